//! Variable kind and change timing definitions
//!
//! These enums are shared by both sides of the negotiation. Their
//! discriminants match the values used by the raw call contract in
//! [`crate::raw`].

use std::ffi::c_int;

/// Stable integer identifier of a variable: its position in the declared sequence
pub type VariableId = u32;

/// Smallest legal resolution width or height
pub const RESOLUTION_MIN: u32 = 1;

/// Largest legal resolution width or height
pub const RESOLUTION_MAX: u32 = 65535;

/// Variable kind enumeration
///
/// Determines the shape of a variable's value domain and value.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum VariableKind {
    /// Marks the end of a declared sequence
    #[default]
    Terminator = 0,
    /// Groups similar items together; carries display text only
    Separator = 1,
    /// One of an ordered list of labels, valued by index
    Enum = 2,
    /// true / false
    Bool = 3,
    /// Integer within an inclusive range
    Int = 4,
    /// Float within an inclusive range
    Float = 5,
    /// Width and height, each within 1..=65535
    Resolution = 6,
}

impl VariableKind {
    /// Convert from the raw discriminant
    ///
    /// Returns None for values outside the known set.
    pub fn from_raw(raw: c_int) -> Option<Self> {
        match raw {
            0 => Some(Self::Terminator),
            1 => Some(Self::Separator),
            2 => Some(Self::Enum),
            3 => Some(Self::Bool),
            4 => Some(Self::Int),
            5 => Some(Self::Float),
            6 => Some(Self::Resolution),
            _ => None,
        }
    }

    /// Check if variables of this kind hold a value
    ///
    /// Separators and terminators are never queried or notified.
    pub fn has_value(&self) -> bool {
        !matches!(self, Self::Terminator | Self::Separator)
    }

    /// Human readable name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Terminator => "terminator",
            Self::Separator => "separator",
            Self::Enum => "enum",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Resolution => "resolution",
        }
    }
}

impl std::fmt::Display for VariableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When a core acknowledges changes to a variable
///
/// Advisory only. The frontend uses it to decide when surfacing an edit is
/// meaningful; the channel never enforces it, and the frontend may still
/// change variables that are currently inapplicable.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ChangeTiming {
    /// Takes effect on the next frame, or within a few frames (<= 0.1s)
    #[default]
    Instant = 0,
    /// Takes effect while running, but not immediately (e.g. next level)
    Delayed = 1,
    /// Only honored when a game is loaded or reset
    Reset = 2,
    /// Ignored until other options change; the core re-declares when they do
    WrongOptions = 3,
    /// Not applicable to the loaded game
    WrongGame = 4,
}

impl ChangeTiming {
    /// Convert from the raw discriminant
    pub fn from_raw(raw: c_int) -> Option<Self> {
        match raw {
            0 => Some(Self::Instant),
            1 => Some(Self::Delayed),
            2 => Some(Self::Reset),
            3 => Some(Self::WrongOptions),
            4 => Some(Self::WrongGame),
            _ => None,
        }
    }

    /// False for the two currently-inapplicable classes
    pub fn is_applicable(&self) -> bool {
        !matches!(self, Self::WrongOptions | Self::WrongGame)
    }

    /// True if edits only take effect on load or reset
    pub fn requires_reset(&self) -> bool {
        matches!(self, Self::Reset)
    }
}
