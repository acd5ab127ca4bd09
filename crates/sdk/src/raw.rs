//! Raw call contract definitions
//!
//! `#[repr(C)]` layouts for a core and frontend that exchange variable
//! declarations through plain pointers. Kind and timing are carried as
//! `c_int` so that foreign discriminants can be checked before conversion.
//!
//! Payload shapes by kind:
//!
//! | kind       | `values`                               | `initial` / value  |
//! |------------|----------------------------------------|--------------------|
//! | Enum       | `*const *const c_char`, NULL-terminated | `c_uint` index     |
//! | Bool       | NULL                                   | `bool`             |
//! | Int        | `*const c_int`, two entries (low, high) | `c_int`            |
//! | Float      | `*const f32`, two entries (low, high)   | `f32`              |
//! | Resolution | NULL                                   | `[c_uint; 2]`      |
//! | Separator  | NULL                                   | NULL               |

use std::ffi::{c_char, c_int, c_uint, c_void};

/// Change notification callback
///
/// Called with the variable's position, a pointer to the new value (same
/// shape as `initial`), and the opaque core handle given at declaration.
pub type ChangeNotifyFn = unsafe extern "C" fn(id: c_uint, value: *mut c_void, core_handle: *mut c_void);

/// One entry of a raw declared sequence
///
/// A sequence is an array of these terminated by an entry whose `kind` is
/// [`crate::VariableKind::Terminator`]; there is no length field.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawVariable {
    /// [`crate::VariableKind`] discriminant
    pub kind: c_int,
    /// [`crate::ChangeTiming`] discriminant
    pub change: c_int,
    /// Internal name, suitable as a configuration key (e.g. `gb_colorize`)
    pub name: *const c_char,
    /// Name shown to the user (e.g. `Game Boy colorization`)
    pub pub_name: *const c_char,
    /// Second line of description text
    pub description: *const c_char,
    /// Kind-dependent value domain
    pub values: *const c_void,
    /// Kind-dependent default value
    pub initial: *const c_void,
    /// Optional change callback
    pub change_notify: Option<ChangeNotifyFn>,
}

impl RawVariable {
    /// Create a terminator entry
    pub const fn terminator() -> Self {
        Self {
            kind: 0,
            change: 0,
            name: std::ptr::null(),
            pub_name: std::ptr::null(),
            description: std::ptr::null(),
            values: std::ptr::null(),
            initial: std::ptr::null(),
            change_notify: None,
        }
    }
}

/// Point-in-time read request
///
/// The core sets `id` and points `value` at storage shaped like the
/// variable's `initial`; the frontend writes the current value into it.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawVariableQuery {
    /// Position of the variable to read
    pub id: c_uint,
    /// Caller-provided destination for the value
    pub value: *mut c_void,
}
