//! retrovars SDK - Variable Protocol Type Definitions
//!
//! This crate contains the plain type definitions shared by a core and the
//! frontend hosting it. It has no required dependencies and compiles quickly,
//! allowing parallel compilation of dependent crates.
//!
//! # Modules
//!
//! - [`variable`] - Variable kinds, change timing classes and bounds
//! - [`raw`] - `#[repr(C)]` mirror of the in-process call contract

pub mod raw;
pub mod variable;

pub use raw::*;
pub use variable::*;
