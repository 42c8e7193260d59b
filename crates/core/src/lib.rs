//! Shared domain types for jobwatch.
//!
//! Pure types, constants, and validation used by the backend client and
//! the request tracker. Has no runtime or I/O dependencies.

pub mod error;
pub mod polling;
pub mod status;
pub mod types;
