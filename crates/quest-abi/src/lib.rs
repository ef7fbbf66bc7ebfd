//! Quest ABI crate: stable contracts shared by the launcher host and the native plugin.

pub mod dto;
pub mod ffi;

pub use dto::*;
