//! Core types shared across switch-up.
//!
//! Currently this is the user-facing error layer: [`SwitchUpError`] names
//! what went wrong in terms the user understands, and
//! [`user_friendly_error`] maps library errors onto it with suggestions.

pub mod error;

pub use error::{ErrorContext, SwitchUpError, user_friendly_error};
