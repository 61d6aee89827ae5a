//! Core types for the schemaform workspace.
//!
//! This crate provides the shared foundation used by every other
//! schemaform crate: the [`FormError`] error enum, the [`Settings`]
//! configuration struct, logging setup helpers, and small text utilities.

pub mod error;
pub mod logging;
pub mod settings;
pub mod utils;

pub use error::{FormError, FormResult, ValidationError};
pub use settings::Settings;
