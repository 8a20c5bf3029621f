//! Core types for TeslaVerse.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod code;
pub mod email;
pub mod id;

pub use code::{CODE_VALIDITY, CodeError, VerificationCode};
pub use email::{Email, EmailError};
pub use id::*;
