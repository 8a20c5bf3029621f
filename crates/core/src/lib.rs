//! TeslaVerse Core - Shared types library.
//!
//! This crate provides common types used across all TeslaVerse components:
//! - `api` - REST API serving accounts, verification, and sessions
//! - `integration-tests` - End-to-end tests against the API router
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, and verification codes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
