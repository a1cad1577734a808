//! Core use-case services.
//!
//! # Responsibility
//! - Own the record collections and enforce cross-record rules.
//! - Keep callers (CLI) decoupled from storage details.

pub mod library;
