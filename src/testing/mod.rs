//! Testing utilities module for transcov
//!
//! This module provides common test helpers, fixtures, and recording
//! collaborators for writing tests across the codebase.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
