//! Foundation module - Core utilities and types
//!
//! This module provides the small set of utilities the instancing core builds on:
//! - Math types and transforms
//! - Logging initialisation

pub mod math;
pub mod logging;
