//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and operations
//! - Handle-based collections
//! - Frame timing
//! - Logging utilities

pub mod collections;
pub mod math;
pub mod time;
pub mod logging;
