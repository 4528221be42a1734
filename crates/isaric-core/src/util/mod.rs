//! Utility modules.
//!
//! # Modules
//!
//! - [`sanitise`]: Turning free-form category values into field-name fragments

pub mod sanitise;
