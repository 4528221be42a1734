#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! ISARIC Data Cleaning
//!
//! # Modules
//!
//! - [`encode`]: Field encoders and the method dispatcher
//! - [`skip_logic`]: Skip-logic expressions
//! - [`filters`]: Skip-logic row masks

pub mod encode;
pub mod filters;
pub mod skip_logic;

// Re-exports for convenience
pub use encode::{
    DEFAULT_COLLAPSE_THRESHOLD, EncodeMethod, OneHotOptions, categorical_ynu_to_boolean, encode,
    inverse_one_hot_encode, one_hot_encode,
};
pub use filters::{Mask, apply_skip_logic, skip_logic_filter};
pub use skip_logic::SkipLogic;
