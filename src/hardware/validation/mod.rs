//! Device Validation Module
//!
//! Compares a block device as the kernel reports it with the drive record the
//! cluster holds for it.

pub mod fields;
pub mod validator;

pub use fields::{FieldCheck, FieldOutcome, FieldValue, MatchPolicy};
pub use validator::*;
