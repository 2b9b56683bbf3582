//! Drive Classification Module
//!
//! Selects node-local drive records from the cache and splits them by
//! management state.

pub mod selector;

pub use selector::*;
