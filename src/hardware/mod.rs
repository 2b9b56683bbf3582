//! Hardware Module
//!
//! Block device descriptors, path resolution, validation of devices against
//! their drive records, and drive selection for the node agent.

pub mod classification;
pub mod device;
pub mod path;
pub mod validation;

pub use classification::*;
pub use device::*;
pub use path::*;
pub use validation::*;
