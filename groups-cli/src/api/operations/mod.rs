//! Directory Operations Module
//!
//! Describes the calls the provisioner issues against the directory
//! service and the recorded outcome of each one.

pub mod operation;

pub use operation::{Operation, OperationResult};
