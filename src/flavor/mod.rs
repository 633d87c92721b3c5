//! Controller flavors
//!
//! Each flavor knows how its controller spells the handful of commands a
//! probing program needs. Selected by name through [`FlavorRegistry`].

pub mod dialect;
pub mod registry;

pub use dialect::{Grbl, LinuxCnc, ProbeDialect};
pub use registry::FlavorRegistry;
