//! Virtual Environmental Sensing peripheral library.
//!
//! This library provides the trigger-driven notification engine of an
//! Environmental Sensing Service, together with the runtime collaborators
//! that drive it.

pub mod config;
pub mod error;
pub mod ess;
pub mod peripheral;
pub mod transport;
