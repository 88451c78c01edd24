//! Domain types for the image-generation pipeline.
//!
//! Holds the user-facing parameter snapshot, model identities, the
//! scheduler set, and validation helpers. This crate has zero internal
//! dependencies so it can be shared by the graph assembler and any
//! future submission or worker tooling.

pub mod error;
pub mod model;
pub mod params;
pub mod scheduler;
pub mod validation;
