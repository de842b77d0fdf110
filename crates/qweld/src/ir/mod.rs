//! Intermediate Representation (IR) for qweld
//!
//! This module provides the type mapping table, the raw candidates produced
//! by the extractor and the validated schemas consumed by the emitters.

pub mod candidate;
pub mod naming;
pub mod schema;
pub mod types;

pub use candidate::*;
pub use schema::*;
pub use types::*;
