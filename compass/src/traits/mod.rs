//!
//! Traits Module
//!
//! Seams of the engine that can be swapped out:
//!
//! - [`parser`]: turning raw submission models into diagrams.
//! - [`selector`]: choosing one feedback for an element out of its cluster's feedback.
//! - [`store`]: reading submissions and persisting clusters, feedback and results.

pub mod parser;
pub mod selector;
pub mod store;
