//! # Compass
//!
//! Semi-automatic assessment of modeling exercises. Elements of all submissions of an
//! exercise are clustered by structural similarity; when a tutor assesses one element of a
//! cluster, the same feedback can be suggested for the other members.
//!
//! ## Key Concepts
//! - **Element model** ([`umlmodel`]): an arena of typed diagram elements with local and
//!   overall similarity.
//! - **Parser** ([`parsers`]): turns the editor's diagram JSON into the element model.
//! - **Cluster builder** ([`clustering`]): groups similar elements across submissions.
//! - **Feedback selection** ([`feedback`]): pluggable strategies picking one feedback per element.
//! - **Suggestion service** ([`suggestion`]): builds clusters once per exercise and turns
//!   cluster feedback into semi-automatic results.
//! - **Storage** ([`traits::store`], [`store`]): persistence behind traits, backed by SeaORM.

pub mod clustering;
pub mod config;
pub mod error;
pub mod feedback;
pub mod parsers;
pub mod store;
pub mod suggestion;
pub mod traits;
pub mod umlmodel;

pub use config::CompassConfig;
pub use error::{CompassError, CompassResult};
pub use store::DbStore;
pub use suggestion::{BuildOutcome, ClusterStatistics, SuggestionService};
