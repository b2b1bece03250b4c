//!
//! # Feedback Selection Strategies
//!
//! - [`most_frequent`]: suggests the feedback most cluster-mates received.
//! - [`unanimous`]: suggests only when every cluster-mate received the same credits.

pub mod most_frequent;
pub mod unanimous;

pub use most_frequent::MostFrequentFeedback;
pub use unanimous::Unanimous;
