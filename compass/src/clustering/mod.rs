//! Clustering of similar diagram elements across the submissions of one exercise.

pub mod cluster_builder;

pub use cluster_builder::{ClusterBuilder, ClusterMember, ElementCluster, SubmissionModel};
