pub mod m202510010001_create_modeling_exercises;
pub mod m202510010002_create_modeling_submissions;
pub mod m202510010003_create_results;
pub mod m202510010004_create_feedback;
pub mod m202510010005_create_model_clusters;
pub mod m202510010006_create_model_elements;
