pub mod assessment_result;
pub mod feedback;
pub mod model_cluster;
pub mod model_element;
pub mod modeling_exercise;
pub mod modeling_submission;

pub use assessment_result::Entity as AssessmentResult;
pub use feedback::Entity as Feedback;
pub use model_cluster::Entity as ModelCluster;
pub use model_element::Entity as ModelElement;
pub use modeling_exercise::Entity as ModelingExercise;
pub use modeling_submission::Entity as ModelingSubmission;
