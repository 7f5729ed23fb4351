pub mod db;
pub mod posture_http;
pub mod study_llm;

pub use db::DbAdapter;
pub use posture_http::HttpPostureSensor;
pub use study_llm::{OpenAiStudyAdapter, StudyModels};
