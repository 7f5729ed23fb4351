pub mod activity;
pub mod commands;
pub mod detection;
pub mod domain;
pub mod generation;
pub mod landmarks;
pub mod ports;
pub mod posture;
pub mod quiz;
pub mod reminders;
pub mod timer;

pub use domain::{
    Flashcard, PostureLogEntry, PostureStatus, QuizAnswer, QuizQuestion, QuizResult, Session,
    SessionStatus, StoredFlashcard,
};
pub use ports::{DatabaseService, PortError, PortResult, PostureSensor, StudyMaterialService};
