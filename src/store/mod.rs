pub mod repository;

pub use repository::{STUDY_FILE, StudySetRepository};
