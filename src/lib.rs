pub mod card;
pub mod commands;
pub mod error;
pub mod palette;
pub mod quiz;
pub mod store;
pub mod tui;
pub mod utils;

pub use card::{CardStore, Direction, Flashcard};
pub use error::Error;
pub use quiz::QuizSession;
pub use store::StudySetRepository;
