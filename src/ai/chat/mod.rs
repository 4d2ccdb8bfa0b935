pub mod core;
pub mod models;

pub use self::core::{Session, SessionBuilder, SubmitError};
pub use self::models::{AttachedImage, Role, Transcript, TranscriptEntry};
