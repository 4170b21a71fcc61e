//! Domain layer: directory entities, shared errors, and the Q&A core.

pub mod errors;
pub mod models;
pub mod qna;

pub use errors::DomainError;
pub use models::{
    DirectorySummary, Hospital, HospitalDraft, HospitalPatch, Session, User, UserProfile,
};
