//! Service layer orchestrating domain operations and infrastructure adapters.

mod auth_service;
mod hospital_service;
mod qna_service;

pub use auth_service::{AuthService, UserStore};
pub use hospital_service::{HospitalService, HospitalStore};
pub use qna_service::{ContextProvider, QnaService, StoreContextProvider};
