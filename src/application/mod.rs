//! Application layer wiring DTOs and services for the directory.

pub mod dtos;
pub mod services;

pub use dtos::{
    AskRequest, AskResponse, AuthResponse, CreateHospitalRequest, CredentialsRequest,
    HealthStatusResponse, HospitalDetailsRequest, HospitalListQuery, MessageResponse,
    UpdateHospitalRequest,
};
pub use services::{AuthService, HospitalService, QnaService};
