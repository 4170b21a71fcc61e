use serde::{Deserialize, Serialize};

use crate::domain::{HospitalDraft, HospitalPatch, UserProfile};

/// Payload accepted when registering a new hospital.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHospitalRequest {
    pub name: String,
    pub city: String,
    pub image_url: String,
    pub specialities: Vec<String>,
    pub rating: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub number_of_doctors: u64,
    #[serde(default)]
    pub number_of_departments: u64,
}

impl From<CreateHospitalRequest> for HospitalDraft {
    fn from(value: CreateHospitalRequest) -> Self {
        Self {
            name: value.name,
            city: value.city,
            image_url: value.image_url,
            specialities: value.specialities,
            rating: value.rating,
            description: value.description,
            images: value.images,
            number_of_doctors: value.number_of_doctors,
            number_of_departments: value.number_of_departments,
        }
    }
}

/// Partial update of any hospital field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHospitalRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialities: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_doctors: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_departments: Option<u64>,
}

impl From<UpdateHospitalRequest> for HospitalPatch {
    fn from(value: UpdateHospitalRequest) -> Self {
        Self {
            name: value.name,
            city: value.city,
            image_url: value.image_url,
            specialities: value.specialities,
            rating: value.rating,
            description: value.description,
            images: value.images,
            number_of_doctors: value.number_of_doctors,
            number_of_departments: value.number_of_departments,
        }
    }
}

/// Detail-only update used by the hospital details form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HospitalDetailsRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_doctors: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_departments: Option<u64>,
}

impl From<HospitalDetailsRequest> for HospitalPatch {
    fn from(value: HospitalDetailsRequest) -> Self {
        Self {
            description: value.description,
            images: value.images,
            number_of_doctors: value.number_of_doctors,
            number_of_departments: value.number_of_departments,
            ..Self::default()
        }
    }
}

/// Query string for hospital listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HospitalListQuery {
    #[serde(default)]
    pub city: Option<String>,
}

/// Credentials shared by the register and login endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Issued after a successful register or login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub response: String,
}

/// Plain confirmation body, e.g. after a delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Health/readiness report for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatusResponse {
    pub status: String,
    pub service: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
