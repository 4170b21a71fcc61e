use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod user;

pub use user::{Session, User, UserProfile};

/// Upper bound on specialities a single hospital may list.
pub const MAX_SPECIALITIES: usize = 5;

/// Ratings live on a closed 0..=5 scale.
pub const MIN_RATING: f64 = 0.0;
pub const MAX_RATING: f64 = 5.0;

/// Core directory record persisted for every facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hospital {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub city: String,
    pub image_url: String,
    pub specialities: Vec<String>,
    pub rating: f64,
    pub description: String,
    pub images: Vec<String>,
    pub number_of_doctors: u64,
    pub number_of_departments: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Hospital {
    pub fn new(draft: HospitalDraft) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: sanitize_single_line(draft.name),
            city: sanitize_single_line(draft.city),
            image_url: draft.image_url.trim().to_string(),
            specialities: normalize_specialities(draft.specialities),
            rating: draft.rating,
            description: draft.description,
            images: draft.images,
            number_of_doctors: draft.number_of_doctors,
            number_of_departments: draft.number_of_departments,
            created_at: now,
            updated_at: now,
        }
    }

    /// Case-insensitive substring match on the city, mirroring a `city=` list filter.
    pub fn matches_city(&self, filter: &str) -> bool {
        self.city
            .to_lowercase()
            .contains(&filter.trim().to_lowercase())
    }

    /// Applies only the supplied fields and bumps `updated_at`.
    pub fn apply(&mut self, patch: HospitalPatch) {
        if let Some(name) = patch.name {
            self.name = sanitize_single_line(name);
        }
        if let Some(city) = patch.city {
            self.city = sanitize_single_line(city);
        }
        if let Some(image_url) = patch.image_url {
            self.image_url = image_url.trim().to_string();
        }
        if let Some(specialities) = patch.specialities {
            self.specialities = normalize_specialities(specialities);
        }
        if let Some(rating) = patch.rating {
            self.rating = rating;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(images) = patch.images {
            self.images = images;
        }
        if let Some(doctors) = patch.number_of_doctors {
            self.number_of_doctors = doctors;
        }
        if let Some(departments) = patch.number_of_departments {
            self.number_of_departments = departments;
        }
        self.updated_at = Utc::now();
    }

    pub fn as_summary(&self) -> DirectorySummary {
        DirectorySummary {
            name: self.name.clone(),
            city: self.city.clone(),
            specialities: self.specialities.clone(),
            description: self.description.clone(),
            doctor_count: self.number_of_doctors,
            department_count: self.number_of_departments,
        }
    }
}

/// Field set required to create a new hospital.
#[derive(Debug, Clone, Default)]
pub struct HospitalDraft {
    pub name: String,
    pub city: String,
    pub image_url: String,
    pub specialities: Vec<String>,
    pub rating: f64,
    pub description: String,
    pub images: Vec<String>,
    pub number_of_doctors: u64,
    pub number_of_departments: u64,
}

impl HospitalDraft {
    /// Applies the same text cleanup a stored record gets, so validation
    /// sees the values that will be persisted.
    pub fn normalized(self) -> Self {
        Self {
            name: sanitize_single_line(self.name),
            city: sanitize_single_line(self.city),
            image_url: self.image_url.trim().to_string(),
            specialities: normalize_specialities(self.specialities),
            ..self
        }
    }
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct HospitalPatch {
    pub name: Option<String>,
    pub city: Option<String>,
    pub image_url: Option<String>,
    pub specialities: Option<Vec<String>>,
    pub rating: Option<f64>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
    pub number_of_doctors: Option<u64>,
    pub number_of_departments: Option<u64>,
}

impl HospitalPatch {
    /// Field-wise counterpart of [`HospitalDraft::normalized`].
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.map(sanitize_single_line),
            city: self.city.map(sanitize_single_line),
            image_url: self.image_url.map(|url| url.trim().to_string()),
            specialities: self.specialities.map(normalize_specialities),
            ..self
        }
    }
}

/// Flat projection of a hospital used to answer directory questions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectorySummary {
    pub name: String,
    pub city: String,
    pub specialities: Vec<String>,
    pub description: String,
    pub doctor_count: u64,
    pub department_count: u64,
}

fn sanitize_single_line(input: impl Into<String>) -> String {
    input
        .into()
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn normalize_specialities(specialities: Vec<String>) -> Vec<String> {
    specialities
        .into_iter()
        .map(|speciality| speciality.trim().to_string())
        .collect()
}
