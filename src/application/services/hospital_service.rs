use std::sync::Arc;

use uuid::Uuid;

use crate::{
    application::dtos::{
        CreateHospitalRequest, HospitalDetailsRequest, MessageResponse, UpdateHospitalRequest,
    },
    domain::{
        models::{MAX_RATING, MAX_SPECIALITIES, MIN_RATING},
        DomainError, Hospital, HospitalDraft, HospitalPatch,
    },
};

/// Contract for hospital persistence.
pub trait HospitalStore: Send + Sync {
    fn insert(&self, hospital: &Hospital) -> Result<(), DomainError>;

    fn get(&self, id: &Uuid) -> Result<Option<Hospital>, DomainError>;

    /// All hospitals, oldest first.
    fn list(&self) -> Result<Vec<Hospital>, DomainError>;

    /// Read-modify-write of a single record; `Ok(None)` when the id is unknown.
    fn update(
        &self,
        id: &Uuid,
        apply: &mut dyn FnMut(&mut Hospital) -> Result<(), DomainError>,
    ) -> Result<Option<Hospital>, DomainError>;

    fn remove(&self, id: &Uuid) -> Result<Option<Hospital>, DomainError>;

    fn ping(&self) -> Result<(), DomainError>;
}

/// CRUD over the directory with payload validation.
pub struct HospitalService {
    store: Arc<dyn HospitalStore>,
}

impl HospitalService {
    pub fn new(store: Arc<dyn HospitalStore>) -> Self {
        Self { store }
    }

    pub fn create(&self, payload: CreateHospitalRequest) -> Result<Hospital, DomainError> {
        let draft = HospitalDraft::from(payload).normalized();
        validate_draft(&draft)?;

        let hospital = Hospital::new(draft);
        self.store.insert(&hospital)?;

        tracing::info!(id = %hospital.id, name = %hospital.name, "hospital created");
        Ok(hospital)
    }

    pub fn list(&self, city: Option<String>) -> Result<Vec<Hospital>, DomainError> {
        let hospitals = self.store.list()?;
        let filter = city.filter(|c| !c.trim().is_empty());

        Ok(match filter {
            Some(city) => hospitals
                .into_iter()
                .filter(|hospital| hospital.matches_city(&city))
                .collect(),
            None => hospitals,
        })
    }

    pub fn get(&self, id: &Uuid) -> Result<Hospital, DomainError> {
        self.store
            .get(id)?
            .ok_or_else(|| DomainError::not_found("Hospital not found"))
    }

    pub fn update(
        &self,
        id: &Uuid,
        payload: UpdateHospitalRequest,
    ) -> Result<Hospital, DomainError> {
        self.patch(id, HospitalPatch::from(payload))
    }

    pub fn add_details(
        &self,
        id: &Uuid,
        payload: HospitalDetailsRequest,
    ) -> Result<Hospital, DomainError> {
        self.patch(id, HospitalPatch::from(payload))
    }

    pub fn delete(&self, id: &Uuid) -> Result<MessageResponse, DomainError> {
        self.store
            .remove(id)?
            .ok_or_else(|| DomainError::not_found("Hospital not found"))?;

        tracing::info!(%id, "hospital deleted");
        Ok(MessageResponse::new("Hospital deleted successfully"))
    }

    pub fn ping(&self) -> Result<(), DomainError> {
        self.store.ping()
    }

    fn patch(&self, id: &Uuid, patch: HospitalPatch) -> Result<Hospital, DomainError> {
        let patch = patch.normalized();
        validate_patch(&patch)?;

        let mut pending = Some(patch);
        let updated = self.store.update(id, &mut |hospital: &mut Hospital| {
            if let Some(patch) = pending.take() {
                hospital.apply(patch);
            }
            Ok(())
        })?;

        updated.ok_or_else(|| DomainError::not_found("Hospital not found"))
    }
}

fn validate_draft(draft: &HospitalDraft) -> Result<(), DomainError> {
    validate_required("Hospital name", &draft.name)?;
    validate_required("City", &draft.city)?;
    validate_required("Image URL", &draft.image_url)?;
    validate_specialities(&draft.specialities)?;
    validate_rating(draft.rating)
}

fn validate_patch(patch: &HospitalPatch) -> Result<(), DomainError> {
    if let Some(name) = &patch.name {
        validate_required("Hospital name", name)?;
    }
    if let Some(city) = &patch.city {
        validate_required("City", city)?;
    }
    if let Some(image_url) = &patch.image_url {
        validate_required("Image URL", image_url)?;
    }
    if let Some(specialities) = &patch.specialities {
        validate_specialities(specialities)?;
    }
    if let Some(rating) = patch.rating {
        validate_rating(rating)?;
    }
    Ok(())
}

fn validate_required(label: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{label} is required")));
    }
    Ok(())
}

fn validate_specialities(specialities: &[String]) -> Result<(), DomainError> {
    if specialities.len() > MAX_SPECIALITIES {
        return Err(DomainError::limit(format!(
            "Maximum {MAX_SPECIALITIES} specialities are allowed"
        )));
    }
    if specialities.iter().any(|s| s.trim().is_empty()) {
        return Err(DomainError::validation("Specialities cannot be empty"));
    }
    Ok(())
}

fn validate_rating(rating: f64) -> Result<(), DomainError> {
    if !rating.is_finite() || !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(DomainError::validation(format!(
            "Rating must be between {MIN_RATING} and {MAX_RATING}"
        )));
    }
    Ok(())
}
