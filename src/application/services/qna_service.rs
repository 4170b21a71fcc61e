use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    application::dtos::{AskRequest, AskResponse},
    application::services::HospitalStore,
    domain::{qna, DirectorySummary, DomainError},
};

/// Supplies the directory snapshot a question is answered from.
pub trait ContextProvider: Send + Sync {
    /// Never fails; an unreadable directory is reported as empty.
    fn load_context(&self) -> Vec<DirectorySummary>;
}

/// Projects every stored hospital to a [`DirectorySummary`].
pub struct StoreContextProvider {
    store: Arc<dyn HospitalStore>,
}

impl StoreContextProvider {
    pub fn new(store: Arc<dyn HospitalStore>) -> Self {
        Self { store }
    }
}

impl ContextProvider for StoreContextProvider {
    fn load_context(&self) -> Vec<DirectorySummary> {
        match self.store.list() {
            Ok(hospitals) => hospitals.iter().map(|h| h.as_summary()).collect(),
            Err(err) => {
                warn!(target: "medidir::qna", error = %err, "failed to load directory context");
                Vec::new()
            }
        }
    }
}

/// Answers free-text questions about the directory.
pub struct QnaService {
    context: Arc<dyn ContextProvider>,
}

impl QnaService {
    pub fn new(context: Arc<dyn ContextProvider>) -> Self {
        Self { context }
    }

    pub fn ask(&self, request: AskRequest) -> Result<AskResponse, DomainError> {
        if request.query.is_empty() {
            return Err(DomainError::validation("Query is required"));
        }

        let summaries = self.context.load_context();
        debug!(
            target: "medidir::qna",
            intent = qna::classify(&request.query).as_str(),
            hospitals = summaries.len(),
            "answering question"
        );

        Ok(AskResponse {
            response: qna::answer(&request.query, &summaries),
        })
    }
}
