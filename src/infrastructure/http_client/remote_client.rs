//! Blocking client for the directory REST API.

use anyhow::{Context, Result};
use uuid::Uuid;

use crate::{
    application::dtos::{
        AskRequest, AskResponse, AuthResponse, CreateHospitalRequest, CredentialsRequest,
        HospitalDetailsRequest, MessageResponse, UpdateHospitalRequest,
    },
    domain::Hospital,
};

use super::{get_service_url, handle_http_error};

/// Typed wrapper over the `/api/v1` endpoints. Carries an optional bearer token.
pub struct RemoteDirectoryClient {
    base_url: String,
    agent: ureq::Agent,
    token: Option<String>,
}

impl RemoteDirectoryClient {
    pub fn new(host: &str, port: u16) -> Self {
        let base_url = get_service_url(host, port);
        let agent = ureq::AgentBuilder::new()
            .timeout(std::time::Duration::from_secs(30))
            .build();

        Self {
            base_url,
            agent,
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, path)
    }

    fn authorized(&self, request: ureq::Request) -> ureq::Request {
        match &self.token {
            Some(token) => request.set("Authorization", &format!("Bearer {token}")),
            None => request,
        }
    }

    /// Registers and keeps the issued token for later calls.
    pub fn register(&mut self, email: &str, password: &str) -> Result<AuthResponse> {
        let auth = self.send_credentials("auth/register", email, password)?;
        self.token = Some(auth.token.clone());
        Ok(auth)
    }

    /// Logs in and keeps the issued token for later calls.
    pub fn login(&mut self, email: &str, password: &str) -> Result<AuthResponse> {
        let auth = self.send_credentials("auth/login", email, password)?;
        self.token = Some(auth.token.clone());
        Ok(auth)
    }

    fn send_credentials(&self, path: &str, email: &str, password: &str) -> Result<AuthResponse> {
        let body = CredentialsRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        self.agent
            .post(&self.api_url(path))
            .send_json(&body)
            .map_err(handle_http_error)?
            .into_json()
            .context("failed to parse auth response")
    }

    pub fn ask(&self, query: &str) -> Result<String> {
        let body = AskRequest {
            query: query.to_string(),
        };

        let response: AskResponse = self
            .authorized(self.agent.post(&self.api_url("qna/ask")))
            .send_json(&body)
            .map_err(handle_http_error)?
            .into_json()
            .context("failed to parse answer")?;

        Ok(response.response)
    }

    pub fn list_hospitals(&self, city: Option<&str>) -> Result<Vec<Hospital>> {
        let mut url = self.api_url("hospitals");
        if let Some(city) = city {
            url = format!("{}?city={}", url, urlencoding::encode(city));
        }

        self.authorized(self.agent.get(&url))
            .call()
            .map_err(handle_http_error)?
            .into_json()
            .context("failed to parse hospital list")
    }

    pub fn get_hospital(&self, id: &Uuid) -> Result<Hospital> {
        self.authorized(self.agent.get(&self.api_url(&format!("hospitals/{id}"))))
            .call()
            .map_err(handle_http_error)?
            .into_json()
            .context("failed to parse hospital")
    }

    pub fn create_hospital(&self, payload: &CreateHospitalRequest) -> Result<Hospital> {
        self.authorized(self.agent.post(&self.api_url("hospitals")))
            .send_json(payload)
            .map_err(handle_http_error)?
            .into_json()
            .context("failed to parse created hospital")
    }

    pub fn update_hospital(&self, id: &Uuid, payload: &UpdateHospitalRequest) -> Result<Hospital> {
        self.authorized(self.agent.put(&self.api_url(&format!("hospitals/{id}"))))
            .send_json(payload)
            .map_err(handle_http_error)?
            .into_json()
            .context("failed to parse updated hospital")
    }

    pub fn add_hospital_details(
        &self,
        id: &Uuid,
        payload: &HospitalDetailsRequest,
    ) -> Result<Hospital> {
        self.authorized(
            self.agent
                .post(&self.api_url(&format!("hospitals/{id}/details"))),
        )
        .send_json(payload)
        .map_err(handle_http_error)?
        .into_json()
        .context("failed to parse updated hospital")
    }

    pub fn delete_hospital(&self, id: &Uuid) -> Result<String> {
        let response: MessageResponse = self
            .authorized(self.agent.delete(&self.api_url(&format!("hospitals/{id}"))))
            .call()
            .map_err(handle_http_error)?
            .into_json()
            .context("failed to parse delete response")?;

        Ok(response.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_client_creation() {
        let client = RemoteDirectoryClient::new("localhost", 5000);
        assert_eq!(client.api_url("hospitals"), "http://localhost:5000/api/v1/hospitals");
        assert!(client.token().is_none());
    }

    #[test]
    fn test_with_token() {
        let client = RemoteDirectoryClient::new("localhost", 5000).with_token("abc");
        assert_eq!(client.token(), Some("abc"));
    }
}
