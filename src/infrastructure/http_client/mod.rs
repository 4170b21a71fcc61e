//! HTTP client for talking to a running `medidir-service`.
//!
//! Used by the `medidir-ask` binary and by the integration tests to drive the
//! REST API end to end.

mod remote_client;

pub use remote_client::RemoteDirectoryClient;

use serde::Deserialize;

/// Default service host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default service port
pub const DEFAULT_PORT: u16 = 5000;

/// Health check response from the service
#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
    service: String,
}

/// Check if the service is running and reports itself healthy
pub fn check_service_availability(host: &str, port: u16) -> bool {
    let url = format!("{}/health", get_service_url(host, port));

    tracing::debug!(target: "medidir::http_client", %url, "checking service");

    match ureq::get(&url)
        .timeout(std::time::Duration::from_secs(2))
        .call()
    {
        Ok(response) => match response.into_json::<HealthResponse>() {
            Ok(health) => {
                tracing::debug!(
                    target: "medidir::http_client",
                    status = %health.status,
                    service = %health.service,
                    "service answered"
                );
                health.status == "healthy"
            }
            Err(err) => {
                tracing::warn!(target: "medidir::http_client", error = %err, "unreadable health response");
                false
            }
        },
        Err(err) => {
            tracing::debug!(target: "medidir::http_client", error = %err, "connection failed");
            false
        }
    }
}

/// Get the service base URL
pub fn get_service_url(host: &str, port: u16) -> String {
    format!("http://{}:{}", host, port)
}

/// Error body returned by the service
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

/// Convert HTTP errors to anyhow errors
pub fn handle_http_error(error: ureq::Error) -> anyhow::Error {
    match error {
        ureq::Error::Status(code, response) => {
            if let Ok(err_response) = response.into_json::<ErrorResponse>() {
                anyhow::anyhow!(
                    "HTTP {} - {}: {}",
                    code,
                    err_response.code.as_deref().unwrap_or("ERROR"),
                    err_response.message
                )
            } else {
                anyhow::anyhow!("HTTP error: {}", code)
            }
        }
        ureq::Error::Transport(transport) => {
            anyhow::anyhow!("Transport error: {}", transport)
        }
    }
}
