//! REST API served by `medidir-service`.
//!
//! # Endpoints
//!
//! - `GET /health` - store liveness
//! - `POST /api/v1/auth/register`, `POST /api/v1/auth/login` - issue bearer tokens
//! - `GET|POST /api/v1/hospitals` - list (optionally `?city=`) and create
//! - `GET|PUT|DELETE /api/v1/hospitals/{id}` - read, partial update, delete
//! - `POST /api/v1/hospitals/{id}/details` - detail-only partial update
//! - `POST /api/v1/qna/ask` - keyword Q&A, bearer token required

use std::{future::Future, sync::Arc, time::Duration};

use axum::{
    extract::{rejection::JsonRejection, Path, Query, Request, State},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderMap, Method, StatusCode,
    },
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    application::{
        AskRequest, AskResponse, AuthResponse, AuthService, CreateHospitalRequest,
        CredentialsRequest, HealthStatusResponse, HospitalDetailsRequest, HospitalListQuery,
        HospitalService, MessageResponse, QnaService, UpdateHospitalRequest,
    },
    domain::{DomainError, Hospital, UserProfile},
};

const SERVICE_NAME: &str = "medidir";

/// Services shared by every handler.
#[derive(Clone)]
pub struct HttpState {
    pub hospitals: Arc<HospitalService>,
    pub auth: Arc<AuthService>,
    pub qna: Arc<QnaService>,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    detail: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            detail: None,
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let (status, code) = match &err {
            DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
            DomainError::LimitExceeded(_) => (StatusCode::BAD_REQUEST, "LIMIT_EXCEEDED"),
            DomainError::AlreadyExists(_) => (StatusCode::BAD_REQUEST, "ALREADY_EXISTS"),
            DomainError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            DomainError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            DomainError::Storage(_) | DomainError::Other(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL")
            }
        };
        Self::new(status, code, err.message())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "MALFORMED_PAYLOAD", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(
                target: "medidir::http",
                code = self.code,
                detail = self.detail.as_deref().unwrap_or(&self.message),
                "request failed"
            );
        }

        let body = ErrorBody {
            message: self.message,
            code: self.code,
            error: self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Runs blocking service work (sled I/O) off the async workers.
async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, DomainError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| ApiError::internal(err.to_string()))?
        .map_err(ApiError::from)
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::new(StatusCode::BAD_REQUEST, "INVALID_ID", "Invalid hospital id"))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

// ============================================================================
// Middleware
// ============================================================================

async fn require_auth(
    State(state): State<HttpState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| ApiError::from(DomainError::unauthorized("Authentication required")))?;

    let auth = Arc::clone(&state.auth);
    let user = run_blocking(move || auth.authenticate(&token)).await?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

// ============================================================================
// Handlers
// ============================================================================

async fn health_check(State(state): State<HttpState>) -> Response {
    let hospitals = Arc::clone(&state.hospitals);

    match run_blocking(move || hospitals.ping()).await {
        Ok(()) => Json(HealthStatusResponse {
            status: "healthy".into(),
            service: SERVICE_NAME.into(),
            details: None,
        })
        .into_response(),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthStatusResponse {
                status: "unavailable".into(),
                service: SERVICE_NAME.into(),
                details: Some(err.message),
            }),
        )
            .into_response(),
    }
}

async fn register(
    State(state): State<HttpState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(payload) = payload?;
    let auth = Arc::clone(&state.auth);

    let issued = run_blocking(move || auth.register(payload)).await?;
    Ok((StatusCode::CREATED, Json(issued)))
}

async fn login(
    State(state): State<HttpState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(payload) = payload?;
    let auth = Arc::clone(&state.auth);

    let issued = run_blocking(move || auth.login(payload)).await?;
    Ok(Json(issued))
}

async fn list_hospitals(
    State(state): State<HttpState>,
    Query(query): Query<HospitalListQuery>,
) -> Result<Json<Vec<Hospital>>, ApiError> {
    let hospitals = Arc::clone(&state.hospitals);

    let items = run_blocking(move || hospitals.list(query.city)).await?;
    Ok(Json(items))
}

async fn create_hospital(
    State(state): State<HttpState>,
    payload: Result<Json<CreateHospitalRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Hospital>), ApiError> {
    let Json(payload) = payload?;
    let hospitals = Arc::clone(&state.hospitals);

    let created = run_blocking(move || hospitals.create(payload)).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_hospital(
    State(state): State<HttpState>,
    Path(id): Path<String>,
) -> Result<Json<Hospital>, ApiError> {
    let id = parse_id(&id)?;
    let hospitals = Arc::clone(&state.hospitals);

    let hospital = run_blocking(move || hospitals.get(&id)).await?;
    Ok(Json(hospital))
}

async fn update_hospital(
    State(state): State<HttpState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateHospitalRequest>, JsonRejection>,
) -> Result<Json<Hospital>, ApiError> {
    let id = parse_id(&id)?;
    let Json(payload) = payload?;
    let hospitals = Arc::clone(&state.hospitals);

    let updated = run_blocking(move || hospitals.update(&id, payload)).await?;
    Ok(Json(updated))
}

async fn add_hospital_details(
    State(state): State<HttpState>,
    Path(id): Path<String>,
    payload: Result<Json<HospitalDetailsRequest>, JsonRejection>,
) -> Result<Json<Hospital>, ApiError> {
    let id = parse_id(&id)?;
    let Json(payload) = payload?;
    let hospitals = Arc::clone(&state.hospitals);

    let updated = run_blocking(move || hospitals.add_details(&id, payload)).await?;
    Ok(Json(updated))
}

async fn delete_hospital(
    State(state): State<HttpState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    let hospitals = Arc::clone(&state.hospitals);

    let message = run_blocking(move || hospitals.delete(&id)).await?;
    Ok(Json(message))
}

async fn ask_question(
    State(state): State<HttpState>,
    Extension(user): Extension<UserProfile>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ApiError> {
    let Json(payload) = payload?;
    let qna = Arc::clone(&state.qna);

    info!(target: "medidir::http", user = %user.email, "question received");

    match run_blocking(move || qna.ask(payload)).await {
        Ok(answer) => Ok(Json(answer)),
        Err(err) if err.status == StatusCode::BAD_REQUEST => Err(err),
        Err(err) => Err(ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "QNA_FAILED",
            message: "Failed to process your question".into(),
            detail: Some(err.message),
        }),
    }
}

// ============================================================================
// Router
// ============================================================================

/// Builds the full API router over `state`.
pub fn router(state: HttpState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    let protected = Router::new()
        .route("/api/v1/qna/ask", post(ask_question))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
        .route(
            "/api/v1/hospitals",
            get(list_hospitals).post(create_hospital),
        )
        .route(
            "/api/v1/hospitals/:id",
            get(get_hospital)
                .put(update_hospital)
                .delete(delete_hospital),
        )
        .route("/api/v1/hospitals/:id/details", post(add_hospital_details))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serves the API on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: HttpState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_extraction() {
        assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc".into()));
        assert_eq!(bearer_token(&headers("Bearer   abc ")), Some("abc".into()));
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("Basic abc")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn domain_errors_map_to_statuses() {
        let cases = [
            (DomainError::validation("x"), StatusCode::BAD_REQUEST),
            (DomainError::limit("x"), StatusCode::BAD_REQUEST),
            (DomainError::already_exists("x"), StatusCode::BAD_REQUEST),
            (DomainError::unauthorized("x"), StatusCode::UNAUTHORIZED),
            (DomainError::not_found("x"), StatusCode::NOT_FOUND),
            (DomainError::storage("x"), StatusCode::INTERNAL_SERVER_ERROR),
            (DomainError::other("x"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn invalid_ids_are_bad_requests() {
        assert_eq!(parse_id("nope").unwrap_err().status(), StatusCode::BAD_REQUEST);
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
    }
}
