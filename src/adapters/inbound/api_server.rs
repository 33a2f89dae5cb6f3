//! Location API Server
//!
//! HTTP API consumed by the map UI: resolve free text to a point, or look a
//! place name up directly. Both routes share one rate-limited geocoder.

use crate::application::{GeocodeClient, ResolutionService};
use crate::domain::entities::{ProviderErrorKind, ResolutionResult};
use crate::infrastructure::shutdown_signal;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

const MSG_EXTRACTION_FAILED: &str = "Could not extract a location from the input.";
const MSG_RESOLVE_NOT_FOUND: &str = "Location not found.";
const MSG_RESOLVE_PROVIDER: &str = "Could not retrieve coordinates for the location.";
const MSG_RESOLVE_UNEXPECTED: &str = "An unexpected error occurred.";

const MSG_METHOD_NOT_ALLOWED: &str = "Method not allowed";
const MSG_PLACE_REQUIRED: &str = "Place parameter is required";
const MSG_LOOKUP_NOT_FOUND: &str = "Location not found";
const MSG_LOOKUP_TIMEOUT: &str = "Timeout error";
const MSG_LOOKUP_SERVICE: &str = "Service error";
const MSG_LOOKUP_UNEXPECTED: &str = "An unexpected error occurred";

/// Body of `POST /resolve`.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolveRequest {
    pub value: String,
}

/// Successful `POST /resolve` answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveResponse {
    /// `[latitude, longitude]`
    pub coordinates: [f64; 2],
    pub title: String,
}

/// Query string of `GET /geocode`.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeParams {
    pub place: Option<String>,
}

/// Successful `GET /geocode` answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResponse {
    pub place: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Error body shared by both routes.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(rename = "locationText", skip_serializing_if = "Option::is_none")]
    pub location_text: Option<String>,
}

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub geocoder: String,
}

/// API Server state.
#[derive(Clone)]
pub struct ApiState {
    pub resolver: Arc<ResolutionService>,
    /// Same instance the resolver uses, so both routes share its rate limit
    pub geocoder: Arc<GeocodeClient>,
}

impl ApiState {
    pub fn new(resolver: Arc<ResolutionService>) -> Self {
        let geocoder = resolver.geocoder().clone();
        Self { resolver, geocoder }
    }
}

/// API Server for the map UI.
pub struct ApiServer {
    listen_addr: String,
    state: ApiState,
}

impl ApiServer {
    pub fn new(listen_addr: String, resolver: Arc<ResolutionService>) -> Self {
        Self {
            listen_addr,
            state: ApiState::new(resolver),
        }
    }

    /// Get shared state for use by other components.
    pub fn state(&self) -> ApiState {
        self.state.clone()
    }

    /// Run the API server until a shutdown signal arrives.
    #[cfg_attr(coverage_nightly, coverage(off))]
    pub async fn run(&self) -> anyhow::Result<()> {
        let app = router(self.state.clone());

        let listener = TcpListener::bind(&self.listen_addr).await?;
        tracing::info!("location API listening on {}", self.listen_addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("location API stopped");
        Ok(())
    }
}

/// Build the router with all routes.
pub fn router(state: ApiState) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(health_handler))
        // Free text -> extraction -> geocoding
        .route(
            "/resolve",
            post(resolve_handler).layer(CatchPanicLayer::custom(resolve_panic_response)),
        )
        // Direct rate-limited lookup
        .route(
            "/geocode",
            get(geocode_handler)
                .fallback(method_not_allowed_handler)
                .layer(CatchPanicLayer::custom(lookup_panic_response)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn error_response(status: StatusCode, message: &str) -> Response {
    let body = ErrorResponse {
        error: message.to_string(),
        location_text: None,
    };
    (status, Json(body)).into_response()
}

/// Map a pipeline outcome to the `/resolve` contract.
pub fn resolution_response(result: ResolutionResult) -> Response {
    match result {
        ResolutionResult::Success(point) => {
            let body = ResolveResponse {
                coordinates: point.coordinates(),
                title: point.title().to_string(),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        ResolutionResult::ExtractionFailed => {
            error_response(StatusCode::BAD_REQUEST, MSG_EXTRACTION_FAILED)
        }
        ResolutionResult::NotFound => error_response(StatusCode::NOT_FOUND, MSG_RESOLVE_NOT_FOUND),
        ResolutionResult::ProviderError { location_text, .. } => {
            let body = ErrorResponse {
                error: MSG_RESOLVE_PROVIDER.to_string(),
                location_text: Some(location_text),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

/// Map a lookup outcome to the `/geocode` contract.
pub fn lookup_response(place: &str, result: ResolutionResult) -> Response {
    match result {
        ResolutionResult::Success(point) => {
            let body = GeocodeResponse {
                place: place.to_string(),
                latitude: point.latitude(),
                longitude: point.longitude(),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        ResolutionResult::NotFound => error_response(StatusCode::NOT_FOUND, MSG_LOOKUP_NOT_FOUND),
        ResolutionResult::ProviderError {
            kind: ProviderErrorKind::Timeout,
            ..
        } => error_response(StatusCode::GATEWAY_TIMEOUT, MSG_LOOKUP_TIMEOUT),
        ResolutionResult::ProviderError {
            kind: ProviderErrorKind::Service,
            ..
        } => error_response(StatusCode::BAD_GATEWAY, MSG_LOOKUP_SERVICE),
        ResolutionResult::ExtractionFailed => {
            tracing::error!("direct lookup produced an extraction outcome");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, MSG_LOOKUP_UNEXPECTED)
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

fn resolve_panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!("resolve handler panicked: {}", panic_message(panic.as_ref()));
    error_response(StatusCode::INTERNAL_SERVER_ERROR, MSG_RESOLVE_UNEXPECTED)
}

fn lookup_panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!("geocode handler panicked: {}", panic_message(panic.as_ref()));
    error_response(StatusCode::INTERNAL_SERVER_ERROR, MSG_LOOKUP_UNEXPECTED)
}

// Handler functions

async fn health_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        geocoder: state.geocoder.provider_name().to_string(),
    };
    Json(response)
}

#[tracing::instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
async fn resolve_handler(
    State(state): State<ApiState>,
    payload: Result<Json<ResolveRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::warn!("rejected resolve body: {}", rejection.body_text());
            return error_response(StatusCode::BAD_REQUEST, MSG_EXTRACTION_FAILED);
        }
    };

    tracing::info!("resolve request: {}", request.value);

    let result = state.resolver.resolve(&request.value).await;
    tracing::info!("{} ({})", result.narration(), result.label());

    resolution_response(result)
}

#[tracing::instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
async fn geocode_handler(
    State(state): State<ApiState>,
    params: Result<Query<GeocodeParams>, QueryRejection>,
) -> Response {
    let place = match params {
        Ok(Query(GeocodeParams { place: Some(place) })) if !place.trim().is_empty() => place,
        Ok(_) => return error_response(StatusCode::BAD_REQUEST, MSG_PLACE_REQUIRED),
        Err(rejection) => {
            tracing::debug!("rejected geocode query: {}", rejection.body_text());
            return error_response(StatusCode::BAD_REQUEST, MSG_PLACE_REQUIRED);
        }
    };

    // Only the lookup key is trimmed; the answer echoes the query as sent
    let result = state.geocoder.lookup(place.trim()).await;
    tracing::info!("geocode '{}' -> {}", place, result.label());

    lookup_response(&place, result)
}

async fn method_not_allowed_handler() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, MSG_METHOD_NOT_ALLOWED)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::domain::entities::{ExtractedLocation, GeocodeMatch, Query};
    use crate::domain::ports::test_doubles::{MockExtractor, MockGeocoder};
    use crate::domain::ports::{
        ExtractionError, GeocodeError, GeocodingProvider, LocationExtractor,
    };
    use crate::domain::value_objects::GeoPoint;
    use async_trait::async_trait;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tower::ServiceExt;

    // ===== Test Helpers =====

    struct PanickingExtractor;

    #[async_trait]
    impl LocationExtractor for PanickingExtractor {
        async fn extract(&self, _query: &Query) -> Result<ExtractedLocation, ExtractionError> {
            panic!("extractor blew up")
        }
    }

    struct PanickingGeocoder;

    #[async_trait]
    impl GeocodingProvider for PanickingGeocoder {
        async fn geocode(&self, _place: &str) -> Result<Vec<GeocodeMatch>, GeocodeError> {
            panic!("geocoder blew up")
        }

        fn name(&self) -> &'static str {
            "panicking"
        }
    }

    fn state_with(
        extractor: MockExtractor,
        geocoder: Arc<MockGeocoder>,
        min_delay: Duration,
    ) -> ApiState {
        let client = Arc::new(GeocodeClient::new(
            geocoder,
            min_delay,
            Duration::from_secs(5),
        ));
        ApiState::new(Arc::new(ResolutionService::new(Arc::new(extractor), client)))
    }

    fn test_state(geocoder: Arc<MockGeocoder>) -> ApiState {
        let extractor = MockExtractor::new()
            .with_answer("Toronto", "Toronto")
            .with_answer("I want to see Atlantis", "Atlantis")
            .with_answer("fly me to Paris", "Paris")
            .with_error("break the model", ExtractionError::Service("status 401".into()));
        state_with(extractor, geocoder, Duration::ZERO)
    }

    fn test_geocoder() -> MockGeocoder {
        MockGeocoder::new()
            .with_place("Toronto", 43.7, -79.4)
            .with_error("Paris", GeocodeError::Service("status 503".into()))
            .with_error("Oslo", GeocodeError::Timeout)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    // ===== Mapping Tests =====

    #[tokio::test]
    async fn test_resolution_response_success() {
        let point = GeoPoint::new(43.7, -79.4, "Toronto").unwrap();
        let response = resolution_response(ResolutionResult::Success(point));

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"coordinates": [43.7, -79.4], "title": "Toronto"})
        );
    }

    #[tokio::test]
    async fn test_lookup_response_unexpected_variant() {
        let response = lookup_response("x", ResolutionResult::ExtractionFailed);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "An unexpected error occurred"})
        );
    }

    #[test]
    fn test_api_state_shares_geocoder() {
        let state = test_state(Arc::new(test_geocoder()));
        assert!(Arc::ptr_eq(&state.geocoder, state.resolver.geocoder()));
    }

    // ===== Handler Tests =====

    #[tokio::test]
    async fn test_health_handler() {
        let app = router(test_state(Arc::new(test_geocoder())));

        let response = app.oneshot(get("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["geocoder"], "mock");
    }

    #[tokio::test]
    async fn test_resolve_handler_success() {
        let app = router(test_state(Arc::new(test_geocoder())));

        let response = app
            .oneshot(post_json("/resolve", serde_json::json!({"value": "Toronto"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"coordinates": [43.7, -79.4], "title": "Toronto"})
        );
    }

    #[tokio::test]
    async fn test_resolve_handler_extraction_failed() {
        let geocoder = Arc::new(test_geocoder());
        let app = router(test_state(geocoder.clone()));

        let response = app
            .oneshot(post_json("/resolve", serde_json::json!({"value": "asdkjasdk"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "Could not extract a location from the input."})
        );
        assert_eq!(geocoder.calls(), 0);
    }

    #[tokio::test]
    async fn test_resolve_handler_not_found() {
        let app = router(test_state(Arc::new(test_geocoder())));

        let response = app
            .oneshot(post_json(
                "/resolve",
                serde_json::json!({"value": "I want to see Atlantis"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "Location not found."})
        );
    }

    #[tokio::test]
    async fn test_resolve_handler_provider_error_includes_location_text() {
        let app = router(test_state(Arc::new(test_geocoder())));

        let response = app
            .oneshot(post_json("/resolve", serde_json::json!({"value": "fly me to Paris"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({
                "error": "Could not retrieve coordinates for the location.",
                "locationText": "Paris"
            })
        );
    }

    #[tokio::test]
    async fn test_resolve_handler_extractor_failure_is_bad_request() {
        let geocoder = Arc::new(test_geocoder());
        let app = router(test_state(geocoder.clone()));

        let response = app
            .oneshot(post_json("/resolve", serde_json::json!({"value": "break the model"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "Could not extract a location from the input."})
        );
        assert_eq!(geocoder.calls(), 0);
    }

    #[tokio::test]
    async fn test_resolve_handler_panic_is_unexpected() {
        let client = Arc::new(GeocodeClient::new(
            Arc::new(test_geocoder()),
            Duration::ZERO,
            Duration::from_secs(5),
        ));
        let resolver = ResolutionService::new(Arc::new(PanickingExtractor), client);
        let app = router(ApiState::new(Arc::new(resolver)));

        let response = app
            .oneshot(post_json("/resolve", serde_json::json!({"value": "Toronto"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "An unexpected error occurred."})
        );
    }

    #[tokio::test]
    async fn test_geocode_handler_panic_is_unexpected() {
        let client = Arc::new(GeocodeClient::new(
            Arc::new(PanickingGeocoder),
            Duration::ZERO,
            Duration::from_secs(5),
        ));
        let resolver = ResolutionService::new(Arc::new(MockExtractor::new()), client);
        let app = router(ApiState::new(Arc::new(resolver)));

        let response = app.oneshot(get("/geocode?place=Oslo")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "An unexpected error occurred"})
        );
    }

    #[tokio::test]
    async fn test_resolve_handler_missing_value() {
        let app = router(test_state(Arc::new(test_geocoder())));

        let response = app
            .oneshot(post_json("/resolve", serde_json::json!({"text": "Toronto"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_resolve_handler_invalid_json() {
        let app = router(test_state(Arc::new(test_geocoder())));

        let request = Request::builder()
            .method("POST")
            .uri("/resolve")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_resolve_handler_blank_value() {
        let app = router(test_state(Arc::new(test_geocoder())));

        let response = app
            .oneshot(post_json("/resolve", serde_json::json!({"value": "   "})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_geocode_handler_success() {
        let app = router(test_state(Arc::new(test_geocoder())));

        let response = app.oneshot(get("/geocode?place=Toronto")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"place": "Toronto", "latitude": 43.7, "longitude": -79.4})
        );
    }

    #[tokio::test]
    async fn test_geocode_handler_missing_place() {
        let geocoder = Arc::new(test_geocoder());
        let app = router(test_state(geocoder.clone()));

        let response = app.oneshot(get("/geocode")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "Place parameter is required"})
        );
        assert_eq!(geocoder.calls(), 0);
    }

    #[tokio::test]
    async fn test_geocode_handler_empty_place() {
        let app = router(test_state(Arc::new(test_geocoder())));

        let response = app.oneshot(get("/geocode?place=")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_geocode_handler_post_not_allowed() {
        let app = router(test_state(Arc::new(test_geocoder())));

        let request = Request::builder()
            .method("POST")
            .uri("/geocode?place=Toronto")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "Method not allowed"})
        );
    }

    #[tokio::test]
    async fn test_geocode_handler_delete_not_allowed() {
        let app = router(test_state(Arc::new(test_geocoder())));

        let request = Request::builder()
            .method("DELETE")
            .uri("/geocode")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_geocode_handler_not_found() {
        let app = router(test_state(Arc::new(test_geocoder())));

        let response = app.oneshot(get("/geocode?place=Atlantis")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "Location not found"})
        );
    }

    #[tokio::test]
    async fn test_geocode_handler_timeout() {
        let app = router(test_state(Arc::new(test_geocoder())));

        let response = app.oneshot(get("/geocode?place=Oslo")).await.unwrap();

        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "Timeout error"})
        );
    }

    #[tokio::test]
    async fn test_geocode_handler_service_error() {
        let app = router(test_state(Arc::new(test_geocoder())));

        let response = app.oneshot(get("/geocode?place=Paris")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "Service error"})
        );
    }

    #[tokio::test]
    async fn test_geocode_handler_url_encoded_place() {
        let geocoder = Arc::new(MockGeocoder::new().with_place("New York", 40.7128, -74.006));
        let app = router(state_with(MockExtractor::new(), geocoder, Duration::ZERO));

        let response = app.oneshot(get("/geocode?place=New%20York")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["place"], "New York");
    }

    #[tokio::test]
    async fn test_geocode_handler_echoes_raw_place() {
        let geocoder = Arc::new(test_geocoder());
        let app = router(test_state(geocoder.clone()));

        let response = app
            .oneshot(get("/geocode?place=%20Toronto%20"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"place": " Toronto ", "latitude": 43.7, "longitude": -79.4})
        );
        assert_eq!(geocoder.calls(), 1);
    }

    #[tokio::test]
    async fn test_routes_share_rate_limit() {
        let geocoder = Arc::new(test_geocoder());
        let extractor = MockExtractor::new().with_answer("Toronto", "Toronto");
        let app = router(state_with(
            extractor,
            geocoder.clone(),
            Duration::from_millis(200),
        ));

        let first = app
            .clone()
            .oneshot(post_json("/resolve", serde_json::json!({"value": "Toronto"})))
            .await
            .unwrap();
        let second = app.oneshot(get("/geocode?place=Toronto")).await.unwrap();

        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(second.status(), StatusCode::OK);

        let started = geocoder.started();
        assert_eq!(started.len(), 2);
        assert!(started[1] - started[0] + Duration::from_millis(20) >= Duration::from_millis(200));
    }
}
