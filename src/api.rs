//! REST API for the rack planner.
//!
//! Provides HTTP endpoints for searching and evaluating rack configurations.
//! Uses Axum as the web framework and supports CORS.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use std::sync::OnceLock;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::config::{ApiConfig, OptimizerConfig};
use crate::error::SearchError;
use crate::geometry::{
    AisleKind, AisleZone, PlacementLimitExceeded, RackPlacement, SchematicPlan, plan_schematic,
};
use crate::layout::{InfeasibleReason, RackLayout};
use crate::model::{
    LayoutConstraints, RackDimensionRange, RackDimensions, RackRanges, ValidationError,
    WarehouseEnvelope,
};
use crate::optimizer::{
    CandidateConfiguration, CandidateOutcome, ComplianceReport, ComplianceThresholds, Objective,
    ScoringPolicy, SearchConfig, SearchInput, SearchResult, TieBreak, evaluate_rack, search,
    search_with_progress,
};
use crate::types::Rect;

#[derive(Clone)]
struct ApiState {
    optimizer_config: OptimizerConfig,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

const EMPTY_RESULT_MESSAGE: &str = "No configuration possible, widen the rack dimension ranges";

// SRI hashes verified against https://unpkg.com/swagger-ui-dist@5.17.14/ on 2025-10-29.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>rack-planner API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-standalone-preset.js"
            integrity="sha384-2YH8WDRaj7V2OqU/trsmzSagmk/E2SutiCsGkdgoQwC9pNUJV1u/141DHB6jgs8t"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                const ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                    presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
                    layout: "StandaloneLayout",
                });
                window.ui = ui;
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Request structure for the search endpoints.
///
/// The optional fields override the server-side search configuration for
/// this request only.
#[derive(Deserialize, Clone, ToSchema)]
#[schema(
    example = json!({
        "envelope": { "length": 50.0, "width": 30.0, "height": 12.0 },
        "ranges": {
            "length": { "min": 1.0, "max": 3.0, "step": 0.5 },
            "width": { "min": 0.8, "max": 1.2, "step": 0.2 },
            "height": { "min": 2.0, "max": 6.0, "step": 1.0 }
        },
        "constraints": {
            "aisle_between_racks": 1.0,
            "main_aisle_width": 4.0,
            "safety_margin": 0.5
        },
        "objective": "balanced"
    })
)]
pub struct SearchRequest {
    pub envelope: WarehouseEnvelope,
    pub ranges: RackRanges,
    pub constraints: LayoutConstraints,
    #[serde(default)]
    #[schema(nullable = true)]
    pub objective: Option<Objective>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub fill_rate: Option<f64>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub tie_break: Option<TieBreak>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub max_candidates: Option<usize>,
}

#[derive(Debug)]
struct ValidatedSearchRequest {
    input: SearchInput,
    config: SearchConfig,
}

impl ValidatedSearchRequest {
    fn combination_count(&self) -> usize {
        self.input.ranges.combination_count()
    }

    fn into_parts(self) -> (SearchInput, SearchConfig) {
        (self.input, self.config)
    }
}

#[derive(Debug)]
enum RequestValidationError {
    InvalidEnvelope(ValidationError),
    InvalidConstraints(ValidationError),
    InvalidRack(ValidationError),
    InvalidRange(SearchError),
    InvalidConfiguration(ValidationError),
}

/// Applies request-level overrides on top of the server configuration.
///
/// A requested candidate cap can only lower the server cap, never raise it.
fn apply_overrides(
    mut config: SearchConfig,
    objective: Option<Objective>,
    fill_rate: Option<f64>,
    tie_break: Option<TieBreak>,
    max_candidates: Option<usize>,
) -> Result<SearchConfig, RequestValidationError> {
    if let Some(objective) = objective {
        config.objective = objective;
    }
    if let Some(fill_rate) = fill_rate {
        config.fill_rate = fill_rate;
    }
    if let Some(tie_break) = tie_break {
        config.tie_break = tie_break;
    }
    if let Some(requested) = max_candidates {
        config.max_candidates = Some(match config.max_candidates {
            Some(server_cap) => requested.min(server_cap),
            None => requested,
        });
    }
    config
        .validate()
        .map_err(RequestValidationError::InvalidConfiguration)?;
    Ok(config)
}

impl SearchRequest {
    fn into_validated(
        self,
        base: SearchConfig,
    ) -> Result<ValidatedSearchRequest, RequestValidationError> {
        let envelope = self
            .envelope
            .validated()
            .map_err(RequestValidationError::InvalidEnvelope)?;
        let constraints = self
            .constraints
            .validated()
            .map_err(RequestValidationError::InvalidConstraints)?;
        self.ranges
            .validate()
            .map_err(RequestValidationError::InvalidRange)?;

        let config = apply_overrides(
            base,
            self.objective,
            self.fill_rate,
            self.tie_break,
            self.max_candidates,
        )?;

        Ok(ValidatedSearchRequest {
            input: SearchInput {
                envelope,
                ranges: self.ranges,
                constraints,
            },
            config,
        })
    }
}

/// Request structure for evaluating a single rack size.
#[derive(Deserialize, Clone, ToSchema)]
#[schema(
    example = json!({
        "envelope": { "length": 50.0, "width": 30.0, "height": 12.0 },
        "constraints": {
            "aisle_between_racks": 1.0,
            "main_aisle_width": 4.0,
            "safety_margin": 0.5
        },
        "rack": { "length": 2.0, "width": 1.0, "height": 6.0 }
    })
)]
pub struct EvaluateRequest {
    pub envelope: WarehouseEnvelope,
    pub constraints: LayoutConstraints,
    pub rack: RackDimensions,
    #[serde(default)]
    #[schema(nullable = true)]
    pub fill_rate: Option<f64>,
}

#[derive(Debug)]
struct ValidatedEvaluateRequest {
    envelope: WarehouseEnvelope,
    constraints: LayoutConstraints,
    rack: RackDimensions,
    config: SearchConfig,
}

impl EvaluateRequest {
    fn into_validated(
        self,
        base: SearchConfig,
    ) -> Result<ValidatedEvaluateRequest, RequestValidationError> {
        let envelope = self
            .envelope
            .validated()
            .map_err(RequestValidationError::InvalidEnvelope)?;
        let constraints = self
            .constraints
            .validated()
            .map_err(RequestValidationError::InvalidConstraints)?;
        let rack = self
            .rack
            .validated()
            .map_err(RequestValidationError::InvalidRack)?;
        let config = apply_overrides(base, None, self.fill_rate, None, None)?;

        Ok(ValidatedEvaluateRequest {
            envelope,
            constraints,
            rack,
            config,
        })
    }
}

/// Response of the search endpoint.
///
/// # Fields
/// * `best` - Head of the ranked list
/// * `candidates` - All feasible configurations, best first
/// * `truncated` - `true` if the candidate cap stopped the search early
#[derive(Serialize, ToSchema)]
pub struct SearchResponse {
    pub objective: Objective,
    pub best: CandidateConfiguration,
    pub candidates: Vec<CandidateConfiguration>,
    pub evaluated: usize,
    pub total_combinations: usize,
    pub feasible: usize,
    pub infeasible: usize,
    pub truncated: bool,
    pub summary: String,
}

impl SearchResponse {
    /// Creates a SearchResponse from a SearchResult.
    pub fn from_search_result(result: SearchResult) -> Self {
        let summary = result.summary();
        let objective = result.objective();
        let evaluated = result.evaluated();
        let total_combinations = result.total_combinations();
        let feasible = result.feasible_count();
        let infeasible = result.infeasible_count();
        let truncated = result.is_truncated();
        let best = *result.best();

        Self {
            objective,
            best,
            candidates: result.into_candidates(),
            evaluated,
            total_combinations,
            feasible,
            infeasible,
            truncated,
            summary,
        }
    }
}

/// Response of the evaluate endpoint: the scored layout and its schematic.
#[derive(Serialize, ToSchema)]
pub struct EvaluateResponse {
    pub candidate: CandidateConfiguration,
    pub schematic: SchematicPlan,
}

#[derive(Debug)]
enum EvaluateError {
    Infeasible(InfeasibleReason),
    TooManyPlacements(PlacementLimitExceeded),
}

fn evaluate_request(
    request: &ValidatedEvaluateRequest,
    max_placements: usize,
) -> Result<EvaluateResponse, EvaluateError> {
    match evaluate_rack(
        0,
        &request.rack,
        &request.envelope,
        &request.constraints,
        &request.config,
    ) {
        CandidateOutcome::Feasible(candidate) => {
            let schematic = plan_schematic(
                &candidate.layout,
                &request.envelope,
                &request.constraints,
                max_placements,
            )
            .map_err(EvaluateError::TooManyPlacements)?;
            Ok(EvaluateResponse {
                candidate,
                schematic,
            })
        }
        CandidateOutcome::Infeasible(reason) => Err(EvaluateError::Infeasible(reason)),
    }
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn validation_error(error: &str, details: impl Into<String>) -> Response {
    error_response(StatusCode::UNPROCESSABLE_ENTITY, error, details)
}

fn request_validation_error(err: RequestValidationError) -> Response {
    match err {
        RequestValidationError::InvalidEnvelope(err) => {
            validation_error("Invalid warehouse dimensions", err.to_string())
        }
        RequestValidationError::InvalidConstraints(err) => {
            validation_error("Invalid layout constraints", err.to_string())
        }
        RequestValidationError::InvalidRack(err) => {
            validation_error("Invalid rack dimensions", err.to_string())
        }
        RequestValidationError::InvalidRange(err) => {
            validation_error("Invalid rack dimension range", err.to_string())
        }
        RequestValidationError::InvalidConfiguration(err) => {
            validation_error("Invalid search configuration", err.to_string())
        }
    }
}

fn search_error(err: SearchError) -> Response {
    match err {
        SearchError::EmptyResult { .. } => validation_error(EMPTY_RESULT_MESSAGE, err.to_string()),
        SearchError::InvalidRange { .. } => {
            validation_error("Invalid rack dimension range", err.to_string())
        }
        SearchError::InvalidDimensions(_) => validation_error("Invalid input data", err.to_string()),
        SearchError::InvalidConfiguration(_) => {
            validation_error("Invalid search configuration", err.to_string())
        }
    }
}

fn parse_search_request(
    payload: Result<Json<SearchRequest>, JsonRejection>,
    base: SearchConfig,
) -> Result<ValidatedSearchRequest, Response> {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(err) => return Err(json_deserialize_error(err)),
    };

    payload
        .into_validated(base)
        .map_err(request_validation_error)
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_search, handle_search_stream, handle_evaluate),
    components(
        schemas(
            SearchRequest,
            SearchResponse,
            EvaluateRequest,
            EvaluateResponse,
            ErrorResponse,
            WarehouseEnvelope,
            RackRanges,
            RackDimensionRange,
            LayoutConstraints,
            RackDimensions,
            RackLayout,
            CandidateConfiguration,
            Objective,
            TieBreak,
            ScoringPolicy,
            ComplianceThresholds,
            ComplianceReport,
            SchematicPlan,
            RackPlacement,
            AisleZone,
            AisleKind,
            Rect
        )
    ),
    tags((name = "racks", description = "Endpoints for rack configuration search"))
)]
struct ApiDoc;

fn router(optimizer_config: OptimizerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let state = ApiState { optimizer_config };

    Router::new()
        // API endpoints
        .route("/search", post(handle_search))
        .route("/search_stream", post(handle_search_stream))
        .route("/evaluate", post(handle_evaluate))
        // API documentation
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(state)
}

/// Starts the API server on the configured address.
///
/// Configures CORS for cross-origin requests.
/// Blocks until the server is terminated.
pub async fn start_api_server(config: ApiConfig, optimizer_config: OptimizerConfig) {
    let app = router(optimizer_config);

    let addr = config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("❌ Could not bind API server to {}: {}", addr, err);
            return;
        }
    };

    let display_host = config.display_host().to_string();
    tracing::info!(
        "🚀 Server running on http://{}:{}",
        display_host,
        config.port()
    );
    if config.binds_to_all_interfaces() && config.uses_default_host() {
        tracing::info!("💡 Local access: http://localhost:{}", config.port());
    }
    tracing::info!("📦 API endpoints: POST /search, POST /search_stream, POST /evaluate");
    tracing::info!("📑 Documentation: GET /docs, GET /docs/openapi.json");

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("❌ API server terminated with an error: {err}");
    }
}

/// Handler for POST /search endpoint.
///
/// Enumerates the rack dimension grid and ranks every feasible configuration.
///
/// # Parameters
/// * `payload` - JSON payload with warehouse, ranges, constraints and overrides
///
/// # Returns
/// JSON response with the ranked candidates, or 422 if nothing fits
#[utoipa::path(
    post,
    path = "/search",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Ranked rack configurations", body = SearchResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request, invalid range or no feasible configuration",
            body = ErrorResponse
        )
    ),
    tag = "racks"
)]
async fn handle_search(
    State(state): State<ApiState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match parse_search_request(payload, state.optimizer_config.search_config()) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let combinations = request.combination_count();
    let (input, config) = request.into_parts();
    tracing::info!(
        "📥 New search request: {} combinations, objective {}",
        combinations,
        config.objective
    );

    let outcome = match tokio::task::spawn_blocking(move || search(&input, &config)).await {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::error!("❌ Search task failed: {err}");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Search task failed",
                err.to_string(),
            );
        }
    };

    match outcome {
        Ok(result) => {
            tracing::info!("📦 Result: {}", result.summary());
            (
                StatusCode::OK,
                Json(SearchResponse::from_search_result(result)),
            )
                .into_response()
        }
        Err(err) => {
            tracing::info!("📦 Result: {}", err);
            search_error(err)
        }
    }
}

/// Handler for POST /search_stream endpoint (SSE).
///
/// Streams search events in real-time as Server-Sent Events (text/event-stream).
/// Invalid requests are rejected before the stream opens.
#[utoipa::path(
    post,
    path = "/search_stream",
    request_body = SearchRequest,
    responses(
        (
            status = 200,
            description = "Streams search events in real-time",
            content_type = "text/event-stream",
            body = String
        ),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request or invalid range",
            body = ErrorResponse
        )
    ),
    tag = "racks"
)]
async fn handle_search_stream(
    State(state): State<ApiState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match parse_search_request(payload, state.optimizer_config.search_config()) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let (input, config) = request.into_parts();
    let (tx, rx) = mpsc::channel::<String>(32);

    tokio::task::spawn_blocking(move || {
        let outcome = search_with_progress(&input, &config, |evt| {
            if let Ok(json) = serde_json::to_string(evt) {
                // A closed receiver only means the client went away.
                let _ = tx.blocking_send(json);
            }
        });
        if let Err(err) = outcome {
            let message = match err {
                SearchError::EmptyResult { .. } => EMPTY_RESULT_MESSAGE,
                _ => "Search failed",
            };
            let failure = json!({
                "type": "Failed",
                "code": err.code(),
                "message": message,
                "details": err.to_string(),
            });
            let _ = tx.blocking_send(failure.to_string());
        }
    });

    let stream = ReceiverStream::new(rx)
        .map(|msg| Ok::<_, std::convert::Infallible>(Event::default().data(msg)));
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

/// Handler for POST /evaluate endpoint.
///
/// Computes the layout of a single rack size together with its schematic.
#[utoipa::path(
    post,
    path = "/evaluate",
    request_body = EvaluateRequest,
    responses(
        (status = 200, description = "Layout and schematic of the rack size", body = EvaluateResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request, rack does not fit or schematic too large",
            body = ErrorResponse
        )
    ),
    tag = "racks"
)]
async fn handle_evaluate(
    State(state): State<ApiState>,
    payload: Result<Json<EvaluateRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };
    let request = match payload.into_validated(state.optimizer_config.search_config()) {
        Ok(request) => request,
        Err(err) => return request_validation_error(err),
    };

    let rack = request.rack;
    let max_placements = state.optimizer_config.max_placements();
    let outcome =
        match tokio::task::spawn_blocking(move || evaluate_request(&request, max_placements)).await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!("❌ Evaluation task failed: {err}");
                return error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Evaluation task failed",
                    err.to_string(),
                );
            }
        };

    match outcome {
        Ok(response) => {
            tracing::info!(
                "📐 Evaluated rack {}x{}x{}: {} racks",
                rack.length,
                rack.width,
                rack.height,
                response.candidate.total_racks()
            );
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(EvaluateError::Infeasible(reason)) => {
            validation_error("Rack does not fit the warehouse", reason.to_string())
        }
        Err(EvaluateError::TooManyPlacements(err)) => {
            validation_error("Schematic too large", err.to_string())
        }
    }
}

async fn serve_openapi_json(State(_state): State<ApiState>) -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui(State(_state): State<ApiState>) -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::DEFAULT_MAX_PLACEMENTS;
    use crate::logging;

    const SEARCH_JSON: &str = r#"{
        "envelope": {"length": 50.0, "width": 30.0, "height": 12.0},
        "ranges": {
            "length": {"min": 2.0, "max": 2.0, "step": 1.0},
            "width": {"min": 1.0, "max": 1.0, "step": 1.0},
            "height": {"min": 6.0, "max": 6.0, "step": 1.0}
        },
        "constraints": {"aisle_between_racks": 1.0, "main_aisle_width": 4.0, "safety_margin": 0.5}
    }"#;

    fn search_request() -> SearchRequest {
        serde_json::from_str(SEARCH_JSON).expect("Should parse valid JSON")
    }

    fn evaluate_request_with_rack(rack: RackDimensions) -> EvaluateRequest {
        EvaluateRequest {
            envelope: WarehouseEnvelope::new(50.0, 30.0, 12.0).unwrap(),
            constraints: LayoutConstraints::new(1.0, 4.0, 0.5).unwrap(),
            rack,
            fill_rate: None,
        }
    }

    #[test]
    fn openapi_doc_lists_expected_paths() {
        let doc = openapi_doc();
        let paths = &doc.paths.paths;
        for path in ["/search", "/search_stream", "/evaluate"] {
            assert!(
                paths.contains_key(path),
                "OpenAPI documentation is missing the {} path",
                path
            );
        }
    }

    #[test]
    fn openapi_doc_contains_key_schemas() {
        let doc = openapi_doc();
        let components = doc
            .components
            .as_ref()
            .expect("OpenAPI documentation contains no components");
        let schemas = &components.schemas;
        for name in [
            "SearchRequest",
            "SearchResponse",
            "EvaluateResponse",
            "ErrorResponse",
            "CandidateConfiguration",
        ] {
            assert!(
                schemas.contains_key(name),
                "Expected schema '{}' is missing from the OpenAPI document",
                name
            );
        }
    }

    #[test]
    fn search_request_overrides_are_absent_by_default() {
        let request = search_request();
        assert_eq!(request.objective, None);
        assert_eq!(request.fill_rate, None);
        assert_eq!(request.tie_break, None);
        assert_eq!(request.max_candidates, None);
    }

    #[test]
    fn search_request_parses_overrides() {
        let mut value: serde_json::Value = serde_json::from_str(SEARCH_JSON).unwrap();
        value["objective"] = json!("max_volume");
        value["fill_rate"] = json!(0.85);
        value["tie_break"] = json!("grid_order");
        value["max_candidates"] = json!(50);
        let request: SearchRequest = serde_json::from_value(value).expect("Should parse overrides");

        let validated = request
            .into_validated(SearchConfig::default())
            .expect("Should validate successfully");
        assert_eq!(validated.config.objective, Objective::MaxVolume);
        assert_eq!(validated.config.fill_rate, 0.85);
        assert_eq!(validated.config.tie_break, TieBreak::GridOrder);
        assert_eq!(validated.config.max_candidates, Some(50));
    }

    #[test]
    fn search_request_null_overrides_preserve_config() {
        let mut value: serde_json::Value = serde_json::from_str(SEARCH_JSON).unwrap();
        value["objective"] = serde_json::Value::Null;
        value["fill_rate"] = serde_json::Value::Null;
        let request: SearchRequest = serde_json::from_value(value).expect("Should parse nulls");

        let base = SearchConfig::builder()
            .objective(Objective::MaxRacks)
            .fill_rate(0.9)
            .build();
        let validated = request.into_validated(base).unwrap();
        assert_eq!(validated.config, base);
    }

    #[test]
    fn candidate_cap_override_cannot_exceed_server_cap() {
        let base = SearchConfig::builder().max_candidates(Some(1000)).build();

        let mut request = search_request();
        request.max_candidates = Some(usize::MAX);
        let validated = request.into_validated(base).unwrap();
        assert_eq!(validated.config.max_candidates, Some(1000));

        let mut request = search_request();
        request.max_candidates = Some(10);
        let validated = request.into_validated(base).unwrap();
        assert_eq!(validated.config.max_candidates, Some(10));
    }

    #[test]
    fn candidate_cap_override_applies_without_server_cap() {
        let base = SearchConfig::builder().max_candidates(None).build();
        let mut request = search_request();
        request.max_candidates = Some(25);
        let validated = request.into_validated(base).unwrap();
        assert_eq!(validated.config.max_candidates, Some(25));
    }

    #[test]
    fn huge_cap_override_from_json_is_clamped() {
        let mut value: serde_json::Value = serde_json::from_str(SEARCH_JSON).unwrap();
        value["max_candidates"] = json!(u64::MAX);
        let request: SearchRequest = serde_json::from_value(value).expect("Should parse u64::MAX");
        let validated = request.into_validated(SearchConfig::default()).unwrap();
        assert_eq!(
            validated.config.max_candidates,
            Some(SearchConfig::DEFAULT_MAX_CANDIDATES)
        );
    }

    #[test]
    fn invalid_fill_rate_override_is_rejected() {
        let mut request = search_request();
        request.fill_rate = Some(0.0);
        assert!(matches!(
            request.into_validated(SearchConfig::default()),
            Err(RequestValidationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn invalid_range_names_axis() {
        let mut request = search_request();
        request.ranges.height.step = 0.0;
        match request.into_validated(SearchConfig::default()) {
            Err(RequestValidationError::InvalidRange(err)) => {
                assert!(err.to_string().contains("height"), "{}", err);
            }
            other => panic!("expected an invalid range, got {:?}", other),
        }
    }

    #[test]
    fn invalid_envelope_is_rejected_before_ranges() {
        let mut request = search_request();
        request.envelope.width = -1.0;
        request.ranges.length.step = 0.0;
        assert!(matches!(
            request.into_validated(SearchConfig::default()),
            Err(RequestValidationError::InvalidEnvelope(_))
        ));
    }

    #[test]
    fn search_response_reports_result() {
        logging::init_test();
        let validated = search_request()
            .into_validated(SearchConfig::default())
            .unwrap();
        let (input, config) = validated.into_parts();
        let result = search(&input, &config).expect("Reference configuration must fit");

        let response = SearchResponse::from_search_result(result);
        assert_eq!(response.best.total_racks(), 308);
        assert_eq!(response.candidates.len(), 1);
        assert_eq!(response.evaluated, 1);
        assert_eq!(response.total_combinations, 1);
        assert!(!response.truncated);

        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body["best"]["total_racks"], json!(308));
        assert_eq!(body["best"]["rack"]["length"], json!(2.0));
    }

    #[test]
    fn evaluate_returns_candidate_and_schematic() {
        let request = evaluate_request_with_rack(RackDimensions::new(2.0, 1.0, 6.0).unwrap())
            .into_validated(SearchConfig::default())
            .unwrap();
        let response = evaluate_request(&request, DEFAULT_MAX_PLACEMENTS).expect("Rack must fit");
        assert_eq!(response.candidate.total_racks(), 308);
        assert_eq!(response.schematic.racks.len(), 308);
        assert!(response.candidate.compliance.main_aisle_forklift_ok);
        assert!(response.candidate.compliance.height_standard);
    }

    #[test]
    fn evaluate_reports_infeasible_rack() {
        let request = evaluate_request_with_rack(RackDimensions::new(2.0, 1.0, 20.0).unwrap())
            .into_validated(SearchConfig::default())
            .unwrap();
        assert!(matches!(
            evaluate_request(&request, DEFAULT_MAX_PLACEMENTS),
            Err(EvaluateError::Infeasible(InfeasibleReason::RackTallerThanWarehouse))
        ));
    }

    #[test]
    fn evaluate_rejects_schematic_above_placement_limit() {
        let request = EvaluateRequest {
            envelope: WarehouseEnvelope::new(200.0, 200.0, 10.0).unwrap(),
            constraints: LayoutConstraints::new(0.0, 0.0, 0.0).unwrap(),
            rack: RackDimensions::new(0.01, 0.01, 10.0).unwrap(),
            fill_rate: None,
        }
        .into_validated(SearchConfig::default())
        .unwrap();
        match evaluate_request(&request, DEFAULT_MAX_PLACEMENTS) {
            Err(EvaluateError::TooManyPlacements(err)) => {
                assert_eq!(err.limit, DEFAULT_MAX_PLACEMENTS);
            }
            other => panic!("expected a placement limit error, got {:?}", other.map(|r| r.schematic.racks.len())),
        }
    }

    #[test]
    fn evaluate_reports_tiny_rack_as_infeasible() {
        let request = EvaluateRequest {
            envelope: WarehouseEnvelope::new(50.0, 30.0, 12.0).unwrap(),
            constraints: LayoutConstraints::new(0.0, 0.0, 0.0).unwrap(),
            rack: RackDimensions::new(1e-10, 1e-10, 1.0).unwrap(),
            fill_rate: None,
        }
        .into_validated(SearchConfig::default())
        .unwrap();
        assert!(matches!(
            evaluate_request(&request, DEFAULT_MAX_PLACEMENTS),
            Err(EvaluateError::Infeasible(InfeasibleReason::TooManyRacks))
        ));
    }

    #[test]
    fn evaluate_rejects_invalid_rack() {
        let request = evaluate_request_with_rack(RackDimensions {
            length: 0.0,
            width: 1.0,
            height: 2.0,
        });
        assert!(matches!(
            request.into_validated(SearchConfig::default()),
            Err(RequestValidationError::InvalidRack(_))
        ));
    }
}
