//! REST API for the box sizing service.
//!
//! Provides JSON endpoints for box selection and for browsing the reference
//! data. Uses Axum as the web framework and supports CORS.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::catalog::Catalog;
use crate::config::ApiConfig;
use crate::estimator::{HeightInfeasible, ItemBreakdown, StackingDetail};
use crate::inventory::BoxInventory;
use crate::model::{CandidateBox, ItemDefinition};
use crate::selection::QuantityInput;
use crate::selector::{
    CandidateRejection, RejectionReason, SelectionOutcome, SelectorConfig, select_for_request,
};
use crate::types::{BoxProvider, ItemLookup};

/// Shared, read-only state of all handlers.
#[derive(Clone)]
pub struct ApiState {
    catalog: Arc<Catalog>,
    inventory: Arc<BoxInventory>,
    selector_config: SelectorConfig,
}

impl ApiState {
    pub fn new(catalog: Catalog, inventory: BoxInventory, selector_config: SelectorConfig) -> Self {
        Self {
            catalog: Arc::new(catalog),
            inventory: Arc::new(inventory),
            selector_config,
        }
    }
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

// SRI hashes verified against https://unpkg.com/swagger-ui-dist@5.17.14/ on 2025-10-29.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>box-sizer API Docs</title>
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

/// Request structure for the selection endpoint.
///
/// `quantities` maps item names to counts; counts may be numbers or text.
#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "quantities": {
            "Geladeira": 1,
            "caixa pequena": "10",
            "Cadeira de Jantar": 4
        },
        "slack_factor": 0.15
    })
)]
pub struct SelectRequest {
    #[serde(default)]
    #[schema(value_type = Object)]
    pub quantities: HashMap<String, QuantityInput>,
    #[serde(default)]
    pub slack_factor: Option<f64>,
}

#[derive(Debug)]
enum SelectRequestValidationError {
    InvalidSlackFactor(f64),
}

impl SelectRequest {
    /// Applies the request-level overrides to the service configuration.
    fn selector_config(&self, base: SelectorConfig) -> Result<SelectorConfig, SelectRequestValidationError> {
        let mut config = base;
        if let Some(slack_factor) = self.slack_factor {
            if !SelectorConfig::is_valid_slack_factor(slack_factor) {
                return Err(SelectRequestValidationError::InvalidSlackFactor(slack_factor));
            }
            config.slack_factor = slack_factor;
        }
        Ok(config)
    }
}

/// One line of the per-item accounting.
#[derive(Serialize, ToSchema)]
pub struct BreakdownEntry {
    pub name: String,
    pub quantity: u32,
    pub volume: f64,
    pub height_used: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stacking: Option<StackingDetail>,
    /// Human-readable rendering of the same facts.
    pub summary: String,
}

impl From<ItemBreakdown> for BreakdownEntry {
    fn from(entry: ItemBreakdown) -> Self {
        let summary = entry.to_string();
        let ItemBreakdown {
            name,
            quantity,
            volume,
            height_used,
            stacking,
        } = entry;
        Self {
            name,
            quantity,
            volume,
            height_used,
            stacking,
            summary,
        }
    }
}

/// A candidate box that was not eligible.
#[derive(Serialize, ToSchema)]
pub struct RejectedBox {
    pub box_id: String,
    pub reason_code: String,
    pub reason: String,
    pub detail: RejectionReason,
}

impl From<CandidateRejection> for RejectedBox {
    fn from(rejection: CandidateRejection) -> Self {
        Self {
            box_id: rejection.box_id,
            reason_code: rejection.reason.code().to_string(),
            reason: rejection.reason.to_string(),
            detail: rejection.reason,
        }
    }
}

/// Response structure of the selection endpoint.
///
/// A missing box is a regular answer, not an error.
#[derive(Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SelectResponse {
    Selected {
        #[serde(rename = "box")]
        chosen_box: CandidateBox,
        total_volume: f64,
        raw_volume: f64,
        peak_height_used: f64,
        slack_factor: f64,
        breakdown: Vec<BreakdownEntry>,
    },
    NoFeasibleBox {
        reason: String,
        item_count: usize,
        rejections: Vec<RejectedBox>,
    },
}

impl SelectResponse {
    /// Creates a SelectResponse from a SelectionOutcome.
    pub fn from_outcome(outcome: SelectionOutcome, item_count: usize) -> Self {
        match outcome {
            SelectionOutcome::Selected(selection) => {
                let estimate = selection.estimate;
                SelectResponse::Selected {
                    chosen_box: selection.chosen,
                    total_volume: estimate.total_volume,
                    raw_volume: estimate.raw_volume,
                    peak_height_used: estimate.peak_height_used,
                    slack_factor: estimate.slack_factor,
                    breakdown: estimate
                        .breakdown
                        .into_iter()
                        .map(BreakdownEntry::from)
                        .collect(),
                }
            }
            SelectionOutcome::NoFeasibleBox { reason, rejections } => {
                SelectResponse::NoFeasibleBox {
                    reason: reason.to_string(),
                    item_count,
                    rejections: rejections.into_iter().map(RejectedBox::from).collect(),
                }
            }
        }
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

fn validation_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid input data",
        details,
    )
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_select, list_catalog, list_boxes),
    components(
        schemas(
            SelectRequest,
            SelectResponse,
            BreakdownEntry,
            RejectedBox,
            RejectionReason,
            HeightInfeasible,
            StackingDetail,
            CandidateBox,
            ItemDefinition,
            ErrorResponse
        )
    ),
    tags(
        (name = "selection", description = "Endpoints for box selection"),
        (name = "reference", description = "Catalog and inventory listings")
    )
)]
struct ApiDoc;

/// Builds the router with all endpoints.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/select", post(handle_select))
        .route("/catalog", get(list_catalog))
        .route("/boxes", get(list_boxes))
        // API documentation
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(state)
}

/// Starts the API server.
///
/// Blocks until the server is terminated.
pub async fn start_api_server(config: ApiConfig, state: ApiState) -> std::io::Result<()> {
    let app = router(state);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let display_host = config.display_host().to_string();
    tracing::info!(
        "🚀 Server running on http://{}:{}",
        display_host,
        config.port()
    );
    if config.binds_to_all_interfaces() && config.uses_default_host() {
        tracing::info!("💡 Local access: http://localhost:{}", config.port());
    }
    tracing::info!("📦 API endpoints: POST /select, GET /catalog, GET /boxes");
    tracing::info!("📑 Documentation: GET /docs, GET /docs/openapi.json");

    axum::serve(listener, app).await
}

/// Handler for POST /select endpoint.
///
/// Normalizes the requested quantities and picks the smallest box that
/// holds them.
#[utoipa::path(
    post,
    path = "/select",
    request_body = SelectRequest,
    responses(
        (status = 200, description = "Selected box or the reason why none fits", body = SelectResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request",
            body = ErrorResponse
        )
    ),
    tag = "selection"
)]
async fn handle_select(
    State(state): State<ApiState>,
    payload: Result<Json<SelectRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };

    let config = match request.selector_config(state.selector_config) {
        Ok(config) => config,
        Err(SelectRequestValidationError::InvalidSlackFactor(value)) => {
            return validation_error(format!(
                "slack_factor must be a finite number of at least 0, got: {}",
                value
            ));
        }
    };

    tracing::info!(
        "📥 New selection request: {} identifiers",
        request.quantities.len()
    );
    let (items, outcome) = select_for_request(
        request.quantities.iter(),
        state.catalog.as_ref(),
        state.inventory.as_ref(),
        &config,
    );

    let response = SelectResponse::from_outcome(outcome, items.len());
    (StatusCode::OK, Json(response)).into_response()
}

/// Handler for GET /catalog: all known items in catalog order.
#[utoipa::path(
    get,
    path = "/catalog",
    responses((status = 200, description = "Catalog entries", body = [ItemDefinition])),
    tag = "reference"
)]
async fn list_catalog(State(state): State<ApiState>) -> Json<Vec<ItemDefinition>> {
    Json(state.catalog.definitions().to_vec())
}

/// Handler for GET /boxes: the available candidate boxes.
#[utoipa::path(
    get,
    path = "/boxes",
    responses((status = 200, description = "Available boxes", body = [CandidateBox])),
    tag = "reference"
)]
async fn list_boxes(State(state): State<ApiState>) -> Json<Vec<CandidateBox>> {
    Json(state.inventory.candidates().to_vec())
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
