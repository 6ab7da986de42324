use axum::{
    Router,
    extract::{Path, State, rejection::JsonRejection},
    middleware::from_fn,
    response::{IntoResponse, Json, Response},
    http::StatusCode,
    routing::{get, post},
};
use care_estimate::{
    CostEstimate, EstimatorPolicy, FinanceRecommendation, InMemoryWizardStorage,
    InsuranceExplanation, RawCostRequest, RawFinanceRequest, RawIncome, RawInsuranceRequest,
    Scoring, WizardInput, WizardRunner,
};
use serde_json::{Value, json};
use std::any::Any;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    config::ServiceConfig,
    models::{
        ApiError, ApiResult, WizardResponse, api_error, bad_request_error, internal_error,
        validation_error,
    },
    telemetry::correlation_id_middleware,
};

#[derive(Clone)]
pub struct AppState {
    pub scoring: Scoring,
    pub wizard: WizardRunner,
}

impl AppState {
    pub fn new(policy: EstimatorPolicy) -> Self {
        let scoring = Scoring::new(policy);
        let wizard = WizardRunner::new(scoring.clone(), Arc::new(InMemoryWizardStorage::new()));
        Self { scoring, wizard }
    }

    pub fn with_session_ttl(mut self, session_ttl: chrono::Duration) -> Self {
        self.wizard = self.wizard.with_session_ttl(session_ttl);
        self
    }
}

pub fn create_app(config: &ServiceConfig) -> anyhow::Result<Router> {
    let policy = config.load_policy()?;
    info!(
        strategy = ?policy.cost.strategy,
        income_multiplier = policy.finance.income_multiplier,
        session_ttl_secs = config.session_ttl_secs,
        "Estimator policy ready"
    );
    Ok(build_router(AppState::new(policy).with_session_ttl(config.session_ttl())))
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/predict-cost", post(predict_cost))
        .route("/api/check-insurance", post(check_insurance))
        .route("/api/recommend-finance", post(recommend_finance))
        .route("/api/wizard", post(start_wizard))
        .route("/api/wizard/{session_id}", get(get_wizard).delete(delete_wizard))
        .route("/api/wizard/{session_id}/medical", post(submit_medical))
        .route("/api/wizard/{session_id}/insurance", post(submit_insurance))
        .route("/api/wizard/{session_id}/finance", post(submit_finance))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(correlation_id_middleware))
        .with_state(app_state)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = %detail, "Request handler panicked");
    internal_error().into_response()
}

fn body_error(rejection: JsonRejection) -> ApiError {
    warn!(error = %rejection, "Malformed request body");
    bad_request_error("Invalid request body", None)
}

fn session_id(raw: &str) -> Result<String, ApiError> {
    Uuid::parse_str(raw)
        .map(|id| id.to_string())
        .map_err(|_| bad_request_error("Invalid session ID format", Some("session_id")))
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Care Cost Estimate Service",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Treatment cost estimate, insurance coverage explanation and financial plan",
        "endpoints": {
            "POST /api/predict-cost": "Estimate a min/avg/max treatment cost band",
            "POST /api/check-insurance": "Explain what an insurance policy covers",
            "POST /api/recommend-finance": "Classify the coverage gap and suggest an action plan",
            "POST /api/wizard": "Start a guided session",
            "GET /api/wizard/{session_id}": "Get a guided session",
            "DELETE /api/wizard/{session_id}": "Discard a guided session",
            "POST /api/wizard/{session_id}/medical": "Step 1: medical details",
            "POST /api/wizard/{session_id}/insurance": "Step 2: insurance details",
            "POST /api/wizard/{session_id}/finance": "Step 3: monthly income",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn predict_cost(
    State(state): State<AppState>,
    payload: Result<Json<RawCostRequest>, JsonRejection>,
) -> ApiResult<CostEstimate> {
    let Json(raw) = payload.map_err(body_error)?;
    let request = raw.validate().map_err(validation_error)?;

    info!(
        condition = %request.condition,
        city = %request.city,
        age = request.age,
        "Predicting treatment cost"
    );

    Ok(Json(state.scoring.estimate(&request)))
}

async fn check_insurance(
    State(state): State<AppState>,
    payload: Result<Json<RawInsuranceRequest>, JsonRejection>,
) -> ApiResult<InsuranceExplanation> {
    let Json(raw) = payload.map_err(body_error)?;
    let request = raw.validate().map_err(validation_error)?;

    info!(
        coverage_amount = request.coverage_amount,
        copay_percent = request.copay_percent,
        "Explaining insurance coverage"
    );

    Ok(Json(state.scoring.explain(&request)))
}

async fn recommend_finance(
    State(state): State<AppState>,
    payload: Result<Json<RawFinanceRequest>, JsonRejection>,
) -> ApiResult<FinanceRecommendation> {
    let Json(raw) = payload.map_err(body_error)?;
    let request = raw.validate().map_err(validation_error)?;

    let recommendation = state.scoring.recommend(&request);
    info!(
        coverage_gap = recommendation.coverage_gap,
        tier = ?recommendation.tier,
        "Finance recommendation ready"
    );

    Ok(Json(recommendation))
}

async fn start_wizard(State(state): State<AppState>) -> ApiResult<WizardResponse> {
    let session = state.wizard.start().await.map_err(api_error)?;
    Ok(Json(session.into()))
}

async fn get_wizard(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<WizardResponse> {
    let id = session_id(&raw_id)?;
    let session = state.wizard.get(&id).await.map_err(api_error)?;
    Ok(Json(session.into()))
}

async fn delete_wizard(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = session_id(&raw_id)?;
    state.wizard.delete(&id).await.map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn run_step(
    state: &AppState,
    raw_id: &str,
    input: WizardInput,
) -> ApiResult<WizardResponse> {
    let id = session_id(raw_id)?;
    let session = state.wizard.run(&id, input).await.map_err(api_error)?;
    Ok(Json(session.into()))
}

async fn submit_medical(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<RawCostRequest>, JsonRejection>,
) -> ApiResult<WizardResponse> {
    let Json(raw) = payload.map_err(body_error)?;
    let request = raw.validate().map_err(validation_error)?;
    run_step(&state, &raw_id, WizardInput::Medical(request)).await
}

async fn submit_insurance(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<RawInsuranceRequest>, JsonRejection>,
) -> ApiResult<WizardResponse> {
    let Json(raw) = payload.map_err(body_error)?;
    let request = raw.validate().map_err(validation_error)?;
    run_step(&state, &raw_id, WizardInput::Insurance(request)).await
}

async fn submit_finance(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<RawIncome>, JsonRejection>,
) -> ApiResult<WizardResponse> {
    let Json(raw) = payload.map_err(body_error)?;
    let monthly_income = raw.validate().map_err(validation_error)?;
    run_step(&state, &raw_id, WizardInput::Finance { monthly_income }).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn app() -> Router {
        build_router(AppState::new(EstimatorPolicy::default()))
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_predict_cost() {
        let body = json!({
            "condition": "knee_replacement",
            "city": "Jaipur",
            "age": "45",
            "hospital_type": "Private",
            "room_type": "Semi-Private"
        });
        let (status, first) = send(&app(), "POST", "/api/predict-cost", Some(body.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["avg_cost"], 385_000);
        assert_eq!(first["min_cost"], 327_250);
        assert_eq!(first["max_cost"], 481_250);
        assert!(first.get("risk_score").is_none());

        let (_, second) = send(&app(), "POST", "/api/predict-cost", Some(body)).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_predict_cost_names_first_invalid_field() {
        let body = json!({
            "condition": "typhoid",
            "city": "Pune",
            "hospital_type": "Private",
            "room_type": "Semi-Private",
            "age": 150
        });
        let (status, error) = send(&app(), "POST", "/api/predict-cost", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["field"], "age");
        assert_eq!(error["message"], "age must be between 0 and 120");
    }

    #[tokio::test]
    async fn test_wrong_json_type_names_the_field() {
        let app = app();

        let body = json!({
            "condition": "typhoid",
            "city": "Pune",
            "hospital_type": "Private",
            "room_type": "Semi-Private",
            "age": true
        });
        let (status, error) = send(&app, "POST", "/api/predict-cost", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["field"], "age");
        assert_eq!(error["message"], "age must be a number");

        let body = json!({ "coverage_amount": [500000], "copay_percent": 10 });
        let (status, error) = send(&app, "POST", "/api/check-insurance", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["field"], "coverage_amount");
        assert_eq!(error["message"], "coverage_amount must be a number");
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/check-insurance")
            .header("content-type", "application/json")
            .body(Body::from("{ not json"))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().contains_key("x-correlation-id"));
    }

    #[tokio::test]
    async fn test_check_insurance() {
        let body = json!({ "coverage_amount": 500000, "copay_percent": "10" });
        let (status, value) = send(&app(), "POST", "/api/check-insurance", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        let explanation = value["explanation"].as_str().unwrap();
        assert!(explanation.contains("10%"));
        assert!(explanation.contains("500000"));
        assert_eq!(value["out_of_pocket_estimate"], 0);
    }

    #[tokio::test]
    async fn test_recommend_finance_tiers() {
        let app = app();

        let body = json!({
            "predicted_avg_cost": 850000,
            "insurance_coverage": 500000,
            "monthly_income": 40000
        });
        let (status, value) = send(&app, "POST", "/api/recommend-finance", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["tier"], "high_risk");
        assert_eq!(value["coverage_gap"], 350_000.0);
        assert_eq!(value["action_plan"].as_array().unwrap().len(), 4);

        let body = json!({
            "predicted_avg_cost": "100000",
            "insurance_coverage": "100000",
            "monthly_income": "1"
        });
        let (_, value) = send(&app, "POST", "/api/recommend-finance", Some(body)).await;
        assert_eq!(value["tier"], "fully_covered");
        assert_eq!(value["action_plan"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_wizard_flow() {
        let app = app();

        let (status, started) = send(&app, "POST", "/api/wizard", None).await;
        assert_eq!(status, StatusCode::OK);
        let id = started["session_id"].as_str().unwrap().to_string();
        assert_eq!(started["session"]["step"], "medical");

        // finance before the earlier steps is rejected
        let (status, error) = send(
            &app,
            "POST",
            &format!("/api/wizard/{id}/finance"),
            Some(json!({ "monthly_income": 40000 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(error["message"].as_str().unwrap().contains("medical"));

        let (status, value) = send(
            &app,
            "POST",
            &format!("/api/wizard/{id}/medical"),
            Some(json!({
                "condition": "cardiac_surgery",
                "city": "Chennai",
                "hospital_type": "Corporate",
                "room_type": "Private Suite",
                "age": 62
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["session"]["step"], "insurance");

        send(
            &app,
            "POST",
            &format!("/api/wizard/{id}/insurance"),
            Some(json!({ "coverage_amount": "500000", "copay_percent": "10" })),
        )
        .await;

        let (status, value) = send(
            &app,
            "POST",
            &format!("/api/wizard/{id}/finance"),
            Some(json!({ "monthly_income": "40000" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["complete"], true);
        assert_eq!(value["session"]["recommendation"]["tier"], "high_risk");

        let (status, stored) = send(&app, "GET", &format!("/api/wizard/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stored["session"]["step"], "results");
    }

    #[tokio::test]
    async fn test_wizard_session_lookup_errors() {
        let app = app();

        let (status, _) = send(&app, "GET", "/api/wizard/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let missing = Uuid::new_v4();
        let (status, error) = send(&app, "GET", &format!("/api/wizard/{missing}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error["message"], "Session not found");
    }

    #[tokio::test]
    async fn test_delete_wizard_session() {
        let app = app();

        let (_, started) = send(&app, "POST", "/api/wizard", None).await;
        let id = started["session_id"].as_str().unwrap().to_string();
        let uri = format!("/api/wizard/{id}");

        let (status, body) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (status, _) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_panic_becomes_opaque_internal_error() {
        async fn boom() -> &'static str {
            panic!("secret detail")
        }

        let app = Router::new()
            .route("/boom", get(boom))
            .layer(CatchPanicLayer::custom(handle_panic));

        let (status, error) = send(&app, "GET", "/boom", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error["message"], "Internal Server Error");
        assert!(!error.to_string().contains("secret"));
    }

    #[tokio::test]
    async fn test_health_check() {
        let (status, value) = send(&app(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["status"], "healthy");
    }
}
