//! HTTP routes mirroring the orchestrator's two operations.
//!
//! Every handled refund outcome, including `status:"error"` preconditions,
//! is returned as JSON with HTTP 200; only transport-level problems (bad
//! multipart, missing fields) map to 4xx, and 500 is reserved for unexpected
//! internal failure.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use reclaim_runtime::RefundOrchestrator;

/// Shared handler state.
pub type AppState = Arc<RefundOrchestrator>;

/// Build the application router.
pub fn router(orchestrator: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/refunds", post(initiate_refund))
        .route("/refunds/{order_id}/response", post(handle_response))
        .with_state(orchestrator)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Fields accepted by `POST /refunds`.
#[derive(Debug, Default)]
struct InitiateFields {
    platform: Option<String>,
    order_id: Option<String>,
    issue_description: Option<String>,
    receipt: Option<Vec<u8>>,
}

async fn initiate_refund(
    State(orchestrator): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<reclaim_runtime::RefundOutcome>, ApiError> {
    let mut fields = InitiateFields::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("unreadable multipart body: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "platform" => fields.platform = Some(read_text(field, &name).await?),
            "order_id" => fields.order_id = Some(read_text(field, &name).await?),
            "issue_description" => {
                fields.issue_description = Some(read_text(field, &name).await?)
            }
            "receipt" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("unreadable receipt: {e}")))?;
                fields.receipt = Some(bytes.to_vec());
            }
            other => {
                tracing::debug!(field = other, "ignoring unknown multipart field");
            }
        }
    }

    let platform = fields
        .platform
        .ok_or_else(|| ApiError::missing_field("platform"))?;
    let order_id = fields
        .order_id
        .ok_or_else(|| ApiError::missing_field("order_id"))?;
    let issue_description = fields
        .issue_description
        .ok_or_else(|| ApiError::missing_field("issue_description"))?;

    let outcome = orchestrator
        .initiate_refund(
            &platform,
            &order_id,
            &issue_description,
            fields.receipt.as_deref(),
        )
        .await;

    Ok(Json(outcome))
}

/// Fields accepted by `POST /refunds/{order_id}/response`.
#[derive(Debug, Deserialize)]
struct HandleResponseForm {
    platform: String,
    response: String,
}

async fn handle_response(
    State(orchestrator): State<AppState>,
    Path(order_id): Path<String>,
    Form(form): Form<HandleResponseForm>,
) -> Json<reclaim_runtime::RefundOutcome> {
    let outcome = orchestrator
        .handle_response(&order_id, &form.response, &form.platform)
        .await;
    Json(outcome)
}

async fn read_text(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::bad_request(format!("unreadable field '{name}': {e}")))
}

/// Transport-level error, rendered in the same `status`-tagged shape as
/// refund outcomes.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message,
        }
    }

    fn missing_field(name: &str) -> Self {
        Self::bad_request(format!("missing required field '{name}'"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "status": "error", "message": self.message }));
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::Utc;
    use http_body_util::BodyExt;
    use tower::util::ServiceExt;

    use reclaim_core::{fallback_policy, EvidenceRecord, RefundPolicy, ResponseAnalysis};
    use reclaim_runtime::{
        AgentError, EvidenceExtractor, MessageComposer, PolicySource, ResponseInterpreter,
    };

    struct StubPolicySource;

    #[async_trait]
    impl PolicySource for StubPolicySource {
        async fn fetch(&self, platform: &str) -> RefundPolicy {
            fallback_policy(platform)
        }
    }

    struct StubExtractor;

    #[async_trait]
    impl EvidenceExtractor for StubExtractor {
        async fn extract(&self, _receipt: &[u8]) -> EvidenceRecord {
            EvidenceRecord::extraction_failure()
        }

        async fn validate(&self, _record: &EvidenceRecord, _policy: &RefundPolicy) -> bool {
            true
        }
    }

    struct StubComposer;

    #[async_trait]
    impl MessageComposer for StubComposer {
        async fn compose_request(
            &self,
            _issue: &str,
            _policy: &RefundPolicy,
            _details: Option<&EvidenceRecord>,
        ) -> Result<String, AgentError> {
            Ok("drafted request".to_string())
        }

        async fn compose_escalation(
            &self,
            _previous: &str,
            _policy: &RefundPolicy,
            _history: &[String],
        ) -> Result<String, AgentError> {
            Ok("drafted escalation".to_string())
        }
    }

    struct StubInterpreter;

    #[async_trait]
    impl ResponseInterpreter for StubInterpreter {
        async fn analyze(&self, response: &str, _policy: &RefundPolicy) -> ResponseAnalysis {
            ResponseAnalysis {
                approved: response.contains("refunded"),
                needs_escalation: false,
                key_points: vec![],
                policy_violations: vec![],
                suggested_action: String::new(),
                confidence: 0.9,
                analyzed_at: Utc::now(),
                response_length: response.len(),
                analysis_version: "test".to_string(),
            }
        }
    }

    fn app() -> Router {
        let orchestrator = RefundOrchestrator::builder()
            .policy_source(Arc::new(StubPolicySource))
            .evidence_extractor(Arc::new(StubExtractor))
            .message_composer(Arc::new(StubComposer))
            .response_interpreter(Arc::new(StubInterpreter))
            .build()
            .expect("all capabilities set");
        router(Arc::new(orchestrator))
    }

    fn multipart_body(fields: &[(&str, &str)]) -> (String, String) {
        let boundary = "reclaim-test-boundary";
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        body.push_str(&format!("--{boundary}--\r\n"));
        (format!("multipart/form-data; boundary={boundary}"), body)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint_responds() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn initiate_returns_initiated_outcome() {
        let (content_type, body) = multipart_body(&[
            ("platform", "amazon"),
            ("order_id", "ORD-1"),
            ("issue_description", "item damaged"),
        ]);

        let response = app()
            .oneshot(
                Request::post("/refunds")
                    .header("content-type", content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "initiated");
        assert_eq!(json["tracking_id"], "ORD-1");
    }

    #[tokio::test]
    async fn missing_field_is_a_client_error() {
        let (content_type, body) = multipart_body(&[("platform", "amazon")]);

        let response = app()
            .oneshot(
                Request::post("/refunds")
                    .header("content-type", content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["status"], "error");
    }

    #[tokio::test]
    async fn response_for_unknown_order_is_a_handled_outcome() {
        let response = app()
            .oneshot(
                Request::post("/refunds/ORD-404/response")
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(Body::from("platform=amazon&response=refunded"))
                    .unwrap(),
            )
            .await
            .unwrap();

        // Precondition failures are handled outcomes, not HTTP errors.
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "error");
    }

    #[tokio::test]
    async fn full_round_trip_reaches_success() {
        let app = app();

        let (content_type, body) = multipart_body(&[
            ("platform", "amazon"),
            ("order_id", "ORD-1"),
            ("issue_description", "item damaged"),
        ]);
        let response = app
            .clone()
            .oneshot(
                Request::post("/refunds")
                    .header("content-type", content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(body_json(response).await["status"], "initiated");

        let response = app
            .oneshot(
                Request::post("/refunds/ORD-1/response")
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(Body::from("platform=amazon&response=your+order+was+refunded"))
                    .unwrap(),
            )
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["status"], "success");
    }
}
