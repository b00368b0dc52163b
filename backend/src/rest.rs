//! REST surface for plans.
//!
//! Create and update bodies arrive as `application/x-www-form-urlencoded`
//! text in the flat bracket-indexed wire shape; responses are JSON.
//! Validation failures map to 422 with the field-error map as the body,
//! unknown ids to 404, storage faults to 500.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::domain::plan_service::{GatewayError, PlanGateway, PlanService};
use crate::storage::MemoryPlanStore;
use crate::wire;
use shared::PlanListRequest;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub plans: Arc<PlanService<MemoryPlanStore>>,
}

impl AppState {
    pub fn new(plans: PlanService<MemoryPlanStore>) -> Self {
        Self {
            plans: Arc::new(plans),
        }
    }
}

/// Routes for the plan endpoints, to be nested under `/api`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/plans", get(list_plans).post(create_plan))
        .route(
            "/plans/:id",
            get(get_plan).put(update_plan).delete(delete_plan),
        )
        .with_state(state)
}

/// Query parameters for the plan listing endpoint.
#[derive(Deserialize, Debug)]
pub struct PlanListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

async fn list_plans(
    State(state): State<AppState>,
    Query(query): Query<PlanListQuery>,
) -> impl IntoResponse {
    info!("GET /plans - query: {:?}", query);

    let request = PlanListRequest {
        page: query.page,
        per_page: query.per_page,
    };
    match state.plans.list(&request) {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn get_plan(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    info!("GET /plans/{}", id);

    match state.plans.get_by_id(id) {
        Ok(plan) => (StatusCode::OK, Json(plan)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn create_plan(State(state): State<AppState>, body: String) -> impl IntoResponse {
    info!("POST /plans - {} bytes", body.len());

    let payload = wire::pairs_from_body(&body);
    match state.plans.create(&payload) {
        Ok(plan) => (StatusCode::CREATED, Json(plan)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn update_plan(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: String,
) -> impl IntoResponse {
    info!("PUT /plans/{} - {} bytes", id, body.len());

    let payload = wire::pairs_from_body(&body);
    match state.plans.update(id, &payload) {
        Ok(plan) => (StatusCode::OK, Json(plan)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn delete_plan(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    info!("DELETE /plans/{}", id);

    match state.plans.delete(id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: GatewayError) -> Response {
    match error {
        GatewayError::Validation(errors) => {
            (StatusCode::UNPROCESSABLE_ENTITY, Json(errors)).into_response()
        }
        GatewayError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            format!("tabela de parcelamento {id} não encontrada"),
        )
            .into_response(),
        GatewayError::Internal(error) => {
            tracing::error!("plan storage failure: {:?}", error);
            (StatusCode::INTERNAL_SERVER_ERROR, "erro interno").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use shared::{FieldErrors, InstallmentPlan, PlanPage};
    use tower::ServiceExt;

    fn test_router() -> Router {
        router(AppState::new(PlanService::new(MemoryPlanStore::new())))
    }

    fn form_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn plan_body(name: &str) -> String {
        wire::to_body(&[
            ("id_curso".to_string(), "3".to_string()),
            ("nome".to_string(), name.to_string()),
            ("valor".to_string(), "1200.00".to_string()),
            ("ativo".to_string(), "s".to_string()),
            ("tipo_curso".to_string(), "1".to_string()),
            ("parcelas[1][parcela]".to_string(), "3".to_string()),
            ("parcelas[1][valor]".to_string(), "400.00".to_string()),
        ])
    }

    async fn json_body<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_create_plan_returns_created() {
        let app = test_router();

        let response = app
            .oneshot(form_request("POST", "/plans", &plan_body("Plano REST")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let plan: InstallmentPlan = json_body(response).await;
        assert_eq!(plan.id, Some(1));
        assert_eq!(plan.name, "Plano REST");
        assert_eq!(
            plan.options.get(&1).unwrap().value.as_deref(),
            Some("400.00")
        );
    }

    #[tokio::test]
    async fn test_create_without_name_is_unprocessable() {
        let app = test_router();

        let response = app
            .oneshot(form_request("POST", "/plans", "id_curso=3&nome="))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let errors: FieldErrors = json_body(response).await;
        assert_eq!(
            errors.first_message("nome"),
            Some("O campo nome é obrigatório")
        );
    }

    #[tokio::test]
    async fn test_get_unknown_plan_is_not_found() {
        let app = test_router();

        let response = app
            .oneshot(Request::get("/plans/42").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_full_crud_cycle() {
        let state = AppState::new(PlanService::new(MemoryPlanStore::new()));

        let response = router(state.clone())
            .oneshot(form_request("POST", "/plans", &plan_body("Plano A")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = router(state.clone())
            .oneshot(Request::get("/plans/1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let mut renamed = plan_body("Plano A renomeado");
        renamed.push_str("&id=1");
        let response = router(state.clone())
            .oneshot(form_request("PUT", "/plans/1", &renamed))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let plan: InstallmentPlan = json_body(response).await;
        assert_eq!(plan.name, "Plano A renomeado");

        let response = router(state.clone())
            .oneshot(Request::delete("/plans/1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = router(state)
            .oneshot(Request::get("/plans/1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_plans_paginates() {
        let state = AppState::new(PlanService::new(MemoryPlanStore::new()));
        for i in 0..4 {
            let response = router(state.clone())
                .oneshot(form_request(
                    "POST",
                    "/plans",
                    &plan_body(&format!("Plano {i}")),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = router(state)
            .oneshot(
                Request::get("/plans?page=2&per_page=3")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let page: PlanPage = json_body(response).await;
        assert_eq!(page.total, 4);
        assert_eq!(page.plans.len(), 1);
        assert_eq!(page.page, 2);
    }
}
