use crate::handlers;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/healthz", get(handlers::healthz))
        .route("/signup", get(handlers::signup_form).post(handlers::signup_submit))
        .route("/dashboard", get(handlers::dashboard))
        .route("/grants/:id", get(handlers::grant_detail))
        .route(
            "/applications/new",
            get(handlers::new_application_form).post(handlers::new_application_submit),
        )
        .with_state(state)
}
