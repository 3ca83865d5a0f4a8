use crate::api::ApiError;
use crate::cache::{CacheKey, Resource};
use crate::errors::AppError;
use crate::models::{ApplicationForm, Credentials};
use crate::session::Session;
use crate::state::AppState;
use crate::ui::{
    describe_error, escape_html, render_dashboard, render_grant_detail, render_landing,
    render_new_application, render_signup,
};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use tracing::{info, warn};

/// Where a successful sign-up lands. The sign-in page is served elsewhere.
pub const SIGNIN_PATH: &str = "/signin";
pub const DASHBOARD_PATH: &str = "/dashboard";

pub async fn index() -> Html<String> {
    Html(render_landing())
}

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn signup_form() -> Html<String> {
    Html(render_signup("", None))
}

pub async fn signup_submit(
    State(state): State<AppState>,
    Form(credentials): Form<Credentials>,
) -> Response {
    match state.api.register(&credentials).await {
        Ok(()) => {
            info!("account registered");
            Redirect::to(SIGNIN_PATH).into_response()
        }
        Err(err) => {
            warn!(error = %err, "registration failed");
            let message = match &err {
                ApiError::Status { status: 400, message } => escape_html(message),
                other => describe_error(other),
            };
            (
                form_failure_status(&err),
                Html(render_signup(&credentials.email, Some(&message))),
            )
                .into_response()
        }
    }
}

pub async fn dashboard(State(state): State<AppState>, headers: HeaderMap) -> Html<String> {
    let session = Session::from_headers(&headers);
    let key = CacheKey::for_session(state.api.url("/grants"), &session);
    let api = state.api.clone();
    let grants = state
        .grants
        .load(key, move || async move { api.list_grants(&session).await })
        .await;
    Html(render_dashboard(&grants))
}

pub async fn grant_detail(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Response {
    let Ok(id) = parse_grant_id(&raw_id) else {
        let page = render_grant_detail(&unknown_grant());
        return (StatusCode::NOT_FOUND, Html(page)).into_response();
    };
    let key = CacheKey::public(state.api.url(&format!("/grants/{id}")));
    let api = state.api.clone();
    let grant = state
        .grant_details
        .load(key, move || async move { api.grant(id).await })
        .await;
    Html(render_grant_detail(&grant)).into_response()
}

// A path id that is not a number cannot name a grant; the API is not asked.
fn unknown_grant<T>() -> Resource<T> {
    Resource::Failed(ApiError::Status {
        status: 404,
        message: "Grant not found".to_string(),
    })
}

pub async fn new_application_form(Query(prefill): Query<ApplicationForm>) -> Html<String> {
    Html(render_new_application(&prefill.grant_id, None))
}

pub async fn new_application_submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ApplicationForm>,
) -> Response {
    let grant_id = match parse_grant_id(&form.grant_id) {
        Ok(id) => id,
        Err(message) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(render_new_application(&form.grant_id, Some(message))),
            )
                .into_response();
        }
    };

    let session = Session::from_headers(&headers);
    match state.api.create_application(&session, grant_id).await {
        Ok(_) => Redirect::to(DASHBOARD_PATH).into_response(),
        Err(err) => {
            warn!(error = %err, grant_id, "application submit failed");
            (
                form_failure_status(&err),
                Html(render_new_application(&form.grant_id, Some(&describe_error(&err)))),
            )
                .into_response()
        }
    }
}

/// Grant ids are sent to the API as JSON numbers.
fn parse_grant_id(raw: &str) -> Result<i64, &'static str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("Enter the id of the grant you are applying for.");
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| "Grant id must be a whole number.")
}

fn form_failure_status(err: &ApiError) -> StatusCode {
    AppError::from(err.clone()).status
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_id_parses_as_number() {
        assert_eq!(parse_grant_id("42"), Ok(42));
        assert_eq!(parse_grant_id(" 7 "), Ok(7));
    }

    #[test]
    fn grant_id_rejects_empty_and_text() {
        assert!(parse_grant_id("").is_err());
        assert!(parse_grant_id("   ").is_err());
        assert!(parse_grant_id("abc").is_err());
        assert!(parse_grant_id("4.5").is_err());
    }

    #[test]
    fn non_numeric_grant_path_renders_not_found() {
        let html = render_grant_detail(&unknown_grant());
        assert!(html.contains("That grant could not be found."));
        assert!(!html.contains("Loading..."));
    }

    #[test]
    fn upstream_failures_map_to_form_statuses() {
        assert_eq!(
            form_failure_status(&ApiError::Unauthorized),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            form_failure_status(&ApiError::Request("refused".into())),
            StatusCode::BAD_GATEWAY
        );
    }
}
