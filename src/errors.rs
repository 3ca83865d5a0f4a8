use crate::api::ApiError;
use axum::http::StatusCode;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn config(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for AppError {}

/// Upstream failures surface as gateway errors, except rejected sessions and
/// upstream client errors which keep their meaning.
impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        let status = match err.status() {
            Some(401) => StatusCode::UNAUTHORIZED,
            Some(code @ 400..=499) => {
                StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            _ => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_map_to_statuses() {
        assert_eq!(
            AppError::from(ApiError::Unauthorized).status,
            StatusCode::UNAUTHORIZED
        );
        let missing = ApiError::Status {
            status: 404,
            message: "Grant not found".into(),
        };
        assert_eq!(AppError::from(missing).status, StatusCode::NOT_FOUND);
        let down = ApiError::Status {
            status: 503,
            message: "down".into(),
        };
        assert_eq!(AppError::from(down).status, StatusCode::BAD_GATEWAY);
        assert_eq!(
            AppError::from(ApiError::Request("refused".into())).status,
            StatusCode::BAD_GATEWAY
        );
    }
}
