use axum::http::StatusCode;

use super::ApiSuccess;

pub async fn health() -> ApiSuccess<()> {
    ApiSuccess::message(StatusCode::OK, "FeedNav API is running")
}
