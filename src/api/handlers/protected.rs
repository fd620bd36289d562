use crate::api::{
    handlers::{extract_bearer_token, message},
    types::MessageResponse,
    SharedAuth,
};
use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use tracing::instrument;

#[utoipa::path(
    get,
    path= "/protected",
    responses (
        (status = 200, description = "Token accepted", body = MessageResponse, content_type = "application/json"),
        (status = 401, description = "Missing bearer token", body = MessageResponse),
        (status = 403, description = "Invalid or expired token", body = MessageResponse),
    ),
    security(("bearer" = [])),
    tag= "protected"
)]
// axum handler for protected
#[instrument(skip_all)]
pub async fn protected(auth: Extension<SharedAuth>, headers: HeaderMap) -> impl IntoResponse {
    let Some(token) = extract_bearer_token(&headers) else {
        return message(StatusCode::UNAUTHORIZED, "Unauthorized");
    };

    match auth.authorize(&token) {
        Ok(username) => message(StatusCode::OK, &format!("Welcome, {username}!")),
        Err(_) => message(StatusCode::FORBIDDEN, "Invalid token"),
    }
}
