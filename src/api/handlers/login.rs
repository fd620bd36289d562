use crate::{
    api::{
        handlers::{
            message, types::Credentials, valid_password, valid_username, INVALID_CREDENTIALS,
            SERVER_ERROR,
        },
        types::{LoginResponse, MessageResponse},
        SharedAuth,
    },
    auth::AuthenticateError,
};
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, error, instrument};

#[utoipa::path(
    post,
    path= "/login",
    request_body = Credentials,
    responses (
        (status = 200, description = "Login successful", body = LoginResponse, content_type = "application/json"),
        (status = 400, description = "Invalid payload or credentials", body = MessageResponse),
        (status = 500, description = "Store failure", body = MessageResponse),
    ),
    tag= "login"
)]
// axum handler for login
#[instrument(skip_all)]
pub async fn login(auth: Extension<SharedAuth>, payload: Option<Json<Credentials>>) -> Response {
    let user: Credentials = match payload {
        Some(Json(payload)) => payload,
        None => return message(StatusCode::BAD_REQUEST, "Missing payload").into_response(),
    };

    debug!("user: {:?}", user);

    // Malformed input gets the same answer as a wrong password.
    if !valid_username(&user.username) || !valid_password(&user.password) {
        return message(StatusCode::BAD_REQUEST, INVALID_CREDENTIALS).into_response();
    }

    match auth.authenticate(&user.username, &user.password).await {
        Ok(token) => {
            debug!("Login successful");

            (
                StatusCode::OK,
                Json(LoginResponse {
                    message: "Login successful".to_string(),
                    token,
                }),
            )
                .into_response()
        }
        Err(AuthenticateError::InvalidCredentials) => {
            message(StatusCode::BAD_REQUEST, INVALID_CREDENTIALS).into_response()
        }
        Err(e) => {
            error!("Error authenticating user: {e}");

            message(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR).into_response()
        }
    }
}
