use crate::{
    api::{
        handlers::{message, types::Credentials, valid_password, valid_username, SERVER_ERROR},
        types::MessageResponse,
        SharedAuth,
    },
    auth::RegisterError,
};
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use tracing::{debug, error, instrument};

#[utoipa::path(
    post,
    path= "/register",
    request_body = Credentials,
    responses (
        (status = 201, description = "Registration successful", body = MessageResponse, content_type = "application/json"),
        (status = 400, description = "Invalid payload or username already taken", body = MessageResponse),
        (status = 500, description = "Store failure", body = MessageResponse),
    ),
    tag= "register"
)]
// axum handler for register
#[instrument(skip_all)]
pub async fn register(
    auth: Extension<SharedAuth>,
    payload: Option<Json<Credentials>>,
) -> impl IntoResponse {
    let user: Credentials = match payload {
        Some(Json(payload)) => payload,
        None => return message(StatusCode::BAD_REQUEST, "Missing payload"),
    };

    debug!("user: {:?}", user);

    if !valid_username(&user.username) {
        return message(StatusCode::BAD_REQUEST, "Invalid username");
    }

    if !valid_password(&user.password) {
        return message(StatusCode::BAD_REQUEST, "Invalid password");
    }

    match auth.register(&user.username, &user.password).await {
        Ok(()) => message(StatusCode::CREATED, "User created"),
        Err(RegisterError::AlreadyExists) => {
            debug!("User already exists");

            message(StatusCode::BAD_REQUEST, "User already exists")
        }
        Err(e) => {
            error!("Error registering user: {e}");

            message(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR)
        }
    }
}
