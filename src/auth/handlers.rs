use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, PublicUser, SignupRequest},
        services,
    },
    db::DbConn,
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

#[instrument(skip(state, conn, payload))]
pub async fn signup(
    State(state): State<AppState>,
    DbConn(mut conn): DbConn,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = services::signup(&mut conn, state.config.password_scheme, payload).await?;
    Ok(Json(user))
}

#[instrument(skip(conn, payload))]
pub async fn login(
    DbConn(mut conn): DbConn,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let res = services::login(&mut conn, payload).await?;
    Ok(Json(res))
}
