use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use crate::{
    error::ApiError,
    predict::dto::{PredictionInput, PredictionOutput},
    state::AppState,
};

pub fn predict_routes() -> Router<AppState> {
    Router::new().route("/predict", post(predict))
}

#[instrument(skip(state))]
pub async fn predict(
    State(state): State<AppState>,
    Json(input): Json<PredictionInput>,
) -> Result<Json<PredictionOutput>, ApiError> {
    let predicted_btc = state.model.predict(&input)?;
    Ok(Json(PredictionOutput {
        input,
        predicted_btc,
    }))
}
