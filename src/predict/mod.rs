use crate::state::AppState;
use axum::Router;

pub mod artifacts;
mod dto;
pub mod handlers;
pub mod model;

pub use model::ModelState;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::predict_routes())
}
