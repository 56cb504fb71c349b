use axum::{routing::post, Router};

use crate::modules::comms::controller;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/comms", post(controller::relay).get(controller::history))
}
