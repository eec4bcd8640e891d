use axum::{Json, extract::State};
use serde_json::{Value, json};

use super::error::ApiResult;
use crate::domain::{Error, Kind};
use crate::infrastructure::{AppState, db};

pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    db::ping(state.db())
        .await
        .map_err(|e| Error::new(Kind::Internal, format!("database unreachable: {}", e)))?;

    Ok(Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "time": chrono::Utc::now().to_rfc3339()
    })))
}
