use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::HashMap;

use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
}

pub async fn root() -> impl IntoResponse {
    let body = json!({
        "service": "Geofan Server",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(body))
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

pub async fn readyz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ready" }))
}

/// The geolocation query endpoint. Wraps the raw query map into the
/// parameter tree the validator expects and hands it to the
/// orchestrator; every pipeline outcome maps to a success status with
/// the payload carrying any problem description.
pub async fn geolocate(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let raw_tree = wrap_query(&query);

    match state.orchestrator.handle(&raw_tree).await {
        Ok(response) => {
            let status =
                StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(response.body))
        }
        Err(e) => {
            tracing::error!(error = %e, category = %e.category(), "query pipeline failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"message": "internal error"})),
            )
        }
    }
}

/// Builds the nested raw tree `{"params": {"querystring": {...}}}`
/// from the flat HTTP query map.
fn wrap_query(query: &HashMap<String, String>) -> Value {
    let mut querystring = Map::new();
    for (name, value) in query {
        querystring.insert(name.clone(), Value::String(value.clone()));
    }
    json!({"params": {"querystring": Value::Object(querystring)}})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_query_shape() {
        let mut query = HashMap::new();
        query.insert("q".to_string(), "ottawa".to_string());
        query.insert("keys".to_string(), "geonames,nominatim".to_string());

        let tree = wrap_query(&query);
        assert_eq!(tree["params"]["querystring"]["q"], json!("ottawa"));
        assert_eq!(
            tree["params"]["querystring"]["keys"],
            json!("geonames,nominatim")
        );
    }

    #[test]
    fn test_wrap_empty_query() {
        let tree = wrap_query(&HashMap::new());
        assert_eq!(tree["params"]["querystring"], json!({}));
    }
}
