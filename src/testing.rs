//! In-process stand-in for the prediction service, shared by unit tests.

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

pub fn config_json() -> Value {
    json!({
        "model": {
            "name": "Salary Predictor",
            "description": "Predicts developer salary",
            "version": "1.0",
            "model_file": "model.pkl"
        },
        "features": [
            {"name": "Country", "display_name": "Country", "type": "categorical", "required": true,
             "options": ["Germany", "India", "United States"]},
            {"name": "Age", "display_name": "Age", "type": "numeric", "required": true, "min": 18, "max": 70},
            {"name": "Years", "display_name": "Years Experience", "type": "numeric", "required": false}
        ],
        "output": {"unit": "USD"}
    })
}

/// Router answering `/`, `/config` and `/predict` like a healthy backend
pub fn mock_api() -> Router {
    Router::new()
        .route(
            "/",
            get(|| async {
                Json(json!({
                    "message": "ML Model Prediction API",
                    "model": "Salary Predictor",
                    "version": "1.0",
                    "endpoints": {"/config": "GET - Get model configuration", "/predict": "POST - Make a prediction"}
                }))
            }),
        )
        .route("/config", get(|| async { Json(config_json()) }))
        .route(
            "/predict",
            post(|Json(body): Json<Value>| async move {
                Json(json!({"success": true, "prediction": 452300.7, "unit": "USD", "input": body}))
            }),
        )
}

/// Serve a router on an ephemeral local port, returning its base URL
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Base URL of a port nothing is listening on
pub async fn unused_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
