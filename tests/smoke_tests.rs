//! End-to-end happy path: find schools near an address, compare the top
//! hits, share the comparison, open the shared link.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use schoolscout::clients::{GeocodeProvider, ProviderError};
use schoolscout::config::Config;
use schoolscout::models::{Coordinates, Institution, InstitutionType};
use schoolscout::state::SharedState;
use schoolscout::store::{InMemoryInstitutionStore, InMemorySnapshotStore};

struct UtrechtProvider;

#[async_trait]
impl GeocodeProvider for UtrechtProvider {
    async fn lookup(&self, _address: &str) -> Result<Option<Coordinates>, ProviderError> {
        // Utrecht Centraal.
        Ok(Some(Coordinates::new(52.0894, 5.1100)))
    }
}

fn school(id: i64, name: &str, lat: f64, lon: f64, rating: f64) -> Institution {
    Institution {
        id,
        institution_type: InstitutionType::Primary,
        name: name.to_string(),
        city: "Utrecht".to_string(),
        address: None,
        postal_code: None,
        coordinates: Some(Coordinates::new(lat, lon)),
        rating: Some(rating),
        is_bilingual: false,
        is_international: false,
        offers_english: false,
        details: serde_json::Value::Null,
        description: None,
    }
}

fn spawn_app() -> Router {
    let mut config = Config::default();
    config.geocoding.min_request_interval_ms = 0;

    let institutions = vec![
        school(1, "De Brug", 52.090, 5.112, 7.8),
        school(2, "De Wissel", 52.095, 5.120, 8.4),
        school(3, "Op Dreef", 52.100, 5.090, 6.9),
    ];

    let shared = SharedState::with_stores(
        config,
        Arc::new(InMemoryInstitutionStore::new(institutions, HashMap::new())),
        Arc::new(InMemorySnapshotStore::new()),
        Arc::new(UtrechtProvider),
    )
    .expect("Failed to create app state");

    schoolscout::api::router(schoolscout::api::create_app_state(Arc::new(shared)))
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn search_compare_share_flow() {
    let app = spawn_app();

    // 1. Parents search around their address.
    let (status, body) = get_json(
        &app,
        "/api/search/nearby?address=Stationsplein%201%2C%20Utrecht&radius_km=3&min_rating=7.0",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let hits = body["data"].as_array().unwrap();
    assert_eq!(hits.len(), 2); // Op Dreef filtered out by rating.
    let ids: Vec<i64> = hits.iter().map(|h| h["id"].as_i64().unwrap()).collect();

    // 2. They look at travel options for the closest hit.
    let uri = format!("/api/transportation/{}?from_address=Stationsplein%201", ids[0]);
    let (status, body) = get_json(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 4);

    // 3. They share a comparison of both hits.
    let request = serde_json::json!({
        "institution_ids": ids,
        "filters_applied": {"radius_km": 3, "min_rating": 7.0}
    });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/comparisons")
                .header("Content-Type", "application/json")
                .body(Body::from(request.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value =
        serde_json::from_slice(&response.into_body().collect().await.unwrap().to_bytes()).unwrap();
    let share_id = body["data"]["share_id"].as_str().unwrap().to_string();

    // 4. The other parent opens the shared link.
    let (status, body) = get_json(&app, &format!("/api/comparisons/{share_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["view_count"], 1);
    assert_eq!(
        body["data"]["institution_ids"].as_array().unwrap().len(),
        2
    );
}
