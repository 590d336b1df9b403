// HTTP tests for the sizing routes

use actix_web::{http::StatusCode, test, web, App};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;
use workwear_sizing::models::{Garment, MeasurementSlot, NewSizeRule};
use workwear_sizing::routes::{configure_routes, sizing::AppState};
use workwear_sizing::services::{
    CatalogCache, CatalogStore, Claims, MemoryStore, SizingService, TokenVerifier,
};
use workwear_sizing::SizeResolver;

const SECRET: &str = "api-test-secret";

fn bearer(user_id: &str, company_id: Uuid) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        company_id,
        admin: false,
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {}", token)
}

async fn state() -> (AppState, Garment) {
    let store = Arc::new(MemoryStore::new());
    let jacket = Garment {
        id: Uuid::new_v4(),
        key: "work_jacket".to_string(),
        description: None,
        category: "outerwear".to_string(),
    };
    store.insert_garment(jacket.clone()).await;
    store
        .set_slots(jacket.id, vec![MeasurementSlot::new(1, "chest")])
        .await
        .unwrap();
    for (label, min, max) in [("S", 88, 96), ("M", 97, 104)] {
        store
            .add_rule(NewSizeRule {
                garment_id: jacket.id,
                measure_key: "chest".to_string(),
                label: label.to_string(),
                min_value: min,
                max_value: max,
                priority: 1,
            })
            .await
            .unwrap();
    }

    let cache = Arc::new(CatalogCache::new(store.clone(), 100, 300));
    let state = AppState {
        service: SizingService::new(cache, store, SizeResolver::default()),
        verifier: TokenVerifier::new(SECRET, 0),
    };
    (state, jacket)
}

#[actix_web::test]
async fn test_health_endpoint() {
    let (state, _) = state().await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "healthy");
}

#[actix_web::test]
async fn test_resolve_endpoint() {
    let (state, jacket) = state().await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/sizes/resolve")
        .set_json(json!({ "garmentId": jacket.id, "measurements": { "chest": "500" } }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["sizeLabel"], "M");
    assert_eq!(body["source"]["kind"], "boundaryFallback");
}

#[actix_web::test]
async fn test_slots_endpoint_and_unknown_garment() {
    let (state, jacket) = state().await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/garments/{}/slots", jacket.id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["fallback"], false);
    assert_eq!(body["slots"][0]["measureKey"], "chest");

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/garments/{}/slots", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_save_requires_token() {
    let (state, jacket) = state().await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/measurements")
        .set_json(json!({ "garmentId": jacket.id, "measurements": { "chest": "90" } }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/v1/measurements")
        .insert_header(("Authorization", "Bearer not-a-token"))
        .set_json(json!({ "garmentId": jacket.id, "measurements": { "chest": "90" } }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_save_list_export_delete() {
    let (state, jacket) = state().await;
    let company = Uuid::new_v4();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/measurements")
        .insert_header(("Authorization", bearer("alice", company)))
        .set_json(json!({ "garmentId": jacket.id, "measurements": { "chest": "91,5" } }))
        .to_request();
    let saved: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(saved["sizeLabel"], "S");
    assert_eq!(saved["values"][0]["value"], 92);
    let record_id = saved["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/v1/measurements")
        .insert_header(("Authorization", bearer("alice", company)))
        .to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed["count"], 1);

    let req = test::TestRequest::get()
        .uri("/api/v1/company/sizes/export")
        .insert_header(("Authorization", bearer("bob", company)))
        .to_request();
    let csv = test::call_and_read_body(&app, req).await;
    let text = String::from_utf8(csv.to_vec()).unwrap();
    assert!(text.lines().any(|line| line == "work_jacket,outerwear,S,1"));

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/measurements/{}", record_id))
        .insert_header(("Authorization", bearer("bob", company)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/measurements/{}", record_id))
        .insert_header(("Authorization", bearer("alice", company)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn test_add_rule_checks_caller_before_body() {
    let (state, jacket) = state().await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes),
    )
    .await;

    let invalid = json!({ "measureKey": "", "label": "", "minValue": 1, "maxValue": 2 });

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/garments/{}/rules", jacket.id))
        .set_json(&invalid)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/garments/{}/rules", jacket.id))
        .insert_header(("Authorization", bearer("alice", Uuid::new_v4())))
        .set_json(&invalid)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/garments/{}/rules", jacket.id))
        .insert_header(("Authorization", bearer("alice", Uuid::new_v4())))
        .set_json(json!({ "measureKey": "waist", "label": "L", "minValue": 90, "maxValue": 99 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
