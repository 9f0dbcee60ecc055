use std::sync::Arc;

use actix_web::{test, web, App};
use criticore::{server, BuiltinModel, ModelManager, Scorer, Settings};

async fn setup_scorer() -> Arc<Scorer> {
    let manager = ModelManager::new_default().expect("cache dir");
    let model = BuiltinModel::CamembertCriticality;
    if !manager.is_model_downloaded(model) {
        manager.download_model(model).await.expect("download");
    }
    Arc::new(
        Scorer::builder()
            .with_model(model)
            .expect("model load")
            .build()
            .expect("scorer build"),
    )
}

fn test_settings() -> Settings {
    Settings {
        batch_size_limit: 2,
        ..Settings::default()
    }
}

#[actix_web::test]
async fn test_service_surface() {
    let scorer = setup_scorer().await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(scorer))
            .app_data(web::Data::new(test_settings()))
            .configure(server::configure),
    )
    .await;

    // Info and health respond
    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert!(resp.status().is_success());
    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["model_loaded"], true);

    // Unknown routes get the envelope too
    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/nope").to_request()).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_predict_validation_and_shape() {
    let scorer = setup_scorer().await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(scorer))
            .app_data(web::Data::new(test_settings()))
            .configure(server::configure),
    )
    .await;

    // Empty text is a 400, not a model error
    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(serde_json::json!({ "text": "   " }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    // A real text produces bounded scores and the derived sum
    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(serde_json::json!({ "text": "fuite d'huile sur la pompe P-101" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body: serde_json::Value = test::read_body_json(resp).await;
    let data = &body["data"];
    let fi = data["fiabilite_integrite"].as_u64().unwrap();
    let d = data["disponibilite"].as_u64().unwrap();
    let ps = data["process_safety"].as_u64().unwrap();
    assert!(fi <= 5 && d <= 5 && ps <= 5);
    assert_eq!(data["criticite"].as_u64().unwrap(), fi + d + ps);
}

#[actix_web::test]
async fn test_batch_limits() {
    let scorer = setup_scorer().await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(scorer))
            .app_data(web::Data::new(test_settings()))
            .configure(server::configure),
    )
    .await;

    // Empty list rejected
    let req = test::TestRequest::post()
        .uri("/batch_predict")
        .set_json(serde_json::json!({ "texts": [] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    // Above the configured limit rejected
    let req = test::TestRequest::post()
        .uri("/batch_predict")
        .set_json(serde_json::json!({ "texts": ["a", "b", "c"] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    // Blank entries are skipped, not scored
    let req = test::TestRequest::post()
        .uri("/batch_predict")
        .set_json(serde_json::json!({ "texts": ["vibration du moteur", "  "] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["results"].as_array().unwrap().len(), 1);
}
