use bookstore_api::routes::health::health_check;

#[tokio::test]
async fn health_check_returns_ok() {
    let response = health_check().await;
    assert!(response.0.success);
    assert_eq!(response.0.message, "Health check");
    assert_eq!(response.0.data.status, "ok");
}
