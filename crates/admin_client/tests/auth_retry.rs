mod common;

use admin_client::{FetchError, RequestSpec};
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

use common::{client, requests};

async fn mount_refresh(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

fn data_calls(requests: &[wiremock::Request]) -> usize {
    requests
        .iter()
        .filter(|r| r.url.path() == "/api/admin/users")
        .count()
}

#[tokio::test]
async fn unauthorized_then_ok_succeeds_after_one_retry() {
    let server = MockServer::start().await;
    mount_refresh(&server, 200).await;
    Mock::given(method("GET"))
        .and(path("/api/admin/users"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;

    let body: Value = client(&server)
        .send(&RequestSpec::get("/api/admin/users"))
        .await
        .unwrap();

    assert_eq!(body["success"], true);
    let received = requests(&server).await;
    assert_eq!(data_calls(&received), 2);
    assert_eq!(received.len(), 3);
}

#[tokio::test]
async fn second_unauthorized_ends_the_session() {
    let server = MockServer::start().await;
    mount_refresh(&server, 200).await;
    Mock::given(method("GET"))
        .and(path("/api/admin/users"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client(&server)
        .send::<Value>(&RequestSpec::get("/api/admin/users"))
        .await
        .unwrap_err();

    assert!(err.is_session_expired());
    assert_eq!(data_calls(&requests(&server).await), 2);
}

#[tokio::test]
async fn failed_refresh_ends_the_session_without_retry() {
    let server = MockServer::start().await;
    mount_refresh(&server, 403).await;
    Mock::given(method("GET"))
        .and(path("/api/admin/users"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client(&server)
        .send::<Value>(&RequestSpec::get("/api/admin/users"))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::SessionExpired));
    assert_eq!(data_calls(&requests(&server).await), 1);
}

#[tokio::test]
async fn other_statuses_are_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/users"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client(&server)
        .send::<Value>(&RequestSpec::get("/api/admin/users"))
        .await
        .unwrap_err();

    match err {
        FetchError::Server { status, message } => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(message, "Service Unavailable");
        }
        other => panic!("expected a server error, got {other:?}"),
    }
    assert_eq!(requests(&server).await.len(), 1);
}

#[tokio::test]
async fn requests_are_sent_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/admin/users/9"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let spec = RequestSpec::put("/api/admin/users/9")
        .json(&json!({"userName": "grace"}))
        .unwrap();
    let _: Value = client(&server).send(&spec).await.unwrap();
}
