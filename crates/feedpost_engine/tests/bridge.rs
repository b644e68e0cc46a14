use std::fs;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use feedpost_core::{DeviceIdentity, SessionBlob};
use feedpost_engine::{BridgeSettings, HttpPlatformClient, PlatformClient, PlatformFailure};
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> HttpPlatformClient {
    HttpPlatformClient::new(&server.uri(), BridgeSettings::default()).unwrap()
}

#[tokio::test]
async fn login_posts_credentials_and_device() {
    let server = MockServer::start().await;
    let device = DeviceIdentity::generate();
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_partial_json(json!({
            "username": "editor",
            "password": "pw",
            "device": { "device_id": device.device_id.clone() },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session": { "authorization": "Bearer x" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = client(&server).login("editor", "pw", &device).await.unwrap();
    assert_eq!(session.as_value(), &json!({ "authorization": "Bearer x" }));
}

#[tokio::test]
async fn challenge_and_two_factor_are_classified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error_type": "two_factor_required",
            "message": "enter the code",
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .login("editor", "pw", &DeviceIdentity::generate())
        .await
        .unwrap_err();
    assert_eq!(err.kind, PlatformFailure::TwoFactorRequired);
    assert_eq!(err.message, "enter the code");
}

#[tokio::test]
async fn probe_maps_unauthorized_to_login_required() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session/probe"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client(&server)
        .probe(&SessionBlob::new(json!({})))
        .await
        .unwrap_err();
    assert_eq!(err.kind, PlatformFailure::LoginRequired);
}

#[tokio::test]
async fn upload_sends_encoded_image_and_returns_rotated_session() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    let image = temp.path().join("latest.jpg");
    fs::write(&image, b"jpeg-bytes").unwrap();

    Mock::given(method("POST"))
        .and(path("/media/photo"))
        .and(body_partial_json(json!({
            "caption": "Hello",
            "image_base64": STANDARD.encode(b"jpeg-bytes"),
            "session": { "v": 1 },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "session": { "v": 2 } })))
        .expect(1)
        .mount(&server)
        .await;

    let rotated = client(&server)
        .upload_photo(&SessionBlob::new(json!({ "v": 1 })), &image, "Hello")
        .await
        .unwrap();
    assert_eq!(rotated.as_value(), &json!({ "v": 2 }));
}

#[tokio::test]
async fn upload_of_missing_file_never_reaches_the_bridge() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let err = client(&server)
        .upload_photo(&SessionBlob::new(json!({})), &temp.path().join("gone.jpg"), "x")
        .await
        .unwrap_err();
    assert_eq!(err.kind, PlatformFailure::Other);
}

#[test]
fn cookie_session_is_built_locally() {
    let device = DeviceIdentity::generate();
    let client = HttpPlatformClient::new("http://127.0.0.1:1/api", BridgeSettings::default()).unwrap();

    let session = client.session_from_cookie("abc", &device);
    assert_eq!(session.as_value()["cookies"]["sessionid"], "abc");
    assert_eq!(session.as_value()["device"]["device_id"], device.device_id.as_str());
}
