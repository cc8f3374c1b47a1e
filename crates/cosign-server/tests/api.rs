//! End-to-end tests over the in-process router and a throwaway database.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use cosign_crypto::curve::{self, point_add, scalar_base_mul, scalar_mul, Scalar};
use cosign_crypto::sm3_digest;
use cosign_server::config::{AdminConfig, AuthConfig, Config, DatabaseConfig, LogConfig, ServerConfig};
use cosign_server::{create_router, AppState};
use cosign_storage::RocksDbStorage;
use http_body_util::BodyExt;
use rand::rngs::OsRng;
use serde_json::{json, Value};
use tower::ServiceExt;

const TEST_MASTER_KEY: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

async fn test_app() -> Router {
    let config = Config {
        server: ServerConfig {
            port: 0,
            read_timeout: 5,
            write_timeout: 5,
        },
        database: DatabaseConfig {
            path: "unused-in-tests".into(),
        },
        auth: AuthConfig {
            token_expire: 3600,
            master_key: TEST_MASTER_KEY.to_string(),
        },
        log: LogConfig::default(),
        admin: AdminConfig::default(),
    };

    let storage = Arc::new(RocksDbStorage::open_test().unwrap());
    let state = Arc::new(AppState::with_storage(config, storage).await.unwrap());
    create_router(state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Value {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    // Business errors still ride on HTTP 200.
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

struct ClientHalf {
    d1: Scalar,
    p1: String,
}

fn client_half() -> ClientHalf {
    let d1 = curve::random_scalar(&mut OsRng).unwrap();
    let d1_inv = curve::invert_scalar(&d1).unwrap();
    let p1 = curve::encode_point(&scalar_base_mul(&d1_inv)).unwrap();
    ClientHalf {
        d1,
        p1: STANDARD.encode(p1),
    }
}

fn decode_scalar_b64(value: &str) -> Scalar {
    let bytes: [u8; 32] = STANDARD.decode(value).unwrap().try_into().unwrap();
    curve::scalar_from_bytes(&bytes).unwrap()
}

/// Complete the cooperative signature client-side and verify it under the
/// joint public key.
fn complete_and_verify(client: &ClientHalf, k1: &Scalar, pa_b64: &str, e: &[u8; 32], data: &Value) -> bool {
    let r = decode_scalar_b64(data["r"].as_str().unwrap());
    let s2 = decode_scalar_b64(data["s2"].as_str().unwrap());
    let s3 = decode_scalar_b64(data["s3"].as_str().unwrap());
    let s = client.d1 * (*k1 * s2 + s3) - r;

    let pa = curve::decode_point(&STANDARD.decode(pa_b64).unwrap()).unwrap();
    let e = curve::scalar_from_bytes(e).unwrap();
    let t = r + s;
    let x_point = point_add(&scalar_base_mul(&s), &scalar_mul(&pa, &t));
    let x_bytes: [u8; 32] = curve::encode_point(&x_point).unwrap()[..32]
        .try_into()
        .unwrap();
    e + curve::reduce_to_scalar(&x_bytes) == r
}

async fn register(app: &Router, username: &str, password: &str, client: &ClientHalf) -> Value {
    send(
        app,
        "POST",
        "/api/register",
        None,
        Some(json!({"username": username, "password": password, "p1": client.p1})),
    )
    .await
}

async fn login(app: &Router, username: &str, password: &str) -> Value {
    send(
        app,
        "POST",
        "/api/login",
        None,
        Some(json!({"username": username, "password": password})),
    )
    .await
}

#[tokio::test]
async fn register_login_and_user_info_flow() {
    let app = test_app().await;
    let client = client_half();

    let registered = register(&app, "alice", "pw123456", &client).await;
    assert_eq!(registered["code"], 0);
    let user_id = registered["data"]["userId"].as_str().unwrap().to_string();
    let public_key = registered["data"]["publicKey"].as_str().unwrap().to_string();
    assert!(registered["data"]["p2"].is_string());

    let logged_in = login(&app, "alice", "pw123456").await;
    assert_eq!(logged_in["code"], 0);
    assert_eq!(logged_in["data"]["userId"], user_id.as_str());
    let token = logged_in["data"]["token"].as_str().unwrap().to_string();

    let info = send(&app, "GET", "/api/user/info", Some(&token), None).await;
    assert_eq!(info["code"], 0);
    assert_eq!(info["data"]["username"], "alice");
    assert_eq!(info["data"]["status"], 1);
    assert_eq!(info["data"]["publicKey"], public_key.as_str());

    // Neither the verifier nor wrapped secrets ever appear on the wire.
    let raw = info.to_string();
    assert!(!raw.contains("passwordHash"));
    assert!(!raw.contains("password_verifier"));
    assert!(!raw.contains("d2"));
}

#[tokio::test]
async fn login_error_codes() {
    let app = test_app().await;
    let client = client_half();
    register(&app, "alice", "pw123456", &client).await;

    let wrong = login(&app, "alice", "wrong-pass").await;
    assert_eq!(wrong["code"], 10004);

    let unknown = login(&app, "nobody", "pw123456").await;
    assert_eq!(unknown["code"], 10003);
}

#[tokio::test]
async fn register_error_codes() {
    let app = test_app().await;
    let client = client_half();

    let first = register(&app, "alice", "pw123456", &client).await;
    assert_eq!(first["code"], 0);

    let duplicate = register(&app, "alice", "pw123456", &client_half()).await;
    assert_eq!(duplicate["code"], 10002);

    let bad_b64 = send(
        &app,
        "POST",
        "/api/register",
        None,
        Some(json!({"username": "bob", "password": "pw123456", "p1": "@@not-base64@@"})),
    )
    .await;
    assert_eq!(bad_b64["code"], 10001);

    let short_point = send(
        &app,
        "POST",
        "/api/register",
        None,
        Some(json!({"username": "bob", "password": "pw123456", "p1": STANDARD.encode([1u8; 63])})),
    )
    .await;
    assert_eq!(short_point["code"], 10001);

    let off_curve = send(
        &app,
        "POST",
        "/api/register",
        None,
        Some(json!({"username": "bob", "password": "pw123456", "p1": STANDARD.encode([0u8; 64])})),
    )
    .await;
    assert_eq!(off_curve["code"], 10001);
}

#[tokio::test]
async fn auth_error_codes() {
    let app = test_app().await;

    let missing = send(&app, "POST", "/api/sign", None, Some(json!({"q1": "", "e": ""}))).await;
    assert_eq!(missing["code"], 10012);

    let junk_token = "f".repeat(64);
    let unknown = send(&app, "GET", "/api/user/info", Some(junk_token.as_str()), None).await;
    assert_eq!(unknown["code"], 10005);
}

#[tokio::test]
async fn cooperative_sign_via_http_verifies() {
    let app = test_app().await;
    let client = client_half();

    let registered = register(&app, "alice", "pw123456", &client).await;
    let pa = registered["data"]["publicKey"].as_str().unwrap().to_string();
    let token = login(&app, "alice", "pw123456").await["data"]["token"]
        .as_str()
        .unwrap()
        .to_string();

    let e = sm3_digest(b"hello");
    let k1 = curve::random_scalar(&mut OsRng).unwrap();
    let q1 = curve::encode_point(&scalar_base_mul(&k1)).unwrap();

    let signed = send(
        &app,
        "POST",
        "/api/sign",
        Some(&token),
        Some(json!({"q1": STANDARD.encode(q1), "e": STANDARD.encode(e)})),
    )
    .await;
    assert_eq!(signed["code"], 0);
    assert!(complete_and_verify(&client, &k1, &pa, &e, &signed["data"]));
}

#[tokio::test]
async fn sign_input_validation_codes() {
    let app = test_app().await;
    let client = client_half();
    register(&app, "alice", "pw123456", &client).await;
    let token = login(&app, "alice", "pw123456").await["data"]["token"]
        .as_str()
        .unwrap()
        .to_string();

    // Off-curve q1.
    let off_curve = send(
        &app,
        "POST",
        "/api/sign",
        Some(&token),
        Some(json!({"q1": STANDARD.encode([0u8; 64]), "e": STANDARD.encode([1u8; 32])})),
    )
    .await;
    assert_eq!(off_curve["code"], 10001);

    // The digest must be exactly 32 bytes: longer and shorter both fail.
    let k1 = curve::random_scalar(&mut OsRng).unwrap();
    let q1 = curve::encode_point(&scalar_base_mul(&k1)).unwrap();
    let long_e = send(
        &app,
        "POST",
        "/api/sign",
        Some(&token),
        Some(json!({"q1": STANDARD.encode(q1), "e": STANDARD.encode([1u8; 33])})),
    )
    .await;
    assert_eq!(long_e["code"], 10001);

    let short_e = send(
        &app,
        "POST",
        "/api/sign",
        Some(&token),
        Some(json!({"q1": STANDARD.encode(q1), "e": STANDARD.encode([1u8; 10])})),
    )
    .await;
    assert_eq!(short_e["code"], 10001);
}

#[tokio::test]
async fn missing_share_is_reported_before_input_validation() {
    let app = test_app().await;

    // The bootstrapped admin has no key share.
    let token = login(&app, "admin", "please-change-password").await["data"]["token"]
        .as_str()
        .unwrap()
        .to_string();

    // Even a malformed payload yields key-not-found, not invalid-param.
    let signed = send(
        &app,
        "POST",
        "/api/sign",
        Some(&token),
        Some(json!({"q1": "@@not-base64@@", "e": ""})),
    )
    .await;
    assert_eq!(signed["code"], 10008);

    let decrypted = send(
        &app,
        "POST",
        "/api/decrypt",
        Some(&token),
        Some(json!({"t1": STANDARD.encode([1u8; 10])})),
    )
    .await;
    assert_eq!(decrypted["code"], 10008);
}

#[tokio::test]
async fn body_user_id_is_ignored() {
    let app = test_app().await;
    let alice = client_half();
    let bob = client_half();

    register(&app, "alice", "pw123456", &alice).await;
    let bob_registered = register(&app, "bob", "pw123456", &bob).await;
    let bob_id = bob_registered["data"]["userId"].as_str().unwrap().to_string();
    let bob_pa = bob_registered["data"]["publicKey"].as_str().unwrap().to_string();

    let alice_token = login(&app, "alice", "pw123456").await["data"]["token"]
        .as_str()
        .unwrap()
        .to_string();
    let bob_token = login(&app, "bob", "pw123456").await["data"]["token"]
        .as_str()
        .unwrap()
        .to_string();

    // Alice rekeys while claiming to be Bob; the session identity wins.
    let fresh = client_half();
    let reinit = send(
        &app,
        "POST",
        "/api/key/init",
        Some(&alice_token),
        Some(json!({"p1": fresh.p1, "userId": bob_id})),
    )
    .await;
    assert_eq!(reinit["code"], 0);

    // Bob's key is untouched.
    let bob_info = send(&app, "GET", "/api/user/info", Some(&bob_token), None).await;
    assert_eq!(bob_info["data"]["publicKey"], bob_pa.as_str());

    // Alice's key changed.
    let alice_info = send(&app, "GET", "/api/user/info", Some(&alice_token), None).await;
    assert_eq!(
        alice_info["data"]["publicKey"],
        reinit["data"]["publicKey"]
    );
}

#[tokio::test]
async fn decrypt_returns_a_point() {
    let app = test_app().await;
    let client = client_half();
    register(&app, "alice", "pw123456", &client).await;
    let token = login(&app, "alice", "pw123456").await["data"]["token"]
        .as_str()
        .unwrap()
        .to_string();

    let k = curve::random_scalar(&mut OsRng).unwrap();
    let t1 = curve::encode_point(&scalar_base_mul(&k)).unwrap();

    let decrypted = send(
        &app,
        "POST",
        "/api/decrypt",
        Some(&token),
        Some(json!({"t1": STANDARD.encode(t1)})),
    )
    .await;
    assert_eq!(decrypted["code"], 0);

    let t2 = STANDARD
        .decode(decrypted["data"]["t2"].as_str().unwrap())
        .unwrap();
    assert_eq!(t2.len(), 64);
    assert!(curve::decode_point(&t2).is_ok());
}

#[tokio::test]
async fn admin_surface_requires_admin_flag() {
    let app = test_app().await;
    let client = client_half();
    register(&app, "alice", "pw123456", &client).await;
    let alice_token = login(&app, "alice", "pw123456").await["data"]["token"]
        .as_str()
        .unwrap()
        .to_string();

    let forbidden = send(&app, "GET", "/mapi/users", Some(&alice_token), None).await;
    assert_eq!(forbidden["code"], 10013);

    let unauthenticated = send(&app, "GET", "/mapi/users", None, None).await;
    assert_eq!(unauthenticated["code"], 10012);

    // The bootstrapped admin gets through.
    let admin_token = login(&app, "admin", "please-change-password").await["data"]["token"]
        .as_str()
        .unwrap()
        .to_string();

    let users = send(&app, "GET", "/mapi/users", Some(&admin_token), None).await;
    assert_eq!(users["code"], 0);
    assert_eq!(users["data"]["total"], 2); // alice + admin
    assert_eq!(users["data"]["pageSize"], 10);

    let stats = send(&app, "GET", "/mapi/stats", Some(&admin_token), None).await;
    assert_eq!(stats["code"], 0);
    assert_eq!(stats["data"]["users"], 2);
    assert_eq!(stats["data"]["keys"], 1);

    let logs = send(
        &app,
        "GET",
        "/mapi/logs?action=register",
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(logs["code"], 0);
    assert_eq!(logs["data"]["total"], 1);

    // Key listing exposes only public fields.
    let keys = send(&app, "GET", "/mapi/keys", Some(&admin_token), None).await;
    assert_eq!(keys["code"], 0);
    let raw = keys.to_string();
    assert!(!raw.contains("\"d2\""));
    assert!(!raw.contains("d2Inv"));
}

#[tokio::test]
async fn deleted_user_loses_access() {
    let app = test_app().await;
    let client = client_half();

    let registered = register(&app, "alice", "pw123456", &client).await;
    let alice_id = registered["data"]["userId"].as_str().unwrap().to_string();
    let alice_token = login(&app, "alice", "pw123456").await["data"]["token"]
        .as_str()
        .unwrap()
        .to_string();
    let admin_token = login(&app, "admin", "please-change-password").await["data"]["token"]
        .as_str()
        .unwrap()
        .to_string();

    let deleted = send(
        &app,
        "DELETE",
        &format!("/mapi/users/{alice_id}"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(deleted["code"], 0);

    // The session cascade removed Alice's token.
    let k1 = curve::random_scalar(&mut OsRng).unwrap();
    let q1 = curve::encode_point(&scalar_base_mul(&k1)).unwrap();
    let sign_attempt = send(
        &app,
        "POST",
        "/api/sign",
        Some(&alice_token),
        Some(json!({"q1": STANDARD.encode(q1), "e": STANDARD.encode([1u8; 32])})),
    )
    .await;
    assert_eq!(sign_attempt["code"], 10005);
}
