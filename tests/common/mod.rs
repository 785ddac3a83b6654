// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use githide::config::Config;
use githide::db::{DocumentStore, FirestoreDb, MemoryStore};
use githide::models::User;
use githide::routes::create_router;
use githide::services::FirebaseTokenVerifier;
use githide::AppState;
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_PROJECT: &str = "test-project";
pub const TEST_KID: &str = "test-key-1";
pub const STATIC_TOKEN: &str = "test_static_token";

const SIGNING_KEY_PEM: &[u8] = include_bytes!("../fixtures/test_signing_key.pem");
const PUBLIC_KEY_PEM: &[u8] = include_bytes!("../fixtures/test_signing_key.pub.pem");

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new(TEST_PROJECT)
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Verifier that trusts the fixture key instead of Google's JWKS.
pub fn test_verifier() -> FirebaseTokenVerifier {
    let key = DecodingKey::from_rsa_pem(PUBLIC_KEY_PEM).expect("fixture public key");
    FirebaseTokenVerifier::new_with_static_key(TEST_PROJECT, TEST_KID, key)
        .expect("static key verifier")
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Sign arbitrary claims with the fixture key.
#[allow(dead_code)]
pub fn sign_claims(claims: &Value, kid: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(SIGNING_KEY_PEM).expect("fixture signing key");
    encode(&header, claims, &key).unwrap()
}

/// Standard Firebase ID token claims for `uid`.
#[allow(dead_code)]
pub fn id_token_claims(uid: &str, email: Option<&str>) -> Value {
    let now = now_secs();
    let mut claims = json!({
        "iss": format!("https://securetoken.google.com/{TEST_PROJECT}"),
        "aud": TEST_PROJECT,
        "sub": uid,
        "user_id": uid,
        "iat": now,
        "auth_time": now,
        "exp": now + 3600,
    });
    if let Some(email) = email {
        claims["email"] = json!(email);
        claims["email_verified"] = json!(true);
    }
    claims
}

/// A valid ID token for `uid` / `email`.
#[allow(dead_code)]
pub fn create_test_token(uid: &str, email: &str) -> String {
    sign_claims(&id_token_claims(uid, Some(email)), TEST_KID)
}

/// An ID token that expired well outside the allowed clock skew.
#[allow(dead_code)]
pub fn create_expired_token(uid: &str, email: &str) -> String {
    let mut claims = id_token_claims(uid, Some(email));
    let now = now_secs();
    claims["iat"] = json!(now - 7200);
    claims["auth_time"] = json!(now - 7200);
    claims["exp"] = json!(now - 3600);
    sign_claims(&claims, TEST_KID)
}

/// Router over an in-memory store, with storage in a temp directory.
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
    _storage: TempDir,
}

#[allow(dead_code)]
impl TestApp {
    pub fn new() -> Self {
        Self::with_config(Config::test_default())
    }

    pub fn with_config(mut config: Config) -> Self {
        let storage = TempDir::new().unwrap();
        config.storage_dir = storage.path().to_path_buf();

        let store = Arc::new(MemoryStore::new());
        let state = Arc::new(AppState::new(
            config,
            store.clone(),
            Arc::new(test_verifier()),
        ));

        Self {
            router: create_router(state.clone()),
            state,
            store,
            _storage: storage,
        }
    }

    /// Insert a user document directly.
    pub async fn seed_user(&self, uid: &str, email: &str) -> User {
        let user = User::new(uid, email, "", "", "2026-01-01T00:00:00.000Z");
        self.store.put_user(user.clone()).await;
        user
    }

    pub async fn user(&self, uid: &str) -> User {
        self.store.get_user(uid).await.unwrap().expect("user exists")
    }

    /// Send a request with an optional bearer token and JSON body.
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    /// Send raw bytes and return the raw response body.
    pub async fn send_bytes(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Vec<u8>,
    ) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = builder
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(Body::from(body))
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    /// Create a repository through the API and return its id.
    pub async fn create_repository(&self, token: &str, name: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/api/v1/repositories",
                Some(token),
                Some(json!({ "name": name, "description": "" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
        body["id"].as_str().unwrap().to_string()
    }
}
