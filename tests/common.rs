// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Test configuration, session tokens, stub collaborators and local stub servers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]
//! Shared test utilities for `maas_workflow_creator`
//!
//! Every test app runs against a real SQLite database and the real router.
//! The generation backend and email delivery are in-process stubs; the agent
//! is a local HTTP server when a test needs one.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use jsonwebtoken::{encode, EncodingKey, Header};
use maas_workflow_creator::config::{
    AgentConfig, BackendConfig, CorsConfig, CreditsConfig, DatabaseConfig, DatabaseUrl,
    EmailConfig, Environment, IdentityConfig, LogLevel, SecretString, ServerConfig, SessionKey,
};
use maas_workflow_creator::context::{ServerComponents, ServerContext};
use maas_workflow_creator::database::Database;
use maas_workflow_creator::errors::{AppError, AppResult};
use maas_workflow_creator::generation::{DispatchRequest, GenerationBackend};
use maas_workflow_creator::identity::{SessionTokenProvider, SvixVerifier};
use maas_workflow_creator::models::User;
use maas_workflow_creator::notifications::{EmailMessage, EmailSender};
use maas_workflow_creator::server::build_router;
use serde_json::json;
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const TEST_SESSION_SECRET: &str = "session-secret";
pub const TEST_IDENTITY_SECRET: &str = "whsec_dGVzdC1zZWNyZXQ=";
pub const TEST_BACKEND_SECRET: &str = "backend-secret";
pub const TEST_APP_URL: &str = "http://maas.test";
pub const TEST_INITIAL_BALANCE: i64 = 5;

/// Nothing listens here, connections are refused immediately
pub const UNREACHABLE_AGENT_URL: &str = "http://127.0.0.1:9/agent";

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Configuration pointing at local stubs
pub fn test_config(agent_url: &str, database: DatabaseUrl) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_owned(),
        http_port: 0,
        app_url: TEST_APP_URL.to_owned(),
        environment: Environment::Testing,
        log_level: LogLevel::Warn,
        database: DatabaseConfig { url: database },
        cors: CorsConfig {
            allowed_origins: vec!["*".to_owned()],
        },
        identity: IdentityConfig {
            webhook_secret: SecretString::new(TEST_IDENTITY_SECRET),
            session_key: SessionKey::Secret(SecretString::new(TEST_SESSION_SECRET)),
            session_issuer: None,
            signature_tolerance_secs: 300,
        },
        backend: BackendConfig {
            webhook_url: "http://127.0.0.1:9/generate".to_owned(),
            webhook_secret: SecretString::new(TEST_BACKEND_SECRET),
            dispatch_timeout_secs: 5,
        },
        agent: AgentConfig {
            webhook_url: agent_url.to_owned(),
            timeout_secs: 5,
            probe_timeout_secs: 2,
        },
        email: EmailConfig {
            resend_api_key: Some(SecretString::new("re_test")),
            api_url: "http://127.0.0.1:9".to_owned(),
            from: "MaaS Workflow Creator <onboarding@maas.test>".to_owned(),
            notifications_from: "MaaS Workflow Creator <notifications@maas.test>".to_owned(),
            send_welcome_email: true,
            timeout_secs: 2,
        },
        credits: CreditsConfig {
            initial_balance: TEST_INITIAL_BALANCE,
        },
    }
}

/// HS256 session token for a user, valid for an hour
pub fn session_token(external_id: &str, email: Option<&str>) -> String {
    let now = chrono::Utc::now().timestamp();
    sign_claims(&json!({
        "sub": external_id,
        "email": email,
        "first_name": "Ada",
        "last_name": "Lovelace",
        "iat": now,
        "exp": now + 3600,
    }))
}

/// Session token that expired an hour ago
pub fn expired_session_token(external_id: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    sign_claims(&json!({
        "sub": external_id,
        "iat": now - 7200,
        "exp": now - 3600,
    }))
}

fn sign_claims(claims: &serde_json::Value) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(TEST_SESSION_SECRET.as_bytes()),
    )
    .expect("Failed to sign session token")
}

/// Svix headers for a payload signed with the test identity secret
pub fn signed_identity_headers(payload: &[u8]) -> Vec<(&'static str, String)> {
    let verifier = SvixVerifier::new(&SecretString::new(TEST_IDENTITY_SECRET), 300)
        .expect("Failed to build verifier");
    let timestamp = chrono::Utc::now().timestamp();
    let msg_id = format!("msg_{}", uuid::Uuid::new_v4().simple());
    let signature = verifier
        .sign(&msg_id, timestamp, payload)
        .expect("Failed to sign payload");
    vec![
        ("svix-id", msg_id),
        ("svix-timestamp", timestamp.to_string()),
        ("svix-signature", signature),
    ]
}

/// How the stub backend answers dispatches
#[derive(Debug, Clone)]
pub enum DispatchBehavior {
    /// A fresh correlation id per call
    Accept,
    /// The same correlation id every time
    Fixed(String),
    /// A retryable upstream error
    Fail,
}

/// In-process generation backend recording every dispatch
pub struct StubBackend {
    behavior: DispatchBehavior,
    counter: AtomicUsize,
    calls: Mutex<Vec<DispatchRequest>>,
}

impl StubBackend {
    pub fn new(behavior: DispatchBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            counter: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn accepting() -> Arc<Self> {
        Self::new(DispatchBehavior::Accept)
    }

    pub fn failing() -> Arc<Self> {
        Self::new(DispatchBehavior::Fail)
    }

    pub fn calls(&self) -> Vec<DispatchRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationBackend for StubBackend {
    async fn dispatch(&self, request: &DispatchRequest) -> AppResult<String> {
        self.calls.lock().unwrap().push(request.clone());
        match &self.behavior {
            DispatchBehavior::Accept => {
                let n = self.counter.fetch_add(1, Ordering::SeqCst);
                Ok(format!("wc_{n}"))
            }
            DispatchBehavior::Fixed(id) => Ok(id.clone()),
            DispatchBehavior::Fail => Err(AppError::external_service(
                "generation backend",
                "responded with status 500 Internal Server Error",
            )),
        }
    }
}

/// Email sender that keeps every message in memory
#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingEmailSender {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Wait until at least `count` messages arrived or a second passed
    pub async fn wait_for(&self, count: usize) -> Vec<EmailMessage> {
        for _ in 0..50 {
            if self.sent.lock().unwrap().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.sent()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// A fully wired application with stubbed collaborators
pub struct TestApp {
    pub context: Arc<ServerContext>,
    pub backend: Arc<StubBackend>,
    pub emails: Arc<RecordingEmailSender>,
    _dir: Option<TempDir>,
}

impl TestApp {
    /// In-memory database, accepting backend, unreachable agent
    pub async fn new() -> Self {
        Self::with_backend(StubBackend::accepting()).await
    }

    pub async fn with_backend(backend: Arc<StubBackend>) -> Self {
        Self::build(backend, UNREACHABLE_AGENT_URL, DatabaseUrl::Memory, None).await
    }

    pub async fn with_agent(agent_url: &str) -> Self {
        Self::build(StubBackend::accepting(), agent_url, DatabaseUrl::Memory, None).await
    }

    /// File database with a real connection pool
    pub async fn with_file_database(backend: Arc<StubBackend>) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path: PathBuf = dir.path().join("maas.db");
        Self::build(
            backend,
            UNREACHABLE_AGENT_URL,
            DatabaseUrl::SQLite { path },
            Some(dir),
        )
        .await
    }

    async fn build(
        backend: Arc<StubBackend>,
        agent_url: &str,
        database_url: DatabaseUrl,
        dir: Option<TempDir>,
    ) -> Self {
        init_test_logging();
        let config = test_config(agent_url, database_url);
        let database = Database::new(&config.database.url.to_connection_string())
            .await
            .expect("Failed to open test database");
        let identity =
            SessionTokenProvider::new(&config.identity).expect("Failed to build identity provider");
        let emails = Arc::new(RecordingEmailSender::default());

        let components = ServerComponents {
            database,
            identity: Arc::new(identity),
            backend: Arc::clone(&backend) as Arc<dyn GenerationBackend>,
            email: Some(Arc::clone(&emails) as Arc<dyn EmailSender>),
        };
        let context = Arc::new(ServerContext::from_components(config, components));

        Self {
            context,
            backend,
            emails,
            _dir: dir,
        }
    }

    /// Router with the full middleware stack
    pub fn router(&self) -> Router {
        build_router(&self.context)
    }

    pub fn database(&self) -> &Database {
        self.context.data().database()
    }

    /// Insert a user with the given balance
    pub async fn seed_user(&self, external_id: &str, balance: i64) -> User {
        self.database()
            .upsert_user(
                external_id,
                Some(&format!("{external_id}@example.com")),
                Some("Ada Lovelace"),
                balance,
            )
            .await
            .expect("Failed to seed user")
            .user
    }

    /// Current state of a user
    pub async fn user(&self, external_id: &str) -> User {
        self.database()
            .get_user_by_external_id(external_id)
            .await
            .expect("Failed to load user")
            .expect("User not found")
    }
}

/// Serve a router on an ephemeral local port and return its base URL
pub async fn spawn_stub_server(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub server");
    let addr = listener.local_addr().expect("Stub server has no address");
    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Stub server failed");
    });
    format!("http://{addr}")
}
