#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end tests for the gate decision middleware over an in-memory
//! stack: sqlite, the in-memory relationship engine and an echo handler
//! standing in for the downstream service.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::Request;
use axum::http::{Method, StatusCode, header};
use axum::response::Json;
use axum::{Router, middleware};
use chrono::Utc;
use http_body_util::BodyExt;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tower::ServiceExt;
use uuid::Uuid;

use orggate_directory::infra::storage::migrations::Migrator as DirectoryMigrator;
use orggate_directory::{Container, DirectoryService, HierarchyConfig, LevelConfig, NewContainer};
use orggate_gate::auth::session::SessionClaims;
use orggate_gate::auth::{CredentialValidator, KeyStore, SessionValidator};
use orggate_gate::config::{CheckRetryConfig, GateConfig, SessionConfig};
use orggate_gate::infra::storage::migrations::Migrator as GateMigrator;
use orggate_gate::middleware::{GateState, gate_middleware};
use orggate_gate::resolver::PermissionResolver;
use orggate_rebac::{InMemoryRelationEngine, RelationEngine, UnavailableEngine};
use orggate_security::Identity;

const SECRET: &str = "gate-test-secret";

async fn echo(req: Request) -> Json<serde_json::Value> {
    let h = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    Json(serde_json::json!({
        "caller": h("x-caller-id"),
        "root": h("x-root-id"),
        "container": h("x-container-id"),
        "admin": h("x-platform-admin"),
    }))
}

struct Env {
    db: DatabaseConnection,
    engine: Arc<InMemoryRelationEngine>,
    directory: Arc<DirectoryService>,
    issuer: KeyStore,
}

impl Env {
    async fn new() -> Self {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        DirectoryMigrator::up(&db, None).await.unwrap();
        GateMigrator::up(&db, None).await.unwrap();

        let hierarchy = Arc::new(
            HierarchyConfig::new(vec![
                LevelConfig {
                    name: "organization".to_owned(),
                    display_name: "Organization".to_owned(),
                    roles: vec!["admin".to_owned(), "member".to_owned(), "viewer".to_owned()],
                    root: true,
                },
                LevelConfig {
                    name: "workspace".to_owned(),
                    display_name: "Workspace".to_owned(),
                    roles: vec!["admin".to_owned(), "member".to_owned(), "viewer".to_owned()],
                    root: false,
                },
            ])
            .unwrap(),
        );

        let engine = Arc::new(InMemoryRelationEngine::new());
        let directory = Arc::new(DirectoryService::new(
            db.clone(),
            hierarchy,
            engine.clone(),
            false,
        ));
        let issuer = KeyStore::new(db.clone(), Duration::ZERO);

        Self {
            db,
            engine,
            directory,
            issuer,
        }
    }

    fn config(dev_mode: bool) -> GateConfig {
        GateConfig {
            dev_mode,
            session: SessionConfig {
                secret: SECRET.to_owned(),
                leeway_secs: 0,
            },
            key_cache_ttl_secs: 0,
            public_routes: vec!["/healthz".to_owned()],
            check_retry: CheckRetryConfig {
                max_attempts: 2,
                initial_ms: 1,
                max_ms: 1,
            },
        }
    }

    fn app_with_engine(&self, dev_mode: bool, engine: Arc<dyn RelationEngine>) -> Router {
        let config = Self::config(dev_mode);
        let validator = CredentialValidator::new(
            SessionValidator::new(&config.session),
            KeyStore::new(self.db.clone(), Duration::ZERO),
        );
        let resolver = PermissionResolver::new(engine, config.check_retry.to_policy());
        let state =
            GateState::new(validator, resolver, self.directory.clone(), &config).unwrap();

        Router::new()
            .fallback(echo)
            .layer(middleware::from_fn_with_state(state, gate_middleware))
    }

    fn app(&self, dev_mode: bool) -> Router {
        self.app_with_engine(dev_mode, self.engine.clone())
    }

    async fn seed_org(&self, creator: Uuid) -> Container {
        self.directory
            .create_container(
                &Identity::user(creator, None, false),
                NewContainer {
                    level: "organization".to_owned(),
                    slug: "acme".to_owned(),
                    display_name: "Acme".to_owned(),
                    parent_id: None,
                    metadata: None,
                },
            )
            .await
            .unwrap()
    }
}

fn token_for(sub: Uuid, tenant_id: Option<Uuid>, admin: bool, exp_offset: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = SessionClaims {
        sub,
        email: Some("u@example.com".to_owned()),
        tenant_id,
        admin,
        exp: now + exp_offset,
        iat: now,
    };
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn request(method: Method, path: &str, token: Option<&str>, scope: Option<Uuid>) -> Request {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    if let Some(scope) = scope {
        builder = builder.header("x-scope-id", scope.to_string());
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(app: &Router, req: Request) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn public_route_bypasses_credentials() {
    let env = Env::new().await;
    let app = env.app(false);

    let (status, _) = send(&app, request(Method::GET, "/healthz", None, None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn missing_credential_is_401() {
    let env = Env::new().await;
    let app = env.app(false);

    let (status, body) = send(
        &app,
        request(Method::GET, "/v1/anything", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing_credential");
}

#[tokio::test]
async fn expired_session_is_401() {
    let env = Env::new().await;
    let app = env.app(false);
    let token = token_for(Uuid::new_v4(), None, false, -600);

    let (status, body) = send(
        &app,
        request(Method::GET, "/v1/anything", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "expired_credential");
}

#[tokio::test]
async fn allowed_request_carries_trusted_headers() {
    let env = Env::new().await;
    let creator = Uuid::new_v4();
    let org = env.seed_org(creator).await;
    let app = env.app(false);
    let token = token_for(creator, Some(org.id), false, 600);

    let (status, body) = send(
        &app,
        request(
            Method::GET,
            &format!("/v1/containers/{}", org.id),
            Some(&token),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["caller"], creator.to_string());
    assert_eq!(body["root"], org.id.to_string());
    assert_eq!(body["container"], org.id.to_string());
    assert_eq!(body["admin"], "false");
}

#[tokio::test]
async fn inbound_trusted_headers_are_stripped() {
    let env = Env::new().await;
    let creator = Uuid::new_v4();
    let org = env.seed_org(creator).await;
    let app = env.app(false);
    let token = token_for(creator, None, false, 600);

    let mut req = request(
        Method::GET,
        &format!("/v1/containers/{}", org.id),
        Some(&token),
        None,
    );
    req.headers_mut().insert(
        "x-caller-id",
        Uuid::new_v4().to_string().parse().unwrap(),
    );
    req.headers_mut()
        .insert("x-platform-admin", "true".parse().unwrap());

    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["caller"], creator.to_string());
    assert_eq!(body["admin"], "false");
}

#[tokio::test]
async fn stranger_is_denied_403() {
    let env = Env::new().await;
    let org = env.seed_org(Uuid::new_v4()).await;
    let app = env.app(false);
    let token = token_for(Uuid::new_v4(), None, false, 600);

    let (status, body) = send(
        &app,
        request(
            Method::GET,
            &format!("/v1/containers/{}", org.id),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "not_permitted");
}

#[tokio::test]
async fn platform_admin_bypasses_container_checks() {
    let env = Env::new().await;
    let org = env.seed_org(Uuid::new_v4()).await;
    let app = env.app(false);
    let token = token_for(Uuid::new_v4(), None, true, 600);

    let (status, body) = send(
        &app,
        request(
            Method::DELETE,
            &format!("/v1/containers/{}", org.id),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["admin"], "true");
}

#[tokio::test]
async fn unknown_container_answers_like_a_denied_one() {
    let env = Env::new().await;
    let org = env.seed_org(Uuid::new_v4()).await;
    let app = env.app(false);
    let token = token_for(Uuid::new_v4(), None, false, 600);

    let (missing_status, missing_body) = send(
        &app,
        request(
            Method::GET,
            &format!("/v1/containers/{}", Uuid::new_v4()),
            Some(&token),
            None,
        ),
    )
    .await;
    let (denied_status, denied_body) = send(
        &app,
        request(
            Method::GET,
            &format!("/v1/containers/{}", org.id),
            Some(&token),
            None,
        ),
    )
    .await;

    // A prober cannot tell absent containers from forbidden ones.
    assert_eq!(missing_status, StatusCode::FORBIDDEN);
    assert_eq!(missing_status, denied_status);
    assert_eq!(missing_body, denied_body);
    assert_eq!(missing_body["error"], "not_permitted");
}

#[tokio::test]
async fn lookup_route_is_not_swallowed_by_the_id_pattern() {
    let env = Env::new().await;
    let app = env.app(false);
    let token = token_for(Uuid::new_v4(), None, false, 600);

    let (status, _) = send(
        &app,
        request(
            Method::GET,
            "/v1/containers/lookup?level=organization&slug=acme",
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn module_migrators_share_one_database() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    DirectoryMigrator::up(&db, None).await.unwrap();
    GateMigrator::up(&db, None).await.unwrap();

    // Re-running either is idempotent.
    DirectoryMigrator::up(&db, None).await.unwrap();
    GateMigrator::up(&db, None).await.unwrap();
}

#[tokio::test]
async fn membership_mutation_escalates_to_manage() {
    let env = Env::new().await;
    let creator = Uuid::new_v4();
    let viewer = Uuid::new_v4();
    let org = env.seed_org(creator).await;
    env.directory
        .add_member(viewer, org.id, "viewer".to_owned())
        .await
        .unwrap();
    let app = env.app(false);

    // Viewers read members fine.
    let token = token_for(viewer, None, false, 600);
    let (status, _) = send(
        &app,
        request(
            Method::GET,
            &format!("/v1/containers/{}/members", org.id),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Mutating the member list needs manage, which a viewer lacks.
    let (status, body) = send(
        &app,
        request(
            Method::POST,
            &format!("/v1/containers/{}/members", org.id),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "not_permitted");
}

#[tokio::test]
async fn key_reads_and_writes_but_never_manages() {
    let env = Env::new().await;
    let creator = Uuid::new_v4();
    let org = env.seed_org(creator).await;
    let issued = env.issuer.issue(creator, org.id, org.id).await.unwrap();
    let app = env.app(false);

    let (status, _) = send(
        &app,
        request(
            Method::GET,
            &format!("/v1/containers/{}", org.id),
            Some(&issued.token),
            Some(org.id),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The key acts as the org admin, yet manage is capped.
    let (status, body) = send(
        &app,
        request(
            Method::DELETE,
            &format!("/v1/containers/{}", org.id),
            Some(&issued.token),
            Some(org.id),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "key_capability_ceiling");
}

#[tokio::test]
async fn key_without_scope_header_is_401() {
    let env = Env::new().await;
    let creator = Uuid::new_v4();
    let org = env.seed_org(creator).await;
    let issued = env.issuer.issue(creator, org.id, org.id).await.unwrap();
    let app = env.app(false);

    let (status, body) = send(
        &app,
        request(
            Method::GET,
            &format!("/v1/containers/{}", org.id),
            Some(&issued.token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "malformed_credential");
}

#[tokio::test]
async fn key_addressing_foreign_container_is_403() {
    let env = Env::new().await;
    let creator = Uuid::new_v4();
    let org = env.seed_org(creator).await;
    let other = Uuid::new_v4();
    let issued = env.issuer.issue(creator, other, other).await.unwrap();
    let app = env.app(false);

    let (status, body) = send(
        &app,
        request(
            Method::GET,
            &format!("/v1/containers/{}", org.id),
            Some(&issued.token),
            Some(other),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "scope_mismatch");
}

#[tokio::test]
async fn revoked_key_is_401() {
    let env = Env::new().await;
    let creator = Uuid::new_v4();
    let org = env.seed_org(creator).await;
    let issued = env.issuer.issue(creator, org.id, org.id).await.unwrap();
    env.issuer.revoke(&issued.record.key_id).await.unwrap();
    let app = env.app(false);

    let (status, body) = send(
        &app,
        request(
            Method::GET,
            &format!("/v1/containers/{}", org.id),
            Some(&issued.token),
            Some(org.id),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "revoked_key");
}

#[tokio::test]
async fn wrong_key_secret_is_401() {
    let env = Env::new().await;
    let creator = Uuid::new_v4();
    let org = env.seed_org(creator).await;
    let issued = env.issuer.issue(creator, org.id, org.id).await.unwrap();
    let forged = format!("sk-{}-forgedsecret", issued.record.key_id);
    let app = env.app(false);

    let (status, body) = send(
        &app,
        request(
            Method::GET,
            &format!("/v1/containers/{}", org.id),
            Some(&forged),
            Some(org.id),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_signature");
}

#[tokio::test]
async fn unreachable_engine_fails_closed_with_503() {
    let env = Env::new().await;
    let creator = Uuid::new_v4();
    let org = env.seed_org(creator).await;
    let app = env.app_with_engine(false, Arc::new(UnavailableEngine));
    let token = token_for(creator, None, false, 600);

    let (status, body) = send(
        &app,
        request(
            Method::GET,
            &format!("/v1/containers/{}", org.id),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "engine_unavailable");
}

#[tokio::test]
async fn dev_mode_injects_synthetic_admin() {
    let env = Env::new().await;
    let app = env.app(true);

    let (status, body) = send(
        &app,
        request(Method::GET, "/v1/anything", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["caller"], Uuid::nil().to_string());
    assert_eq!(body["admin"], "true");
}
