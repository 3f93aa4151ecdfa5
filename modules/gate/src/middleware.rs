//! The gate decision middleware.
//!
//! Per request: Unauthenticated → Authenticated → Resolved →
//! Allowed/Denied. Credential validation strictly precedes permission
//! work; the decision is computed fresh every time. Allowed requests are
//! forwarded with trusted identity headers; denied requests never reach
//! the downstream handler.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Request, State};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use orggate_directory::{Container, DirectoryService, domain::DomainError};
use orggate_security::{Capability, DenyReason, Identity};

use crate::auth::validator::{AuthFailure, CredentialValidator, scope_header};
use crate::config::GateConfig;
use crate::resolver::PermissionResolver;

/// Headers the downstream service trusts verbatim. Inbound copies are
/// always stripped before the gate decides anything.
pub const CALLER_ID_HEADER: &str = "x-caller-id";
pub const ROOT_ID_HEADER: &str = "x-root-id";
pub const CONTAINER_ID_HEADER: &str = "x-container-id";
pub const PLATFORM_ADMIN_HEADER: &str = "x-platform-admin";

const TRUSTED_HEADERS: [&str; 4] = [
    CALLER_ID_HEADER,
    ROOT_ID_HEADER,
    CONTAINER_ID_HEADER,
    PLATFORM_ADMIN_HEADER,
];

/// How a matched route names its target container and whether mutating
/// methods escalate to manage (membership and lifecycle routes).
#[derive(Clone, Copy, Debug, Default)]
struct RoutePolicy {
    scope_param: Option<&'static str>,
    escalate_to_manage: bool,
}

struct Inner {
    validator: CredentialValidator,
    resolver: PermissionResolver,
    directory: Arc<DirectoryService>,
    dev_mode: bool,
    public: matchit::Router<()>,
    scoped: matchit::Router<RoutePolicy>,
}

/// Shared state for [`gate_middleware`].
#[derive(Clone)]
pub struct GateState(Arc<Inner>);

impl GateState {
    /// Build the gate state, including the route policy tables.
    ///
    /// # Errors
    /// Route-pattern insertion failures (overlapping or malformed
    /// patterns), which are configuration bugs and fatal at startup.
    pub fn new(
        validator: CredentialValidator,
        resolver: PermissionResolver,
        directory: Arc<DirectoryService>,
        config: &GateConfig,
    ) -> anyhow::Result<Self> {
        let mut public = matchit::Router::new();
        for pattern in &config.public_routes {
            public
                .insert(pattern.clone(), ())
                .map_err(|e| anyhow::anyhow!("public route '{pattern}': {e}"))?;
        }

        let mut scoped = matchit::Router::new();
        let table: [(&str, RoutePolicy); 7] = [
            // Static segment, or the `{id}` pattern below swallows it.
            (
                "/v1/containers/lookup",
                RoutePolicy {
                    scope_param: None,
                    escalate_to_manage: false,
                },
            ),
            (
                "/v1/containers/{id}",
                RoutePolicy {
                    scope_param: Some("id"),
                    escalate_to_manage: false,
                },
            ),
            (
                "/v1/containers/{id}/children",
                RoutePolicy {
                    scope_param: Some("id"),
                    escalate_to_manage: false,
                },
            ),
            (
                "/v1/containers/{id}/ancestors",
                RoutePolicy {
                    scope_param: Some("id"),
                    escalate_to_manage: false,
                },
            ),
            (
                "/v1/containers/{id}/deactivate",
                RoutePolicy {
                    scope_param: Some("id"),
                    escalate_to_manage: true,
                },
            ),
            (
                "/v1/containers/{id}/members",
                RoutePolicy {
                    scope_param: Some("id"),
                    escalate_to_manage: true,
                },
            ),
            (
                "/v1/containers/{id}/members/{user_id}",
                RoutePolicy {
                    scope_param: Some("id"),
                    escalate_to_manage: true,
                },
            ),
        ];
        for (pattern, policy) in table {
            scoped
                .insert(pattern, policy)
                .map_err(|e| anyhow::anyhow!("scoped route '{pattern}': {e}"))?;
        }

        Ok(Self(Arc::new(Inner {
            validator,
            resolver,
            directory,
            dev_mode: config.dev_mode,
            public,
            scoped,
        })))
    }
}

fn reject(status: StatusCode, error: &'static str, message: &str) -> Response {
    (
        status,
        Json(serde_json::json!({ "error": error, "message": message })),
    )
        .into_response()
}

fn strip_trusted_headers(req: &mut Request) {
    for name in TRUSTED_HEADERS {
        req.headers_mut().remove(name);
    }
}

fn emit_identity_headers(req: &mut Request, identity: &Identity, container: Option<&Container>) {
    let headers = req.headers_mut();
    if let Ok(v) = HeaderValue::from_str(&identity.subject_id().to_string()) {
        headers.insert(CALLER_ID_HEADER, v);
    }
    let root_id = container.map(|c| c.root_id).or_else(|| identity.root_id());
    if let Some(root_id) = root_id {
        if let Ok(v) = HeaderValue::from_str(&root_id.to_string()) {
            headers.insert(ROOT_ID_HEADER, v);
        }
    }
    if let Some(container) = container {
        if let Ok(v) = HeaderValue::from_str(&container.id.to_string()) {
            headers.insert(CONTAINER_ID_HEADER, v);
        }
    }
    headers.insert(
        PLATFORM_ADMIN_HEADER,
        HeaderValue::from_static(if identity.is_platform_admin() {
            "true"
        } else {
            "false"
        }),
    );
}

/// Target container id for a request: `{id}` path segment first, the
/// scope header second.
fn target_container_id(
    inner: &Inner,
    req: &Request,
) -> Result<(Option<Uuid>, RoutePolicy), Response> {
    let path = req.uri().path();
    if let Ok(m) = inner.scoped.at(path) {
        let policy = *m.value;
        if let Some(param) = policy.scope_param {
            let raw = m.params.get(param).unwrap_or_default();
            let id = Uuid::parse_str(raw).map_err(|_| {
                reject(
                    StatusCode::BAD_REQUEST,
                    "invalid_scope",
                    "container id is not a valid uuid",
                )
            })?;
            return Ok((Some(id), policy));
        }
        return Ok((scope_header(req.headers()), policy));
    }
    Ok((scope_header(req.headers()), RoutePolicy::default()))
}

/// The gate. Installed with `axum::middleware::from_fn_with_state`.
pub async fn gate_middleware(
    State(state): State<GateState>,
    mut req: Request,
    next: Next,
) -> Response {
    let inner = &*state.0;

    // Nothing inbound may impersonate the gate's own headers.
    strip_trusted_headers(&mut req);

    if inner.public.at(req.uri().path()).is_ok() {
        return next.run(req).await;
    }

    // Development bypass: explicit configuration, synthetic identity.
    if inner.dev_mode {
        let identity = Identity::synthetic_admin();
        emit_identity_headers(&mut req, &identity, None);
        req.extensions_mut().insert(identity);
        return next.run(req).await;
    }

    let identity = match inner.validator.authenticate(req.headers()).await {
        Ok(identity) => identity,
        Err(AuthFailure::Credential(e)) => {
            return reject(StatusCode::UNAUTHORIZED, e.as_str(), &e.to_string());
        }
        Err(AuthFailure::Datastore(e)) => {
            tracing::error!(error = %e, "credential store unreachable, failing closed");
            return reject(
                StatusCode::SERVICE_UNAVAILABLE,
                "dependency_unavailable",
                "credential store unavailable",
            );
        }
    };

    let (target, policy) = match target_container_id(inner, &req) {
        Ok(v) => v,
        Err(response) => return response,
    };

    // Keys address exactly their bound container.
    if identity.is_key() && target != identity.container_id() {
        return reject(
            StatusCode::FORBIDDEN,
            DenyReason::ScopeMismatch.as_str(),
            "key is not valid for the addressed container",
        );
    }

    let container = match target {
        Some(id) => match inner.directory.get_container(id).await {
            Ok(container) => Some(container),
            Err(DomainError::ContainerNotFound { .. }) => {
                // Absent containers answer exactly like denied ones, so a
                // prober cannot learn which ids exist.
                return reject(
                    StatusCode::FORBIDDEN,
                    DenyReason::NotPermitted.as_str(),
                    "access denied",
                );
            }
            Err(DomainError::Database(e)) => {
                tracing::error!(error = %e, "container lookup failed, failing closed");
                return reject(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "dependency_unavailable",
                    "container store unavailable",
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "container lookup failed");
                return reject(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "internal error",
                );
            }
        },
        None => None,
    };

    let mut capability = Capability::from_method(req.method());
    if policy.escalate_to_manage && capability != Capability::Read {
        capability = Capability::Manage;
    }

    if let Some(container) = &container {
        let decision = inner.resolver.check(&identity, container, capability).await;
        if !decision.is_allowed() {
            let reason = decision.reason().unwrap_or(DenyReason::NotPermitted);
            tracing::debug!(
                caller_id = %identity.subject_id(),
                container_id = %container.id,
                capability = %capability,
                reason = reason.as_str(),
                "request denied"
            );
            let status = match reason {
                DenyReason::EngineUnavailable => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::FORBIDDEN,
            };
            return reject(status, reason.as_str(), "access denied");
        }
    }

    emit_identity_headers(&mut req, &identity, container.as_ref());
    req.extensions_mut().insert(identity);
    next.run(req).await
}
