//! Permission resolution.
//!
//! Inheritance lives in the relationship engine; this resolver applies the
//! local short-circuits (platform admin, key ceiling, deactivated
//! container) and issues one point check, retried with bounded backoff.
//! Engine failure is a deny, never an allow.

use std::sync::Arc;

use orggate_directory::Container;
use orggate_rebac::{CheckRetry, RelationEngine, object_container, subject_user};
use orggate_security::{Capability, DenyReason, Identity, PermissionDecision};

pub struct PermissionResolver {
    engine: Arc<dyn RelationEngine>,
    retry: CheckRetry,
}

impl PermissionResolver {
    #[must_use]
    pub fn new(engine: Arc<dyn RelationEngine>, retry: CheckRetry) -> Self {
        Self { engine, retry }
    }

    /// Decide whether `identity` may exercise `capability` on `container`.
    pub async fn check(
        &self,
        identity: &Identity,
        container: &Container,
        capability: Capability,
    ) -> PermissionDecision {
        if identity.is_platform_admin() {
            return PermissionDecision::allow(capability);
        }
        if identity.is_key() && capability == Capability::Manage {
            return PermissionDecision::deny(capability, DenyReason::KeyCapabilityCeiling);
        }
        if !container.active && capability != Capability::Read {
            return PermissionDecision::deny(capability, DenyReason::ContainerInactive);
        }

        let subject = subject_user(identity.subject_id());
        let object = object_container(container.id);
        let mut attempt: u32 = 0;
        loop {
            match self
                .engine
                .check(&subject, capability.relation(), &object)
                .await
            {
                Ok(true) => return PermissionDecision::allow(capability),
                Ok(false) => {
                    return PermissionDecision::deny(capability, DenyReason::NotPermitted);
                }
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.retry.max_attempts {
                        tracing::warn!(
                            error = %e,
                            container_id = %container.id,
                            relation = capability.relation(),
                            "relation engine unreachable, failing closed"
                        );
                        return PermissionDecision::deny(
                            capability,
                            DenyReason::EngineUnavailable,
                        );
                    }
                    self.retry.wait(attempt - 1).await;
                }
            }
        }
    }
}
