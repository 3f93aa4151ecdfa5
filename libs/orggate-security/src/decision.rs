use crate::Capability;

/// Why a permission check was denied.
///
/// Reason codes are stable labels for logs and rejection bodies; they must
/// not leak whether the addressed resource exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// The relationship engine answered "no".
    NotPermitted,
    /// Programmatic keys are capped below `can_manage`.
    KeyCapabilityCeiling,
    /// The container is deactivated and the capability is not read.
    ContainerInactive,
    /// A key credential addressed a container other than its binding.
    ScopeMismatch,
    /// The relationship engine could not be reached; fail closed.
    EngineUnavailable,
}

impl DenyReason {
    /// Stable label for observability.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotPermitted => "not_permitted",
            Self::KeyCapabilityCeiling => "key_capability_ceiling",
            Self::ContainerInactive => "container_inactive",
            Self::ScopeMismatch => "scope_mismatch",
            Self::EngineUnavailable => "engine_unavailable",
        }
    }
}

/// Outcome of one authorization evaluation. Never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PermissionDecision {
    allowed: bool,
    capability: Capability,
    reason: Option<DenyReason>,
}

impl PermissionDecision {
    #[must_use]
    pub fn allow(capability: Capability) -> Self {
        Self {
            allowed: true,
            capability,
            reason: None,
        }
    }

    #[must_use]
    pub fn deny(capability: Capability, reason: DenyReason) -> Self {
        Self {
            allowed: false,
            capability,
            reason: Some(reason),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    #[inline]
    #[must_use]
    pub fn capability(&self) -> Capability {
        self.capability
    }

    #[inline]
    #[must_use]
    pub fn reason(&self) -> Option<DenyReason> {
        self.reason
    }
}
