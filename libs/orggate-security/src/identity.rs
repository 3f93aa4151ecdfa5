use uuid::Uuid;

/// Kind of resolved caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    /// Authenticated from a session token.
    User,
    /// Authenticated from a programmatic key.
    Key,
}

/// The resolved caller of one request.
///
/// Built by the credential validator and consumed by the permission
/// resolver; never stored beyond the request.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Identity {
    subject_id: Uuid,
    kind: IdentityKind,
    /// Root (tenant) binding, when the credential carries one.
    root_id: Option<Uuid>,
    /// Container binding for key identities; keys are valid for exactly
    /// one container.
    container_id: Option<Uuid>,
    platform_admin: bool,
    email: Option<String>,
}

impl Identity {
    /// Identity resolved from a session token.
    #[must_use]
    pub fn user(subject_id: Uuid, root_id: Option<Uuid>, platform_admin: bool) -> Self {
        Self {
            subject_id,
            kind: IdentityKind::User,
            root_id,
            container_id: None,
            platform_admin,
            email: None,
        }
    }

    /// Identity resolved from a programmatic key, bound to one container.
    #[must_use]
    pub fn key(subject_id: Uuid, container_id: Uuid, root_id: Uuid) -> Self {
        Self {
            subject_id,
            kind: IdentityKind::Key,
            root_id: Some(root_id),
            container_id: Some(container_id),
            platform_admin: false,
            email: None,
        }
    }

    /// Fixed synthetic identity injected when the gate runs with the
    /// development bypass enabled. Not valid outside non-production setups.
    #[must_use]
    pub fn synthetic_admin() -> Self {
        Self {
            subject_id: Uuid::nil(),
            kind: IdentityKind::User,
            root_id: None,
            container_id: None,
            platform_admin: true,
            email: Some("dev@localhost".to_owned()),
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn subject_id(&self) -> Uuid {
        self.subject_id
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> IdentityKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn root_id(&self) -> Option<Uuid> {
        self.root_id
    }

    #[inline]
    #[must_use]
    pub fn container_id(&self) -> Option<Uuid> {
        self.container_id
    }

    #[inline]
    #[must_use]
    pub fn is_platform_admin(&self) -> bool {
        self.platform_admin
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Whether this identity is a programmatic key.
    #[must_use]
    pub fn is_key(&self) -> bool {
        self.kind == IdentityKind::Key
    }
}
