use http::Method;

/// Class of operation a caller may perform on a container.
///
/// Capabilities are ordered: `Manage` implies `Write` implies `Read`.
/// The ordering itself is evaluated by the relationship engine; this type
/// only names the three relations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Read,
    Write,
    Manage,
}

impl Capability {
    /// Relation name used in the relationship engine's graph.
    #[must_use]
    pub fn relation(self) -> &'static str {
        match self {
            Self::Read => "can_read",
            Self::Write => "can_write",
            Self::Manage => "can_manage",
        }
    }

    /// Capability implied by an HTTP method.
    ///
    /// DELETE maps to manage; membership-mutation routes escalate POST to
    /// manage at the gate's route table, not here.
    #[must_use]
    pub fn from_method(method: &Method) -> Self {
        match *method {
            Method::DELETE => Self::Manage,
            Method::POST | Method::PUT | Method::PATCH => Self::Write,
            _ => Self::Read,
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.relation())
    }
}
