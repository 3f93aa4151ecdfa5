//! Declarative hierarchy configuration.
//!
//! Levels form a strict linear chain (tenant → workspace → …), loaded once
//! at process start and immutable thereafter. Validation failure is fatal
//! at startup; the chain is never hot-reloaded.

use std::collections::HashSet;

use thiserror::Error;

/// One level of the organizational hierarchy, as declared in config.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct LevelConfig {
    /// Stable level name, e.g. `tenant` or `workspace`.
    pub name: String,
    /// Human-facing label.
    #[serde(default)]
    pub display_name: String,
    /// Role names valid at this level, most privileged first.
    pub roles: Vec<String>,
    /// Marks the root level. Exactly one level carries this flag.
    #[serde(default)]
    pub root: bool,
}

/// Hierarchy configuration errors; all fatal at startup.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("hierarchy must declare at least one level")]
    Empty,

    #[error("duplicate level name: {0}")]
    DuplicateLevel(String),

    #[error("level '{0}' declares no roles")]
    NoRoles(String),

    #[error("exactly one root level required, found {0}")]
    RootCount(usize),

    #[error("root level must be the first level in the chain, found '{0}' at position {1}")]
    RootNotFirst(String, usize),
}

/// Validated, immutable level chain.
#[derive(Clone, Debug)]
pub struct HierarchyConfig {
    levels: Vec<LevelConfig>,
}

impl HierarchyConfig {
    /// Validate and freeze a level chain.
    ///
    /// # Errors
    /// Returns `HierarchyError` when the chain is malformed: no levels,
    /// duplicate names, a level without roles, or anything but exactly one
    /// root at the head of the chain.
    pub fn new(levels: Vec<LevelConfig>) -> Result<Self, HierarchyError> {
        if levels.is_empty() {
            return Err(HierarchyError::Empty);
        }

        let mut seen = HashSet::new();
        for level in &levels {
            if !seen.insert(level.name.as_str()) {
                return Err(HierarchyError::DuplicateLevel(level.name.clone()));
            }
            if level.roles.is_empty() {
                return Err(HierarchyError::NoRoles(level.name.clone()));
            }
        }

        let roots: Vec<usize> = levels
            .iter()
            .enumerate()
            .filter(|(_, l)| l.root)
            .map(|(i, _)| i)
            .collect();
        match roots.as_slice() {
            [0] => {}
            [pos] => {
                return Err(HierarchyError::RootNotFirst(levels[*pos].name.clone(), *pos));
            }
            other => return Err(HierarchyError::RootCount(other.len())),
        }

        Ok(Self { levels })
    }

    /// Level by name.
    #[must_use]
    pub fn level(&self, name: &str) -> Option<&LevelConfig> {
        self.levels.iter().find(|l| l.name == name)
    }

    /// Parent level of `name` in the chain, `None` for the root.
    #[must_use]
    pub fn parent_level(&self, name: &str) -> Option<&LevelConfig> {
        let idx = self.levels.iter().position(|l| l.name == name)?;
        if idx == 0 {
            None
        } else {
            self.levels.get(idx - 1)
        }
    }

    /// Child level of `name` in the chain, `None` for the leaf level.
    #[must_use]
    pub fn child_level(&self, name: &str) -> Option<&LevelConfig> {
        let idx = self.levels.iter().position(|l| l.name == name)?;
        self.levels.get(idx + 1)
    }

    /// Number of levels in the chain.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// The root level.
    #[must_use]
    pub fn root_level(&self) -> &LevelConfig {
        // Validated in `new`: the chain is non-empty and the head is root.
        &self.levels[0]
    }

    /// Whether `role` is valid at `level`.
    #[must_use]
    pub fn is_valid_role(&self, level: &str, role: &str) -> bool {
        self.level(level)
            .is_some_and(|l| l.roles.iter().any(|r| r == role))
    }

    /// Most privileged role of a level (first in the configured list).
    #[must_use]
    pub fn most_privileged_role(&self, level: &str) -> Option<&str> {
        self.level(level).and_then(|l| l.roles.first().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn level(name: &str, roles: &[&str], root: bool) -> LevelConfig {
        LevelConfig {
            name: name.to_owned(),
            display_name: name.to_owned(),
            roles: roles.iter().map(|r| (*r).to_owned()).collect(),
            root,
        }
    }

    fn two_level() -> HierarchyConfig {
        HierarchyConfig::new(vec![
            level("tenant", &["admin", "member"], true),
            level("workspace", &["admin", "member", "viewer"], false),
        ])
        .unwrap()
    }

    #[test]
    fn chain_navigation() {
        let h = two_level();
        assert_eq!(h.depth(), 2);
        assert_eq!(h.root_level().name, "tenant");
        assert_eq!(h.parent_level("workspace").map(|l| l.name.as_str()), Some("tenant"));
        assert!(h.parent_level("tenant").is_none());
        assert_eq!(h.child_level("tenant").map(|l| l.name.as_str()), Some("workspace"));
        assert!(h.child_level("workspace").is_none());
        assert!(h.level("project").is_none());
    }

    #[test]
    fn role_lookup() {
        let h = two_level();
        assert!(h.is_valid_role("workspace", "viewer"));
        assert!(!h.is_valid_role("tenant", "viewer"));
        assert_eq!(h.most_privileged_role("tenant"), Some("admin"));
    }

    #[test]
    fn rejects_empty_chain() {
        assert_eq!(HierarchyConfig::new(vec![]).unwrap_err(), HierarchyError::Empty);
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = HierarchyConfig::new(vec![
            level("tenant", &["admin"], true),
            level("tenant", &["admin"], false),
        ])
        .unwrap_err();
        assert_eq!(err, HierarchyError::DuplicateLevel("tenant".to_owned()));
    }

    #[test]
    fn rejects_roleless_level() {
        let err = HierarchyConfig::new(vec![level("tenant", &[], true)]).unwrap_err();
        assert_eq!(err, HierarchyError::NoRoles("tenant".to_owned()));
    }

    #[test]
    fn rejects_zero_or_many_roots() {
        let err = HierarchyConfig::new(vec![
            level("tenant", &["admin"], false),
            level("workspace", &["admin"], false),
        ])
        .unwrap_err();
        assert_eq!(err, HierarchyError::RootCount(0));

        let err = HierarchyConfig::new(vec![
            level("tenant", &["admin"], true),
            level("workspace", &["admin"], true),
        ])
        .unwrap_err();
        assert_eq!(err, HierarchyError::RootCount(2));
    }

    #[test]
    fn rejects_root_mid_chain() {
        let err = HierarchyConfig::new(vec![
            level("tenant", &["admin"], false),
            level("workspace", &["admin"], true),
        ])
        .unwrap_err();
        assert_eq!(err, HierarchyError::RootNotFirst("workspace".to_owned(), 1));
    }
}
