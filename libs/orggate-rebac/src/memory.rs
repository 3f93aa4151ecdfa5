//! In-memory relationship engine for development and tests.
//!
//! Implements the documented inheritance rule over the synchronized graph:
//! `can_manage = admin OR admin-of-ancestor`, `can_write = member OR
//! can_manage OR member-of-ancestor`, `can_read = viewer OR can_write`.
//! This is a stand-in for a real engine deployment, not a general
//! graph-expansion implementation.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::engine::{EngineError, RelationEngine};
use crate::tuple::{RelationTuple, PARENT_RELATION};

/// Hierarchy depth is configuration-bounded; anything deeper is a cycle.
const MAX_WALK_DEPTH: usize = 32;

/// Tuple store with local evaluation of the inheritance rule.
#[derive(Default)]
pub struct InMemoryRelationEngine {
    tuples: RwLock<HashSet<RelationTuple>>,
}

impl InMemoryRelationEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tuples (test helper).
    #[must_use]
    pub fn len(&self) -> usize {
        self.tuples.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tuples.read().is_empty()
    }

    fn has(&self, subject: &str, relation: &str, object: &str) -> bool {
        self.tuples.read().contains(&RelationTuple::new(subject, relation, object))
    }

    /// Parent container of `object`, if a `parent` tuple exists.
    fn parent_of(&self, object: &str) -> Option<String> {
        let tuples = self.tuples.read();
        tuples
            .iter()
            .find(|t| t.relation == PARENT_RELATION && t.object == object)
            .map(|t| t.subject.clone())
    }

    /// Direct-or-inherited role check, walking the parent chain.
    fn role_inherited(&self, subject: &str, role: &str, object: &str) -> bool {
        let mut current = object.to_owned();
        for _ in 0..MAX_WALK_DEPTH {
            if self.has(subject, role, &current) {
                return true;
            }
            match self.parent_of(&current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
        false
    }

    fn can_manage(&self, subject: &str, object: &str) -> bool {
        self.role_inherited(subject, "admin", object)
    }

    fn can_write(&self, subject: &str, object: &str) -> bool {
        self.role_inherited(subject, "member", object) || self.can_manage(subject, object)
    }

    fn can_read(&self, subject: &str, object: &str) -> bool {
        self.role_inherited(subject, "viewer", object) || self.can_write(subject, object)
    }
}

#[async_trait]
impl RelationEngine for InMemoryRelationEngine {
    async fn check(
        &self,
        subject: &str,
        relation: &str,
        object: &str,
    ) -> Result<bool, EngineError> {
        let allowed = match relation {
            "can_manage" => self.can_manage(subject, object),
            "can_write" => self.can_write(subject, object),
            "can_read" => self.can_read(subject, object),
            other => self.has(subject, other, object),
        };
        Ok(allowed)
    }

    async fn write_tuple(&self, tuple: &RelationTuple) -> Result<(), EngineError> {
        self.tuples.write().insert(tuple.clone());
        Ok(())
    }

    async fn delete_tuple(&self, tuple: &RelationTuple) -> Result<(), EngineError> {
        self.tuples.write().remove(tuple);
        Ok(())
    }
}

/// Engine that always fails, for fail-closed tests.
#[derive(Default)]
pub struct UnavailableEngine;

#[async_trait]
impl RelationEngine for UnavailableEngine {
    async fn check(&self, _: &str, _: &str, _: &str) -> Result<bool, EngineError> {
        Err(EngineError::Unavailable("engine is down".to_owned()))
    }

    async fn write_tuple(&self, _: &RelationTuple) -> Result<(), EngineError> {
        Err(EngineError::Unavailable("engine is down".to_owned()))
    }

    async fn delete_tuple(&self, _: &RelationTuple) -> Result<(), EngineError> {
        Err(EngineError::Unavailable("engine is down".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::tuple::{object_container, subject_user};

    async fn seed_parent_child() -> (InMemoryRelationEngine, Uuid, Uuid, Uuid) {
        let engine = InMemoryRelationEngine::new();
        let user = Uuid::new_v4();
        let root = Uuid::new_v4();
        let child = Uuid::new_v4();

        engine
            .write_tuple(&RelationTuple::parent(child, root))
            .await
            .ok();
        engine
            .write_tuple(&RelationTuple::role(user, "admin", root))
            .await
            .ok();
        (engine, user, root, child)
    }

    #[tokio::test]
    async fn admin_on_root_manages_child() {
        let (engine, user, _root, child) = seed_parent_child().await;
        let allowed = engine
            .check(
                &subject_user(user),
                "can_manage",
                &object_container(child),
            )
            .await
            .ok();
        assert_eq!(allowed, Some(true));
    }

    #[tokio::test]
    async fn manage_implies_write_and_read() {
        let (engine, user, _root, child) = seed_parent_child().await;
        let subject = subject_user(user);
        let object = object_container(child);

        assert_eq!(engine.check(&subject, "can_write", &object).await.ok(), Some(true));
        assert_eq!(engine.check(&subject, "can_read", &object).await.ok(), Some(true));
    }

    #[tokio::test]
    async fn viewer_reads_but_never_writes() {
        let engine = InMemoryRelationEngine::new();
        let user = Uuid::new_v4();
        let container = Uuid::new_v4();
        engine
            .write_tuple(&RelationTuple::role(user, "viewer", container))
            .await
            .ok();

        let subject = subject_user(user);
        let object = object_container(container);
        assert_eq!(engine.check(&subject, "can_read", &object).await.ok(), Some(true));
        assert_eq!(engine.check(&subject, "can_write", &object).await.ok(), Some(false));
        assert_eq!(engine.check(&subject, "can_manage", &object).await.ok(), Some(false));
    }

    #[tokio::test]
    async fn stranger_is_denied() {
        let (engine, _user, _root, child) = seed_parent_child().await;
        let stranger = subject_user(Uuid::new_v4());
        let object = object_container(child);

        assert_eq!(engine.check(&stranger, "can_read", &object).await.ok(), Some(false));
    }

    #[tokio::test]
    async fn deleted_tuple_revokes_access() {
        let (engine, user, root, child) = seed_parent_child().await;
        engine
            .delete_tuple(&RelationTuple::role(user, "admin", root))
            .await
            .ok();

        let allowed = engine
            .check(
                &subject_user(user),
                "can_manage",
                &object_container(child),
            )
            .await
            .ok();
        assert_eq!(allowed, Some(false));
    }
}
