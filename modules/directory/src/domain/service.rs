//! Container tree service.
//!
//! All mutations run as one unit: the database transaction plus the engine
//! tuple synchronization. Mutations execute on a detached task so a client
//! disconnect cannot abandon an already-issued relationship write
//! mid-flight. Creation-side tuple writes happen before commit, so an
//! engine failure rolls the whole unit back; deletion-side tuple removals
//! happen after commit and are issued exactly once, never retried.

use std::future::Future;
use std::sync::Arc;

use anyhow::anyhow;
use sea_orm::{DatabaseConnection, TransactionTrait};
use uuid::Uuid;

use orggate_rebac::{RelationEngine, RelationTuple, object_container, subject_user};
use orggate_security::{Capability, Identity};

use crate::config::HierarchyConfig;
use crate::infra::storage::repo::{self, NewContainerRow};

use super::error::DomainError;
use super::model::{Container, Membership, NewContainer};

/// Slug given to the default child container provisioned under new roots.
const DEFAULT_CHILD_SLUG: &str = "default";

/// The resource container store.
#[derive(Clone)]
pub struct DirectoryService {
    db: DatabaseConnection,
    hierarchy: Arc<HierarchyConfig>,
    engine: Arc<dyn RelationEngine>,
    /// Provision a default child container when a root is created.
    provision_default_child: bool,
}

impl DirectoryService {
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        hierarchy: Arc<HierarchyConfig>,
        engine: Arc<dyn RelationEngine>,
        provision_default_child: bool,
    ) -> Self {
        Self {
            db,
            hierarchy,
            engine,
            provision_default_child,
        }
    }

    /// Hierarchy configuration this store was built with.
    #[must_use]
    pub fn hierarchy(&self) -> &HierarchyConfig {
        &self.hierarchy
    }

    /// Run a mutation on a detached task: client cancellation must not
    /// abandon an already-issued relationship write.
    async fn detached<T, F>(fut: F) -> Result<T, DomainError>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, DomainError>> + Send + 'static,
    {
        tokio::spawn(fut)
            .await
            .map_err(|e| DomainError::Internal(anyhow!("mutation task failed: {e}")))?
    }

    /// Create a container; the creator is granted the level's most
    /// privileged role. For roots, optionally provisions a default child.
    /// Non-platform-admin creators must hold `can_write` on the parent.
    ///
    /// # Errors
    /// `UnknownLevel`, `LevelMismatch`, `ParentNotFound`, `NotPermitted`,
    /// `SlugConflict`, plus engine/database failures (the whole unit rolls
    /// back).
    pub async fn create_container(
        &self,
        creator: &Identity,
        req: NewContainer,
    ) -> Result<Container, DomainError> {
        let svc = self.clone();
        let creator = creator.clone();
        Self::detached(async move { svc.create_container_inner(&creator, req).await }).await
    }

    async fn create_container_inner(
        &self,
        creator: &Identity,
        req: NewContainer,
    ) -> Result<Container, DomainError> {
        let creator_id = creator.subject_id();
        if self.hierarchy.level(&req.level).is_none() {
            return Err(DomainError::UnknownLevel {
                level: req.level,
            });
        }

        let id = Uuid::new_v4();
        let (parent, root_id, path, depth) = match req.parent_id {
            Some(parent_id) => {
                let Some(expected_parent) = self.hierarchy.parent_level(&req.level) else {
                    return Err(DomainError::level_mismatch(format!(
                        "root level '{}' cannot have a parent",
                        req.level
                    )));
                };
                let parent = repo::find_container(&self.db, parent_id)
                    .await?
                    .ok_or(DomainError::ParentNotFound { id: parent_id })?;
                if parent.level != expected_parent.name {
                    return Err(DomainError::level_mismatch(format!(
                        "level '{}' expects a '{}' parent, got '{}'",
                        req.level, expected_parent.name, parent.level
                    )));
                }
                // The gate never sees the parent (it travels in the body),
                // so the write grant on it is checked here.
                if !creator.is_platform_admin() {
                    let permitted = self
                        .engine
                        .check(
                            &subject_user(creator_id),
                            Capability::Write.relation(),
                            &object_container(parent.id),
                        )
                        .await?;
                    if !permitted {
                        return Err(DomainError::NotPermitted {
                            container_id: parent.id,
                        });
                    }
                }
                let path = format!("{}/{id}", parent.path);
                let depth = parent.depth + 1;
                let root_id = parent.root_id;
                (Some(parent), root_id, path, depth)
            }
            None => {
                let root_level = self.hierarchy.root_level();
                if req.level != root_level.name {
                    return Err(DomainError::level_mismatch(format!(
                        "level '{}' requires a parent; only '{}' containers are roots",
                        req.level, root_level.name
                    )));
                }
                (None, id, id.to_string(), 0)
            }
        };

        // Most privileged role exists: levels validate as non-empty.
        let creator_role = self
            .hierarchy
            .most_privileged_role(&req.level)
            .ok_or_else(|| DomainError::Internal(anyhow!("level lost its roles")))?
            .to_owned();

        let txn = self.db.begin().await?;

        let model = repo::insert_container(
            &txn,
            NewContainerRow {
                id,
                level: req.level.clone(),
                slug: req.slug,
                display_name: req.display_name,
                parent_id: parent.as_ref().map(|p| p.id),
                root_id,
                path,
                depth,
                metadata: req.metadata.unwrap_or_else(|| serde_json::json!({})),
            },
        )
        .await?;
        repo::insert_membership(&txn, creator_id, id, &creator_role).await?;

        let mut tuples = Vec::with_capacity(4);
        if let Some(parent) = &parent {
            tuples.push(RelationTuple::parent(id, parent.id));
        }
        tuples.push(RelationTuple::role(creator_id, &creator_role, id));

        // Default-child provisioning is part of the same atomic unit.
        if parent.is_none() && self.provision_default_child {
            if let Some(child_level) = self.hierarchy.child_level(&req.level) {
                let child_id = Uuid::new_v4();
                let child_role = child_level
                    .roles
                    .first()
                    .ok_or_else(|| DomainError::Internal(anyhow!("level lost its roles")))?;
                repo::insert_container(
                    &txn,
                    NewContainerRow {
                        id: child_id,
                        level: child_level.name.clone(),
                        slug: DEFAULT_CHILD_SLUG.to_owned(),
                        display_name: "Default".to_owned(),
                        parent_id: Some(id),
                        root_id,
                        path: format!("{}/{child_id}", model.path),
                        depth: 1,
                        metadata: serde_json::json!({}),
                    },
                )
                .await?;
                repo::insert_membership(&txn, creator_id, child_id, child_role).await?;
                tuples.push(RelationTuple::parent(child_id, id));
                tuples.push(RelationTuple::role(creator_id, child_role, child_id));
            }
        }

        // Engine writes before commit: an engine failure rolls back the
        // whole unit, leaving no container without its graph projection.
        for tuple in &tuples {
            self.engine.write_tuple(tuple).await?;
        }

        txn.commit().await?;
        tracing::info!(
            container_id = %model.id,
            level = %model.level,
            slug = %model.slug,
            "container created"
        );
        Ok(model.into())
    }

    /// Container by id.
    ///
    /// # Errors
    /// `ContainerNotFound` when no such row exists.
    pub async fn get_container(&self, id: Uuid) -> Result<Container, DomainError> {
        repo::find_container(&self.db, id)
            .await?
            .map(Container::from)
            .ok_or(DomainError::ContainerNotFound { id })
    }

    /// Container by `(level, slug, parent)`.
    ///
    /// # Errors
    /// Database failures only; absence is `None`.
    pub async fn get_by_slug(
        &self,
        level: &str,
        slug: &str,
        parent_id: Option<Uuid>,
    ) -> Result<Option<Container>, DomainError> {
        Ok(repo::find_by_slug(&self.db, level, slug, parent_id)
            .await?
            .map(Container::from))
    }

    /// Direct children, optionally filtered by level.
    ///
    /// # Errors
    /// Database failures.
    pub async fn list_children(
        &self,
        parent_id: Uuid,
        level: Option<&str>,
    ) -> Result<Vec<Container>, DomainError> {
        Ok(repo::list_children(&self.db, parent_id, level)
            .await?
            .into_iter()
            .map(Container::from)
            .collect())
    }

    /// All containers under a root, optionally filtered by level.
    ///
    /// # Errors
    /// Database failures.
    pub async fn list_by_root(
        &self,
        root_id: Uuid,
        level: Option<&str>,
    ) -> Result<Vec<Container>, DomainError> {
        Ok(repo::list_by_root(&self.db, root_id, level)
            .await?
            .into_iter()
            .map(Container::from)
            .collect())
    }

    /// Ancestors of a container, nearest first. O(depth): the walk is
    /// bounded by the configured hierarchy depth.
    ///
    /// # Errors
    /// `ContainerNotFound` for the starting id; database failures.
    pub async fn ancestors(&self, id: Uuid) -> Result<Vec<Container>, DomainError> {
        let start = self.get_container(id).await?;
        let mut ancestors = Vec::with_capacity(self.hierarchy.depth().saturating_sub(1));
        let mut cursor = start.parent_id;
        while let Some(parent_id) = cursor {
            let parent = repo::find_container(&self.db, parent_id)
                .await?
                .ok_or(DomainError::ParentNotFound { id: parent_id })?;
            cursor = parent.parent_id;
            ancestors.push(Container::from(parent));
        }
        Ok(ancestors)
    }

    /// Grant a role on a container.
    ///
    /// # Errors
    /// `InvalidRole`, `AlreadyMember`, `ContainerNotFound`, engine or
    /// database failures (unit rolls back).
    pub async fn add_member(
        &self,
        user_id: Uuid,
        container_id: Uuid,
        role: String,
    ) -> Result<Membership, DomainError> {
        let svc = self.clone();
        Self::detached(async move {
            let container = svc.get_container(container_id).await?;
            if !svc.hierarchy.is_valid_role(&container.level, &role) {
                return Err(DomainError::InvalidRole {
                    role,
                    level: container.level,
                });
            }

            let txn = svc.db.begin().await?;
            let membership = repo::insert_membership(&txn, user_id, container_id, &role).await?;
            svc.engine
                .write_tuple(&RelationTuple::role(user_id, &role, container_id))
                .await?;
            txn.commit().await?;

            tracing::info!(%user_id, %container_id, role = %role, "membership granted");
            Ok(Membership::from(membership))
        })
        .await
    }

    /// Members of a container.
    ///
    /// # Errors
    /// Database failures.
    pub async fn list_members(&self, container_id: Uuid) -> Result<Vec<Membership>, DomainError> {
        Ok(repo::list_members(&self.db, container_id)
            .await?
            .into_iter()
            .map(Membership::from)
            .collect())
    }

    /// Membership row for (user, container), if any.
    ///
    /// # Errors
    /// Database failures.
    pub async fn get_membership(
        &self,
        user_id: Uuid,
        container_id: Uuid,
    ) -> Result<Option<Membership>, DomainError> {
        Ok(repo::find_membership(&self.db, user_id, container_id)
            .await?
            .map(Membership::from))
    }

    /// Revoke a user's membership on a container.
    ///
    /// # Errors
    /// `MembershipNotFound`; engine or database failures.
    pub async fn remove_member(
        &self,
        user_id: Uuid,
        container_id: Uuid,
    ) -> Result<(), DomainError> {
        let svc = self.clone();
        Self::detached(async move {
            let txn = svc.db.begin().await?;
            let membership = repo::find_membership(&txn, user_id, container_id)
                .await?
                .ok_or(DomainError::MembershipNotFound {
                    user_id,
                    container_id,
                })?;
            repo::delete_membership(&txn, user_id, container_id).await?;
            txn.commit().await?;

            // Post-commit, exactly once, never retried.
            svc.engine
                .delete_tuple(&RelationTuple::role(user_id, &membership.role, container_id))
                .await?;
            Ok(())
        })
        .await
    }

    /// Soft-deactivate a container. Deactivated containers deny all
    /// non-read operations at the resolver.
    ///
    /// # Errors
    /// `ContainerNotFound`; database failures.
    pub async fn deactivate(&self, id: Uuid) -> Result<(), DomainError> {
        let svc = self.clone();
        Self::detached(async move { repo::set_active(&svc.db, id, false).await }).await
    }

    /// Delete a container and cascade over its descendants, memberships
    /// and relationship tuples. Row deletion is one transaction; partial
    /// row cascades cannot happen.
    ///
    /// # Errors
    /// `ContainerNotFound`; engine or database failures. An engine failure
    /// after commit is surfaced (rows are gone, some tuples may remain for
    /// ids that no longer resolve).
    pub async fn delete_container(&self, id: Uuid) -> Result<(), DomainError> {
        let svc = self.clone();
        Self::detached(async move {
            let container = svc.get_container(id).await?;

            let txn = svc.db.begin().await?;
            let descendants =
                repo::list_descendants(&txn, &container.descendant_prefix()).await?;

            let mut all_ids = Vec::with_capacity(descendants.len() + 1);
            all_ids.push(container.id);
            all_ids.extend(descendants.iter().map(|d| d.id));

            let memberships = repo::list_memberships_for_containers(&txn, &all_ids).await?;

            let mut tuples = Vec::with_capacity(memberships.len() + all_ids.len());
            for m in &memberships {
                tuples.push(RelationTuple::role(m.user_id, &m.role, m.container_id));
            }
            if let Some(parent_id) = container.parent_id {
                tuples.push(RelationTuple::parent(container.id, parent_id));
            }
            for d in &descendants {
                if let Some(parent_id) = d.parent_id {
                    tuples.push(RelationTuple::parent(d.id, parent_id));
                }
            }

            repo::delete_memberships_for_containers(&txn, &all_ids).await?;
            repo::delete_containers(&txn, &all_ids).await?;
            txn.commit().await?;

            tracing::info!(
                container_id = %id,
                cascaded = descendants.len(),
                "container deleted"
            );

            for tuple in &tuples {
                if let Err(e) = svc.engine.delete_tuple(tuple).await {
                    tracing::error!(error = %e, "tuple cleanup failed after cascade");
                    return Err(DomainError::Engine(e));
                }
            }
            Ok(())
        })
        .await
    }
}
