use uuid::Uuid;

/// One relationship in the engine's graph.
///
/// Subjects and objects are typed string ids (`user:<uuid>`,
/// `container:<uuid>`); the relation is either a role name written on a
/// membership grant or the structural `parent` relation between containers.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct RelationTuple {
    pub subject: String,
    pub relation: String,
    pub object: String,
}

/// Relation linking a container to its parent container.
pub const PARENT_RELATION: &str = "parent";

impl RelationTuple {
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        relation: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            relation: relation.into(),
            object: object.into(),
        }
    }

    /// Role grant for a user on a container.
    #[must_use]
    pub fn role(user_id: Uuid, role: &str, container_id: Uuid) -> Self {
        Self::new(subject_user(user_id), role, object_container(container_id))
    }

    /// Structural `parent` edge from a child container to its parent.
    ///
    /// The subject is the parent so the engine can expand
    /// "role on parent implies capability on child".
    #[must_use]
    pub fn parent(child_id: Uuid, parent_id: Uuid) -> Self {
        Self::new(
            object_container(parent_id),
            PARENT_RELATION,
            object_container(child_id),
        )
    }
}

/// Engine subject id for a user identity.
#[must_use]
pub fn subject_user(user_id: Uuid) -> String {
    format!("user:{user_id}")
}

/// Engine object id for a container.
#[must_use]
pub fn object_container(container_id: Uuid) -> String {
    format!("container:{container_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_tuple_shape() {
        let user = Uuid::new_v4();
        let container = Uuid::new_v4();
        let t = RelationTuple::role(user, "admin", container);

        assert_eq!(t.subject, format!("user:{user}"));
        assert_eq!(t.relation, "admin");
        assert_eq!(t.object, format!("container:{container}"));
    }

    #[test]
    fn parent_tuple_points_from_parent_to_child() {
        let child = Uuid::new_v4();
        let parent = Uuid::new_v4();
        let t = RelationTuple::parent(child, parent);

        assert_eq!(t.subject, format!("container:{parent}"));
        assert_eq!(t.relation, PARENT_RELATION);
        assert_eq!(t.object, format!("container:{child}"));
    }
}
