//! Reference fields and the relations pairing them.
//!
//! Every array-valued field that points at another collection is a
//! [`ReferenceField`]. A [`Relation`] pairs the forward field(s) of an owner
//! with the back field on its members, so one reconciliation algorithm can
//! serve cluster rosters, session clusters, and session attendance alike.

use std::collections::BTreeSet;
use std::fmt;

use uuid::Uuid;

/// The three stored collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Cluster,
    ClassSession,
}

impl EntityKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Cluster => "cluster",
            Self::ClassSession => "class session",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An array-valued field holding ids of another collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceField {
    /// `User.in_cluster`
    UserClusters,
    /// `User.in_class`
    UserSessions,
    /// `Cluster.students`
    ClusterStudents,
    /// `Cluster.in_class`
    ClusterSessions,
    /// `ClassSession.classcodes`
    SessionClusters,
    /// `ClassSession.teachers`
    SessionTeachers,
    /// `ClassSession.students`
    SessionStudents,
}

impl ReferenceField {
    pub const ALL: [Self; 7] = [
        Self::UserClusters,
        Self::UserSessions,
        Self::ClusterStudents,
        Self::ClusterSessions,
        Self::SessionClusters,
        Self::SessionTeachers,
        Self::SessionStudents,
    ];

    /// Collection whose documents carry this field.
    #[must_use]
    pub const fn holder(self) -> EntityKind {
        match self {
            Self::UserClusters | Self::UserSessions => EntityKind::User,
            Self::ClusterStudents | Self::ClusterSessions => EntityKind::Cluster,
            Self::SessionClusters | Self::SessionTeachers | Self::SessionStudents => {
                EntityKind::ClassSession
            }
        }
    }

    /// Collection the stored ids point at.
    #[must_use]
    pub const fn target(self) -> EntityKind {
        match self {
            Self::ClusterStudents | Self::SessionTeachers | Self::SessionStudents => {
                EntityKind::User
            }
            Self::UserClusters | Self::SessionClusters => EntityKind::Cluster,
            Self::UserSessions | Self::ClusterSessions => EntityKind::ClassSession,
        }
    }

    /// Field name as exposed on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserClusters => "inCluster",
            Self::UserSessions | Self::ClusterSessions => "inClass",
            Self::ClusterStudents | Self::SessionStudents => "students",
            Self::SessionClusters => "classcodes",
            Self::SessionTeachers => "teachers",
        }
    }

    /// Fields that point at `kind`. Deleting an entity of that kind must
    /// strip its id from each of them.
    pub fn referencing(kind: EntityKind) -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().filter(move |field| field.target() == kind)
    }
}

impl fmt::Display for ReferenceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.holder(), self.as_str())
    }
}

/// A forward/back pair kept in sync by the membership reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// `Cluster.students` ↔ `User.in_cluster`
    ClusterStudents,
    /// `ClassSession.classcodes` ↔ `Cluster.in_class`
    SessionClusters,
    /// `ClassSession.{teachers ∪ students}` ↔ `User.in_class`
    SessionAttendees,
}

impl Relation {
    /// Kind of the document owning the forward field(s).
    #[must_use]
    pub const fn owner_kind(self) -> EntityKind {
        match self {
            Self::ClusterStudents => EntityKind::Cluster,
            Self::SessionClusters | Self::SessionAttendees => EntityKind::ClassSession,
        }
    }

    /// Kind of the documents carrying the back field.
    #[must_use]
    pub const fn member_kind(self) -> EntityKind {
        self.back_field().holder()
    }

    /// Field on members that mirrors the owner's forward field(s).
    #[must_use]
    pub const fn back_field(self) -> ReferenceField {
        match self {
            Self::ClusterStudents => ReferenceField::UserClusters,
            Self::SessionClusters => ReferenceField::ClusterSessions,
            Self::SessionAttendees => ReferenceField::UserSessions,
        }
    }

    /// Owner fields whose union forms the membership set.
    #[must_use]
    pub const fn forward_fields(self) -> &'static [ReferenceField] {
        match self {
            Self::ClusterStudents => &[ReferenceField::ClusterStudents],
            Self::SessionClusters => &[ReferenceField::SessionClusters],
            Self::SessionAttendees => &[
                ReferenceField::SessionTeachers,
                ReferenceField::SessionStudents,
            ],
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ClusterStudents => "cluster_students",
            Self::SessionClusters => "session_clusters",
            Self::SessionAttendees => "session_attendees",
        };
        f.write_str(name)
    }
}

/// Minimal set of back-reference writes turning `current` into `desired`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipDiff {
    pub to_add: BTreeSet<Uuid>,
    pub to_remove: BTreeSet<Uuid>,
}

impl MembershipDiff {
    /// Compute `desired − current` and `current − desired`.
    ///
    /// # Examples
    /// ```
    /// use std::collections::BTreeSet;
    /// use roster::domain::MembershipDiff;
    /// use uuid::Uuid;
    ///
    /// let (a, b, c) = (Uuid::from_u128(1), Uuid::from_u128(2), Uuid::from_u128(3));
    /// let diff = MembershipDiff::compute(&BTreeSet::from([a, b]), &BTreeSet::from([b, c]));
    /// assert_eq!(diff.to_add, BTreeSet::from([c]));
    /// assert_eq!(diff.to_remove, BTreeSet::from([a]));
    /// ```
    #[must_use]
    pub fn compute(current: &BTreeSet<Uuid>, desired: &BTreeSet<Uuid>) -> Self {
        Self {
            to_add: desired.difference(current).copied().collect(),
            to_remove: current.difference(desired).copied().collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Collect typed ids into raw UUIDs for the reference-level store API.
pub fn uuid_set<I, T>(ids: I) -> BTreeSet<Uuid>
where
    I: IntoIterator<Item = T>,
    T: Into<Uuid>,
{
    ids.into_iter().map(Into::into).collect()
}

/// Convert raw UUIDs back into a typed id set.
pub fn typed_set<T: From<Uuid> + Ord>(ids: &BTreeSet<Uuid>) -> BTreeSet<T> {
    ids.iter().copied().map(T::from).collect()
}
