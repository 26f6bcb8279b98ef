//! PostgreSQL-backed `EntityStore` implementation using Diesel ORM.
//!
//! Reference fields live in `uuid[]` columns. Reference edits are single
//! `UPDATE` statements using `array_append` and `array_remove`, guarded by a
//! containment filter so that adding an existing reference or removing an
//! absent one touches no rows.

use std::collections::BTreeSet;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_types::{Array, Uuid as SqlUuid};
use diesel_async::RunQueryDsl;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{EntityStore, EntityStoreError};
use crate::domain::{
    ClassSession, ClassSessionDetails, ClassSessionId, Cluster, ClusterId, ClusterName,
    EntityKind, ReferenceField, SessionFilter, SessionSchedule, User, UserId, UserRole, Username,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{
    ClassSessionDetailsUpdate, ClassSessionRow, ClusterRow, NewClassSessionRow, NewClusterRow,
    NewUserRow, UserRow,
};
use super::pool::DbPool;
use super::schema::{class_sessions, clusters, users};

diesel::define_sql_function! {
    fn array_append(array: Array<SqlUuid>, element: SqlUuid) -> Array<SqlUuid>;
}

diesel::define_sql_function! {
    fn array_remove(array: Array<SqlUuid>, element: SqlUuid) -> Array<SqlUuid>;
}

/// Bind `$table` to the schema module owning `$field` and `$column` to its
/// array column, then evaluate `$body`. Each arm is type-checked on its
/// own, so the body may use table-specific DSL freely.
macro_rules! with_reference_column {
    ($field:expr, |$table:ident, $column:ident| $body:expr) => {
        match $field {
            ReferenceField::UserClusters => {
                use super::schema::users as $table;
                let $column = $table::in_cluster;
                $body
            }
            ReferenceField::UserSessions => {
                use super::schema::users as $table;
                let $column = $table::in_class;
                $body
            }
            ReferenceField::ClusterStudents => {
                use super::schema::clusters as $table;
                let $column = $table::students;
                $body
            }
            ReferenceField::ClusterSessions => {
                use super::schema::clusters as $table;
                let $column = $table::in_class;
                $body
            }
            ReferenceField::SessionClusters => {
                use super::schema::class_sessions as $table;
                let $column = $table::classcodes;
                $body
            }
            ReferenceField::SessionTeachers => {
                use super::schema::class_sessions as $table;
                let $column = $table::teachers;
                $body
            }
            ReferenceField::SessionStudents => {
                use super::schema::class_sessions as $table;
                let $column = $table::students;
                $body
            }
        }
    };
}

/// Diesel-backed implementation of the `EntityStore` port.
#[derive(Clone)]
pub struct DieselEntityStore {
    pool: DbPool,
}

impl DieselEntityStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn corrupt(what: &str, err: impl std::fmt::Display) -> EntityStoreError {
    EntityStoreError::query(format!("stored {what} is invalid: {err}"))
}

fn typed<T: From<Uuid> + Ord>(ids: Vec<Uuid>) -> BTreeSet<T> {
    ids.into_iter().map(T::from).collect()
}

fn raw<T: Copy + Into<Uuid>>(ids: &BTreeSet<T>) -> Vec<Uuid> {
    ids.iter().copied().map(Into::into).collect()
}

fn row_to_user(row: UserRow) -> Result<User, EntityStoreError> {
    let username = Username::new(row.username).map_err(|err| corrupt("username", err))?;
    let role = row
        .role
        .parse::<UserRole>()
        .map_err(|err| corrupt("role", err))?;
    Ok(User {
        id: UserId::from_uuid(row.id),
        username,
        role,
        in_cluster: typed(row.in_cluster),
        in_class: typed(row.in_class),
    })
}

fn row_to_cluster(row: ClusterRow) -> Result<Cluster, EntityStoreError> {
    let name = ClusterName::new(row.name).map_err(|err| corrupt("cluster name", err))?;
    Ok(Cluster {
        id: ClusterId::from_uuid(row.id),
        name,
        students: typed(row.students),
        in_class: typed(row.in_class),
    })
}

fn row_to_session(row: ClassSessionRow) -> Result<ClassSession, EntityStoreError> {
    let schedule = SessionSchedule::new(row.session_date, row.start_time, row.end_time)
        .map_err(|err| corrupt("session schedule", err))?;
    let details = ClassSessionDetails::new(row.kind, row.classroom, schedule)
        .map_err(|err| corrupt("session details", err))?;
    Ok(ClassSession {
        id: ClassSessionId::from_uuid(row.id),
        details,
        classcodes: typed(row.classcodes),
        teachers: typed(row.teachers),
        students: typed(row.students),
    })
}

#[async_trait]
impl EntityStore for DieselEntityStore {
    async fn insert_user(&self, user: &User) -> Result<(), EntityStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewUserRow {
            id: user.id.into(),
            username: user.username.as_ref(),
            role: user.role.as_str(),
            in_cluster: raw(&user.in_cluster),
            in_class: raw(&user.in_class),
        };
        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_user(&self, id: &UserId) -> Result<Option<User>, EntityStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        users::table
            .find(Uuid::from(*id))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_user)
            .transpose()
    }

    async fn find_user_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, EntityStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        users::table
            .filter(users::username.eq(username.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_user)
            .transpose()
    }

    async fn list_users(&self, role: Option<UserRole>) -> Result<Vec<User>, EntityStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = users::table
            .select(UserRow::as_select())
            .order(users::username.asc())
            .into_boxed();
        if let Some(role) = role {
            query = query.filter(users::role.eq(role.as_str()));
        }
        let rows: Vec<UserRow> = query.load(&mut conn).await.map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_user).collect()
    }

    async fn delete_user(&self, id: &UserId) -> Result<bool, EntityStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(users::table.find(Uuid::from(*id)))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn insert_cluster(&self, cluster: &Cluster) -> Result<(), EntityStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewClusterRow {
            id: cluster.id.into(),
            name: cluster.name.as_ref(),
            students: raw(&cluster.students),
            in_class: raw(&cluster.in_class),
        };
        diesel::insert_into(clusters::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_cluster(&self, id: &ClusterId) -> Result<Option<Cluster>, EntityStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        clusters::table
            .find(Uuid::from(*id))
            .select(ClusterRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_cluster)
            .transpose()
    }

    async fn find_cluster_by_name(
        &self,
        name: &ClusterName,
    ) -> Result<Option<Cluster>, EntityStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        clusters::table
            .filter(clusters::name.eq(name.as_ref()))
            .select(ClusterRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_cluster)
            .transpose()
    }

    async fn list_clusters(&self) -> Result<Vec<Cluster>, EntityStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ClusterRow> = clusters::table
            .select(ClusterRow::as_select())
            .order(clusters::name.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_cluster).collect()
    }

    async fn rename_cluster(
        &self,
        id: &ClusterId,
        name: &ClusterName,
    ) -> Result<bool, EntityStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(clusters::table.find(Uuid::from(*id)))
            .set(clusters::name.eq(name.as_ref()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn delete_cluster(&self, id: &ClusterId) -> Result<bool, EntityStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(clusters::table.find(Uuid::from(*id)))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn insert_session(&self, session: &ClassSession) -> Result<(), EntityStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let schedule = session.details.schedule();
        let row = NewClassSessionRow {
            id: session.id.into(),
            kind: session.details.kind(),
            classroom: session.details.classroom(),
            session_date: schedule.date(),
            start_time: schedule.start(),
            end_time: schedule.end(),
            classcodes: raw(&session.classcodes),
            teachers: raw(&session.teachers),
            students: raw(&session.students),
        };
        diesel::insert_into(class_sessions::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_session(
        &self,
        id: &ClassSessionId,
    ) -> Result<Option<ClassSession>, EntityStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        class_sessions::table
            .find(Uuid::from(*id))
            .select(ClassSessionRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_session)
            .transpose()
    }

    async fn list_sessions(
        &self,
        filter: SessionFilter,
    ) -> Result<Vec<ClassSession>, EntityStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = class_sessions::table
            .select(ClassSessionRow::as_select())
            .order((
                class_sessions::session_date.asc(),
                class_sessions::start_time.asc(),
                class_sessions::id.asc(),
            ))
            .into_boxed();
        if let Some(date) = filter.date {
            query = query.filter(class_sessions::session_date.eq(date));
        }
        if let Some(cluster) = filter.cluster {
            query = query.filter(class_sessions::classcodes.contains(vec![Uuid::from(cluster)]));
        }
        if let Some(user) = filter.attendee {
            let needle = vec![Uuid::from(user)];
            query = query.filter(
                class_sessions::teachers
                    .contains(needle.clone())
                    .or(class_sessions::students.contains(needle)),
            );
        }
        let rows: Vec<ClassSessionRow> = query.load(&mut conn).await.map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_session).collect()
    }

    async fn update_session_details(
        &self,
        id: &ClassSessionId,
        details: &ClassSessionDetails,
    ) -> Result<bool, EntityStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let schedule = details.schedule();
        let changes = ClassSessionDetailsUpdate {
            kind: details.kind(),
            classroom: details.classroom(),
            session_date: schedule.date(),
            start_time: schedule.start(),
            end_time: schedule.end(),
        };
        let updated = diesel::update(class_sessions::table.find(Uuid::from(*id)))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn delete_session(&self, id: &ClassSessionId) -> Result<bool, EntityStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(class_sessions::table.find(Uuid::from(*id)))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn existing_ids(
        &self,
        kind: EntityKind,
        ids: &BTreeSet<Uuid>,
    ) -> Result<BTreeSet<Uuid>, EntityStoreError> {
        if ids.is_empty() {
            return Ok(BTreeSet::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let wanted: Vec<Uuid> = ids.iter().copied().collect();
        let found: Vec<Uuid> = match kind {
            EntityKind::User => {
                users::table
                    .filter(users::id.eq_any(wanted))
                    .select(users::id)
                    .load::<Uuid>(&mut conn)
                    .await
            }
            EntityKind::Cluster => {
                clusters::table
                    .filter(clusters::id.eq_any(wanted))
                    .select(clusters::id)
                    .load::<Uuid>(&mut conn)
                    .await
            }
            EntityKind::ClassSession => {
                class_sessions::table
                    .filter(class_sessions::id.eq_any(wanted))
                    .select(class_sessions::id)
                    .load::<Uuid>(&mut conn)
                    .await
            }
        }
        .map_err(map_diesel_error)?;
        Ok(found.into_iter().collect())
    }

    async fn holders_of(
        &self,
        field: ReferenceField,
        target: Uuid,
    ) -> Result<BTreeSet<Uuid>, EntityStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let holders: Vec<Uuid> = with_reference_column!(field, |table, column| {
            table::table
                .filter(column.contains(vec![target]))
                .select(table::id)
                .load::<Uuid>(&mut conn)
                .await
        })
        .map_err(map_diesel_error)?;
        Ok(holders.into_iter().collect())
    }

    async fn add_reference(
        &self,
        field: ReferenceField,
        holders: &BTreeSet<Uuid>,
        target: Uuid,
    ) -> Result<(), EntityStoreError> {
        if holders.is_empty() {
            return Ok(());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let holders: Vec<Uuid> = holders.iter().copied().collect();
        let touched = with_reference_column!(field, |table, column| {
            diesel::update(
                table::table
                    .filter(table::id.eq_any(holders))
                    .filter(diesel::dsl::not(column.contains(vec![target]))),
            )
            .set(column.eq(array_append(column, target)))
            .execute(&mut conn)
            .await
        })
        .map_err(map_diesel_error)?;
        debug!(%field, %target, touched, "references added");
        Ok(())
    }

    async fn remove_reference(
        &self,
        field: ReferenceField,
        holders: &BTreeSet<Uuid>,
        target: Uuid,
    ) -> Result<(), EntityStoreError> {
        if holders.is_empty() {
            return Ok(());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let holders: Vec<Uuid> = holders.iter().copied().collect();
        let touched = with_reference_column!(field, |table, column| {
            diesel::update(
                table::table
                    .filter(table::id.eq_any(holders))
                    .filter(column.contains(vec![target])),
            )
            .set(column.eq(array_remove(column, target)))
            .execute(&mut conn)
            .await
        })
        .map_err(map_diesel_error)?;
        debug!(%field, %target, touched, "references removed");
        Ok(())
    }

    async fn replace_references(
        &self,
        field: ReferenceField,
        holder: Uuid,
        targets: &BTreeSet<Uuid>,
    ) -> Result<(), EntityStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let targets: Vec<Uuid> = targets.iter().copied().collect();
        let touched = with_reference_column!(field, |table, column| {
            diesel::update(table::table.find(holder))
                .set(column.eq(targets))
                .execute(&mut conn)
                .await
        })
        .map_err(map_diesel_error)?;
        if touched == 0 {
            debug!(%field, %holder, "replace skipped missing holder");
        }
        Ok(())
    }
}
