//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{NaiveDate, NaiveTime};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{class_sessions, clusters, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub role: String,
    pub in_cluster: Vec<Uuid>,
    pub in_class: Vec<Uuid>,
}

/// Insertable struct for creating user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub role: &'a str,
    pub in_cluster: Vec<Uuid>,
    pub in_class: Vec<Uuid>,
}

/// Row struct for reading from the clusters table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = clusters)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ClusterRow {
    pub id: Uuid,
    pub name: String,
    pub students: Vec<Uuid>,
    pub in_class: Vec<Uuid>,
}

/// Insertable struct for creating cluster records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = clusters)]
pub(crate) struct NewClusterRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub students: Vec<Uuid>,
    pub in_class: Vec<Uuid>,
}

/// Row struct for reading from the class_sessions table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = class_sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ClassSessionRow {
    pub id: Uuid,
    pub kind: String,
    pub classroom: String,
    pub session_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub classcodes: Vec<Uuid>,
    pub teachers: Vec<Uuid>,
    pub students: Vec<Uuid>,
}

/// Insertable struct for creating class session records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = class_sessions)]
pub(crate) struct NewClassSessionRow<'a> {
    pub id: Uuid,
    pub kind: &'a str,
    pub classroom: &'a str,
    pub session_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub classcodes: Vec<Uuid>,
    pub teachers: Vec<Uuid>,
    pub students: Vec<Uuid>,
}

/// Changeset for the descriptive session columns. Reference arrays are
/// never touched here.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = class_sessions)]
pub(crate) struct ClassSessionDetailsUpdate<'a> {
    pub kind: &'a str,
    pub classroom: &'a str,
    pub session_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}
