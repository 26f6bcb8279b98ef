//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Reference
//! fields are `uuid[]` columns; the GIN indexes declared in the migration
//! serve the `@>` containment filters used to find holders.

diesel::table! {
    /// User accounts.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Unique login name (3 to 32 characters).
        username -> Varchar,
        /// One of `admin`, `teacher`, `student`.
        role -> Varchar,
        /// Clusters listing this user as a student.
        in_cluster -> Array<Uuid>,
        /// Class sessions this user teaches or attends.
        in_class -> Array<Uuid>,
    }
}

diesel::table! {
    /// Named student groups.
    clusters (id) {
        id -> Uuid,
        /// Unique cluster name (at most 64 characters).
        name -> Varchar,
        students -> Array<Uuid>,
        /// Class sessions listing this cluster in `classcodes`.
        in_class -> Array<Uuid>,
    }
}

diesel::table! {
    /// Scheduled class sessions.
    class_sessions (id) {
        id -> Uuid,
        kind -> Text,
        classroom -> Text,
        session_date -> Date,
        start_time -> Time,
        end_time -> Time,
        classcodes -> Array<Uuid>,
        teachers -> Array<Uuid>,
        students -> Array<Uuid>,
    }
}

diesel::allow_tables_to_appear_in_same_query!(users, clusters, class_sessions);
