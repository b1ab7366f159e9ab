//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate
//! with `diesel print-schema` after changing a migration.

diesel::table! {
    /// Users mirrored from the auth service.
    users (id) {
        id -> Uuid,
        email -> Varchar,
        display_name -> Varchar,
        /// Optional SMS destination.
        phone -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Events with a fixed seat capacity.
    events (id) {
        id -> Uuid,
        organizer_id -> Uuid,
        title -> Varchar,
        /// Always positive; enforced by a CHECK constraint.
        capacity -> Int4,
        /// One of `draft`, `published`, `cancelled`.
        status -> Varchar,
        starts_at -> Timestamptz,
        ends_at -> Timestamptz,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// One row per (user, event) pair; the capacity ledger.
    registrations (id) {
        id -> Uuid,
        event_id -> Uuid,
        user_id -> Uuid,
        /// One of `confirmed`, `cancelled`, `waitlisted`, `checked_in`.
        status -> Varchar,
        registered_at -> Timestamptz,
        checked_in_at -> Nullable<Timestamptz>,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// In-app notifications.
    notifications (id) {
        id -> Uuid,
        user_id -> Uuid,
        title -> Varchar,
        message -> Text,
        read -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(events -> users (organizer_id));
diesel::joinable!(registrations -> events (event_id));
diesel::joinable!(notifications -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(users, events, registrations, notifications);
