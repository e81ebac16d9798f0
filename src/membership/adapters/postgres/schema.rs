//! Diesel schema for project membership persistence.

diesel::table! {
    /// Registered users.
    users (id) {
        /// User identifier.
        id -> Uuid,
        /// Unique login.
        #[max_length = 255]
        login -> Varchar,
    }
}

diesel::table! {
    /// Shared projects.
    projects (id) {
        /// Project identifier.
        id -> Uuid,
        /// Display name.
        #[max_length = 255]
        name -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Membership and invitation rows, one per project and user.
    project_memberships (project_id, user_id) {
        /// Project the row belongs to.
        project_id -> Uuid,
        /// Member or invitee.
        user_id -> Uuid,
        /// User who created the row.
        inviter_id -> Uuid,
        /// `pending` or `accepted`.
        #[max_length = 16]
        status -> Varchar,
        /// Row creation timestamp.
        invited_at -> Timestamptz,
        /// Acceptance timestamp.
        responded_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// To-do tasks, optionally filed under a project.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Owning project.
        project_id -> Nullable<Uuid>,
        /// Task title.
        title -> Text,
    }
}

diesel::table! {
    /// Tag associations owned by the tag service.
    task_tags (task_id, tag) {
        /// Tagged task.
        task_id -> Uuid,
        /// Tag label.
        #[max_length = 100]
        tag -> Varchar,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    users,
    projects,
    project_memberships,
    tasks,
    task_tags
);
