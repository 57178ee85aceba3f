//! Database schema and migrations for Depot.
//!
//! Migrations are applied in order when the database is opened. The
//! schema_version table tracks which ones have run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: users
    r#"
CREATE TABLE users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    email       TEXT NOT NULL UNIQUE,
    password    TEXT NOT NULL,           -- Argon2 hash
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);
"#,
    // v2: file tree nodes
    r#"
-- parent_id 0 is the tree root; any other value is a folder id.
-- Only file nodes carry a content key.
CREATE TABLE files (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL REFERENCES users(id),
    name        TEXT NOT NULL,
    node_type   TEXT NOT NULL CHECK (node_type IN ('folder', 'file')),
    is_public   INTEGER NOT NULL DEFAULT 0,
    parent_id   INTEGER NOT NULL DEFAULT 0,
    content_key TEXT UNIQUE,
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    CHECK ((node_type = 'folder' AND content_key IS NULL)
        OR (node_type = 'file' AND content_key IS NOT NULL))
);

CREATE INDEX idx_files_user_parent ON files(user_id, parent_id);
"#,
    // v3: session tokens for the database token backend
    r#"
CREATE TABLE sessions (
    token       TEXT PRIMARY KEY,
    user_id     INTEGER NOT NULL,
    expires_at  TEXT NOT NULL,
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_sessions_expires_at ON sessions(expires_at);
"#,
];
