//! Database schema definition

/// SQL schema for the checklistgen database
pub const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

-- Documents whose segments have been embedded, one row per (fingerprint, scope)
CREATE TABLE IF NOT EXISTS embedded_documents (
    id TEXT PRIMARY KEY,
    fingerprint TEXT NOT NULL,
    scope TEXT NOT NULL,
    name TEXT NOT NULL,
    segment_count INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (fingerprint, scope)
);

-- Segment text and its embedding, order-aligned per document
CREATE TABLE IF NOT EXISTS segment_embeddings (
    document_id TEXT NOT NULL,
    order_number INTEGER NOT NULL,
    content TEXT NOT NULL,
    embedding BLOB,
    PRIMARY KEY (document_id, order_number),
    FOREIGN KEY (document_id) REFERENCES embedded_documents(id) ON DELETE CASCADE
);

-- Checklist nodes; the root row is its own checklist_root_id
CREATE TABLE IF NOT EXISTS checklist_nodes (
    id TEXT PRIMARY KEY,
    checklist_root_id TEXT NOT NULL,
    parent_id TEXT,
    position INTEGER NOT NULL,
    order_number INTEGER NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    priority TEXT,
    time_estimate TEXT,
    project_id TEXT,
    created_at TEXT NOT NULL,
    FOREIGN KEY (parent_id) REFERENCES checklist_nodes(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_checklist_nodes_root ON checklist_nodes(checklist_root_id);
CREATE INDEX IF NOT EXISTS idx_checklist_nodes_parent ON checklist_nodes(parent_id);

-- Status labels of a checklist, in display order
CREATE TABLE IF NOT EXISTS status_indicators (
    checklist_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    label TEXT NOT NULL,
    PRIMARY KEY (checklist_id, position),
    FOREIGN KEY (checklist_id) REFERENCES checklist_nodes(id) ON DELETE CASCADE
);
"#;
