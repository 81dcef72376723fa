/// Schema for the document tables.
pub const SCHEMA: &str = r#"
-- One row per document, partitioned by entity kind
CREATE TABLE IF NOT EXISTS documents (
    kind TEXT NOT NULL,
    id TEXT NOT NULL,
    data BLOB NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (kind, id)
);

CREATE INDEX IF NOT EXISTS idx_documents_created
    ON documents(kind, created_at);
"#;
