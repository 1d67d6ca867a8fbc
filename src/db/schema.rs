/// Complete database schema for the knowledge base.
///
/// Uses CREATE TABLE/INDEX IF NOT EXISTS for idempotent execution.
pub const INITIAL_SCHEMA: &str = r#"
-- Documents: text plus its embedding (little-endian f32 bytes)
CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    content TEXT NOT NULL,
    embedding BLOB NOT NULL,
    embedding_model TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

-- Facts the enhanced agent remembers about the user
CREATE TABLE IF NOT EXISTS user_facts (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);

-- Corpus order is insertion order
CREATE INDEX IF NOT EXISTS idx_documents_created ON documents(created_at);
"#;
