use super::*;
use tempfile::tempdir;

#[test]
fn in_memory_opens_successfully() {
    let result = Database::in_memory();
    assert!(result.is_ok());
}

#[test]
fn schema_tables_exist() {
    let db = Database::in_memory().unwrap();

    let tables: Vec<String> = db
        .connection()
        .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .filter_map(|r| r.ok())
        .collect();

    assert!(tables.contains(&"documents".to_string()));
    assert!(tables.contains(&"user_facts".to_string()));
}

#[test]
fn schema_indexes_exist() {
    let db = Database::in_memory().unwrap();

    let indexes: Vec<String> = db
        .connection()
        .prepare(
            "SELECT name FROM sqlite_master WHERE type='index' AND name LIKE 'idx_%' ORDER BY name",
        )
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .filter_map(|r| r.ok())
        .collect();

    assert_eq!(indexes, vec!["idx_documents_created".to_string()]);
}

#[test]
fn open_creates_database_file() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("knowledge.db");

    let result = Database::open(&db_path);
    assert!(result.is_ok());
    assert!(db_path.exists());
}

#[test]
fn reopen_is_idempotent() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("knowledge.db");

    {
        let db = Database::open(&db_path).unwrap();
        db.connection()
            .execute(
                "INSERT INTO user_facts (key, value, updated_at) VALUES ('budget', '$400K', 0)",
                [],
            )
            .unwrap();
    }

    let db2 = Database::open(&db_path);
    assert!(db2.is_ok());

    let value: String = db2
        .unwrap()
        .connection()
        .query_row("SELECT value FROM user_facts WHERE key = 'budget'", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(value, "$400K");
}

#[test]
fn duplicate_document_id_violates_primary_key() {
    let db = Database::in_memory().unwrap();
    let insert = "INSERT INTO documents (id, content, embedding, embedding_model, created_at)
                  VALUES ('doc_0', 'text', x'', 'hashing-4', 0)";

    db.connection().execute(insert, []).unwrap();
    assert!(db.connection().execute(insert, []).is_err());
}

#[test]
fn embedding_bytes_are_little_endian_f32() {
    let bytes = encode_embedding(&[1.0, -0.5]);
    assert_eq!(bytes.len(), 8);
    assert_eq!(&bytes[0..4], &1.0f32.to_le_bytes());
    assert_eq!(decode_embedding(&bytes), vec![1.0, -0.5]);
}

#[test]
fn decode_ignores_partial_trailing_bytes() {
    let mut bytes = encode_embedding(&[0.25]);
    bytes.push(0xff);
    assert_eq!(decode_embedding(&bytes), vec![0.25]);
}

#[test]
fn embedding_blob_survives_storage() {
    let db = Database::in_memory().unwrap();
    let vector = vec![0.1f32, 0.2, 0.3];
    db.connection()
        .execute(
            "INSERT INTO documents (id, content, embedding, embedding_model, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params!["doc_0", "text", encode_embedding(&vector), "hashing-3", 0i64],
        )
        .unwrap();

    let blob: Vec<u8> = db
        .connection()
        .query_row("SELECT embedding FROM documents WHERE id = 'doc_0'", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(decode_embedding(&blob), vector);
}
