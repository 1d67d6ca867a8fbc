//! SQLite-backed document collection.

use std::collections::BTreeMap;
use std::sync::Arc;

use rusqlite::{OptionalExtension, params};
use time::OffsetDateTime;

use super::corpus::{LISTINGS, listing_id};
use super::{Document, Retriever, StoreError, VectorStore};
use crate::db::{Database, decode_embedding, encode_embedding};
use crate::embedding::Embedder;

/// Persistent document collection plus the facts remembered about the user.
///
/// Every document lives both in the `documents` table and in an in-memory
/// `VectorStore`; the store is rebuilt from the table on open.
pub struct KnowledgeBase {
    db: Database,
    embedder: Arc<dyn Embedder>,
    store: VectorStore,
}

struct StoredRow {
    id: String,
    content: String,
    embedding: Vec<u8>,
    model: String,
}

impl KnowledgeBase {
    /// Loads every stored document.
    ///
    /// Documents embedded by a model other than `embedder.model_id()` are
    /// re-embedded and rewritten.
    pub fn open(db: Database, embedder: Arc<dyn Embedder>) -> Result<Self, StoreError> {
        let rows = {
            let mut stmt = db.connection().prepare(
                "SELECT id, content, embedding, embedding_model FROM documents
                 ORDER BY created_at, rowid",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(StoredRow {
                    id: row.get(0)?,
                    content: row.get(1)?,
                    embedding: row.get(2)?,
                    model: row.get(3)?,
                })
            })?;
            let collected = rows.collect::<Result<Vec<_>, _>>()?;
            collected
        };

        let model_id = embedder.model_id().to_string();
        let mut store = VectorStore::new();
        let mut refreshed = 0usize;

        for row in rows {
            let embedding = if row.model == model_id {
                decode_embedding(&row.embedding)
            } else {
                let embedding = embedder.embed(&row.content)?;
                db.connection().execute(
                    "UPDATE documents SET embedding = ?1, embedding_model = ?2 WHERE id = ?3",
                    params![encode_embedding(&embedding), model_id, row.id],
                )?;
                refreshed += 1;
                embedding
            };
            store.add(row.id, row.content, embedding)?;
        }

        if refreshed > 0 {
            tracing::info!(refreshed, model = %model_id, "re-embedded stored documents");
        }
        tracing::debug!(documents = store.len(), "knowledge base loaded");

        Ok(Self {
            db,
            embedder,
            store,
        })
    }

    /// Adds any missing built-in listings. Returns how many were added.
    pub fn seed_defaults(&mut self) -> Result<usize, StoreError> {
        let missing: Vec<(String, &str)> = LISTINGS
            .iter()
            .enumerate()
            .map(|(i, text)| (listing_id(i), *text))
            .filter(|(id, _)| !self.store.contains(id))
            .collect();

        if missing.is_empty() {
            return Ok(0);
        }

        let texts: Vec<&str> = missing.iter().map(|(_, text)| *text).collect();
        let embeddings = self.embedder.embed_batch(&texts)?;

        for ((id, text), embedding) in missing.iter().zip(embeddings) {
            self.insert(id, text, embedding)?;
        }

        tracing::info!(added = missing.len(), "seeded knowledge base");
        Ok(missing.len())
    }

    /// Adds a document and returns its id.
    ///
    /// Without `id` the next free `doc_{n}` is assigned.
    ///
    /// # Errors
    ///
    /// `EmptyDocument` for blank text, `DuplicateId` for a taken id.
    pub fn add_document(&mut self, id: Option<&str>, text: &str) -> Result<String, StoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(StoreError::EmptyDocument);
        }

        let id = match id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) if self.store.contains(id) => {
                return Err(StoreError::DuplicateId(id.to_string()));
            }
            Some(id) => id.to_string(),
            None => self.next_document_id(),
        };

        let embedding = self.embedder.embed(text)?;
        self.insert(&id, text, embedding)?;
        Ok(id)
    }

    /// Deletes a document. Returns whether it existed.
    pub fn remove_document(&mut self, id: &str) -> Result<bool, StoreError> {
        let deleted = self
            .db
            .connection()
            .execute("DELETE FROM documents WHERE id = ?1", params![id])?;
        let removed = self.store.remove(id);
        Ok(deleted > 0 || removed)
    }

    /// All documents in insertion order.
    pub fn documents(&self) -> Vec<Document> {
        self.store.documents()
    }

    pub fn get(&self, id: &str) -> Option<Document> {
        self.store.get(id)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Model id of the embedder backing this collection.
    pub fn embedding_model(&self) -> &str {
        self.embedder.model_id()
    }

    /// Stores or overwrites a fact about the user.
    pub fn remember_fact(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.db.connection().execute(
            "INSERT INTO user_facts (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, OffsetDateTime::now_utc().unix_timestamp()],
        )?;
        Ok(())
    }

    /// All remembered facts, keyed in sorted order.
    pub fn facts(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let mut stmt = self
            .db
            .connection()
            .prepare("SELECT key, value FROM user_facts")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let facts = rows.collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(facts)
    }

    /// Looks up a single fact.
    pub fn fact(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .db
            .connection()
            .query_row(
                "SELECT value FROM user_facts WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Snapshot of the current documents for the query path.
    pub fn retriever(&self) -> Retriever {
        Retriever::new(self.store.clone(), Arc::clone(&self.embedder))
    }

    fn insert(&mut self, id: &str, text: &str, embedding: Vec<f32>) -> Result<(), StoreError> {
        // Index first: it validates id and dimensions before anything is written
        self.store.add(id, text, embedding.clone())?;

        let written = self.db.connection().execute(
            "INSERT INTO documents (id, content, embedding, embedding_model, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id,
                text,
                encode_embedding(&embedding),
                self.embedder.model_id(),
                OffsetDateTime::now_utc().unix_timestamp()
            ],
        );

        if let Err(e) = written {
            self.store.remove(id);
            return Err(e.into());
        }

        tracing::debug!(id, "document added");
        Ok(())
    }

    fn next_document_id(&self) -> String {
        let mut n = self.store.len();
        loop {
            let candidate = listing_id(n);
            if !self.store.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}
