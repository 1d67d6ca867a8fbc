pub mod agents;
pub mod config;
pub mod db;
pub mod demo;
pub mod doctor;
pub mod embedding;
pub mod knowledge;
pub mod llm;
pub mod rag;
pub mod service;
pub mod tools;
pub mod tui;
pub mod utils;

pub use agents::{
    AgentError, AgentReply, CustomerAgent, FinancialAgent, MemoryAgent, RealEstateAgent,
    ResearchAgent,
};
pub use config::{Config, EmbedderKind};
pub use db::Database;
pub use embedding::{Embedder, EmbeddingError, HashingEmbedder, LocalEmbedder, OllamaEmbedder};
pub use knowledge::{Document, KnowledgeBase, Retriever, SearchHit, StoreError, VectorStore};
pub use rag::{RagAnswer, RagError, RagPipeline, RetrievalMode};
pub use service::RealtorService;
pub use tools::{ToolError, ToolRegistry};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_accessible_from_crate_root() {
        let db = Database::in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn types_accessible_from_crate_root() {
        let mode = RetrievalMode::parse("keyword").unwrap();
        assert_eq!(mode, RetrievalMode::Keyword);

        let registry = ToolRegistry::base();
        assert_eq!(registry.definitions().len(), 3);

        let doc = Document::new("doc_9", "Condo near Zilker Park");
        assert_eq!(doc.id, "doc_9");
    }
}
