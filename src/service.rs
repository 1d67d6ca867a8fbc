use std::sync::Arc;

use anyhow::{Context, Result};

use crate::agents::{CustomerAgent, MemoryAgent, RealEstateAgent};
use crate::config::Config;
use crate::db::Database;
use crate::embedding::Embedder;
use crate::knowledge::KnowledgeBase;
use crate::llm::ChatClientTrait;
use crate::rag::{RagAnswer, RagError, RagPipeline, RetrievalMode};
use crate::utils::ensure_database_directory;

/// Wires the chat client, knowledge base and RAG pipeline together.
///
/// RealtorService is UI-independent: the CLI subcommands and the chat TUI
/// both build their agents from it.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use realtor::{Database, HashingEmbedder, KnowledgeBase, RealtorService};
/// use realtor::llm::ChatClientBuilder;
///
/// # fn main() -> anyhow::Result<()> {
/// let kb = KnowledgeBase::open(Database::in_memory()?, Arc::new(HashingEmbedder::default()))?;
/// let client = ChatClientBuilder::new().api_key("sk-test").build()?;
/// let service = RealtorService::new(Arc::new(client), "deepseek-chat", kb);
/// assert!(service.knowledge().is_empty());
/// # Ok(())
/// # }
/// ```
pub struct RealtorService {
    client: Arc<dyn ChatClientTrait>,
    model: String,
    kb: KnowledgeBase,
    rag: Arc<RagPipeline>,
}

impl RealtorService {
    pub fn new(
        client: Arc<dyn ChatClientTrait>,
        model: impl Into<String>,
        kb: KnowledgeBase,
    ) -> Self {
        let model = model.into();
        let rag = build_pipeline(&client, &model, &kb);
        Self {
            client,
            model,
            kb,
            rag,
        }
    }

    /// Opens the configured database, seeds the listings on first use and
    /// connects the chat client.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened, the embedder
    /// cannot be reached while seeding, or the client configuration is
    /// invalid. A missing API key is not an error until a request is made.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::from_config_with_embedder(config, config.embedder()?)
    }

    /// Like `from_config`, but embeds with `embedder` instead of the
    /// configured backend.
    pub fn from_config_with_embedder(
        config: &Config,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let kb = open_knowledge_base_with(config, embedder)?;
        let client = config.chat_client()?;
        let model = client.model().to_string();
        Ok(Self::new(Arc::new(client), model, kb))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn client(&self) -> Arc<dyn ChatClientTrait> {
        Arc::clone(&self.client)
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.kb
    }

    /// Mutable access to the knowledge base.
    ///
    /// Call `refresh` afterwards so the pipeline sees the changes.
    pub fn knowledge_mut(&mut self) -> &mut KnowledgeBase {
        &mut self.kb
    }

    /// Rebuilds the RAG pipeline from the current knowledge base.
    pub fn refresh(&mut self) {
        self.rag = build_pipeline(&self.client, &self.model, &self.kb);
    }

    pub fn rag(&self) -> Arc<RagPipeline> {
        Arc::clone(&self.rag)
    }

    /// Answers a question from the knowledge base.
    pub fn ask(&self, question: &str, mode: RetrievalMode) -> Result<RagAnswer, RagError> {
        self.rag.answer_in(mode, question)
    }

    pub fn tool_agent(&self) -> RealEstateAgent {
        RealEstateAgent::new(self.client(), self.model.clone())
    }

    pub fn customer_agent(&self) -> CustomerAgent {
        CustomerAgent::new(self.client(), self.rag(), self.model.clone())
    }

    /// Builds the memory agent, handing it the knowledge base as its fact
    /// store so remembered facts survive restarts.
    pub fn into_memory_agent(self) -> Result<MemoryAgent> {
        MemoryAgent::new(self.client, self.rag, self.model)
            .with_fact_sink(Box::new(self.kb))
            .context("Failed to load remembered facts")
    }
}

fn build_pipeline(
    client: &Arc<dyn ChatClientTrait>,
    model: &str,
    kb: &KnowledgeBase,
) -> Arc<RagPipeline> {
    Arc::new(RagPipeline::new(
        Arc::new(kb.retriever()),
        Arc::clone(client),
        model,
    ))
}

/// Opens (creating if needed) the knowledge base at the configured path.
///
/// An empty knowledge base is seeded with the default listings. Listings
/// removed later stay removed; `seed_defaults` restores them.
pub fn open_knowledge_base(config: &Config) -> Result<KnowledgeBase> {
    open_knowledge_base_with(config, config.embedder()?)
}

/// Opens the configured knowledge base with an explicit embedder.
pub fn open_knowledge_base_with(
    config: &Config,
    embedder: Arc<dyn Embedder>,
) -> Result<KnowledgeBase> {
    ensure_database_directory(&config.database_path)
        .context("Failed to ensure database directory")?;
    let db = Database::open(&config.database_path).context("Failed to open database")?;

    let mut kb = KnowledgeBase::open(db, embedder).context("Failed to load knowledge base")?;
    if kb.is_empty() {
        kb.seed_defaults()
            .context("Failed to seed default listings")?;
    }
    Ok(kb)
}

#[cfg(test)]
mod tests;
