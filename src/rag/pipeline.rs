//! Retrieve-then-generate answering.

use std::sync::Arc;

use thiserror::Error;

use super::types::{RagAnswer, RetrievalMode, Source};
use crate::knowledge::{Retriever, SearchHit, StoreError};
use crate::llm::{ChatClientTrait, ChatMessage, LlmError};

/// Prompt for answers grounded on semantically retrieved documents.
const SEMANTIC_PROMPT_TEMPLATE: &str = "You are a knowledgeable real estate assistant. Based on the following information, answer the user's question accurately and helpfully.

Context:
{context}

Question: {question}

Answer:";

/// Prompt for answers grounded on keyword matches.
const KEYWORD_PROMPT_TEMPLATE: &str = "Based on this real estate information:
{context}

Question: {question}

Please answer based only on the provided information.";

/// Documents retrieved per semantic question.
const SEMANTIC_RESULTS: usize = 2;
const SEMANTIC_MAX_TOKENS: u32 = 300;
const KEYWORD_MAX_TOKENS: u32 = 200;

/// Errors from the answering pipeline.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("Question cannot be empty")]
    EmptyQuestion,

    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] StoreError),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Answers questions from knowledge-base context.
pub struct RagPipeline {
    retriever: Arc<Retriever>,
    client: Arc<dyn ChatClientTrait>,
    model: String,
}

impl RagPipeline {
    /// Creates a pipeline sending completions for `model` through `client`.
    pub fn new(
        retriever: Arc<Retriever>,
        client: Arc<dyn ChatClientTrait>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            retriever,
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Answers from the two most similar documents.
    pub fn answer(&self, question: &str) -> Result<RagAnswer, RagError> {
        let question = validate(question)?;
        let hits = self.retriever.semantic_search(question, SEMANTIC_RESULTS)?;
        self.generate(
            question,
            hits,
            SEMANTIC_PROMPT_TEMPLATE,
            "\n\n",
            SEMANTIC_MAX_TOKENS,
            RetrievalMode::Semantic,
        )
    }

    /// Answers from every quick fact sharing a word with the question.
    pub fn answer_with_keywords(&self, question: &str) -> Result<RagAnswer, RagError> {
        let question = validate(question)?;
        let hits = self.retriever.keyword_search(question);
        self.generate(
            question,
            hits,
            KEYWORD_PROMPT_TEMPLATE,
            "\n",
            KEYWORD_MAX_TOKENS,
            RetrievalMode::Keyword,
        )
    }

    /// Answers in the given mode.
    pub fn answer_in(&self, mode: RetrievalMode, question: &str) -> Result<RagAnswer, RagError> {
        match mode {
            RetrievalMode::Semantic => self.answer(question),
            RetrievalMode::Keyword => self.answer_with_keywords(question),
        }
    }

    fn generate(
        &self,
        question: &str,
        hits: Vec<SearchHit>,
        template: &str,
        separator: &str,
        max_tokens: u32,
        mode: RetrievalMode,
    ) -> Result<RagAnswer, RagError> {
        let context = hits
            .iter()
            .map(|hit| hit.content.as_str())
            .collect::<Vec<_>>()
            .join(separator);

        // An empty context is still sent; the model answers from general knowledge
        let prompt = template
            .replace("{context}", &context)
            .replace("{question}", question);

        tracing::debug!(%mode, sources = hits.len(), "generating answer");

        let answer = self
            .client
            .chat(&self.model, vec![ChatMessage::user(prompt)], max_tokens)?;

        Ok(RagAnswer {
            question: question.to_string(),
            answer,
            sources: hits
                .into_iter()
                .map(|hit| Source {
                    id: hit.id,
                    score: hit.score,
                })
                .collect(),
            mode,
        })
    }
}

fn validate(question: &str) -> Result<&str, RagError> {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        Err(RagError::EmptyQuestion)
    } else {
        Ok(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{Embedder, HashingEmbedder};
    use crate::knowledge::VectorStore;
    use crate::knowledge::corpus::listing_documents;
    use crate::llm::ChatRequest;
    use std::sync::Mutex;

    struct RecordingClient {
        reply: String,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl RecordingClient {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn last_prompt(&self) -> String {
            let requests = self.requests.lock().unwrap();
            requests.last().unwrap().messages[0].text().to_string()
        }
    }

    impl ChatClientTrait for RecordingClient {
        fn complete(&self, request: &ChatRequest) -> Result<ChatMessage, LlmError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(ChatMessage::assistant(self.reply.clone()))
        }
    }

    fn seeded_retriever() -> Arc<Retriever> {
        let embedder = HashingEmbedder::default();
        let mut store = VectorStore::new();
        for doc in listing_documents() {
            let embedding = embedder.embed(&doc.content).unwrap();
            store.add(doc.id, doc.content, embedding).unwrap();
        }
        Arc::new(Retriever::new(store, Arc::new(embedder)))
    }

    fn empty_retriever() -> Arc<Retriever> {
        Arc::new(Retriever::new(
            VectorStore::new(),
            Arc::new(HashingEmbedder::default()),
        ))
    }

    #[test]
    fn semantic_answer_uses_two_documents_and_template() {
        let client = RecordingClient::new("The Oak Avenue home has a pool.");
        let pipeline = RagPipeline::new(seeded_retriever(), client.clone(), "deepseek-chat");

        let answer = pipeline.answer("Which property has a swimming pool?").unwrap();

        assert_eq!(answer.answer, "The Oak Avenue home has a pool.");
        assert_eq!(answer.sources.len(), 2);
        assert_eq!(answer.mode, RetrievalMode::Semantic);

        let prompt = client.last_prompt();
        assert!(prompt.starts_with("You are a knowledgeable real estate assistant."));
        assert!(prompt.contains("\n\nContext:\n"));
        assert!(prompt.ends_with("Question: Which property has a swimming pool?\n\nAnswer:"));

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests[0].max_tokens, Some(300));
        assert_eq!(requests[0].model, "deepseek-chat");
        assert!(requests[0].tools.is_none());
    }

    #[test]
    fn keyword_answer_joins_matches_with_newlines() {
        let client = RecordingClient::new("It costs $450,000.");
        let pipeline = RagPipeline::new(seeded_retriever(), client.clone(), "deepseek-chat");

        let answer = pipeline.answer_with_keywords("Tell me about 123 Main St").unwrap();
        assert_eq!(answer.mode, RetrievalMode::Keyword);

        let prompt = client.last_prompt();
        assert!(prompt.starts_with("Based on this real estate information:\n"));
        assert!(prompt.ends_with("Please answer based only on the provided information."));
        assert!(prompt.contains("Property: 123 Main St, Austin TX."));

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests[0].max_tokens, Some(200));
    }

    #[test]
    fn empty_question_is_rejected_before_calling_the_model() {
        let client = RecordingClient::new("unused");
        let pipeline = RagPipeline::new(seeded_retriever(), client.clone(), "m");

        assert!(matches!(pipeline.answer("   "), Err(RagError::EmptyQuestion)));
        assert!(matches!(
            pipeline.answer_with_keywords(""),
            Err(RagError::EmptyQuestion)
        ));
        assert!(client.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn empty_retrieval_still_calls_the_model() {
        let client = RecordingClient::new("I don't have data on that.");
        let pipeline = RagPipeline::new(empty_retriever(), client.clone(), "m");

        let answer = pipeline.answer("Anything?").unwrap();
        assert!(!answer.has_sources());
        assert!(client.last_prompt().contains("Context:\n\n\nQuestion: Anything?"));
    }

    #[test]
    fn llm_errors_propagate() {
        struct Failing;
        impl ChatClientTrait for Failing {
            fn complete(&self, _request: &ChatRequest) -> Result<ChatMessage, LlmError> {
                Err(LlmError::Auth)
            }
        }

        let pipeline = RagPipeline::new(seeded_retriever(), Arc::new(Failing), "m");
        let err = pipeline.answer("price?").unwrap_err();
        assert!(matches!(err, RagError::Llm(LlmError::Auth)));
    }

    #[test]
    fn answer_in_dispatches_by_mode() {
        let client = RecordingClient::new("ok");
        let pipeline = RagPipeline::new(seeded_retriever(), client, "m");
        let answer = pipeline.answer_in(RetrievalMode::Keyword, "pool").unwrap();
        assert_eq!(answer.source_ids(), ["fact_1"]);
    }
}
