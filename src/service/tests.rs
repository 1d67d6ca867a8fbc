use super::*;
use crate::agents::testing::ScriptedClient;
use crate::config::EmbedderKind;
use crate::embedding::{Embedder, HashingEmbedder};
use tempfile::tempdir;

fn seeded_kb() -> KnowledgeBase {
    let db = Database::in_memory().expect("failed to create in-memory database");
    let mut kb = KnowledgeBase::open(db, Arc::new(HashingEmbedder::default()))
        .expect("failed to open knowledge base");
    kb.seed_defaults().expect("failed to seed");
    kb
}

fn test_config(path: std::path::PathBuf) -> Config {
    Config {
        api_key: Some("sk-test".to_string()),
        base_url: None,
        model: Some("deepseek-chat".to_string()),
        embedder: EmbedderKind::Local,
        ollama_host: None,
        embedding_model: "all-minilm".to_string(),
        model_cache_dir: path.with_file_name("models"),
        database_path: path,
    }
}

fn hashing() -> Arc<dyn Embedder> {
    Arc::new(HashingEmbedder::default())
}

#[test]
fn ask_retrieves_from_the_knowledge_base() {
    let client = ScriptedClient::new().reply("It has a pool.");
    let service = RealtorService::new(client.clone(), "deepseek-chat", seeded_kb());

    let answer = service
        .ask("Which property has a swimming pool?", RetrievalMode::Semantic)
        .expect("ask should succeed");

    assert_eq!(answer.answer, "It has a pool.");
    assert_eq!(answer.sources.len(), 2);
    assert_eq!(client.request_count(), 1);
}

#[test]
fn refresh_picks_up_new_documents() {
    let client = ScriptedClient::new().reply("first").reply("second");
    let db = Database::in_memory().expect("failed to create in-memory database");
    let kb = KnowledgeBase::open(db, Arc::new(HashingEmbedder::default())).unwrap();
    let mut service = RealtorService::new(client.clone(), "deepseek-chat", kb);

    let before = service.ask("lakefront cabin", RetrievalMode::Semantic).unwrap();
    assert!(before.sources.is_empty());

    service
        .knowledge_mut()
        .add_document(None, "Lakefront cabin with a private dock")
        .unwrap();
    service.refresh();

    let after = service.ask("lakefront cabin", RetrievalMode::Semantic).unwrap();
    assert_eq!(after.source_ids(), vec!["doc_0"]);
}

#[test]
fn from_config_creates_and_seeds_database() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("knowledge.db");

    let service =
        RealtorService::from_config_with_embedder(&test_config(path.clone()), hashing()).unwrap();
    assert_eq!(service.knowledge().len(), 6);
    assert_eq!(service.model(), "deepseek-chat");
    assert!(path.exists());

    drop(service);
    let reopened =
        RealtorService::from_config_with_embedder(&test_config(path), hashing()).unwrap();
    assert_eq!(reopened.knowledge().len(), 6, "seeding must not duplicate");
}

#[test]
fn removed_listings_stay_removed() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path().join("knowledge.db"));

    let mut kb = open_knowledge_base_with(&config, hashing()).unwrap();
    assert!(kb.remove_document("doc_2").unwrap());
    drop(kb);

    let kb = open_knowledge_base_with(&config, hashing()).unwrap();
    assert_eq!(kb.len(), 5);
    assert!(kb.get("doc_2").is_none());
}

#[test]
fn memory_agent_persists_facts_in_the_database() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path().join("knowledge.db"));

    let service = RealtorService::from_config_with_embedder(&config, hashing()).unwrap();
    let mut agent = service.into_memory_agent().unwrap();
    agent.remember("budget", "$400K");
    drop(agent);

    let kb = open_knowledge_base_with(&config, hashing()).unwrap();
    assert_eq!(kb.fact("budget").unwrap().as_deref(), Some("$400K"));

    let agent = RealtorService::from_config_with_embedder(&config, hashing())
        .unwrap()
        .into_memory_agent()
        .unwrap();
    assert_eq!(agent.user_context().get("budget").map(String::as_str), Some("$400K"));
}
