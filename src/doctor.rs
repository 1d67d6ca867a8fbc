//! Health check and maintenance utilities for realtor.
//!
//! Provides the `doctor` command functionality:
//! - System health checks (database, chat API, embedding backend)
//! - Knowledge-base statistics
//! - Repair of missing listings and stale embeddings

use std::io::{self, Write};

use anyhow::{Context, Result};

use crate::config::{Config, EmbedderKind};
use crate::db::Database;
use crate::embedding::{Embedder, LOCAL_EMBEDDING_MODEL};
use crate::knowledge::corpus::{LISTINGS, listing_id};
use crate::llm::{ChatClient, LlmError};
use crate::service::open_knowledge_base_with;
use crate::utils::ensure_database_directory;

// ANSI color codes for terminal output
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Health status for a component.
#[derive(Debug, Clone, PartialEq)]
pub enum HealthStatus {
    /// Component is healthy
    Ok,
    /// Component has a warning but is functional
    Warning(String),
    /// Component is not functional
    Error(String),
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, HealthStatus::Ok)
    }

    fn describe(&self, ok_text: &str) -> String {
        match self {
            HealthStatus::Ok => ok_text.to_string(),
            HealthStatus::Warning(w) => w.clone(),
            HealthStatus::Error(e) => e.clone(),
        }
    }
}

/// Database health information.
#[derive(Debug)]
pub struct DatabaseHealth {
    pub status: HealthStatus,
    pub file_path: String,
}

/// Chat API connectivity information.
#[derive(Debug)]
pub struct ChatHealth {
    pub status: HealthStatus,
    pub base_url: String,
    pub model: String,
    pub has_api_key: bool,
}

/// Embedding backend information.
#[derive(Debug)]
pub struct EmbedderHealth {
    pub status: HealthStatus,
    pub backend: String,
    pub model: String,
    pub dimensions: Option<usize>,
}

/// Knowledge-base statistics for doctor output.
#[derive(Debug, Default, PartialEq)]
pub struct KnowledgeStats {
    pub documents: i64,
    pub missing_listings: Vec<String>,
    pub embedding_models: Vec<String>,
    pub facts: i64,
}

/// Work the repair step would do.
#[derive(Debug, Default, PartialEq)]
pub struct RepairPlan {
    pub missing_listings: Vec<String>,
    pub stale_documents: Vec<String>,
}

impl RepairPlan {
    pub fn is_empty(&self) -> bool {
        self.missing_listings.is_empty() && self.stale_documents.is_empty()
    }

    pub fn total_items(&self) -> usize {
        self.missing_listings.len() + self.stale_documents.len()
    }
}

// ============================================================================
// Health Check Functions
// ============================================================================

/// Performs all health checks and prints results.
pub fn run_health_checks(config: &Config) -> Result<()> {
    ensure_database_directory(&config.database_path)
        .context("Failed to ensure database directory")?;
    let db = Database::open(&config.database_path).context("Failed to open database")?;

    let db_health = check_database_health(&config.database_path.display().to_string(), &db);
    let chat_health = match config.chat_client() {
        Ok(client) => check_chat_health(&client),
        Err(e) => ChatHealth {
            status: HealthStatus::Error(format!("{e:#}")),
            base_url: String::new(),
            model: String::new(),
            has_api_key: config.api_key.is_some(),
        },
    };
    let embedder_health = match config.embedder() {
        Ok(embedder) => check_embedder_health(embedder.as_ref(), &config.embedder.to_string()),
        Err(e) => EmbedderHealth {
            status: HealthStatus::Error(format!("{e:#}")),
            backend: config.embedder.to_string(),
            model: match config.embedder {
                EmbedderKind::Local => LOCAL_EMBEDDING_MODEL.to_string(),
                EmbedderKind::Ollama => config.embedding_model.clone(),
            },
            dimensions: None,
        },
    };
    let stats = get_knowledge_stats(&db)?;

    print_health_report(
        &mut io::stdout().lock(),
        &db_health,
        &chat_health,
        &embedder_health,
        &stats,
    )?;

    Ok(())
}

pub fn check_database_health(db_path: &str, db: &Database) -> DatabaseHealth {
    let status = match db.connection().query_row("SELECT 1", [], |_| Ok(())) {
        Ok(_) => HealthStatus::Ok,
        Err(e) => HealthStatus::Error(format!("Connection test failed: {}", e)),
    };

    DatabaseHealth {
        status,
        file_path: db_path.to_string(),
    }
}

/// Pings the chat API. Without a key the check fails without a request.
pub fn check_chat_health(client: &ChatClient) -> ChatHealth {
    let status = if !client.has_api_key() {
        HealthStatus::Error(LlmError::Auth.to_string())
    } else {
        match client.ping() {
            Ok(reply) if reply.trim().is_empty() => {
                HealthStatus::Warning("Connected, but the reply was empty".to_string())
            }
            Ok(_) => HealthStatus::Ok,
            Err(e) => HealthStatus::Error(format!("Connection failed: {}", e)),
        }
    };

    ChatHealth {
        status,
        base_url: client.base_url().to_string(),
        model: client.model().to_string(),
        has_api_key: client.has_api_key(),
    }
}

/// Embeds a probe text to confirm the backend answers.
pub fn check_embedder_health(embedder: &dyn Embedder, backend: &str) -> EmbedderHealth {
    let (status, dimensions) = match embedder.embed("health check") {
        Ok(vector) if vector.is_empty() => (
            HealthStatus::Warning("Backend returned an empty vector".to_string()),
            Some(0),
        ),
        Ok(vector) => (HealthStatus::Ok, Some(vector.len())),
        Err(e) => (HealthStatus::Error(format!("Connection failed: {}", e)), None),
    };

    EmbedderHealth {
        status,
        backend: backend.to_string(),
        model: embedder.model_id().to_string(),
        dimensions,
    }
}

pub fn get_knowledge_stats(db: &Database) -> Result<KnowledgeStats> {
    let conn = db.connection();

    let documents: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
    let facts: i64 = conn.query_row("SELECT COUNT(*) FROM user_facts", [], |row| row.get(0))?;

    let mut stmt =
        conn.prepare("SELECT DISTINCT embedding_model FROM documents ORDER BY embedding_model")?;
    let embedding_models = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(KnowledgeStats {
        documents,
        missing_listings: missing_listings(db)?,
        embedding_models,
        facts,
    })
}

fn missing_listings(db: &Database) -> Result<Vec<String>> {
    let mut stmt = db
        .connection()
        .prepare("SELECT COUNT(*) FROM documents WHERE id = ?1")?;

    let mut missing = Vec::new();
    for i in 0..LISTINGS.len() {
        let id = listing_id(i);
        let count: i64 = stmt.query_row([&id], |row| row.get(0))?;
        if count == 0 {
            missing.push(id);
        }
    }
    Ok(missing)
}

// ============================================================================
// Pretty Printing
// ============================================================================

fn status_symbol(status: &HealthStatus) -> &'static str {
    match status {
        HealthStatus::Ok => "\u{2713}",
        HealthStatus::Warning(_) => "!",
        HealthStatus::Error(_) => "\u{2717}",
    }
}

fn status_color(status: &HealthStatus) -> &'static str {
    match status {
        HealthStatus::Ok => GREEN,
        HealthStatus::Warning(_) => YELLOW,
        HealthStatus::Error(_) => RED,
    }
}

fn print_status(
    out: &mut impl Write,
    status: &HealthStatus,
    label: &str,
    ok_text: &str,
) -> io::Result<()> {
    writeln!(
        out,
        "  {}{}{} {}: {}",
        status_color(status),
        status_symbol(status),
        RESET,
        label,
        status.describe(ok_text)
    )
}

pub fn print_health_report(
    out: &mut impl Write,
    db: &DatabaseHealth,
    chat: &ChatHealth,
    embedder: &EmbedderHealth,
    stats: &KnowledgeStats,
) -> io::Result<()> {
    writeln!(out, "{}realtor doctor{}", BOLD, RESET)?;
    writeln!(out)?;

    writeln!(out, "{}Database{}", BOLD, RESET)?;
    print_status(out, &db.status, "Connection", "OK")?;
    writeln!(out, "    {}Path: {}{}", DIM, db.file_path, RESET)?;
    writeln!(out)?;

    writeln!(out, "{}Chat API{}", BOLD, RESET)?;
    print_status(out, &chat.status, "Status", "Connected")?;
    if !chat.base_url.is_empty() {
        writeln!(out, "    {}URL: {}{}", DIM, chat.base_url, RESET)?;
    }
    if !chat.model.is_empty() {
        writeln!(out, "    {}Model: {}{}", DIM, chat.model, RESET)?;
    }
    writeln!(
        out,
        "    {}API key: {}{}",
        DIM,
        if chat.has_api_key { "set" } else { "missing" },
        RESET
    )?;
    writeln!(out)?;

    writeln!(out, "{}Embeddings{}", BOLD, RESET)?;
    print_status(out, &embedder.status, "Status", "Reachable")?;
    writeln!(out, "    {}Backend: {}{}", DIM, embedder.backend, RESET)?;
    writeln!(out, "    {}Model: {}{}", DIM, embedder.model, RESET)?;
    if let Some(dimensions) = embedder.dimensions {
        writeln!(out, "    {}Dimensions: {}{}", DIM, dimensions, RESET)?;
    }
    writeln!(out)?;

    writeln!(out, "{}Knowledge Base{}", BOLD, RESET)?;
    writeln!(out, "  Documents:  {:>6}", stats.documents)?;
    if !stats.missing_listings.is_empty() {
        writeln!(
            out,
            "  {}Missing listings: {}{}",
            YELLOW,
            stats.missing_listings.join(", "),
            RESET
        )?;
    }
    if !stats.embedding_models.is_empty() {
        writeln!(
            out,
            "    {}Embedded with: {}{}",
            DIM,
            stats.embedding_models.join(", "),
            RESET
        )?;
    }
    writeln!(out, "  Facts:      {:>6}", stats.facts)?;
    Ok(())
}

// ============================================================================
// Repair Functions
// ============================================================================

/// Lists missing listings and documents embedded by another model.
pub fn create_repair_plan(db: &Database, embedding_model: &str) -> Result<RepairPlan> {
    let mut stmt = db.connection().prepare(
        "SELECT id FROM documents WHERE embedding_model != ?1 ORDER BY created_at, rowid",
    )?;
    let stale_documents = stmt
        .query_map([embedding_model], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RepairPlan {
        missing_listings: missing_listings(db)?,
        stale_documents,
    })
}

pub fn print_repair_plan(out: &mut impl Write, plan: &RepairPlan) -> io::Result<()> {
    writeln!(out, "{}Repair Plan{}", BOLD, RESET)?;
    writeln!(out)?;

    if !plan.missing_listings.is_empty() {
        writeln!(
            out,
            "Listings to seed: {}{}{}",
            BOLD,
            plan.missing_listings.len(),
            RESET
        )?;
        for id in &plan.missing_listings {
            writeln!(out, "  {}- {}{}", DIM, id, RESET)?;
        }
        writeln!(out)?;
    }

    if !plan.stale_documents.is_empty() {
        writeln!(
            out,
            "Documents to re-embed: {}{}{}",
            BOLD,
            plan.stale_documents.len(),
            RESET
        )?;
        for id in plan.stale_documents.iter().take(10) {
            writeln!(out, "  {}- {}{}", DIM, id, RESET)?;
        }
        if plan.stale_documents.len() > 10 {
            writeln!(
                out,
                "  {}... and {} more{}",
                DIM,
                plan.stale_documents.len() - 10,
                RESET
            )?;
        }
    }
    Ok(())
}

/// Prompts user for confirmation.
pub fn confirm_repair() -> bool {
    print!("\nProceed with repair? [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }

    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Runs the health report, then offers to repair the knowledge base.
pub fn run_doctor(config: &Config, repair: bool, assume_yes: bool) -> Result<()> {
    run_health_checks(config)?;
    if !repair {
        return Ok(());
    }

    let db = Database::open(&config.database_path).context("Failed to open database")?;
    let embedder = config.embedder()?;
    let plan = create_repair_plan(&db, embedder.model_id())?;
    drop(db);

    println!();
    if plan.is_empty() {
        println!("{}Nothing to repair.{}", GREEN, RESET);
        return Ok(());
    }

    print_repair_plan(&mut io::stdout().lock(), &plan)?;
    if !assume_yes && !confirm_repair() {
        println!("Repair cancelled.");
        return Ok(());
    }

    // Opening re-embeds stale rows; seeding fills the gaps
    let mut kb = open_knowledge_base_with(config, embedder)?;
    kb.seed_defaults()
        .context("Failed to seed default listings")?;
    println!(
        "{}Repaired {} item(s); {} documents embedded with {}.{}",
        GREEN,
        plan.total_items(),
        kb.len(),
        kb.embedding_model(),
        RESET
    );
    Ok(())
}
