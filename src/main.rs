use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use realtor::demo::DemoSet;
use realtor::tools::{affordability_check, calculate_mortgage, property_comparison};
use realtor::{
    AgentError, Config, KnowledgeBase, RagError, RealtorService, RetrievalMode, StoreError,
    ToolError, doctor, service, tui,
};

/// realtor - real-estate assistant built on retrieval, calculator tools and agents
#[derive(Parser)]
#[command(name = "realtor")]
#[command(about = "A real-estate assistant with RAG answers, calculator tools and cooperating agents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Check that the chat API answers
    Ping,
    /// Answer a question from the knowledge base
    Ask(AskCommand),
    /// One turn with the tool-calling real estate agent
    Agent(MessageCommand),
    /// Route a message to the research and financial specialists
    Coordinate(MessageCommand),
    /// Run a calculator directly
    #[command(subcommand)]
    Calc(CalcCommand),
    /// Manage the knowledge base
    #[command(subcommand)]
    Kb(KbCommand),
    /// Run a canned question list
    Demo(DemoCommand),
    /// Interactive terminal chat
    Chat,
    /// Check database, API and embedding health
    Doctor(DoctorCommand),
}

#[derive(Parser)]
struct AskCommand {
    /// The question to answer
    #[arg(value_name = "QUESTION")]
    question: String,

    /// Match quick facts by keyword instead of semantic search
    #[arg(short, long)]
    keyword: bool,
}

#[derive(Parser)]
struct MessageCommand {
    /// The message for the agent
    #[arg(value_name = "MESSAGE")]
    message: String,
}

#[derive(Subcommand)]
enum CalcCommand {
    /// Monthly payment and total cost of a fixed-rate loan
    Mortgage {
        /// Home price in dollars
        price: f64,
        /// Down payment percentage
        #[arg(long, default_value_t = 20.0)]
        down: f64,
        /// Annual interest rate percentage
        #[arg(long, default_value_t = 6.5)]
        rate: f64,
        /// Loan term in years
        #[arg(long, default_value_t = 30.0)]
        years: f64,
    },
    /// Compare two properties by price per square foot
    Compare {
        price1: f64,
        sqft1: f64,
        price2: f64,
        sqft2: f64,
    },
    /// Check affordability under the 28/36 rule
    Afford {
        /// Annual income in dollars
        income: f64,
        /// Home price in dollars
        price: f64,
        /// Existing monthly debt payments
        #[arg(long, default_value_t = 0.0)]
        debt: f64,
    },
}

#[derive(Subcommand)]
enum KbCommand {
    /// List stored documents
    List,
    /// Add a document
    Add {
        /// Document text
        #[arg(value_name = "TEXT", conflicts_with = "file")]
        text: Option<String>,
        /// Read the document text from a file
        #[arg(short, long, value_name = "PATH")]
        file: Option<PathBuf>,
        /// Explicit document id (default: next free doc_N)
        #[arg(long)]
        id: Option<String>,
    },
    /// Remove a document by id
    Remove {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Restore any missing built-in listings
    Seed,
}

#[derive(Parser)]
struct DemoCommand {
    /// Which walkthrough to run
    #[arg(value_enum, default_value_t = DemoArg::Rag)]
    set: DemoArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum DemoArg {
    Rag,
    Keyword,
    Agent,
}

impl From<DemoArg> for DemoSet {
    fn from(arg: DemoArg) -> Self {
        match arg {
            DemoArg::Rag => DemoSet::Rag,
            DemoArg::Keyword => DemoSet::Keyword,
            DemoArg::Agent => DemoSet::Agent,
        }
    }
}

#[derive(Parser)]
struct DoctorCommand {
    /// Offer to seed missing listings and re-embed stale documents
    #[arg(long)]
    repair: bool,

    /// Repair without asking for confirmation
    #[arg(short, long, requires = "repair")]
    yes: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(matches!(cli.command, Commands::Chat));

    let result = match &cli.command {
        Commands::Calc(cmd) => handle_calc(cmd),
        command => Config::load().and_then(|config| dispatch(command, &config)),
    };

    if let Err(e) = result {
        // Determine exit code based on error type
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

/// Logs to stderr. `RUST_LOG` overrides the default filter; the chat UI
/// defaults to silence so log lines do not corrupt the screen.
fn init_tracing(interactive: bool) {
    use tracing_subscriber::prelude::*;

    let default_filter = if interactive { "off" } else { "realtor=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn dispatch(command: &Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Ping => handle_ping(config),
        Commands::Ask(cmd) => handle_ask(cmd, config),
        Commands::Agent(cmd) => handle_agent(cmd, config),
        Commands::Coordinate(cmd) => handle_coordinate(cmd, config),
        Commands::Calc(cmd) => handle_calc(cmd),
        Commands::Kb(cmd) => handle_kb(cmd, config),
        Commands::Demo(cmd) => handle_demo(cmd, config),
        Commands::Chat => tui::run(config),
        Commands::Doctor(cmd) => doctor::run_doctor(config, cmd.repair, cmd.yes),
    }
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors are bad input: empty messages, unknown ids, invalid
/// calculator arguments. Network, database and API failures are internal.
fn is_user_error(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        if let Some(e) = cause.downcast_ref::<AgentError>() {
            return matches!(e, AgentError::EmptyMessage | AgentError::Tool(_));
        }
        if let Some(e) = cause.downcast_ref::<RagError>() {
            return matches!(e, RagError::EmptyQuestion);
        }
        if let Some(e) = cause.downcast_ref::<StoreError>() {
            return matches!(e, StoreError::DuplicateId(_) | StoreError::EmptyDocument);
        }
        if cause.downcast_ref::<ToolError>().is_some() {
            return true;
        }
        let message = cause.to_string();
        message.contains("cannot be empty") || message.starts_with("No document with id")
    })
}

fn handle_ping(config: &Config) -> Result<()> {
    let client = config.chat_client()?;
    let reply = client.ping().context("API connection failed")?;
    println!("API connection successful!");
    println!("Response: {reply}");
    Ok(())
}

fn handle_ask(cmd: &AskCommand, config: &Config) -> Result<()> {
    let service = RealtorService::from_config(config)?;
    let mode = if cmd.keyword {
        RetrievalMode::Keyword
    } else {
        RetrievalMode::Semantic
    };

    let answer = service.ask(&cmd.question, mode)?;
    println!("{}", answer.answer);
    println!();
    if answer.has_sources() {
        println!("Sources ({mode}): {}", answer.source_ids().join(", "));
    } else {
        println!("Sources ({mode}): none");
    }
    Ok(())
}

fn handle_agent(cmd: &MessageCommand, config: &Config) -> Result<()> {
    let service = RealtorService::from_config(config)?;
    let reply = service.tool_agent().run(&cmd.message)?;

    println!("{}", reply.text);
    if reply.used_tools() {
        let names: Vec<&str> = reply.tool_calls.iter().map(|c| c.name.as_str()).collect();
        println!();
        println!("Tools used: {}", names.join(", "));
    }
    Ok(())
}

fn handle_coordinate(cmd: &MessageCommand, config: &Config) -> Result<()> {
    let service = RealtorService::from_config(config)?;
    let response = service.customer_agent().coordinate_response(&cmd.message)?;

    let needs: Vec<String> = response.needs.iter().map(ToString::to_string).collect();
    if needs.is_empty() {
        println!("Consulted: none");
    } else {
        println!("Consulted: {}", needs.join(", "));
    }
    println!();
    println!("{}", response.answer);
    Ok(())
}

fn handle_calc(cmd: &CalcCommand) -> Result<()> {
    println!("{}", execute_calc(cmd)?);
    Ok(())
}

/// Runs a calculator and returns its result as pretty JSON.
fn execute_calc(cmd: &CalcCommand) -> Result<String> {
    let value = match *cmd {
        CalcCommand::Mortgage {
            price,
            down,
            rate,
            years,
        } => serde_json::to_value(calculate_mortgage(price, down, rate, years)?)?,
        CalcCommand::Compare {
            price1,
            sqft1,
            price2,
            sqft2,
        } => serde_json::to_value(property_comparison(price1, price2, sqft1, sqft2)?)?,
        CalcCommand::Afford {
            income,
            price,
            debt,
        } => serde_json::to_value(affordability_check(income, debt, price)?)?,
    };
    Ok(serde_json::to_string_pretty(&value)?)
}

fn handle_kb(cmd: &KbCommand, config: &Config) -> Result<()> {
    let mut kb = service::open_knowledge_base(config)?;
    execute_kb(cmd, &mut kb)
}

/// Executes a knowledge-base command against an open knowledge base.
///
/// Separated from `handle_kb` to allow testing with in-memory databases.
fn execute_kb(cmd: &KbCommand, kb: &mut KnowledgeBase) -> Result<()> {
    match cmd {
        KbCommand::List => {
            println!(
                "{} document(s), embedded with {}",
                kb.len(),
                kb.embedding_model()
            );
            for doc in kb.documents() {
                println!("  {}: {}", doc.id, preview(&doc.content, 80));
            }
        }
        KbCommand::Add { text, file, id } => {
            let text = match (text, file) {
                (Some(text), _) => text.clone(),
                (None, Some(path)) => std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                (None, None) => anyhow::bail!("Document text cannot be empty"),
            };
            let id = kb.add_document(id.as_deref(), &text)?;
            println!("Document added (id: {id})");
        }
        KbCommand::Remove { id } => {
            if !kb.remove_document(id)? {
                anyhow::bail!("No document with id {id}");
            }
            println!("Document removed (id: {id})");
        }
        KbCommand::Seed => {
            let added = kb.seed_defaults()?;
            println!("Seeded {added} listing(s)");
        }
    }
    Ok(())
}

fn handle_demo(cmd: &DemoCommand, config: &Config) -> Result<()> {
    let set = DemoSet::from(cmd.set);
    let service = RealtorService::from_config(config)?;
    let agent = service.tool_agent();

    println!("{}", set.title());
    println!();

    for question in set.questions() {
        println!("Question: {question}");
        let answer = match set {
            DemoSet::Rag => service.ask(question, RetrievalMode::Semantic)?.answer,
            DemoSet::Keyword => service.ask(question, RetrievalMode::Keyword)?.answer,
            DemoSet::Agent => agent.run(question)?.text,
        };
        println!("Answer: {answer}");
        println!("{}", "-".repeat(80));
    }
    Ok(())
}

/// First `max_chars` characters of a single-line rendering of `text`.
fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() > max_chars {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{cut}...")
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use realtor::{Database, HashingEmbedder};

    fn empty_kb() -> KnowledgeBase {
        let db = Database::in_memory().expect("failed to create in-memory database");
        KnowledgeBase::open(db, Arc::new(HashingEmbedder::new(32))).expect("failed to open")
    }

    #[test]
    fn cli_parses_every_subcommand() {
        use clap::CommandFactory;
        Cli::command().debug_assert();

        let cli = Cli::try_parse_from(["realtor", "ask", "pools?", "--keyword"]).unwrap();
        assert!(matches!(cli.command, Commands::Ask(AskCommand { keyword: true, .. })));

        let cli = Cli::try_parse_from(["realtor", "demo"]).unwrap();
        assert!(matches!(cli.command, Commands::Demo(DemoCommand { set: DemoArg::Rag })));

        assert!(Cli::try_parse_from(["realtor", "kb", "add", "text", "--file", "x.txt"]).is_err());
        assert!(Cli::try_parse_from(["realtor", "doctor", "--yes"]).is_err());
    }

    #[test]
    fn calc_mortgage_defaults() {
        let cli = Cli::try_parse_from(["realtor", "calc", "mortgage", "450000"]).unwrap();
        let Commands::Calc(cmd) = cli.command else {
            panic!("expected calc");
        };
        let json: serde_json::Value = serde_json::from_str(&execute_calc(&cmd).unwrap()).unwrap();
        assert_eq!(json["monthly_payment"], 2275.44);
        assert_eq!(json["loan_amount"], 360000.0);
    }

    #[test]
    fn calc_compare_and_afford() {
        let compare = CalcCommand::Compare {
            price1: 450_000.0,
            sqft1: 2_000.0,
            price2: 620_000.0,
            sqft2: 2_800.0,
        };
        let json: serde_json::Value =
            serde_json::from_str(&execute_calc(&compare).unwrap()).unwrap();
        assert_eq!(json["better_value"], "Property 2");

        let afford = CalcCommand::Afford {
            income: 120_000.0,
            price: 450_000.0,
            debt: 0.0,
        };
        let json: serde_json::Value =
            serde_json::from_str(&execute_calc(&afford).unwrap()).unwrap();
        assert_eq!(json["can_afford"], true);
    }

    #[test]
    fn invalid_calculator_input_is_user_error() {
        let cmd = CalcCommand::Mortgage {
            price: 450_000.0,
            down: 20.0,
            rate: 6.5,
            years: 0.0,
        };
        let err = execute_calc(&cmd).unwrap_err();
        assert!(is_user_error(&err));
    }

    #[test]
    fn kb_add_requires_text() {
        let mut kb = empty_kb();
        let cmd = KbCommand::Add {
            text: None,
            file: None,
            id: None,
        };
        let err = execute_kb(&cmd, &mut kb).unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
        assert!(is_user_error(&err));
    }

    #[test]
    fn kb_add_from_file_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listing.txt");
        std::fs::write(&path, "Ranch house in Round Rock with a workshop").unwrap();

        let mut kb = empty_kb();
        let add = KbCommand::Add {
            text: None,
            file: Some(path),
            id: Some("ranch".to_string()),
        };
        execute_kb(&add, &mut kb).unwrap();
        assert!(kb.get("ranch").is_some());

        let remove = KbCommand::Remove {
            id: "ranch".to_string(),
        };
        execute_kb(&remove, &mut kb).unwrap();
        assert!(kb.is_empty());

        let err = execute_kb(&remove, &mut kb).unwrap_err();
        assert!(is_user_error(&err));
    }

    #[test]
    fn duplicate_id_is_user_error() {
        let mut kb = empty_kb();
        execute_kb(&KbCommand::Seed, &mut kb).unwrap();
        let add = KbCommand::Add {
            text: Some("Another listing".to_string()),
            file: None,
            id: Some("doc_0".to_string()),
        };
        let err = execute_kb(&add, &mut kb).unwrap_err();
        assert!(is_user_error(&err));
    }

    #[test]
    fn internal_errors_are_not_user_errors() {
        let err = anyhow::anyhow!("connection refused").context("Failed to open database");
        assert!(!is_user_error(&err));
    }

    #[test]
    fn preview_truncates_on_characters() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("line one\nline two", 8), "line one...");
        assert_eq!(preview("café au lait", 4), "café...");
    }
}
