//! `strata chat` — interactive session or single-message mode.
//!
//! The interactive loop is single-threaded cooperative: one user turn is
//! fully processed before the next input is read. Slash commands are
//! intercepted before the budget check. A collaborator failure abandons
//! the current turn and keeps the loop alive; only `/exit` and `/quit`
//! shut the session down, awaiting the session-end archival first.

use std::sync::Arc;
use strata_config::AppConfig;
use strata_context::{BudgetEstimator, ElasticBudgetController, Session};
use strata_core::inference::InferenceService;
use strata_core::store::{Embedder, EpisodicStore, SemanticStore};
use strata_providers::{HfTokenCounter, OpenAiCompatClient};
use strata_stores::{SqliteEpisodicStore, SqliteSemanticStore};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::commands::ingest;
use crate::persona;

/// A line of user input after command interception.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Exit,
    Clear,
    Recall(&'a str),
    Vault(&'a str),
    Ingest,
    Say(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if line == "/exit" || line == "/quit" {
            return Some(Command::Exit);
        }
        if line == "/clear" {
            return Some(Command::Clear);
        }
        if line == "/ingest" {
            return Some(Command::Ingest);
        }
        if let Some(rest) = line.strip_prefix("/recall") {
            return Some(Command::Recall(rest.trim()));
        }
        if let Some(rest) = line.strip_prefix("/vault") {
            return Some(Command::Vault(rest.trim()));
        }
        Some(Command::Say(line))
    }
}

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    let client = Arc::new(
        OpenAiCompatClient::new(
            "ollama",
            &config.api_url,
            config.api_key.clone().unwrap_or_else(|| "ollama".into()),
            &config.model,
        )
        .with_embed_model(&config.embed_model)
        .with_temperature(config.temperature)
        .with_max_tokens(config.max_tokens),
    );

    // Heartbeat: load model weights before the loop starts
    if let Err(e) = client.warmup().await {
        eprintln!();
        eprintln!("  ERROR: inference endpoint unreachable at {}", config.api_url);
        eprintln!("  {e}");
        eprintln!();
        eprintln!("  Is the model server running? For Ollama:");
        eprintln!("    ollama serve && ollama pull {}", config.model);
        eprintln!();
        return Err("Inference endpoint warm-up failed".into());
    }

    let estimator = build_estimator(&config);
    let (persona_block, persona_tokens) = persona::load(&config, &estimator);

    std::fs::create_dir_all(&config.data_dir)?;
    let episodic = Arc::new(
        SqliteEpisodicStore::new(&format!(
            "sqlite://{}",
            config.data_dir.join("episodic.db").display()
        ))
        .await?,
    );
    let vault = Arc::new(
        SqliteSemanticStore::new(
            &format!("sqlite://{}", config.data_dir.join("vault.db").display()),
            client.clone() as Arc<dyn Embedder>,
        )
        .await?,
    );

    let controller = ElasticBudgetController::new(config.budget.base_limit, config.budget.reserve);
    let mut session = Session::new(
        persona_block,
        client.clone() as Arc<dyn InferenceService>,
        episodic.clone() as Arc<dyn EpisodicStore>,
        vault.clone() as Arc<dyn SemanticStore>,
        estimator,
        controller,
    );

    if let Some(msg) = message {
        // Single message mode
        let reply = session.handle_turn(&msg).await?;
        println!("{reply}");
        session.end().await?;
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  strata — tiered memory session");
    println!();
    println!("  Endpoint:  {} ({})", config.api_url, config.model);
    println!(
        "  Overhead:  {persona_tokens}/{} persona tokens{}",
        persona::PERSONA_TOKEN_BUDGET,
        if persona_tokens <= persona::PERSONA_TOKEN_BUDGET {
            ""
        } else {
            "  [over budget]"
        }
    );
    println!(
        "  Budget:    {} + {} reserve tokens for history",
        config.budget.base_limit, config.budget.reserve
    );
    println!();
    println!("  Commands: /recall <query>  /vault <query>  /clear  /ingest  /exit");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("  You > ");
        use std::io::Write;
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break; // EOF
        };

        match Command::parse(&line) {
            None => continue,

            Some(Command::Exit) => {
                if !session.history().is_empty() {
                    println!("  [*] Archiving this session to the ledger...");
                }
                if let Err(e) = session.end().await {
                    eprintln!("  [Error] Session archival failed: {e}");
                }
                break;
            }

            Some(Command::Clear) => {
                session.clear_context();
                println!("  [*] Injected context cleared.");
            }

            Some(Command::Recall(query)) => {
                if query.is_empty() {
                    println!("  Usage: /recall <keywords>");
                    continue;
                }
                match session.recall(query).await {
                    Ok(Some(slot)) => {
                        println!("  [*] Tier 2 context injected ({}).", slot.source);
                    }
                    Ok(None) => println!("  No matching ledger records."),
                    Err(e) => eprintln!("  [Error] Ledger search failed: {e}"),
                }
            }

            Some(Command::Vault(query)) => {
                if query.is_empty() {
                    println!("  Usage: /vault <query>");
                    continue;
                }
                match session.vault_search(query).await {
                    Ok(Some(slot)) => {
                        let distance = slot.distance.unwrap_or_default();
                        println!(
                            "  [*] Tier 3 context injected ({}, distance {distance:.3}).",
                            slot.source
                        );
                    }
                    Ok(None) => println!("  No confident vault match."),
                    Err(e) => eprintln!("  [Error] Vault search failed: {e}"),
                }
            }

            Some(Command::Ingest) => match ingest::sync(&config, &vault).await {
                Ok(report) => println!("  {report}"),
                Err(e) => eprintln!("  [Error] Ingestion failed: {e}"),
            },

            Some(Command::Say(text)) => {
                debug!(limit = session.effective_limit(), "Processing turn");
                match session.handle_turn(text).await {
                    Ok(reply) => {
                        println!();
                        for line in reply.lines() {
                            println!("  Assistant > {line}");
                        }
                        println!();
                    }
                    Err(e) => {
                        // Turn abandoned; loop continues
                        eprintln!("  [Error] {e}");
                        println!();
                    }
                }
            }
        }
    }

    println!("  Session closed.");
    Ok(())
}

fn build_estimator(config: &AppConfig) -> BudgetEstimator {
    match &config.tokenizer_file {
        Some(path) => match HfTokenCounter::from_file(path) {
            Ok(counter) => BudgetEstimator::new(Arc::new(counter)),
            Err(e) => {
                debug!(error = %e, "Tokenizer unavailable, using word heuristic");
                BudgetEstimator::heuristic()
            }
        },
        None => BudgetEstimator::heuristic(),
    }
}
