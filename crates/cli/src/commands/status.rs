//! `strata status` — store counts and configuration summary.

use std::sync::Arc;
use strata_config::AppConfig;
use strata_context::CONSOLIDATION_THRESHOLD;
use strata_core::error::StoreError;
use strata_core::store::{Embedder, EpisodicStore};
use strata_stores::{SqliteEpisodicStore, SqliteSemanticStore};

/// An embedder that never runs — status only counts rows.
struct OfflineEmbedder;

#[async_trait::async_trait]
impl Embedder for OfflineEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, StoreError> {
        Err(StoreError::EmbeddingFailed("status is offline".into()))
    }
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    println!();
    println!("  strata status");
    println!();
    println!("  Endpoint:   {} ({})", config.api_url, config.model);
    println!("  Data dir:   {}", config.data_dir.display());
    println!("  Docs dir:   {}", config.docs_dir.display());
    println!(
        "  Budget:     base {} + reserve {} tokens",
        config.budget.base_limit, config.budget.reserve
    );

    if config.data_dir.join("episodic.db").exists() {
        let episodic = SqliteEpisodicStore::new(&format!(
            "sqlite://{}",
            config.data_dir.join("episodic.db").display()
        ))
        .await?;
        let unarchived = episodic.count_unarchived().await?;
        println!(
            "  Ledger:     {unarchived}/{CONSOLIDATION_THRESHOLD} summaries until consolidation"
        );
    } else {
        println!("  Ledger:     not yet created");
    }

    if config.data_dir.join("vault.db").exists() {
        let vault = SqliteSemanticStore::new(
            &format!("sqlite://{}", config.data_dir.join("vault.db").display()),
            Arc::new(OfflineEmbedder),
        )
        .await?;
        println!("  Vault:      {} documents", vault.count().await?);
    } else {
        println!("  Vault:      not yet created");
    }

    println!();
    Ok(())
}
