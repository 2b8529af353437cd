//! `strata ingest` — sync the docs folder into the semantic vault.
//!
//! Text files only (`.txt`, `.md`); OCR and binary formats are out of
//! scope. Files are deduplicated against the vault by content hash, so
//! re-running the sync is idempotent.

use std::sync::Arc;
use strata_config::AppConfig;
use strata_core::slot::epoch_seconds;
use strata_core::store::{Embedder, InsertOutcome};
use strata_core::content_hash;
use strata_providers::OpenAiCompatClient;
use strata_stores::SqliteSemanticStore;
use tracing::{info, warn};

/// Outcome tallies for one sync pass.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub ingested: usize,
    pub duplicates: usize,
    pub skipped: usize,
}

impl std::fmt::Display for IngestReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[*] Ingestion complete: {} new, {} duplicate, {} skipped.",
            self.ingested, self.duplicates, self.skipped
        )
    }
}

/// Standalone subcommand: build the embedder client, open the vault, sync.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    let client = Arc::new(
        OpenAiCompatClient::new(
            "ollama",
            &config.api_url,
            config.api_key.clone().unwrap_or_else(|| "ollama".into()),
            &config.model,
        )
        .with_embed_model(&config.embed_model),
    );

    std::fs::create_dir_all(&config.data_dir)?;
    let vault = SqliteSemanticStore::new(
        &format!("sqlite://{}", config.data_dir.join("vault.db").display()),
        client as Arc<dyn Embedder>,
    )
    .await?;

    let report = sync(&config, &vault).await?;
    println!("{report}");
    Ok(())
}

/// Walk the docs directory and ingest every eligible text file.
pub async fn sync(
    config: &AppConfig,
    vault: &SqliteSemanticStore,
) -> Result<IngestReport, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(&config.docs_dir)?;

    let mut entries: Vec<std::path::PathBuf> = std::fs::read_dir(&config.docs_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| !n.starts_with('.'))
        })
        .collect();
    entries.sort();

    if entries.is_empty() {
        info!(dir = %config.docs_dir.display(), "No files to ingest");
        return Ok(IngestReport::default());
    }

    info!(files = entries.len(), "Syncing docs folder into the vault");

    let mut report = IngestReport::default();
    for path in entries {
        let eligible = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("txt") || ext.eq_ignore_ascii_case("md"));
        if !eligible {
            report.skipped += 1;
            continue;
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unnamed")
            .to_string();

        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                warn!(file = %name, error = %e, "Unreadable file skipped");
                report.skipped += 1;
                continue;
            }
        };

        if content.trim().is_empty() {
            report.skipped += 1;
            continue;
        }

        match vault
            .ingest(&content, &name, epoch_seconds(), &content_hash(&content))
            .await
        {
            Ok(InsertOutcome::Inserted) => {
                info!(file = %name, "Ingested");
                report.ingested += 1;
            }
            Ok(InsertOutcome::Duplicate) => {
                report.duplicates += 1;
            }
            Err(e) => {
                warn!(file = %name, error = %e, "Ingestion failed for file");
                report.skipped += 1;
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::error::StoreError;

    struct FixedEmbedder;

    #[async_trait::async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, StoreError> {
            Ok(vec![1.0, 0.0])
        }
    }

    async fn vault() -> SqliteSemanticStore {
        SqliteSemanticStore::new("sqlite::memory:", Arc::new(FixedEmbedder))
            .await
            .unwrap()
    }

    fn config_with_docs(dir: &std::path::Path) -> AppConfig {
        AppConfig {
            docs_dir: dir.to_path_buf(),
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn sync_ingests_text_files_and_skips_others() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "lease terms").unwrap();
        std::fs::write(tmp.path().join("readme.md"), "project summary").unwrap();
        std::fs::write(tmp.path().join("photo.png"), [0u8, 1, 2]).unwrap();
        std::fs::write(tmp.path().join(".hidden.txt"), "secret").unwrap();

        let vault = vault().await;
        let report = sync(&config_with_docs(tmp.path()), &vault).await.unwrap();

        assert_eq!(report.ingested, 2);
        assert_eq!(report.skipped, 1); // the png; hidden file is filtered out
        assert_eq!(vault.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn resync_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("doc.txt"), "stable content").unwrap();

        let vault = vault().await;
        let config = config_with_docs(tmp.path());

        let first = sync(&config, &vault).await.unwrap();
        assert_eq!(first.ingested, 1);

        let second = sync(&config, &vault).await.unwrap();
        assert_eq!(second.ingested, 0);
        assert_eq!(second.duplicates, 1);
        assert_eq!(vault.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_files_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("empty.txt"), "   \n").unwrap();

        let vault = vault().await;
        let report = sync(&config_with_docs(tmp.path()), &vault).await.unwrap();
        assert_eq!(report.ingested, 0);
        assert_eq!(report.skipped, 1);
    }

    #[tokio::test]
    async fn missing_docs_dir_is_created_and_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("docs");
        let vault = vault().await;

        let report = sync(&config_with_docs(&dir), &vault).await.unwrap();
        assert_eq!(report.ingested, 0);
        assert!(dir.is_dir());
    }
}
