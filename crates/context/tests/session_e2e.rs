//! End-to-end scenarios for the session engine: in-memory stores and a
//! scripted inference service wired through the full per-turn pipeline.

use std::sync::Arc;

use strata_context::{
    BudgetEstimator, CONSOLIDATION_THRESHOLD, ElasticBudgetController, Session,
};
use strata_core::error::{InferenceError, StoreError};
use strata_core::inference::InferenceService;
use strata_core::slot::Tier;
use strata_core::store::{Embedder, EpisodicStore, SemanticHit, SemanticStore};
use strata_stores::{InMemoryEpisodicStore, InMemorySemanticStore};

// ── Scripted inference ───────────────────────────────────────────────────

/// Returns scripted replies in sequence and records every request.
struct ScriptedService {
    replies: std::sync::Mutex<Vec<String>>,
    requests: std::sync::Mutex<Vec<(String, String, String)>>,
}

impl ScriptedService {
    fn new(replies: Vec<&str>) -> Self {
        Self {
            replies: std::sync::Mutex::new(replies.iter().rev().map(|s| s.to_string()).collect()),
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<(String, String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl InferenceService for ScriptedService {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        persona: &str,
        context: &str,
        user: &str,
    ) -> Result<String, InferenceError> {
        self.requests
            .lock()
            .unwrap()
            .push((persona.into(), context.into(), user.into()));
        self.replies
            .lock()
            .unwrap()
            .pop()
            .ok_or(InferenceError::EmptyResponse)
    }
}

/// A vault that always returns one hit at a fixed distance.
struct FixedDistanceVault {
    distance: f64,
}

#[async_trait::async_trait]
impl SemanticStore for FixedDistanceVault {
    async fn search(&self, _query: &str, k: usize) -> Result<Vec<SemanticHit>, StoreError> {
        Ok(std::iter::once(SemanticHit {
            content: "Monthly budget allocation: 3000.".into(),
            timestamp: 1700000000.0,
            source_name: "budget_notes.txt".into(),
            distance: self.distance,
        })
        .take(k)
        .collect())
    }
}

struct ConstantEmbedder;

#[async_trait::async_trait]
impl Embedder for ConstantEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, StoreError> {
        Ok(vec![1.0, 0.0, 0.0])
    }
}

fn scripted(n: usize) -> Arc<ScriptedService> {
    let replies: Vec<String> = (0..n).map(|i| format!("scripted reply {i}")).collect();
    Arc::new(ScriptedService::new(
        replies.iter().map(String::as_str).collect(),
    ))
}

// ── Scenarios ────────────────────────────────────────────────────────────

#[tokio::test]
async fn three_turns_then_vault_recall() {
    // Scenario: three short turns stay under the base limit (no pruning);
    // a vault query with a distance-0.3 match activates the sole Tier 3
    // slot; the merged block carries only the Tier 3 label and no notice.
    let inference = scripted(3);
    let episodic = Arc::new(InMemoryEpisodicStore::new());
    let mut session = Session::new(
        "You are a terse assistant.",
        inference.clone(),
        episodic.clone(),
        Arc::new(FixedDistanceVault { distance: 0.3 }),
        BudgetEstimator::heuristic(),
        ElasticBudgetController::new(2048, 512),
    );

    for msg in ["hello", "what time is it", "thanks"] {
        session.handle_turn(msg).await.unwrap();
    }

    // No pruning: all six turns retained, nothing archived
    assert_eq!(session.history().len(), 6);
    assert_eq!(episodic.count_unarchived().await.unwrap(), 0);

    // /vault budget
    let slot = session.vault_search("budget").await.unwrap().unwrap();
    assert_eq!(slot.distance, Some(0.3));
    assert!(session.active_slots().episodic().is_none());

    let merged = session.merged_context();
    assert!(merged.contains(Tier::Semantic.label()));
    assert!(!merged.contains(Tier::Episodic.label()));
    assert!(!merged.contains("[NOTICE]"));
    assert!(merged.contains("Monthly budget allocation"));
}

#[tokio::test]
async fn gatekeeper_rejection_leaves_no_slot() {
    let mut session = Session::new(
        "persona",
        scripted(0),
        Arc::new(InMemoryEpisodicStore::new()),
        Arc::new(FixedDistanceVault { distance: 0.8 }),
        BudgetEstimator::heuristic(),
        ElasticBudgetController::new(2048, 512),
    );

    let slot = session.vault_search("budget").await.unwrap();
    assert!(slot.is_none());
    assert!(session.active_slots().is_empty());
    assert!(session.merged_context().contains("No external documents"));
}

#[tokio::test]
async fn injected_context_reaches_the_generator() {
    let inference = scripted(1);
    let episodic = Arc::new(InMemoryEpisodicStore::new());
    episodic
        .insert("Last week we planned the budget.", 1700000100.0, "h1")
        .await
        .unwrap();

    let mut session = Session::new(
        "persona text",
        inference.clone(),
        episodic,
        Arc::new(InMemorySemanticStore::new(Arc::new(ConstantEmbedder))),
        BudgetEstimator::heuristic(),
        ElasticBudgetController::new(2048, 512),
    );

    session.recall("budget").await.unwrap().unwrap();
    session.handle_turn("what did we plan?").await.unwrap();

    let requests = inference.requests();
    assert_eq!(requests.len(), 1);
    let (persona, context, user) = &requests[0];
    assert_eq!(persona, "persona text");
    assert!(context.contains("Last week we planned the budget."));
    assert_eq!(user, "what did we plan?");
}

#[tokio::test]
async fn conflicting_tiers_flag_the_newer_one() {
    let episodic = Arc::new(InMemoryEpisodicStore::new());
    // Ledger entry newer than the vault document (1700000000)
    episodic
        .insert("Budget was raised to 4000.", 1800000000.0, "h1")
        .await
        .unwrap();

    let mut session = Session::new(
        "persona",
        scripted(0),
        episodic,
        Arc::new(FixedDistanceVault { distance: 0.2 }),
        BudgetEstimator::heuristic(),
        ElasticBudgetController::new(2048, 512),
    );

    session.recall("Budget").await.unwrap().unwrap();
    session.vault_search("budget").await.unwrap().unwrap();

    let merged = session.merged_context();
    assert!(merged.starts_with("[NOTICE]"));
    let notice = merged.lines().next().unwrap();
    assert!(notice.contains(Tier::Episodic.label()));
    // Both bodies present
    assert!(merged.contains("Budget was raised to 4000."));
    assert!(merged.contains("Monthly budget allocation"));
}

#[tokio::test]
async fn clear_deactivates_both_tiers() {
    let episodic = Arc::new(InMemoryEpisodicStore::new());
    episodic.insert("budget notes", 100.0, "h1").await.unwrap();

    let mut session = Session::new(
        "persona",
        scripted(0),
        episodic,
        Arc::new(FixedDistanceVault { distance: 0.1 }),
        BudgetEstimator::heuristic(),
        ElasticBudgetController::new(2048, 512),
    );

    session.recall("budget").await.unwrap();
    session.vault_search("budget").await.unwrap();
    assert!(!session.active_slots().is_empty());

    session.clear_context();
    assert!(session.active_slots().is_empty());
    assert!(session.merged_context().contains("No external documents"));
}

#[tokio::test]
async fn full_session_lifecycle_with_consolidation() {
    // Six prior sessions already in the ledger; ending this one makes
    // seven and trips the batch archive.
    let episodic = Arc::new(InMemoryEpisodicStore::new());
    for i in 0..(CONSOLIDATION_THRESHOLD - 1) {
        episodic
            .insert(&format!("prior session {i}"), i as f64, &format!("h{i}"))
            .await
            .unwrap();
    }

    let mut session = Session::new(
        "persona",
        scripted(2),
        episodic.clone(),
        Arc::new(InMemorySemanticStore::new(Arc::new(ConstantEmbedder))),
        BudgetEstimator::heuristic(),
        ElasticBudgetController::new(2048, 512),
    );

    session.handle_turn("let's wrap up").await.unwrap();
    session.end().await.unwrap();

    assert_eq!(episodic.count_unarchived().await.unwrap(), 0);
}
