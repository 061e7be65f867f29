use crate::config::PipelineConfig;
use crate::models::{Claim, ClaimResult};
use crate::pipeline::traits::{ClaimVerifier, EvidenceFetcher};
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::Instrument;

/// Lifecycle of one claim task.
///
/// `Pending -> Searching -> Verifying -> Done`, or `... -> Failed -> Degraded`.
/// `Done` and `Degraded` are terminal and both carry a `ClaimResult`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Searching,
    Verifying,
    Done,
    Failed,
    Degraded,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Done | TaskState::Degraded)
    }

    pub fn can_advance_to(self, next: TaskState) -> bool {
        use TaskState::*;
        matches!(
            (self, next),
            (Pending, Searching)
                | (Searching, Verifying)
                | (Verifying, Done)
                | (Pending | Searching | Verifying, Failed)
                | (Failed, Degraded)
        )
    }
}

#[derive(Clone, Debug)]
pub struct TaskOutcome {
    pub state: TaskState,
    pub result: ClaimResult,
}

impl TaskOutcome {
    fn degraded(claim: Claim, reason: impl Into<String>) -> Self {
        Self {
            state: TaskState::Degraded,
            result: ClaimResult::degraded(claim, reason),
        }
    }
}

struct ClaimTask {
    claim: Claim,
    state: TaskState,
}

impl ClaimTask {
    fn new(claim: Claim) -> Self {
        Self {
            claim,
            state: TaskState::Pending,
        }
    }

    fn advance(&mut self, next: TaskState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "invalid transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::trace!(from = ?self.state, to = ?next, "claim task transition");
        self.state = next;
    }

    fn finish(mut self, result: ClaimResult) -> TaskOutcome {
        self.advance(TaskState::Done);
        TaskOutcome {
            state: self.state,
            result,
        }
    }

    fn degrade(mut self, reason: String) -> TaskOutcome {
        self.advance(TaskState::Failed);
        self.advance(TaskState::Degraded);
        TaskOutcome {
            state: self.state,
            result: ClaimResult::degraded(self.claim, reason),
        }
    }
}

async fn run_task<F, V>(
    fetcher: Arc<F>,
    verifier: Arc<V>,
    claim: Claim,
    max_results: usize,
) -> TaskOutcome
where
    F: EvidenceFetcher + ?Sized,
    V: ClaimVerifier + ?Sized,
{
    let mut task = ClaimTask::new(claim);

    task.advance(TaskState::Searching);
    let evidence = fetcher.search(&task.claim, max_results).await;

    task.advance(TaskState::Verifying);
    match verifier.verify(&task.claim, evidence).await {
        Ok(result) => task.finish(result),
        Err(err) => {
            tracing::warn!(error = %err, "verification exhausted retries");
            task.degrade(format!("Verification failed: {err}"))
        }
    }
}

/// Fans claim tasks out over a bounded pool and joins them back in claim order.
pub struct Orchestrator<F: ?Sized, V: ?Sized> {
    fetcher: Arc<F>,
    verifier: Arc<V>,
    sources_per_claim: usize,
    run_timeout: Duration,
}

impl<F, V> Orchestrator<F, V>
where
    F: EvidenceFetcher + ?Sized + 'static,
    V: ClaimVerifier + ?Sized + 'static,
{
    pub fn new(fetcher: Arc<F>, verifier: Arc<V>, config: &PipelineConfig) -> Self {
        Self {
            fetcher,
            verifier,
            sources_per_claim: config.sources_per_claim,
            run_timeout: config.run_timeout,
        }
    }

    /// One result per input claim, aligned index-for-index with `claims`.
    pub async fn run(&self, claims: &[Claim], concurrency_limit: usize) -> Vec<ClaimResult> {
        self.run_with_sources(claims, concurrency_limit, self.sources_per_claim)
            .await
    }

    /// [`run`](Self::run) with a per-call evidence breadth.
    pub async fn run_with_sources(
        &self,
        claims: &[Claim],
        concurrency_limit: usize,
        sources_per_claim: usize,
    ) -> Vec<ClaimResult> {
        self.execute(claims, concurrency_limit, sources_per_claim)
            .await
            .into_iter()
            .map(|outcome| outcome.result)
            .collect()
    }

    /// Like [`run`](Self::run) but keeps each task's terminal state.
    pub async fn run_detailed(
        &self,
        claims: &[Claim],
        concurrency_limit: usize,
    ) -> Vec<TaskOutcome> {
        self.execute(claims, concurrency_limit, self.sources_per_claim)
            .await
    }

    async fn execute(
        &self,
        claims: &[Claim],
        concurrency_limit: usize,
        max_results: usize,
    ) -> Vec<TaskOutcome> {
        let deadline = Instant::now() + self.run_timeout;
        let limit = concurrency_limit.max(1);

        let tasks = claims.iter().cloned().enumerate().map(|(position, claim)| {
            let fetcher = Arc::clone(&self.fetcher);
            let verifier = Arc::clone(&self.verifier);
            let span = tracing::info_span!("claim", index = claim.index());
            async move {
                let fallback = claim.clone();
                let handle = tokio::spawn(
                    run_task(fetcher, verifier, claim, max_results).instrument(span),
                );
                let abort = handle.abort_handle();
                let outcome = match timeout_at(deadline, handle).await {
                    Ok(Ok(outcome)) => outcome,
                    Ok(Err(err)) => {
                        tracing::error!(claim_index = fallback.index(), error = %err, "claim task aborted");
                        TaskOutcome::degraded(fallback, format!("Verification task aborted: {err}"))
                    }
                    Err(_) => {
                        abort.abort();
                        tracing::warn!(claim_index = fallback.index(), "run timeout reached, degrading claim");
                        TaskOutcome::degraded(
                            fallback,
                            "Run timeout elapsed before verification finished.",
                        )
                    }
                };
                (position, outcome)
            }
        });

        let mut slots: Vec<Option<TaskOutcome>> = vec![None; claims.len()];
        let mut completed = stream::iter(tasks).buffer_unordered(limit);
        while let Some((position, outcome)) = completed.next().await {
            tracing::debug!(
                claim_index = outcome.result.claim.index(),
                state = ?outcome.state,
                "claim task finished"
            );
            slots[position] = Some(outcome);
        }

        slots
            .into_iter()
            .zip(claims)
            .map(|(slot, claim)| {
                slot.unwrap_or_else(|| TaskOutcome::degraded(claim.clone(), "No result recorded."))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EvidenceQuality, Verdict};
    use crate::pipeline::mock::{ScriptedFetcher, StubVerifier};

    fn claims(n: usize) -> Vec<Claim> {
        (0..n).map(|i| Claim::new(i, format!("claim {i}"))).collect()
    }

    fn orchestrator(
        fetcher: ScriptedFetcher,
        verifier: StubVerifier,
        timeout: Duration,
    ) -> Orchestrator<ScriptedFetcher, StubVerifier> {
        let config = PipelineConfig {
            run_timeout: timeout,
            ..PipelineConfig::default()
        };
        Orchestrator::new(Arc::new(fetcher), Arc::new(verifier), &config)
    }

    #[test]
    fn state_machine_transitions() {
        use TaskState::*;
        assert!(Pending.can_advance_to(Searching));
        assert!(Verifying.can_advance_to(Done));
        assert!(Failed.can_advance_to(Degraded));
        assert!(!Pending.can_advance_to(Done));
        assert!(!Done.can_advance_to(Failed));
        assert!(Done.is_terminal() && Degraded.is_terminal());
        assert!(!Failed.is_terminal());
    }

    #[tokio::test(start_paused = true)]
    async fn output_order_ignores_completion_order() {
        let fetcher = ScriptedFetcher::new()
            .with_delay(0, Duration::from_millis(300))
            .with_delay(2, Duration::from_millis(100));
        let orch = orchestrator(fetcher, StubVerifier::new(), Duration::from_secs(60));
        let input = claims(5);
        let results = orch.run(&input, 5).await;

        assert_eq!(results.len(), 5);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.claim.index(), i);
            assert_eq!(result.claim.text(), input[i].text());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrency_never_exceeds_limit() {
        let fetcher = ScriptedFetcher::new().with_default_delay(Duration::from_millis(50));
        let probe = fetcher.clone();
        let orch = orchestrator(fetcher, StubVerifier::new(), Duration::from_secs(60));
        let results = orch.run(&claims(9), 2).await;

        assert_eq!(results.len(), 9);
        assert!(probe.peak_in_flight() <= 2);
        assert_eq!(probe.peak_in_flight(), 2);
    }

    #[tokio::test]
    async fn verifier_failure_degrades_only_that_claim() {
        let orch = orchestrator(
            ScriptedFetcher::new(),
            StubVerifier::new().failing_on(1),
            Duration::from_secs(60),
        );
        let outcomes = orch.run_detailed(&claims(3), 3).await;

        assert_eq!(outcomes[0].state, TaskState::Done);
        assert_eq!(outcomes[1].state, TaskState::Degraded);
        assert_eq!(outcomes[1].result.verdict, Verdict::Unverifiable);
        assert_eq!(outcomes[1].result.evidence_quality, EvidenceQuality::Insufficient);
        assert_eq!(outcomes[2].state, TaskState::Done);
        assert_eq!(outcomes[2].result.verdict, Verdict::True);
    }

    #[tokio::test]
    async fn claim_failing_every_stage_still_reaches_a_terminal_result() {
        let orch = orchestrator(
            ScriptedFetcher::new().empty_for(1),
            StubVerifier::new().failing_on(1),
            Duration::from_secs(60),
        );
        let outcomes = orch.run_detailed(&claims(3), 2).await;

        assert_eq!(outcomes.len(), 3);
        let failed = &outcomes[1];
        assert_eq!(failed.state, TaskState::Degraded);
        assert_eq!(failed.result.claim.index(), 1);
        assert_eq!(failed.result.verdict, Verdict::Unverifiable);
        assert_eq!(failed.result.evidence_quality, EvidenceQuality::Insufficient);
        assert_eq!(failed.result.confidence, 0.0);
        assert!(failed.result.evidence.is_empty());
        for sibling in [&outcomes[0], &outcomes[2]] {
            assert_eq!(sibling.state, TaskState::Done);
            assert_eq!(sibling.result.verdict, Verdict::True);
            assert_eq!(sibling.result.evidence.len(), 2);
        }
    }

    #[tokio::test]
    async fn panicking_task_does_not_take_siblings_down() {
        let orch = orchestrator(
            ScriptedFetcher::new(),
            StubVerifier::new().panicking_on(0),
            Duration::from_secs(60),
        );
        let outcomes = orch.run_detailed(&claims(2), 2).await;
        assert_eq!(outcomes[0].state, TaskState::Degraded);
        assert_eq!(outcomes[1].state, TaskState::Done);
    }

    #[tokio::test(start_paused = true)]
    async fn run_timeout_degrades_pending_tasks() {
        let fetcher = ScriptedFetcher::new().with_delay(1, Duration::from_secs(600));
        let orch = orchestrator(fetcher, StubVerifier::new(), Duration::from_secs(5));
        let outcomes = orch.run_detailed(&claims(3), 3).await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].state, TaskState::Done);
        assert_eq!(outcomes[1].state, TaskState::Degraded);
        assert!(outcomes[1].result.reasoning.contains("timeout"));
        assert_eq!(outcomes[2].state, TaskState::Done);
    }

    #[tokio::test]
    async fn no_claims_is_an_empty_result() {
        let orch = orchestrator(ScriptedFetcher::new(), StubVerifier::new(), Duration::from_secs(1));
        assert!(orch.run(&[], 3).await.is_empty());
    }
}
