//! Concurrent fingerprint loading and pairwise comparison.
//!
//! Loading fans out over a bounded pool of blocking workers. Each finished
//! load is sent to a single aggregator task, which owns the map from group
//! key to fingerprint. The whole load phase runs under one deadline; when it
//! expires no comparisons are made.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

use crate::core::evidence::EvidenceError;
use crate::core::fingerprint::Fingerprint;
use crate::core::identity::FingerprintIdentity;
use crate::core::panel::HaplotypeDatabase;
use crate::core::types::{FingerprintResult, IdentityGranularity};
use crate::crosscheck::config::{CrosscheckConfig, CrosscheckMode, ValidationStringency};
use crate::crosscheck::source::FingerprintSource;
use crate::matching::engine::{MatchError, MatchingEngine};
use crate::matching::scoring::MatchResults;

#[derive(Error, Debug)]
pub enum CrosscheckError {
    #[error("Unreadable input '{input}': {message}")]
    UnreadableInput { input: String, message: String },

    #[error("Timed out after {timeout:?} with {loaded} of {total} inputs loaded")]
    Timeout {
        timeout: Duration,
        loaded: usize,
        total: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error("Failed to combine fingerprints: {0}")]
    Evidence(#[from] EvidenceError),

    #[error("Failed to start worker runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("Loader task failed: {0}")]
    Worker(String),
}

/// Fingerprint groups keyed by projected identity
pub type FingerprintGroups = BTreeMap<FingerprintIdentity, Fingerprint>;

/// One compared pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrosscheckResult {
    /// Observed side
    pub left: FingerprintIdentity,
    /// Expected side
    pub right: FingerprintIdentity,
    pub expected_to_match: bool,
    pub result: FingerprintResult,
    #[serde(flatten)]
    pub match_results: MatchResults,
}

/// All comparisons of a run, in deterministic order
#[derive(Debug, Clone, Serialize)]
pub struct CrosscheckReport {
    pub results: Vec<CrosscheckResult>,
    /// Number of fingerprint groups that were compared
    pub groups: usize,
    pub expect_all_groups_to_match: bool,
}

impl CrosscheckReport {
    /// Whether the run should be reported as successful.
    ///
    /// Any unexpected result fails the run. When every group is expected to
    /// match, inconclusive results fail it too.
    #[must_use]
    pub fn passed(&self) -> bool {
        let (unexpected, inconclusive) = self.failure_counts();
        unexpected == 0 && inconclusive == 0
    }

    /// Failing results as (unexpected, inconclusive). Inconclusive results
    /// only count when every group is expected to match.
    #[must_use]
    pub fn failure_counts(&self) -> (usize, usize) {
        let unexpected = self.results.iter().filter(|r| r.result.is_unexpected()).count();
        let inconclusive = if self.expect_all_groups_to_match {
            self.results
                .iter()
                .filter(|r| r.result == FingerprintResult::Inconclusive)
                .count()
        } else {
            0
        };
        (unexpected, inconclusive)
    }

    /// One-line reason the report failed, if it did
    #[must_use]
    pub fn failure_summary(&self) -> Option<String> {
        let (unexpected, inconclusive) = self.failure_counts();
        let total = self.results.len();
        match (unexpected, inconclusive) {
            (0, 0) => None,
            (u, 0) => Some(format!("{u} unexpected of {total} comparisons")),
            (0, i) => Some(format!("{i} inconclusive of {total} comparisons")),
            (u, i) => Some(format!("{u} unexpected and {i} inconclusive of {total} comparisons")),
        }
    }

    /// Count of results per classification
    #[must_use]
    pub fn counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for r in &self.results {
            *counts.entry(r.result.to_string()).or_insert(0) += 1;
        }
        counts
    }
}

/// Outcome of one source load, as sent to the aggregator
struct LoadMessage {
    batch: usize,
    index: usize,
    input: String,
    outcome: Result<Vec<Fingerprint>, String>,
}

/// Loads fingerprints concurrently and compares them pairwise
pub struct Crosschecker {
    panel: Arc<HaplotypeDatabase>,
    config: CrosscheckConfig,
    engine: MatchingEngine,
}

impl Crosschecker {
    /// Create a crosschecker over a shared panel
    ///
    /// # Errors
    ///
    /// Returns `CrosscheckError::InvalidConfig` if the config is invalid.
    pub fn new(panel: Arc<HaplotypeDatabase>, config: CrosscheckConfig) -> Result<Self, CrosscheckError> {
        config.validate()?;
        Ok(Self {
            engine: MatchingEngine::new(config.matching_config()),
            panel,
            config,
        })
    }

    pub fn config(&self) -> &CrosscheckConfig {
        &self.config
    }

    /// Compare every group in one batch against every other group
    ///
    /// # Errors
    ///
    /// Returns `CrosscheckError::Timeout` if loading exceeds the deadline,
    /// `CrosscheckError::UnreadableInput` for a bad source under strict
    /// validation, or any matching error.
    pub fn crosscheck(
        &self,
        sources: &[Arc<dyn FingerprintSource>],
    ) -> Result<CrosscheckReport, CrosscheckError> {
        let mut batches = self.load_batches(&[sources])?;
        let groups = batches.pop().unwrap_or_default();

        let keys: Vec<&FingerprintIdentity> = groups.keys().collect();
        let mut pairs = Vec::new();
        for &left in &keys {
            for &right in &keys {
                if left != right {
                    pairs.push((&groups[left], &groups[right]));
                }
            }
        }

        self.compare_pairs(&pairs, groups.len())
    }

    /// Compare groups of a left batch against groups of a right batch
    ///
    /// # Errors
    ///
    /// As for [`Self::crosscheck`].
    pub fn crosscheck_batches(
        &self,
        left: &[Arc<dyn FingerprintSource>],
        right: &[Arc<dyn FingerprintSource>],
    ) -> Result<CrosscheckReport, CrosscheckError> {
        let batches = self.load_batches(&[left, right])?;
        let (left_groups, right_groups) = match batches.as_slice() {
            [l, r] => (l, r),
            _ => return Err(CrosscheckError::Worker("missing batch".to_string())),
        };

        let mut pairs = Vec::new();
        for l in left_groups.values() {
            for r in right_groups.values() {
                if self.config.mode == CrosscheckMode::CheckSameSample
                    && l.identity.sample != r.identity.sample
                {
                    continue;
                }
                pairs.push((l, r));
            }
        }

        self.compare_pairs(&pairs, left_groups.len() + right_groups.len())
    }

    /// Load and group every batch under the configured deadline.
    ///
    /// Groups are merged in input order, so the result does not depend on
    /// which loads finish first.
    ///
    /// # Errors
    ///
    /// Returns `CrosscheckError::Timeout` if the deadline passes first, or
    /// `CrosscheckError::UnreadableInput` under strict validation.
    pub fn load_batches(
        &self,
        batches: &[&[Arc<dyn FingerprintSource>]],
    ) -> Result<Vec<FingerprintGroups>, CrosscheckError> {
        let total: usize = batches.iter().map(|b| b.len()).sum();
        let timeout = self.config.timeout();
        info!(
            "Loading {} inputs with {} workers (timeout {:?})",
            total, self.config.num_threads, timeout
        );

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.num_threads)
            .enable_all()
            .build()?;

        let cancelled = Arc::new(AtomicBool::new(false));
        let loaded = Arc::new(AtomicUsize::new(0));

        let outcome = runtime.block_on(async {
            let (tx, rx) = mpsc::channel::<LoadMessage>(self.config.num_threads.max(1) * 2);
            let permits = Arc::new(Semaphore::new(self.config.num_threads));

            for (batch, sources) in batches.iter().enumerate() {
                for (index, source) in sources.iter().enumerate() {
                    tokio::spawn(load_one(
                        batch,
                        index,
                        Arc::clone(source),
                        Arc::clone(&self.panel),
                        Arc::clone(&permits),
                        Arc::clone(&cancelled),
                        tx.clone(),
                    ));
                }
            }
            drop(tx);

            let aggregator = tokio::spawn(aggregate(
                rx,
                batches.len(),
                self.config.identity_granularity,
                self.config.validation,
                Arc::clone(&loaded),
            ));

            tokio::time::timeout(timeout, aggregator).await
        });

        cancelled.store(true, Ordering::SeqCst);
        // Blocking loads may still be running; do not wait for them.
        runtime.shutdown_background();

        match outcome {
            Err(_) => {
                let loaded = loaded.load(Ordering::SeqCst);
                warn!("Load phase timed out with {loaded} of {total} inputs loaded");
                Err(CrosscheckError::Timeout {
                    timeout,
                    loaded,
                    total,
                })
            }
            Ok(Err(e)) => Err(CrosscheckError::Worker(e.to_string())),
            Ok(Ok(groups)) => groups,
        }
    }

    fn compare_pairs(
        &self,
        pairs: &[(&Fingerprint, &Fingerprint)],
        groups: usize,
    ) -> Result<CrosscheckReport, CrosscheckError> {
        let mut results = Vec::with_capacity(pairs.len());
        for (left, right) in pairs {
            let match_results = self.engine.compare(left, right)?;
            let expected_to_match = self.expected_to_match(&left.identity, &right.identity);
            let result = FingerprintResult::classify(
                expected_to_match,
                match_results.lod,
                self.config.lod_threshold,
            );
            if result.is_unexpected() {
                debug!(
                    "{} vs {}: {} (LOD {:.3})",
                    left.identity, right.identity, result, match_results.lod
                );
            }
            results.push(CrosscheckResult {
                left: left.identity.clone(),
                right: right.identity.clone(),
                expected_to_match,
                result,
                match_results,
            });
        }

        info!("Compared {} pairs across {} groups", results.len(), groups);
        Ok(CrosscheckReport {
            results,
            groups,
            expect_all_groups_to_match: self.config.expect_all_groups_to_match,
        })
    }

    fn expected_to_match(&self, left: &FingerprintIdentity, right: &FingerprintIdentity) -> bool {
        if self.config.expect_all_groups_to_match {
            return true;
        }
        match self.config.identity_granularity {
            IdentityGranularity::File => left == right,
            _ => left.sample == right.sample,
        }
    }
}

async fn load_one(
    batch: usize,
    index: usize,
    source: Arc<dyn FingerprintSource>,
    panel: Arc<HaplotypeDatabase>,
    permits: Arc<Semaphore>,
    cancelled: Arc<AtomicBool>,
    tx: mpsc::Sender<LoadMessage>,
) {
    let Ok(_permit) = permits.acquire_owned().await else {
        return;
    };
    if cancelled.load(Ordering::SeqCst) {
        return;
    }

    let input = source.name();
    debug!("Loading {input}");
    let outcome = match tokio::task::spawn_blocking(move || source.load(&panel)).await {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(e) => Err(format!("loader failed: {e}")),
    };

    // The aggregator is gone once the run has failed
    let _ = tx
        .send(LoadMessage {
            batch,
            index,
            input,
            outcome,
        })
        .await;
}

async fn aggregate(
    mut rx: mpsc::Receiver<LoadMessage>,
    num_batches: usize,
    granularity: IdentityGranularity,
    validation: ValidationStringency,
    loaded: Arc<AtomicUsize>,
) -> Result<Vec<FingerprintGroups>, CrosscheckError> {
    let mut mergers: Vec<BatchMerger> = (0..num_batches).map(|_| BatchMerger::new(granularity)).collect();

    while let Some(msg) = rx.recv().await {
        loaded.fetch_add(1, Ordering::SeqCst);
        let fingerprints = match msg.outcome {
            Ok(fps) => Some(fps),
            Err(message) => match validation {
                ValidationStringency::Strict => {
                    return Err(CrosscheckError::UnreadableInput {
                        input: msg.input,
                        message,
                    })
                }
                ValidationStringency::Lenient => {
                    warn!("Skipping unreadable input {}: {}", msg.input, message);
                    None
                }
            },
        };
        mergers[msg.batch].accept(msg.index, msg.input, fingerprints)?;
    }

    let mut groups = Vec::with_capacity(num_batches);
    for (batch, merger) in mergers.into_iter().enumerate() {
        let batch_groups = merger.finish()?;
        debug!("Batch {} has {} groups", batch, batch_groups.len());
        groups.push(batch_groups);
    }
    Ok(groups)
}

/// Folds one batch's loads into groups in input order.
///
/// Loads arriving ahead of an earlier input wait in `pending`; each time the
/// next expected index shows up, the whole contiguous run is merged.
struct BatchMerger {
    granularity: IdentityGranularity,
    groups: FingerprintGroups,
    next: usize,
    pending: BTreeMap<usize, (String, Option<Vec<Fingerprint>>)>,
}

impl BatchMerger {
    fn new(granularity: IdentityGranularity) -> Self {
        Self {
            granularity,
            groups: FingerprintGroups::new(),
            next: 0,
            pending: BTreeMap::new(),
        }
    }

    /// `None` marks an input skipped under lenient validation
    fn accept(
        &mut self,
        index: usize,
        input: String,
        fingerprints: Option<Vec<Fingerprint>>,
    ) -> Result<(), EvidenceError> {
        self.pending.insert(index, (input, fingerprints));
        while let Some((input, fingerprints)) = self.pending.remove(&self.next) {
            self.merge(input, fingerprints)?;
            self.next += 1;
        }
        Ok(())
    }

    fn merge(&mut self, input: String, fingerprints: Option<Vec<Fingerprint>>) -> Result<(), EvidenceError> {
        match fingerprints {
            Some(fps) => {
                for mut fp in fps {
                    if fp.identity.file.is_none() {
                        fp.identity.file = Some(input.clone());
                    }
                    let key = fp.identity.project(self.granularity);
                    self.groups
                        .entry(key.clone())
                        .or_insert_with(|| Fingerprint::new(key))
                        .absorb(fp)?;
                }
            }
            None if self.granularity == IdentityGranularity::File => {
                let key = FingerprintIdentity::new("").with_file(input);
                self.groups
                    .entry(key.clone())
                    .or_insert_with(|| Fingerprint::new(key));
            }
            None => {}
        }
        Ok(())
    }

    /// Merges anything left behind a gap (a load that never reported) and
    /// returns the groups.
    fn finish(mut self) -> Result<FingerprintGroups, EvidenceError> {
        let pending = std::mem::take(&mut self.pending);
        for (_, (input, fingerprints)) in pending {
            self.merge(input, fingerprints)?;
        }
        Ok(self.groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::evidence::HaplotypeEvidence;
    use crate::core::marker::Marker;
    use crate::core::panel::HaplotypeDatabaseBuilder;
    use crate::core::types::Genotype;
    use crate::crosscheck::source::InMemorySource;
    use crate::parsing::ParseError;

    struct SlowSource(Duration);

    impl FingerprintSource for SlowSource {
        fn name(&self) -> String {
            "slow".to_string()
        }

        fn load(&self, _panel: &HaplotypeDatabase) -> Result<Vec<Fingerprint>, ParseError> {
            std::thread::sleep(self.0);
            Ok(Vec::new())
        }
    }

    struct BrokenSource;

    impl FingerprintSource for BrokenSource {
        fn name(&self) -> String {
            "broken.vcf".to_string()
        }

        fn load(&self, _panel: &HaplotypeDatabase) -> Result<Vec<Fingerprint>, ParseError> {
            Err(ParseError::InvalidFormat("truncated".to_string()))
        }
    }

    struct DelayedSource(Duration, InMemorySource);

    impl FingerprintSource for DelayedSource {
        fn name(&self) -> String {
            self.1.name()
        }

        fn load(&self, panel: &HaplotypeDatabase) -> Result<Vec<Fingerprint>, ParseError> {
            std::thread::sleep(self.0);
            self.1.load(panel)
        }
    }

    fn make_panel() -> Arc<HaplotypeDatabase> {
        let mut builder = HaplotypeDatabaseBuilder::new();
        for i in 0..12u32 {
            let maf = 0.2 + 0.02 * f64::from(i);
            builder
                .add_anchor(Marker::new(format!("rs{i}"), "chr1", u64::from(i) * 1000, b'A', b'G', maf))
                .unwrap();
        }
        Arc::new(builder.build().unwrap())
    }

    fn genotypes(seed: usize) -> Vec<Genotype> {
        (0..12).map(|i| Genotype::ALL[(i * 7 + seed) % 3]).collect()
    }

    fn fingerprint(
        panel: &HaplotypeDatabase,
        identity: FingerprintIdentity,
        calls: &[Genotype],
    ) -> Fingerprint {
        let mut fp = Fingerprint::new(identity);
        for (block, &g) in panel.blocks().zip(calls) {
            fp.add(HaplotypeEvidence::from_call(Arc::clone(block), g, 0.01)).unwrap();
        }
        fp
    }

    fn source(name: &str, fps: Vec<Fingerprint>) -> Arc<dyn FingerprintSource> {
        Arc::new(InMemorySource::new(name, fps))
    }

    fn config() -> CrosscheckConfig {
        CrosscheckConfig {
            num_threads: 2,
            timeout_secs: 30.0,
            ..CrosscheckConfig::default()
        }
    }

    #[test]
    fn test_crosscheck_all_pairs() {
        let panel = make_panel();
        let sources = vec![
            source("a.vcf", vec![fingerprint(&panel, FingerprintIdentity::new("A"), &genotypes(0))]),
            source("b.vcf", vec![fingerprint(&panel, FingerprintIdentity::new("B"), &genotypes(1))]),
            source("c.vcf", vec![fingerprint(&panel, FingerprintIdentity::new("C"), &genotypes(2))]),
        ];
        let checker = Crosschecker::new(Arc::clone(&panel), config()).unwrap();
        let report = checker.crosscheck(&sources).unwrap();

        assert_eq!(report.groups, 3);
        assert_eq!(report.results.len(), 6);
        assert!(report.results.iter().all(|r| !r.expected_to_match));
        assert!(report
            .results
            .iter()
            .all(|r| r.result == FingerprintResult::ExpectedMismatch));
        assert!(report.passed());

        // Ordered by (left, right)
        assert_eq!(report.results[0].left.sample, "A");
        assert_eq!(report.results[0].right.sample, "B");
        assert_eq!(report.results[5].left.sample, "C");
    }

    #[test]
    fn test_read_groups_merge_by_sample() {
        let panel = make_panel();
        let calls = genotypes(0);
        let sources = vec![
            source(
                "s1.vcf",
                vec![
                    fingerprint(&panel, FingerprintIdentity::new("S1").with_read_group("rg1"), &calls),
                    fingerprint(&panel, FingerprintIdentity::new("S1").with_read_group("rg2"), &calls),
                ],
            ),
            source(
                "s1b.vcf",
                vec![fingerprint(&panel, FingerprintIdentity::new("S1").with_read_group("rg3"), &calls)],
            ),
        ];

        let by_rg = Crosschecker::new(Arc::clone(&panel), config()).unwrap();
        let report = by_rg.crosscheck(&sources).unwrap();
        assert_eq!(report.groups, 3);
        assert_eq!(report.results.len(), 6);
        assert!(report.results.iter().all(|r| r.expected_to_match));
        assert!(report.results.iter().all(|r| r.result == FingerprintResult::ExpectedMatch));

        let by_sample = Crosschecker::new(
            Arc::clone(&panel),
            CrosscheckConfig {
                identity_granularity: IdentityGranularity::Sample,
                ..config()
            },
        )
        .unwrap();
        let groups = by_sample.load_batches(&[sources.as_slice()]).unwrap();
        assert_eq!(groups[0].len(), 1);
        assert!(by_sample.crosscheck(&sources).unwrap().results.is_empty());
    }

    #[test]
    fn test_swapped_sample_is_unexpected() {
        let panel = make_panel();
        let sources = vec![
            source("a1.vcf", vec![fingerprint(&panel, FingerprintIdentity::new("A").with_read_group("1"), &genotypes(0))]),
            source("a2.vcf", vec![fingerprint(&panel, FingerprintIdentity::new("A").with_read_group("2"), &genotypes(1))]),
        ];
        let report = Crosschecker::new(panel, config())
            .unwrap()
            .crosscheck(&sources)
            .unwrap();
        assert_eq!(report.results.len(), 2);
        assert!(report
            .results
            .iter()
            .all(|r| r.result == FingerprintResult::UnexpectedMismatch));
        assert!(!report.passed());
    }

    #[test]
    fn test_timeout_discards_results() {
        let panel = make_panel();
        let sources: Vec<Arc<dyn FingerprintSource>> = vec![
            source("a.vcf", vec![fingerprint(&panel, FingerprintIdentity::new("A"), &genotypes(0))]),
            Arc::new(SlowSource(Duration::from_secs(3))),
        ];
        let checker = Crosschecker::new(
            panel,
            CrosscheckConfig {
                timeout_secs: 0.1,
                ..config()
            },
        )
        .unwrap();

        let start = std::time::Instant::now();
        let err = checker.crosscheck(&sources).unwrap_err();
        assert!(start.elapsed() < Duration::from_secs(2));
        match err {
            CrosscheckError::Timeout { total, loaded, .. } => {
                assert_eq!(total, 2);
                assert!(loaded < 2);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_strict_aborts_on_unreadable_input() {
        let panel = make_panel();
        let sources: Vec<Arc<dyn FingerprintSource>> = vec![
            source("a.vcf", vec![fingerprint(&panel, FingerprintIdentity::new("A"), &genotypes(0))]),
            Arc::new(BrokenSource),
        ];
        let err = Crosschecker::new(panel, config())
            .unwrap()
            .crosscheck(&sources)
            .unwrap_err();
        assert!(matches!(err, CrosscheckError::UnreadableInput { ref input, .. } if input == "broken.vcf"));
    }

    #[test]
    fn test_lenient_skips_unreadable_input() {
        let panel = make_panel();
        let sources: Vec<Arc<dyn FingerprintSource>> = vec![
            source("a.vcf", vec![fingerprint(&panel, FingerprintIdentity::new("A"), &genotypes(0))]),
            source("b.vcf", vec![fingerprint(&panel, FingerprintIdentity::new("B"), &genotypes(1))]),
            Arc::new(BrokenSource),
        ];
        let lenient = CrosscheckConfig {
            validation: ValidationStringency::Lenient,
            ..config()
        };
        let report = Crosschecker::new(Arc::clone(&panel), lenient.clone())
            .unwrap()
            .crosscheck(&sources)
            .unwrap();
        assert_eq!(report.groups, 2);
        assert_eq!(report.results.len(), 2);

        // Grouping by file keeps an empty group for the unreadable input
        let by_file = CrosscheckConfig {
            identity_granularity: IdentityGranularity::File,
            ..lenient
        };
        let report = Crosschecker::new(panel, by_file)
            .unwrap()
            .crosscheck(&sources)
            .unwrap();
        assert_eq!(report.groups, 3);
        let empty: Vec<_> = report
            .results
            .iter()
            .filter(|r| r.left.file.as_deref() == Some("broken.vcf"))
            .collect();
        assert_eq!(empty.len(), 2);
        assert!(empty.iter().all(|r| r.match_results.lod == 0.0));
    }

    #[test]
    fn test_results_independent_of_completion_order() {
        let panel = make_panel();
        let make_sources = |delay_first: bool| -> Vec<Arc<dyn FingerprintSource>> {
            let a = fingerprint(&panel, FingerprintIdentity::new("A").with_read_group("1"), &genotypes(0));
            let b = fingerprint(&panel, FingerprintIdentity::new("A").with_read_group("2"), &genotypes(0));
            let c = fingerprint(&panel, FingerprintIdentity::new("C"), &genotypes(2));
            let (d1, d2) = if delay_first {
                (Duration::from_millis(150), Duration::ZERO)
            } else {
                (Duration::ZERO, Duration::from_millis(150))
            };
            let first: Arc<dyn FingerprintSource> =
                Arc::new(DelayedSource(d1, InMemorySource::new("a.vcf", vec![a])));
            let second: Arc<dyn FingerprintSource> =
                Arc::new(DelayedSource(d2, InMemorySource::new("b.vcf", vec![b])));
            vec![first, second, source("c.vcf", vec![c])]
        };

        let checker = Crosschecker::new(
            Arc::clone(&panel),
            CrosscheckConfig {
                identity_granularity: IdentityGranularity::Sample,
                num_threads: 3,
                ..config()
            },
        )
        .unwrap();
        let first = checker.crosscheck(&make_sources(true)).unwrap();
        let second = checker.crosscheck(&make_sources(false)).unwrap();
        assert_eq!(first.results, second.results);
    }

    #[test]
    fn test_failure_summary_counts_inconclusive() {
        let result = |result: FingerprintResult| CrosscheckResult {
            left: FingerprintIdentity::new("A"),
            right: FingerprintIdentity::new("B"),
            expected_to_match: true,
            result,
            match_results: MatchResults::default(),
        };
        let mut report = CrosscheckReport {
            results: vec![
                result(FingerprintResult::ExpectedMatch),
                result(FingerprintResult::Inconclusive),
                result(FingerprintResult::Inconclusive),
            ],
            groups: 2,
            expect_all_groups_to_match: false,
        };
        assert!(report.passed());
        assert_eq!(report.failure_summary(), None);

        report.expect_all_groups_to_match = true;
        assert!(!report.passed());
        assert_eq!(report.failure_counts(), (0, 2));
        assert_eq!(report.failure_summary().unwrap(), "2 inconclusive of 3 comparisons");

        report.results.push(result(FingerprintResult::UnexpectedMismatch));
        assert_eq!(
            report.failure_summary().unwrap(),
            "1 unexpected and 2 inconclusive of 4 comparisons"
        );
    }

    #[test]
    fn test_batch_merger_folds_contiguous_loads() {
        let panel = make_panel();
        let fp = |read_group: &str, seed: usize| {
            fingerprint(&panel, FingerprintIdentity::new("A").with_read_group(read_group), &genotypes(seed))
        };

        let mut merger = BatchMerger::new(IdentityGranularity::Sample);
        merger.accept(2, "c.vcf".to_string(), Some(vec![fp("3", 0)])).unwrap();
        merger.accept(1, "b.vcf".to_string(), None).unwrap();
        assert_eq!(merger.pending.len(), 2);
        assert!(merger.groups.is_empty());

        merger.accept(0, "a.vcf".to_string(), Some(vec![fp("1", 0)])).unwrap();
        assert!(merger.pending.is_empty());
        assert_eq!(merger.next, 3);
        assert_eq!(merger.groups.len(), 1);

        merger.accept(4, "e.vcf".to_string(), Some(vec![fp("5", 0)])).unwrap();
        assert_eq!(merger.pending.len(), 1);

        let groups = merger.finish().unwrap();
        assert_eq!(groups.len(), 1);
        let key = FingerprintIdentity::new("A").project(IdentityGranularity::Sample);
        assert!(!groups[&key].is_empty());
    }

    #[test]
    fn test_lod_symmetric_across_directions() {
        let panel = make_panel();
        let sources = vec![
            source("a.vcf", vec![fingerprint(&panel, FingerprintIdentity::new("A"), &genotypes(0))]),
            source("b.vcf", vec![fingerprint(&panel, FingerprintIdentity::new("B"), &genotypes(1))]),
        ];
        let report = Crosschecker::new(panel, config())
            .unwrap()
            .crosscheck(&sources)
            .unwrap();
        let ab = &report.results[0].match_results;
        let ba = &report.results[1].match_results;
        assert!((ab.lod - ba.lod).abs() < 1e-10);
    }

    #[test]
    fn test_two_batches_same_sample_mode() {
        let panel = make_panel();
        let left = vec![
            source("l1.vcf", vec![fingerprint(&panel, FingerprintIdentity::new("A"), &genotypes(0))]),
            source("l2.vcf", vec![fingerprint(&panel, FingerprintIdentity::new("B"), &genotypes(1))]),
        ];
        let right = vec![
            source("r1.vcf", vec![fingerprint(&panel, FingerprintIdentity::new("A"), &genotypes(0))]),
            source("r2.vcf", vec![fingerprint(&panel, FingerprintIdentity::new("B"), &genotypes(1))]),
        ];

        let all = Crosschecker::new(Arc::clone(&panel), config())
            .unwrap()
            .crosscheck_batches(&left, &right)
            .unwrap();
        assert_eq!(all.results.len(), 4);
        assert!(all.passed());

        let same = Crosschecker::new(
            panel,
            CrosscheckConfig {
                mode: CrosscheckMode::CheckSameSample,
                ..config()
            },
        )
        .unwrap()
        .crosscheck_batches(&left, &right)
        .unwrap();
        assert_eq!(same.results.len(), 2);
        assert!(same.results.iter().all(|r| r.result == FingerprintResult::ExpectedMatch));
    }

    #[test]
    fn test_expect_all_groups_to_match() {
        let panel = make_panel();
        let sources = vec![
            source("a.vcf", vec![fingerprint(&panel, FingerprintIdentity::new("A"), &genotypes(0))]),
            source("b.vcf", vec![fingerprint(&panel, FingerprintIdentity::new("B"), &genotypes(1))]),
        ];
        let report = Crosschecker::new(
            panel,
            CrosscheckConfig {
                expect_all_groups_to_match: true,
                ..config()
            },
        )
        .unwrap()
        .crosscheck(&sources)
        .unwrap();
        assert!(report.results.iter().all(|r| r.expected_to_match));
        assert!(!report.passed());
        assert_eq!(report.counts().get("UNEXPECTED_MISMATCH"), Some(&2));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = Crosschecker::new(
            make_panel(),
            CrosscheckConfig {
                num_threads: 0,
                ..config()
            },
        );
        assert!(matches!(result, Err(CrosscheckError::InvalidConfig(_))));
    }
}
