//! Coverage counters, their aggregation, and report dispatch at the end of
//! a run.

use crate::runner::error::RunnerError;
use crate::runner::report::{ReportFactory, ReportOptions};
use crate::runner::store::SourceStore;
use crate::types::config::CoverageConfig;
use serde::Serialize;
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::{debug, info};

/// Hit counts for one file, keyed by construct id.
pub type FileCounters = BTreeMap<String, u64>;

/// Execution counts per instrumented construct, per file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoverageMap {
    files: BTreeMap<String, FileCounters>,
}

impl CoverageMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, file: &str, construct_id: &str) {
        *self
            .files
            .entry(file.to_string())
            .or_default()
            .entry(construct_id.to_string())
            .or_insert(0) += 1;
    }

    /// Registers a construct with a zero count so it shows up as uncovered.
    pub fn declare(&mut self, file: &str, construct_id: &str) {
        self.files
            .entry(file.to_string())
            .or_default()
            .entry(construct_id.to_string())
            .or_insert(0);
    }

    pub fn hits(&self, file: &str, construct_id: &str) -> u64 {
        self.files
            .get(file)
            .and_then(|counters| counters.get(construct_id))
            .copied()
            .unwrap_or(0)
    }

    pub fn file(&self, file: &str) -> Option<&FileCounters> {
        self.files.get(file)
    }

    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Adds every counter of `other` into `self`.
    pub fn merge(&mut self, other: &CoverageMap) {
        for (file, counters) in &other.files {
            let target = self.files.entry(file.clone()).or_default();
            for (construct_id, hits) in counters {
                *target.entry(construct_id.clone()).or_insert(0) += hits;
            }
        }
    }
}

/// Handle through which instrumented code records execution counts.
///
/// Clones share the same map; the aggregator keeps one handle and gives
/// others to the host executing instrumented modules.
#[derive(Debug, Clone)]
pub struct CoverageSink {
    name: Rc<str>,
    map: Rc<RefCell<CoverageMap>>,
}

impl CoverageSink {
    pub fn new(name: &str) -> Self {
        Self {
            name: Rc::from(name),
            map: Rc::new(RefCell::new(CoverageMap::new())),
        }
    }

    /// The coverage variable name instrumented code was told to use.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn increment(&self, file: &str, construct_id: &str) {
        self.map.borrow_mut().increment(file, construct_id);
    }

    pub fn declare(&self, file: &str, construct_id: &str) {
        self.map.borrow_mut().declare(file, construct_id);
    }

    pub fn snapshot(&self) -> CoverageMap {
        self.map.borrow().clone()
    }
}

/// Aggregation of one or more coverage maps into a single dataset.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Collector {
    options: Map<String, Value>,
    sources: usize,
    merged: CoverageMap,
}

impl Collector {
    pub fn new(options: Map<String, Value>) -> Self {
        Self {
            options,
            sources: 0,
            merged: CoverageMap::new(),
        }
    }

    pub fn add(&mut self, map: &CoverageMap) {
        self.merged.merge(map);
        self.sources += 1;
    }

    /// Number of maps added so far.
    pub fn sources(&self) -> usize {
        self.sources
    }

    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.merged.files()
    }

    pub fn file_coverage(&self, file: &str) -> Option<&FileCounters> {
        self.merged.file(file)
    }

    pub fn coverage(&self) -> &CoverageMap {
        &self.merged
    }

    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }
}

/// Owns the coverage sink for one run and writes the configured reports
/// when the run completes.
pub struct CoverageAggregator {
    config: CoverageConfig,
    sink: CoverageSink,
    store: SourceStore,
    reports: Box<dyn ReportFactory>,
}

impl CoverageAggregator {
    /// Starts a run with a fresh, empty sink.
    pub fn new(config: &CoverageConfig, store: SourceStore, reports: Box<dyn ReportFactory>) -> Self {
        Self {
            sink: CoverageSink::new(&config.coverage_variable),
            config: config.clone(),
            store,
            reports,
        }
    }

    pub fn sink(&self) -> CoverageSink {
        self.sink.clone()
    }

    /// Collects the sink and writes every configured report in order.
    /// Consumes the aggregator, so it can only run once per run.
    pub fn complete(self) -> Result<Collector, RunnerError> {
        let mut collector = Collector::new(self.config.collector.clone());
        collector.add(&self.sink.snapshot());
        debug!(
            files = collector.coverage().files().count(),
            "Collected coverage"
        );

        for (name, specific) in &self.config.reporters {
            let options = ReportOptions::merged(&self.config.directory, &self.store, specific);
            let report = self.reports.create(name, &options).map_err(|e| RunnerError::Report {
                name: name.clone(),
                message: e.to_string(),
            })?;
            report
                .write_report(&collector, true)
                .map_err(|e| RunnerError::Report {
                    name: name.clone(),
                    message: e.to_string(),
                })?;
            info!(report = %name, dir = %options.dir.display(), "Wrote coverage report");
        }

        Ok(collector)
    }
}
