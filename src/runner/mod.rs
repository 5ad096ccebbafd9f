pub mod annotate;
pub mod bridge;
pub mod config;
pub mod coverage;
pub mod error;
pub mod interceptor;
pub mod loader;
pub mod patterns;
pub mod report;
pub mod sourcemap;
pub mod store;

pub use annotate::annotate;
pub use bridge::{Completion, FsGlob, GlobExpander, TestRunner, TestRunnerBridge};
pub use coverage::{Collector, CoverageAggregator, CoverageMap, CoverageSink};
pub use error::{BoxError, RunnerError, SourceMapError};
pub use interceptor::{
    Instrumenter, LoadGate, LoadPipeline, ModuleHost, ModuleLoader, Transpiled, Transpiler,
};
pub use report::{Report, ReportFactory, ReportOptions};
pub use store::SourceStore;

use crate::types::config::Config;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::info;

/// Result of a finished run.
#[derive(Debug)]
pub struct RunOutcome {
    pub test_files: Vec<PathBuf>,
    /// `None` when the test runner returned without calling its completion.
    pub collector: Option<Collector>,
}

/// Wires the load pipeline, coverage aggregator and test runner bridge for a
/// single run.
pub struct Runner {
    config: Config,
    store: SourceStore,
    pipeline: LoadPipeline,
    aggregator: CoverageAggregator,
    bridge: TestRunnerBridge,
}

impl Runner {
    pub fn new(
        config: Config,
        transpiler: Box<dyn Transpiler>,
        instrumenter: Box<dyn Instrumenter>,
        reports: Box<dyn ReportFactory>,
    ) -> Result<Self, RunnerError> {
        let store = SourceStore::new();
        let pipeline = LoadPipeline::new(&config, transpiler, instrumenter, store.clone())?;
        let aggregator = CoverageAggregator::new(&config.coverage, store.clone(), reports);
        let bridge = TestRunnerBridge::new(&config);

        Ok(Self {
            config,
            store,
            pipeline,
            aggregator,
            bridge,
        })
    }

    pub fn with_expander(mut self, expander: Box<dyn GlobExpander>) -> Self {
        self.bridge = self.bridge.with_expander(expander);
        self
    }

    pub fn with_working_dir(mut self, working_dir: PathBuf) -> Self {
        self.bridge = self.bridge.with_working_dir(working_dir);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn source_store(&self) -> SourceStore {
        self.store.clone()
    }

    /// Handle for the host to record execution counts into.
    pub fn coverage_sink(&self) -> CoverageSink {
        self.aggregator.sink()
    }

    pub fn pipeline(&self) -> &LoadPipeline {
        &self.pipeline
    }

    /// Runs the tests. Every module the runner loads goes through the
    /// pipeline into `host`; reports are written when the runner completes.
    pub fn run(
        self,
        test_runner: &mut dyn TestRunner,
        host: &mut dyn ModuleHost,
    ) -> Result<RunOutcome, RunnerError> {
        let Runner {
            pipeline,
            aggregator,
            bridge,
            ..
        } = self;

        let collected = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&collected);
        let on_complete: Completion<'_> = Box::new(move || {
            let collector = aggregator.complete()?;
            *slot.borrow_mut() = Some(collector);
            Ok(())
        });

        let mut loader = pipeline.bind(host);
        let test_files = bridge.start(test_runner, &mut loader, on_complete)?;
        info!(files = test_files.len(), "Test run finished");

        let collector = collected.borrow_mut().take();
        Ok(RunOutcome {
            test_files,
            collector,
        })
    }
}
