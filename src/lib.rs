pub mod runner;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use runner::config::normalize;
pub use runner::{annotate, Runner, RunnerError};
pub use types::config::Config;
pub use types::output::OutputFormat;
