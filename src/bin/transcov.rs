use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;
use transcov::runner::loader::{load_config, DEFAULT_CONFIG_FILE};
use transcov::runner::{LoadGate, TestRunnerBridge};
use transcov::{annotate, normalize, Config, OutputFormat};

#[derive(Parser)]
#[command(name = "transcov")]
#[command(about = "Inspect a transpile-aware coverage setup and its source-mapped annotations")]
#[command(version = "0.1.0")]
struct Cli {
    /// Configuration file (JSON, or YAML with a .yml/.yaml extension)
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Output format for the resolved configuration
    #[arg(short, long, value_enum, default_value = "json")]
    output: OutputFormatCli,

    /// List the test files the configured globs resolve to
    #[arg(long)]
    list_tests: bool,

    /// Print the side-by-side annotation of a generated file
    #[arg(long, value_name = "FILE")]
    annotate: Option<PathBuf>,

    /// Show whether a file would be transpiled and instrumented
    #[arg(long, value_name = "FILE")]
    check: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long)]
    verbose: bool,
}

#[derive(Clone, ValueEnum)]
enum OutputFormatCli {
    Json,
    Yaml,
}

impl From<OutputFormatCli> for OutputFormat {
    fn from(cli_format: OutputFormatCli) -> Self {
        match cli_format {
            OutputFormatCli::Json => OutputFormat::Json,
            OutputFormatCli::Yaml => OutputFormat::Yaml,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Some(generated) = &cli.annotate {
        let source = tokio::fs::read_to_string(generated).await?;
        println!("{}", annotate(&source));
        return Ok(());
    }

    let raw = match load_config(&cli.config).await {
        Ok(raw) => raw,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    let config = normalize(&raw);

    if let Some(file) = &cli.check {
        return handle_check(&config, file);
    }

    if cli.list_tests {
        return handle_list_tests(&config);
    }

    println!("{}", OutputFormat::from(cli.output).render(&config)?);
    info!("Configuration resolved");
    Ok(())
}

fn handle_check(config: &Config, file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let gate = LoadGate::new(config)?;
    let file = if file.is_absolute() {
        file.to_path_buf()
    } else {
        std::env::current_dir()?.join(file)
    };

    println!("{}", file.display());
    println!("  transpile: {}", yes_no(gate.should_transpile(&file)));
    println!("  instrument: {}", yes_no(gate.should_instrument(&file)));
    Ok(())
}

fn handle_list_tests(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let files = TestRunnerBridge::new(config).test_files()?;
    for file in &files {
        println!("{}", file.display());
    }
    info!("Found {} test files", files.len());
    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
