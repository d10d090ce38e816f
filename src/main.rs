use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use sepsis_dash::common::log::{init_logging, LogFormat};
use sepsis_dash::{api, AppCfg, AppState};

/// Sepsis prediction dashboard over a pretrained tabular classifier.
#[derive(Debug, Parser)]
#[command(name = "sepsis-dash", version, about)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Reference dataset (CSV)
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,

    /// Classifier artefact (JSON)
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Listen address, e.g. 127.0.0.1:8501
    #[arg(long, global = true)]
    bind: Option<String>,

    /// Decision threshold in [0, 1]
    #[arg(long, global = true)]
    threshold: Option<f64>,

    /// Log level filter (overridden by RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format: pretty or json
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the dashboard server (default)
    Serve,
    /// Load dataset and model, print a summary, and exit
    Check,
}

impl Cli {
    fn into_cfg(self) -> Result<(AppCfg, Command)> {
        let cfg = AppCfg::load(self.config.as_deref()).context("loading configuration")?;
        self.apply(cfg)
    }

    /// Flags win over the file; the merged result is validated.
    fn apply(self, mut cfg: AppCfg) -> Result<(AppCfg, Command)> {
        if let Some(path) = self.dataset {
            cfg.dataset_path = path;
        }
        if let Some(path) = self.model {
            cfg.model_path = path;
        }
        if let Some(bind) = self.bind {
            cfg.bind = bind;
        }
        if let Some(threshold) = self.threshold {
            cfg.threshold = threshold;
        }
        if let Some(level) = self.log_level {
            cfg.log.level = level;
        }
        if let Some(format) = self.log_format {
            cfg.log.format = format;
        }
        cfg.validate().context("invalid configuration")?;
        Ok((cfg, self.command.unwrap_or(Command::Serve)))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let (cfg, command) = Cli::parse().into_cfg()?;
    init_logging(&cfg.log).context("initializing logging")?;

    let state = AppState::load(&cfg).context("loading dashboard state")?;

    match command {
        Command::Check => {
            let assembler = &state.assembler;
            let classifier = assembler.classifier();
            println!("dataset:   {}", cfg.dataset_path.display());
            println!("features:  {}", assembler.catalog().len());
            println!(
                "vitals:    {}",
                state.layout.vitals().collect::<Vec<_>>().join(", ")
            );
            println!(
                "model:     {} ({}, {} inputs)",
                classifier.model_id(),
                classifier.kind().as_str(),
                classifier.n_features()
            );
            println!("threshold: {}", assembler.threshold().value());
            Ok(())
        }
        Command::Serve => {
            let addr = cfg.bind_addr()?;
            api::serve(Arc::new(state), addr).await?;
            Ok(())
        }
    }
}
