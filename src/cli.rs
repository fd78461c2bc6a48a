use crate::adapters::plugin::WeightedNamingPlugin;
use crate::app::engine::AnalysisEngine;
use anyhow::{Result, anyhow};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "archrole", version, about = "Classify types into architectural roles")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Classify every type and detect dependency cycles
    Analyze {
        #[command(flatten)]
        input: InputArgs,
        /// Refine domain roles with the weighted naming plugin
        #[arg(long)]
        weighted: bool,
    },
    /// Print type-level dependency cycles only
    Cycles {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Explain the classification of one type
    Classify {
        #[command(flatten)]
        input: InputArgs,
        /// Qualified name of the type
        qualified_name: String,
    },
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// Graph document (JSON)
    pub graph: PathBuf,
    /// Analysis configuration (JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Single-line JSON output
    #[arg(long)]
    pub compact: bool,
}

impl InputArgs {
    fn engine(&self) -> Result<AnalysisEngine> {
        AnalysisEngine::load(&self.graph, self.config.as_deref())
    }
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{json}");
    Ok(())
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Analyze { input, weighted } => {
            let mut engine = input.engine()?;
            let report = if weighted {
                engine = engine.with_plugin(Arc::new(WeightedNamingPlugin::with_default_signals("weighted-naming")));
                let report = engine.report_with_plugins().await;
                engine.shutdown().await;
                report
            } else {
                engine.report()
            };
            print_json(&report, input.compact)
        }
        Command::Cycles { input } => {
            let engine = input.engine()?;
            print_json(&engine.detect_type_cycles(), input.compact)
        }
        Command::Classify {
            input,
            qualified_name,
        } => {
            let engine = input.engine()?;
            let explanation = engine
                .explain(&qualified_name)
                .ok_or_else(|| anyhow!("Type not found: {qualified_name}"))?;
            print_json(&explanation, input.compact)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_classify_with_config() {
        let cli = Cli::try_parse_from([
            "archrole",
            "classify",
            "graph.json",
            "shop.Order",
            "--config",
            "cfg.json",
        ])
        .unwrap();
        match cli.command {
            Command::Classify {
                input,
                qualified_name,
            } => {
                assert_eq!(qualified_name, "shop.Order");
                assert_eq!(input.config, Some(PathBuf::from("cfg.json")));
                assert!(!input.compact);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_analyze_requires_graph() {
        assert!(Cli::try_parse_from(["archrole", "analyze"]).is_err());
    }
}
