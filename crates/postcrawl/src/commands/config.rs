//! Config command - shows the merged configuration and its sources.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use postcrawl_config::PostcrawlConfig;
use serde::Serialize;

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Exit non-zero if the configuration cannot run the workflow
    #[arg(long)]
    pub check: bool,
}

#[derive(Debug, Serialize)]
struct SourceOutput {
    path: String,
    loaded: bool,
}

#[derive(Debug, Serialize)]
struct ConfigOutput<'a> {
    sources: Vec<SourceOutput>,
    env_overrides: &'a [&'static str],
    warnings: &'a [String],
    valid: bool,
    problem: Option<String>,
    config: &'a PostcrawlConfig,
}

/// Run the config command.
pub fn run(args: ConfigArgs, ctx: &Context) -> Result<ExitCode> {
    let loaded = &ctx.config;
    let problem = loaded.config.validate().err().map(|e| e.to_string());

    if ctx.json_output {
        let output = ConfigOutput {
            sources: loaded
                .sources
                .iter()
                .map(|s| SourceOutput {
                    path: s.path.display().to_string(),
                    loaded: s.loaded,
                })
                .collect(),
            env_overrides: &loaded.env_overrides,
            warnings: &loaded.warnings,
            valid: problem.is_none(),
            problem: problem.clone(),
            config: &loaded.config,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        let dim = Style::new().dim();
        println!();
        println!("{}", style("Configuration Sources").bold());
        println!("{}", dim.apply_to("─".repeat(40)));
        for source in &loaded.sources {
            let marker = if source.loaded {
                style("●").green()
            } else {
                style("○").dim()
            };
            println!("  {} {}", marker, source.path.display());
        }
        if !loaded.env_overrides.is_empty() {
            println!(
                "  {} {}",
                dim.apply_to("Environment:"),
                loaded.env_overrides.join(", ")
            );
        }
        for warning in &loaded.warnings {
            println!("  {} {}", style("warning:").yellow(), warning);
        }

        println!();
        println!("{}", style("Merged Configuration").bold());
        println!("{}", dim.apply_to("─".repeat(40)));
        println!("{}", loaded.config.to_toml()?);

        match &problem {
            None => println!("{}", style("✓ ready to handle completion events").green()),
            Some(problem) => println!("{} {}", style("✗").red(), problem),
        }
        println!();
    }

    Ok(if args.check && problem.is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
