//! Handle command - runs the completion workflow for one event.

use std::io::Read;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use clap::Args;
use console::{Style, style};
use postcrawl_pipeline::{CompletionSignal, Orchestrator, WorkflowOutcome, WorkflowSettings};
use serde::Serialize;

use super::Context;

/// Arguments for the handle command.
#[derive(Args, Debug)]
pub struct HandleArgs {
    /// Completion event JSON file, or "-" to read stdin
    #[arg(short, long, default_value = "-")]
    pub event: String,
}

/// Outcome for JSON output.
#[derive(Debug, Serialize)]
struct OutcomeOutput<'a> {
    success: bool,
    job_name: &'a str,
    stage: &'static str,
    failure_kind: Option<&'static str>,
    reason: Option<String>,
    crawler: Option<&'a str>,
    crawler_state: Option<&'a str>,
    crawler_timed_out: Option<bool>,
    table: Option<&'a str>,
    query_run_id: Option<&'a str>,
    query_state: Option<&'a str>,
    output_location: Option<&'a str>,
}

impl<'a> OutcomeOutput<'a> {
    fn from_outcome(outcome: &'a WorkflowOutcome) -> Self {
        Self {
            success: outcome.is_success(),
            job_name: &outcome.job_name,
            stage: outcome.stage.as_str(),
            failure_kind: outcome.failure.as_ref().map(|f| f.kind()),
            reason: outcome.reason(),
            crawler: outcome.refresh.as_ref().map(|r| r.crawler.as_str()),
            crawler_state: outcome.refresh.as_ref().map(|r| r.state.as_str()),
            crawler_timed_out: outcome.refresh.as_ref().map(|r| r.timed_out),
            table: outcome.table.as_ref().map(|t| t.name.as_str()),
            query_run_id: outcome.query.as_ref().map(|q| q.run_id.as_str()),
            query_state: outcome.query.as_ref().map(|q| q.state.as_str()),
            output_location: outcome.query.as_ref().map(|q| q.output_location.as_str()),
        }
    }
}

/// Run the handle command.
///
/// Exit code is 0 when the validation query succeeded and 1 for any workflow
/// failure. Bad input or configuration is returned as an error.
pub async fn run(args: HandleArgs, ctx: &Context) -> Result<ExitCode> {
    let settings = WorkflowSettings::from_config(&ctx.config.config)
        .context("configuration is incomplete (see `postcrawl config`)")?;

    let text = read_event(&args.event)?;
    let signal =
        CompletionSignal::from_json(&text).context("failed to parse completion event")?;

    // Clients load on first use, so an unclassified signal makes no AWS calls.
    let services = postcrawl_aws::connect(&ctx.config.config.aws());
    let orchestrator = Orchestrator::new(services, settings);
    let outcome = orchestrator.handle(&signal).await;

    print_outcome(&outcome, ctx)?;

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn read_event(source: &str) -> Result<String> {
    if source == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read completion event from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(Path::new(source))
            .with_context(|| format!("failed to read completion event from {source}"))
    }
}

fn print_outcome(outcome: &WorkflowOutcome, ctx: &Context) -> Result<()> {
    let output = OutcomeOutput::from_outcome(outcome);

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    println!();
    println!("{}", style("Completion Workflow").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!("  {} {}", dim.apply_to("Job:"), output.job_name);
    if let Some(crawler) = output.crawler {
        let timed_out = if output.crawler_timed_out == Some(true) {
            " (timed out, continued)"
        } else {
            ""
        };
        println!(
            "  {} {} → {}{}",
            dim.apply_to("Crawler:"),
            crawler,
            output.crawler_state.unwrap_or("-"),
            timed_out
        );
    }
    if let Some(table) = output.table {
        println!("  {} {}", dim.apply_to("Table:"), table);
    }
    if let Some(run_id) = output.query_run_id {
        println!(
            "  {} {} → {}",
            dim.apply_to("Query:"),
            run_id,
            output.query_state.unwrap_or("-")
        );
    }
    if let Some(location) = output.output_location {
        println!("  {} {}", dim.apply_to("Results:"), location);
    }

    println!();
    if output.success {
        println!("  {}", style("● success").green());
    } else {
        println!(
            "  {} {}",
            style("● failure").red(),
            output.reason.as_deref().unwrap_or_default()
        );
        if ctx.verbose
            && let Some(failure) = &outcome.failure
        {
            println!("  {} {}", dim.apply_to("Detail:"), failure);
        }
    }
    println!();

    Ok(())
}
