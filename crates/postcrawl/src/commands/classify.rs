//! Classify command - dry run of job-name classification.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use postcrawl_pipeline::{ContentType, CrawlerNames};
use serde::Serialize;

use super::Context;

/// Arguments for the classify command.
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Job name as it appears in the completion event
    pub job_name: String,
}

#[derive(Debug, Serialize)]
struct ClassifyOutput {
    job_name: String,
    classified: bool,
    content_type: Option<String>,
    table_prefix: Option<&'static str>,
    crawler: Option<String>,
}

/// Run the classify command. Makes no external calls.
pub fn run(args: ClassifyArgs, ctx: &Context) -> Result<ExitCode> {
    let content_type = ContentType::detect(&args.job_name);
    let crawlers = CrawlerNames::from_section(&ctx.config.config.crawlers());
    let crawler = content_type
        .map(|t| crawlers.for_type(t))
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    let output = ClassifyOutput {
        job_name: args.job_name,
        classified: content_type.is_some(),
        content_type: content_type.map(|t| t.to_string()),
        table_prefix: content_type.map(ContentType::table_prefix),
        crawler,
    };

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        let dim = Style::new().dim();
        println!();
        println!("{}", style("Classification").bold());
        println!("{}", dim.apply_to("─".repeat(40)));
        println!("  {} {}", dim.apply_to("Job:"), output.job_name);
        match content_type {
            Some(content_type) => {
                println!(
                    "  {} {}",
                    dim.apply_to("Content type:"),
                    style(content_type).green()
                );
                println!(
                    "  {} {}",
                    dim.apply_to("Table prefix:"),
                    content_type.table_prefix()
                );
                println!(
                    "  {} {}",
                    dim.apply_to("Crawler:"),
                    output.crawler.as_deref().unwrap_or("(not configured)")
                );
            }
            None => {
                println!(
                    "  {} {}",
                    dim.apply_to("Result:"),
                    style("unclassified (no txt/csv/json marker)").red()
                );
            }
        }
        println!();
    }

    Ok(if output.classified {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
