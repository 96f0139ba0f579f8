//! `hostca clean` - remove host certificate material.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use super::Context;
use crate::cli::args::CleanArgs;

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum CleanStatus {
    Cleaned,
    NotFound,
    Failed(String),
}

#[derive(Debug, Serialize)]
struct CleanOutcome {
    hostname: String,
    status: CleanStatus,
}

pub async fn execute(ctx: Context, args: CleanArgs) -> Result<()> {
    let outcomes = ctx
        .with_service(move |service| {
            Ok(args
                .hosts
                .into_iter()
                .map(|hostname| {
                    let status = match service.clean(&hostname) {
                        Ok(()) => CleanStatus::Cleaned,
                        Err(e) if e.is_not_found() => CleanStatus::NotFound,
                        Err(e) => CleanStatus::Failed(e.to_string()),
                    };
                    CleanOutcome { hostname, status }
                })
                .collect::<Vec<_>>())
        })
        .await?;

    if !ctx.output_format.print_structured(&outcomes)? {
        for outcome in &outcomes {
            match &outcome.status {
                CleanStatus::Cleaned => {
                    println!("{} {}", "Cleaned:".green().bold(), outcome.hostname.cyan());
                }
                CleanStatus::NotFound => {
                    println!("{} {}", "Not found:".yellow().bold(), outcome.hostname);
                }
                CleanStatus::Failed(error) => {
                    println!("{} {}: {error}", "Failed:".red().bold(), outcome.hostname);
                }
            }
        }
    }

    // unknown hosts are reported, not fatal
    let failed = outcomes
        .iter()
        .filter(|o| matches!(o.status, CleanStatus::Failed(_)))
        .count();
    if failed > 0 {
        anyhow::bail!("{failed} host(s) could not be cleaned");
    }
    Ok(())
}
