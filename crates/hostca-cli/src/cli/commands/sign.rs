//! `hostca sign` - sign pending requests.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use super::Context;
use crate::cli::args::SignArgs;

#[derive(Debug, Serialize)]
struct SignOutcome {
    hostname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    serial: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn execute(ctx: Context, args: SignArgs) -> Result<()> {
    let outcomes = ctx
        .with_service(move |service| {
            let hosts = if args.all {
                service.ca().list_requests()?
            } else {
                args.hosts
            };

            Ok(hosts
                .into_iter()
                .map(|hostname| match service.ca().sign_pending(&hostname) {
                    Ok(signed) => SignOutcome {
                        hostname,
                        serial: Some(signed.serial),
                        error: None,
                    },
                    Err(e) => SignOutcome {
                        hostname,
                        serial: None,
                        error: Some(e.to_string()),
                    },
                })
                .collect::<Vec<_>>())
        })
        .await?;

    if !ctx.output_format.print_structured(&outcomes)? {
        if outcomes.is_empty() {
            println!("No pending requests.");
        }
        for outcome in &outcomes {
            match (&outcome.serial, &outcome.error) {
                (Some(serial), _) => println!(
                    "{} {} (serial 0x{serial:04X})",
                    "Signed:".green().bold(),
                    outcome.hostname.cyan()
                ),
                (None, Some(error)) => {
                    println!("{} {}: {error}", "Failed:".red().bold(), outcome.hostname);
                }
                (None, None) => {}
            }
        }
    }

    let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
    if failed > 0 {
        anyhow::bail!("{failed} request(s) could not be signed");
    }
    Ok(())
}
