//! `hostca autosign` - evaluate the autosign policy.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use super::Context;
use crate::cli::args::AutosignArgs;
use hostca::AutosignSetting;

#[derive(Debug, Serialize)]
struct Decision {
    hostname: String,
    autosign: bool,
}

pub async fn execute(ctx: Context, args: AutosignArgs) -> Result<()> {
    // never opens (or creates) the CA
    let setting = AutosignSetting::new(ctx.settings.autosign.clone());
    let decisions: Vec<Decision> = args
        .hosts
        .into_iter()
        .map(|hostname| Decision {
            autosign: setting.autosign(&hostname),
            hostname,
        })
        .collect();

    if ctx.output_format.print_structured(&decisions)? {
        return Ok(());
    }

    if ctx.verbose {
        println!("{} {}", "Policy:".bold(), ctx.settings.autosign);
    }
    for decision in &decisions {
        let verdict = if decision.autosign {
            "autosign".green()
        } else {
            "manual".yellow()
        };
        println!("{}: {verdict}", decision.hostname);
    }
    Ok(())
}
