//! `hostca inspect` - show an issued certificate.

use anyhow::Result;
use colored::Colorize;

use super::Context;
use crate::cli::args::InspectArgs;

pub async fn execute(ctx: Context, args: InspectArgs) -> Result<()> {
    let host = args.host;
    let info = ctx
        .with_service(move |service| Ok(service.ca().inspect(&host)?))
        .await?;

    if ctx.output_format.print_structured(&info)? {
        return Ok(());
    }

    let status = if info.is_expired_at(chrono::Utc::now()) {
        "expired".red()
    } else {
        "valid".green()
    };

    println!("{} {}", "Certificate:".bold(), info.subject.cyan().bold());
    println!();
    println!("  {} {}", "Issuer:".bold(), info.issuer);
    println!("  {} 0x{}", "Serial:".bold(), info.serial);
    println!("  {} {}", "Not before:".bold(), info.not_before.to_rfc3339());
    println!("  {} {}", "Not after:".bold(), info.not_after.to_rfc3339());
    println!("  {} {}", "Status:".bold(), status);
    println!("  {} {}", "SHA-256:".bold(), info.fingerprint_display());
    Ok(())
}
