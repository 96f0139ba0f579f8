//! `hostca generate` - issue a key and certificate locally.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

use super::Context;
use crate::cli::args::GenerateArgs;

#[derive(Debug, Serialize)]
struct Generated {
    hostname: String,
    serial: u64,
    certificate_path: PathBuf,
    private_key_path: PathBuf,
}

pub async fn execute(ctx: Context, args: GenerateArgs) -> Result<()> {
    let host = args.host;
    let generated = ctx
        .with_service(move |service| {
            let ca = service.ca();
            let signed = ca.generate(&host)?;
            Ok(Generated {
                certificate_path: ca.store().certificate_path(&signed.hostname)?,
                private_key_path: ca.store().private_key_path(&signed.hostname)?,
                serial: signed.serial,
                hostname: signed.hostname,
            })
        })
        .await?;

    if ctx.output_format.print_structured(&generated)? {
        return Ok(());
    }

    println!(
        "{} {} (serial 0x{:04X})",
        "Generated:".green().bold(),
        generated.hostname.cyan(),
        generated.serial
    );
    println!("  {} {}", "Certificate:".bold(), generated.certificate_path.display());
    println!("  {} {}", "Private key:".bold(), generated.private_key_path.display());
    Ok(())
}
