//! `hostca getcert` - submit a certificate request.

use anyhow::{Context as _, Result};
use colored::Colorize;
use std::io::Read;
use std::path::Path;

use super::Context;
use crate::cli::args::GetcertArgs;
use hostca::CertResponse;

pub async fn execute(ctx: Context, args: GetcertArgs) -> Result<()> {
    let csr = read_request(&args.csr)?;
    let client = args.hostname.clone();
    let ip = args.ip;

    let response = ctx
        .with_service(move |service| Ok(service.getcert(&csr, client.as_deref(), ip)?))
        .await?;

    if ctx.output_format.print_structured(&response)? {
        return Ok(());
    }

    match response {
        CertResponse::Issued { certificate, .. } => print!("{certificate}"),
        CertResponse::Pending { .. } => {
            eprintln!(
                "{} request filed, waiting for an operator to sign it",
                "Pending:".yellow().bold()
            );
        }
    }
    Ok(())
}

fn read_request(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut csr = String::new();
        std::io::stdin()
            .read_to_string(&mut csr)
            .context("Failed to read request from stdin")?;
        return Ok(csr);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request from {}", path.display()))
}
