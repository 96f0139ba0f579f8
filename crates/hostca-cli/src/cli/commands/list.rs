//! `hostca list` - pending requests and issued certificates.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use super::Context;
use crate::cli::args::ListArgs;
use hostca::CertificateInfo;

#[derive(Debug, Serialize)]
struct Listing {
    requests: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    certificates: Option<Vec<CertificateInfo>>,
}

#[derive(Tabled)]
struct CertificateRow {
    #[tabled(rename = "Host")]
    subject: String,
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Expires")]
    not_after: String,
    #[tabled(rename = "Status")]
    status: String,
}

pub async fn execute(ctx: Context, args: ListArgs) -> Result<()> {
    let all = args.all;
    let listing = ctx
        .with_service(move |service| {
            let ca = service.ca();
            Ok(Listing {
                requests: ca.list_requests()?,
                certificates: if all {
                    Some(ca.list_certificates()?)
                } else {
                    None
                },
            })
        })
        .await?;

    if ctx.output_format.print_structured(&listing)? {
        return Ok(());
    }

    if listing.requests.is_empty() {
        println!("{}", "No pending requests.".dimmed());
    } else {
        println!("{}", "Pending requests:".bold());
        for host in &listing.requests {
            println!("  {host}");
        }
    }

    if let Some(certificates) = listing.certificates {
        println!();
        println!("{}", "Issued certificates:".bold());
        let now = chrono::Utc::now();
        let rows: Vec<CertificateRow> = certificates
            .iter()
            .map(|info| CertificateRow {
                subject: info.subject.clone(),
                serial: format!("0x{}", info.serial),
                not_after: info.not_after.format("%Y-%m-%d").to_string(),
                status: if info.is_expired_at(now) {
                    "expired".red().to_string()
                } else {
                    "valid".green().to_string()
                },
            })
            .collect();
        let table = Table::new(&rows).with(Style::rounded()).to_string();
        println!("{table}");
    }
    Ok(())
}
