//! `hostca config` - settings file management.

use anyhow::Result;
use colored::Colorize;

use super::Context;
use crate::cli::args::{ConfigArgs, ConfigCommands};
use crate::config;

pub async fn execute(ctx: Context, args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(&ctx),
        ConfigCommands::Set { key, value } => set_config(&ctx, &key, &value),
        ConfigCommands::Path => {
            println!("{}", ctx.config_path.display());
            Ok(())
        }
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    let settings = &ctx.settings;
    if ctx.output_format.print_structured(settings)? {
        return Ok(());
    }

    println!("{}", "Current Configuration:".bold());
    println!();
    println!("  {} {}", "cadir:".bold(), settings.cadir.display());
    println!("  {} {}", "ca_name:".bold(), settings.ca_name);
    println!("  {} {}", "autosign:".bold(), settings.autosign);
    println!("  {} {}", "ca_ttl_days:".bold(), settings.ca_ttl_days);
    println!("  {} {}", "cert_ttl_days:".bold(), settings.cert_ttl_days);
    let server_name = settings
        .server_name
        .clone()
        .unwrap_or_else(|| "(not set)".dimmed().to_string());
    println!("  {} {}", "server_name:".bold(), server_name);
    Ok(())
}

fn set_config(ctx: &Context, key: &str, value: &str) -> Result<()> {
    // reload from disk: a --cadir override must not be saved
    let mut settings = config::load(&ctx.config_path, None)?;
    config::set_value(&mut settings, key, value)?;
    settings.save(&ctx.config_path)?;

    println!("{} {} set to {}.", "Success:".green().bold(), key, value.cyan());
    Ok(())
}
