//! Command-line argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Host identity certificate authority
///
/// Signs agent certificate requests according to the autosign policy and
/// keeps issued certificates in the CA directory.
#[derive(Parser, Debug)]
#[command(name = "hostca")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Settings file (default: platform config dir)
    #[arg(short, long, env = "HOSTCA_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// CA directory, overriding the settings file
    #[arg(long, env = "HOSTCA_CADIR", global = true)]
    pub cadir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit a certificate request as an agent would
    Getcert(GetcertArgs),

    /// Sign pending certificate requests
    Sign(SignArgs),

    /// Remove all certificate material for hosts
    Clean(CleanArgs),

    /// List pending requests (and issued certificates)
    List(ListArgs),

    /// Show details of an issued certificate
    Inspect(InspectArgs),

    /// Generate a key and certificate for a host
    Generate(GenerateArgs),

    /// Check whether hosts would be signed automatically
    Autosign(AutosignArgs),

    /// Manage the settings file
    Config(ConfigArgs),
}

// ============================================================================
// Getcert command
// ============================================================================

#[derive(Args, Debug)]
pub struct GetcertArgs {
    /// PEM certificate request, or `-` for stdin
    pub csr: PathBuf,

    /// Name the agent connected as, for the logs; the certificate is
    /// always issued to the request's common name
    #[arg(long)]
    pub hostname: Option<String>,

    /// Address of the requesting agent, for the logs
    #[arg(long)]
    pub ip: Option<IpAddr>,
}

// ============================================================================
// Sign command
// ============================================================================

#[derive(Args, Debug)]
pub struct SignArgs {
    /// Hosts whose pending requests to sign
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub hosts: Vec<String>,

    /// Sign every pending request
    #[arg(long)]
    pub all: bool,
}

// ============================================================================
// Clean / inspect / generate commands
// ============================================================================

#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Hosts to clean
    #[arg(required = true)]
    pub hosts: Vec<String>,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Host whose certificate to show
    pub host: String,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Host to issue a certificate for
    pub host: String,
}

// ============================================================================
// List command
// ============================================================================

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Include issued certificates
    #[arg(short, long)]
    pub all: bool,
}

// ============================================================================
// Autosign command
// ============================================================================

#[derive(Args, Debug)]
pub struct AutosignArgs {
    /// Hostnames to evaluate
    #[arg(required = true)]
    pub hosts: Vec<String>,
}

// ============================================================================
// Config command
// ============================================================================

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current settings
    Show,

    /// Set a value
    Set {
        /// Setting key (cadir, ca_name, autosign, ca_ttl_days, cert_ttl_days, server_name)
        key: String,
        /// Value to set
        value: String,
    },

    /// Show the settings file path
    Path,
}
