//! Command-line companion for the forms-authentication ticket codec
//!
//! Thin wrapper over the `formsauth` crate: argument parsing, config file
//! handling, and output formatting live here; all ticket-format logic stays
//! in the codec.

mod config;
mod output;

use anyhow::Context;
use clap::{Parser, Subcommand};
use config::MachineKeyConfig;
use formsauth::{decrypt_ticket, encrypt_ticket, KeyMaterial, Ticket};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Cookie name used for the ready-to-paste assignment line
const COOKIE_NAME: &str = ".ASPXAUTH";

#[derive(Parser)]
#[command(name = "tickettool", version)]
#[command(about = "Mint, inspect, and reissue forms-authentication cookie tickets")]
struct Cli {
    /// Machine-key configuration file
    #[arg(long, global = true, default_value = "machine.keys")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decrypt a cookie value and print the ticket
    Decrypt {
        /// Encrypted cookie value (hex wire string)
        cookie: String,

        /// Emit JSON instead of the pretty listing
        #[arg(long)]
        json: bool,

        /// Render timestamps in UTC instead of local time
        #[arg(long)]
        utc: bool,
    },

    /// Reissue an existing cookie under a new name and validity window
    Encrypt {
        /// Existing encrypted cookie value
        existing_cookie: String,

        /// Name for the reissued ticket
        new_user: String,

        /// Opaque user data for the reissued ticket
        user_data: String,

        /// Validity in minutes from now
        minutes_valid: u64,
    },

    /// Mint a fresh ticket
    Create {
        /// Identity name
        username: String,

        /// Opaque user data
        user_data: String,

        /// Validity in minutes from now
        minutes_valid: u64,

        /// Mark the ticket persistent
        #[arg(long)]
        persistent: bool,
    },

    /// Write a machine-key configuration file
    GenConfig {
        /// Hex decryption key (16/24/32 bytes)
        decryption_key: String,

        /// Hex validation key (at least 16 bytes)
        validation_key: String,

        /// Compatibility mode: legacy or modern
        #[arg(long, default_value = "modern")]
        mode: String,

        /// Output file; prints to stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config_path = cli.config;

    match cli.command {
        Command::Decrypt { cookie, json, utc } => cmd_decrypt(&config_path, &cookie, json, utc),
        Command::Encrypt {
            existing_cookie,
            new_user,
            user_data,
            minutes_valid,
        } => cmd_encrypt(
            &config_path,
            &existing_cookie,
            new_user,
            user_data,
            minutes_valid,
        ),
        Command::Create {
            username,
            user_data,
            minutes_valid,
            persistent,
        } => cmd_create(&config_path, username, user_data, minutes_valid, persistent),
        Command::GenConfig {
            decryption_key,
            validation_key,
            mode,
            out,
        } => cmd_gen_config(&decryption_key, &validation_key, &mode, out.as_deref()),
    }
}

fn load_config(path: &Path) -> anyhow::Result<MachineKeyConfig> {
    MachineKeyConfig::from_file(path)
        .with_context(|| format!("loading machine keys from {}", path.display()))
}

fn cmd_decrypt(config_path: &Path, cookie: &str, as_json: bool, as_utc: bool) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let ticket = decrypt_ticket(cookie, &config.keys, config.mode)?;

    if as_json {
        println!("{}", output::ticket_json(&ticket, as_utc));
    } else {
        output::print_pretty(&ticket, as_utc, "Forms-Authentication Ticket");
    }
    Ok(())
}

fn cmd_encrypt(
    config_path: &Path,
    existing_cookie: &str,
    new_user: String,
    user_data: String,
    minutes_valid: u64,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let old = decrypt_ticket(existing_cookie, &config.keys, config.mode)
        .context("cannot decrypt existing cookie")?;

    let ticket = old.reissue(new_user, user_data, Duration::from_secs(minutes_valid * 60));
    let wire = encrypt_ticket(&ticket, &config.keys, config.mode)?;

    print_minted(&wire, &ticket);
    Ok(())
}

fn cmd_create(
    config_path: &Path,
    username: String,
    user_data: String,
    minutes_valid: u64,
    persistent: bool,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let ticket = Ticket::new(
        username,
        user_data,
        persistent,
        Duration::from_secs(minutes_valid * 60),
    );
    let wire = encrypt_ticket(&ticket, &config.keys, config.mode)?;

    print_minted(&wire, &ticket);
    Ok(())
}

fn cmd_gen_config(
    decryption_key: &str,
    validation_key: &str,
    mode: &str,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    // Validate key material before anything lands on disk
    KeyMaterial::from_hex(decryption_key, validation_key)?;
    let mode = config::parse_mode(mode)?;

    let rendered = config::render_config(decryption_key, validation_key, mode);
    match out {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote: {}", path.display());
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

fn print_minted(wire: &str, ticket: &Ticket) {
    println!("{}", wire);
    println!();
    println!("{}={}", COOKIE_NAME, wire);
    println!();
    output::print_pretty(ticket, false, "New Ticket (summary)");
}
