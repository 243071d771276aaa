use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use pkbzone::args::RestoreMode;
use pkbzone::config::Settings;
use pkbzone::export::{export_snapshot, export_zone};
use pkbzone::parser::read_zone;
use pkbzone::provider::DnsProvider;
use pkbzone::reconcile::{Outcome, Reconciler, Target};
use pkbzone::snapshot::read_snapshot;

#[derive(Parser)]
#[command(name = "pkbzone", version)]
#[command(about = "Export and restore Porkbun DNS records as JSON snapshots or zone files")]
struct Cli {
    /// API key used for Porkbun API calls (usually starts with "pk")
    #[arg(short, long, env = "PKB_API_KEY", hide_env_values = true)]
    key: Option<String>,

    /// API secret used for Porkbun API calls (usually starts with "sk")
    #[arg(short, long, env = "PKB_API_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// API endpoint
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// TOML file with api_key, secret_api_key, endpoint and backup_dir
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory for backups written when an import fails (default: .)
    #[arg(long, value_name = "DIR")]
    backup_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check the credentials and print the public IP seen by the API
    Ping,
    /// Print all DNS records of a domain
    DnsRetrieve { domain: String },
    /// Save all DNS records to a JSON snapshot
    DnsExport { domain: String, filename: PathBuf },
    /// Save all DNS records to a zone file
    DnsExportBind { domain: String, filename: PathBuf },
    /// Restore DNS records from a JSON snapshot
    DnsImport {
        domain: String,
        filename: PathBuf,
        #[arg(value_enum)]
        restore_mode: RestoreMode,
    },
    /// Restore DNS records from a zone file; the domain is its $ORIGIN
    DnsImportBind {
        filename: PathBuf,
        #[arg(value_enum)]
        restore_mode: RestoreMode,
    },
    /// Parse a zone file offline and print it normalized
    ZoneCheck { filename: PathBuf },
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn settings(cli: &Cli) -> Result<Settings> {
    let flags = Settings {
        api_key: cli.key.clone(),
        secret_api_key: cli.secret.clone(),
        endpoint: cli.endpoint.clone(),
        backup_dir: cli.backup_dir.clone(),
    };
    let file = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    Ok(flags.or(file))
}

fn restore(settings: &Settings, target: &Target, mode: RestoreMode) -> Result<()> {
    let client = settings.client()?;
    let outcome = Reconciler::new(&client)
        .with_backup_dir(settings.backup_dir())
        .run(target, mode)?;

    match outcome {
        Outcome::Applied(changes) => {
            println!(
                "import completed: {} created, {} updated, {} deleted{}",
                changes.created,
                changes.updated,
                changes.deleted,
                if changes.name_servers_set {
                    ", name servers set"
                } else {
                    ""
                }
            );
            Ok(())
        }
        Outcome::Failed {
            error,
            backup,
            changes,
        } => match backup {
            Ok(path) => bail!(
                "import failed after {} change(s): {error}; existing records were saved to {}",
                changes.created + changes.updated + changes.deleted,
                path.display()
            ),
            Err(backup_error) => bail!(
                "import failed after {} change(s): {error}; the backup of existing records could not be written: {backup_error}",
                changes.created + changes.updated + changes.deleted
            ),
        },
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);
    let settings = settings(&cli)?;

    match &cli.command {
        Command::Ping => {
            let ip = settings.client()?.ping()?;
            println!("{ip}");
        }
        Command::DnsRetrieve { domain } => {
            let records = settings.client()?.list_records(domain)?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Command::DnsExport { domain, filename } => {
            export_snapshot(&settings.client()?, domain, filename)
                .with_context(|| format!("exporting {domain} to {}", filename.display()))?;
        }
        Command::DnsExportBind { domain, filename } => {
            export_zone(&settings.client()?, domain, filename)
                .with_context(|| format!("exporting {domain} to {}", filename.display()))?;
        }
        Command::DnsImport {
            domain,
            filename,
            restore_mode,
        } => {
            let snapshot = read_snapshot(filename)
                .with_context(|| format!("reading {}", filename.display()))?;
            restore(
                &settings,
                &Target::from_snapshot(domain, &snapshot),
                *restore_mode,
            )?;
        }
        Command::DnsImportBind {
            filename,
            restore_mode,
        } => {
            let zone =
                read_zone(filename).with_context(|| format!("reading {}", filename.display()))?;
            restore(&settings, &Target::from_zone(&zone), *restore_mode)?;
        }
        Command::ZoneCheck { filename } => {
            let zone =
                read_zone(filename).with_context(|| format!("reading {}", filename.display()))?;
            print!("{zone}");
        }
    }

    Ok(())
}
