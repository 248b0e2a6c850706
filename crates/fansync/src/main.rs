//! fansync - move a built fan-curve-app binary between machines via
//! removable media, verify it, and install it over the active copy.

use clap::{CommandFactory, Parser, Subcommand};
use fansync_bundle::BundleName;
use fansync_common::{Error, Result};
use fansync_sync::Installed;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "fansync")]
#[command(
    author,
    version,
    about = "Export, transport and install the fan-curve-app binary"
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Package the built binary into a new bundle on a destination root
    Export {
        /// Destination root, e.g. a mounted USB drive
        dest_root: PathBuf,

        /// Binary to export
        #[arg(default_value = fansync_bundle::DEFAULT_SOURCE_BINARY)]
        binary: PathBuf,

        /// Bundle name prefix
        #[arg(long, default_value = fansync_bundle::DEFAULT_PREFIX)]
        prefix: String,
    },

    /// Install from a bundle root, a bundle directory, or a raw file
    Install {
        /// Bundle root (latest bundle wins), bundle directory, or binary file
        path: PathBuf,

        /// Install location of the active binary
        #[arg(long, default_value = fansync_bundle::DEFAULT_INSTALL_PATH)]
        target: PathBuf,

        /// Bundle name prefix
        #[arg(long, default_value = fansync_bundle::DEFAULT_PREFIX)]
        prefix: String,
    },
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version are not failures; everything else (unknown
            // mode, missing operand) exits 1, not clap's default 2.
            let code = match e.kind() {
                clap::error::ErrorKind::DisplayHelp
                | clap::error::ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    let Some(command) = cli.command else {
        let _ = Cli::command().print_help();
        std::process::exit(0);
    };

    if let Err(e) = run(command, cli.format) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(command: Commands, format: OutputFormat) -> Result<()> {
    match command {
        Commands::Export {
            dest_root,
            binary,
            prefix,
        } => {
            let exported = fansync_sync::export(&dest_root, &binary, &prefix)?;
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&exported)?);
            } else {
                println!("{}", exported.bundle_dir.display());
            }
        }

        Commands::Install {
            path,
            target,
            prefix,
        } => {
            let installed = if path.is_dir() {
                let bundle_dir = resolve_bundle_dir(&path, &prefix)?;
                fansync_sync::install_from_bundle(&bundle_dir, &target)?
            } else if path.is_file() {
                fansync_sync::install_from_file(&path, &target)?
            } else {
                return Err(Error::PathNotFound(path));
            };
            report_install(&installed, format)?;
        }
    }

    Ok(())
}

/// A directory whose own name is a bundle name is installed directly; any
/// other directory is a root and resolves to its latest bundle.
fn resolve_bundle_dir(path: &Path, prefix: &str) -> Result<PathBuf> {
    let is_bundle = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| BundleName::parse(n, prefix).is_ok());
    if is_bundle {
        Ok(path.to_path_buf())
    } else {
        info!("resolving latest bundle under {}", path.display());
        fansync_sync::locate_latest(path, prefix)
    }
}

fn report_install(installed: &Installed, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(installed)?);
        return Ok(());
    }
    println!("installed: {}", installed.installed_path.display());
    if let Some(backup) = &installed.backup_path {
        println!("backup: {}", backup.display());
    }
    println!("sha256: {}", installed.sha256);
    println!("verified: {}", if installed.verified { "yes" } else { "no" });
    Ok(())
}
