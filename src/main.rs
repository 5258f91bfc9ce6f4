use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use coldstash::cli::{
    handle_backup, handle_config, handle_configure, handle_configure_rotation, handle_delete,
    handle_delete_older_than, handle_export, handle_info, handle_ls, handle_pull_inventory,
    handle_restore, handle_rotate, handle_show, handle_show_mirror, handle_sync, BackupArgs,
    ConfigureArgs, ExportArgs, RestoreArgs, RotationArgs, ShowArgs,
};
use coldstash::config::settings::DEFAULT_PROFILE;
use coldstash::config::StashPaths;
use coldstash::models::Tier;
use coldstash::services::Stash;

#[derive(Parser)]
#[command(
    name = "coldstash",
    author = "Kaylee Beyene",
    version,
    about = "Compress, encrypt and upload backups to tiered storage",
    long_about = "coldstash packs a file or directory into a gzip tarball, optionally \
                  encrypts it, and uploads it to a fast object store or a cold vault. \
                  Every backup is recorded in an inventory mirrored to the fast tier, \
                  and old backups can be expired by age or grandfather-father-son rotation."
)]
struct Cli {
    /// Profile to use
    #[arg(short, long, global = true, default_value = DEFAULT_PROFILE)]
    profile: String,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store credentials and store locations for a profile
    Configure(ConfigureArgs),

    /// Store the rotation policy for a profile
    ConfigureRotation(RotationArgs),

    /// Archive and upload a file or directory
    Backup(BackupArgs),

    /// Restore the latest (or an exact) backup
    Restore(RestoreArgs),

    /// Delete one backup by stored name
    #[command(alias = "rm")]
    Delete {
        stored_name: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Delete backups of a name older than an interval (e.g. 30D, 3M, 1Y)
    DeleteOlderThan { name: String, interval: String },

    /// Apply the rotation policy to a backup name
    Rotate {
        name: String,
        /// Show what would be kept and expired without deleting
        #[arg(long)]
        dry_run: bool,
    },

    /// Latest backup and version count, per name
    Info { name: Option<String> },

    /// Show inventory records
    Show(ShowArgs),

    /// List raw ids stored in a tier
    Ls {
        #[arg(short = 'd', long = "destination")]
        tier: Option<Tier>,
    },

    /// Push the inventory to its mirror
    Sync,

    /// Replace the local inventory with the mirrored copy
    PullInventory,

    /// Print the mirrored inventory
    ShowMirror,

    /// Export the inventory to a file
    Export(ExportArgs),

    /// Show current configuration and paths
    Config,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn open(paths: StashPaths, profile: &str) -> Result<Stash> {
    Ok(Stash::open(paths, profile)?)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let paths = StashPaths::new()?;
    let profile = cli.profile.as_str();

    match cli.command {
        Commands::Configure(args) => handle_configure(&paths, profile, args)?,
        Commands::ConfigureRotation(args) => handle_configure_rotation(&paths, profile, args)?,
        Commands::Config => handle_config(&paths, profile)?,
        Commands::Backup(args) => handle_backup(&open(paths, profile)?, args)?,
        Commands::Restore(args) => handle_restore(&open(paths, profile)?, args)?,
        Commands::Delete { stored_name, force } => {
            handle_delete(&open(paths, profile)?, &stored_name, force)?
        }
        Commands::DeleteOlderThan { name, interval } => {
            handle_delete_older_than(&open(paths, profile)?, &name, &interval)?
        }
        Commands::Rotate { name, dry_run } => handle_rotate(&open(paths, profile)?, &name, dry_run)?,
        Commands::Info { name } => handle_info(&open(paths, profile)?, name.as_deref())?,
        Commands::Show(args) => handle_show(&open(paths, profile)?, args)?,
        Commands::Ls { tier } => handle_ls(&open(paths, profile)?, tier)?,
        Commands::Sync => handle_sync(&open(paths, profile)?)?,
        Commands::PullInventory => handle_pull_inventory(&open(paths, profile)?)?,
        Commands::ShowMirror => handle_show_mirror(&open(paths, profile)?)?,
        Commands::Export(args) => handle_export(&open(paths, profile)?, args)?,
    }

    Ok(())
}
