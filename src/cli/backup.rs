//! Backup and restore commands

use std::path::PathBuf;

use chrono::Utc;
use clap::Args;

use crate::crypto::ArchiveKey;
use crate::display::{format_job, format_size};
use crate::error::{StashError, StashResult};
use crate::models::Tier;
use crate::services::{BackupRequest, BackupService, JobCheck, RestoreOutcome, RestoreService, Stash};

/// Archive key options shared by `backup` and `restore`
#[derive(Args, Debug, Default)]
pub struct KeyArgs {
    /// Encrypt or decrypt with a passphrase (prompted unless COLDSTASH_PASSWORD is set)
    #[arg(short = 'k', long)]
    pub password: bool,

    #[arg(long, env = "COLDSTASH_PASSWORD", hide = true, hide_env_values = true)]
    pub passphrase: Option<String>,

    /// Base64-encoded 256-bit key
    #[arg(long, env = "COLDSTASH_KEY", hide_env_values = true)]
    pub key: Option<String>,
}

impl KeyArgs {
    /// Resolve the archive key, prompting when `--password` is given without
    /// a passphrase in the environment. `confirm` asks twice.
    pub fn resolve(self, confirm: bool) -> StashResult<Option<ArchiveKey>> {
        if let Some(encoded) = self.key {
            return ArchiveKey::from_base64(&encoded).map(Some);
        }
        if let Some(passphrase) = self.passphrase {
            return ArchiveKey::passphrase(passphrase).map(Some);
        }
        if !self.password {
            return Ok(None);
        }

        let passphrase = prompt_passphrase("Passphrase: ")?;
        if confirm && prompt_passphrase("Confirm passphrase: ")? != passphrase {
            return Err(StashError::Validation("passphrases do not match".into()));
        }
        ArchiveKey::passphrase(passphrase).map(Some)
    }
}

/// Arguments for `backup`
#[derive(Args, Debug)]
pub struct BackupArgs {
    /// File or directory to back up (a .tar.gz/.tgz is uploaded as-is)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Logical backup name; defaults to the last path component
    #[arg(short, long)]
    pub name: Option<String>,

    /// Tier to upload to (fast or cold)
    #[arg(short = 'd', long = "destination")]
    pub tier: Option<Tier>,

    /// Comma-separated tags
    #[arg(short, long, value_delimiter = ',')]
    pub tags: Vec<String>,

    #[command(flatten)]
    pub key: KeyArgs,
}

/// Arguments for `restore`
#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Backup name (restores the latest) or exact stored name
    pub name: String,

    /// Directory to restore into
    #[arg(long, default_value = ".")]
    pub dest: PathBuf,

    /// Only restore from this tier
    #[arg(short = 'd', long = "destination")]
    pub tier: Option<Tier>,

    /// Report the cold-tier retrieval job without restoring
    #[arg(long)]
    pub job_check: bool,

    /// Block until a cold-tier retrieval job is ready
    #[arg(short, long)]
    pub wait: bool,

    #[command(flatten)]
    pub key: KeyArgs,
}

/// Handle `backup`
pub fn handle_backup(stash: &Stash, args: BackupArgs) -> StashResult<()> {
    let key = args.key.resolve(true)?;
    // `.` has no file name to derive a backup name from
    let source = args.path.canonicalize().unwrap_or(args.path);
    let request = BackupRequest {
        source,
        name: args.name,
        tier: args.tier,
        key,
        tags: args.tags,
        created_at: None,
    };

    let record = BackupService::new(stash).backup(request)?;

    println!(
        "Backed up '{}' as {} ({}, {})",
        record.name,
        record.stored_name,
        record.tier,
        format_size(record.size)
    );
    println!("Fingerprint: {}", record.fingerprint);
    if stash.inventory().is_mirror_pending()? {
        println!("Warning: inventory mirror is out of date; run `coldstash sync`.");
    }
    Ok(())
}

/// Handle `restore`
pub fn handle_restore(stash: &Stash, args: RestoreArgs) -> StashResult<()> {
    let service = RestoreService::new(stash);

    if args.job_check {
        let (record, check) = service.job_check(&args.name, args.tier)?;
        let now = Utc::now();
        match check {
            JobCheck::NotNeeded => println!(
                "{} is on the {} tier; no retrieval job needed.",
                record.stored_name, record.tier
            ),
            JobCheck::NoJob => println!("No retrieval job for {}.", record.stored_name),
            JobCheck::Pending(job) | JobCheck::Ready(job) => println!("{}", format_job(&job, now)),
        }
        return Ok(());
    }

    let record = service.resolve(&args.name, args.tier)?;
    let key = if record.encrypted {
        let mut key_args = args.key;
        if key_args.key.is_none() && key_args.passphrase.is_none() {
            key_args.password = true;
        }
        key_args.resolve(false)?
    } else {
        None
    };

    match service.restore(&record.stored_name, args.tier, &args.dest, key.as_ref(), args.wait)? {
        RestoreOutcome::Restored { record, paths } => {
            println!(
                "Restored {} into {}",
                record.stored_name,
                args.dest.display()
            );
            for path in paths {
                println!("  {}", path.display());
            }
        }
        RestoreOutcome::Pending { record, job } => {
            println!(
                "{} is in cold storage; retrieval started.",
                record.stored_name
            );
            println!("{}", format_job(&job, Utc::now()));
            println!("Run the restore again later, or pass --wait to block.");
        }
    }
    Ok(())
}

fn prompt_passphrase(prompt: &str) -> StashResult<String> {
    rpassword::prompt_password(prompt)
        .map_err(|e| StashError::Encryption(format!("Failed to read passphrase: {}", e)))
}
