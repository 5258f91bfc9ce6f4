//! Profile configuration commands
//!
//! `configure`, `configure-rotation` and `config`.

use std::io::{self, Write};
use std::path::PathBuf;

use chrono::Weekday;
use clap::Args;

use crate::config::{Profile, Settings, StashPaths};
use crate::error::{StashError, StashResult};
use crate::models::Tier;
use crate::rotation::RotationPolicy;
use crate::storage::Backends;

/// Arguments for `configure`
#[derive(Args, Debug, Default)]
pub struct ConfigureArgs {
    /// Access key for the stores
    #[arg(long)]
    pub access_key: Option<String>,

    /// Secret key for the stores (prompted when omitted)
    #[arg(long, env = "COLDSTASH_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Root directory of the fast-tier bucket
    #[arg(long)]
    pub bucket: Option<PathBuf>,

    /// Root directory of the cold-tier vault
    #[arg(long)]
    pub vault: Option<PathBuf>,

    /// Default tier for backups (fast or cold)
    #[arg(short = 'd', long = "destination")]
    pub default_tier: Option<Tier>,

    #[arg(long)]
    pub region: Option<String>,

    /// Seconds before a cold-tier retrieval is ready
    #[arg(long)]
    pub retrieval_delay: Option<u64>,

    /// gzip level, 0-9
    #[arg(long)]
    pub compression_level: Option<u32>,
}

/// Arguments for `configure-rotation`
#[derive(Args, Debug)]
pub struct RotationArgs {
    /// Daily backups to keep
    #[arg(long, default_value_t = 0)]
    pub days: u32,

    /// Weekly backups to keep
    #[arg(long, default_value_t = 0)]
    pub weeks: u32,

    /// Monthly backups to keep
    #[arg(long, default_value_t = 0)]
    pub months: u32,

    /// Yearly backups to keep
    #[arg(long, default_value_t = 0)]
    pub years: u32,

    /// Day weekly buckets start on
    #[arg(long, default_value = "sat")]
    pub first_week_day: Weekday,
}

/// Create or update a profile
///
/// Values not given as flags come from the existing profile, or are
/// prompted for when the profile is new.
pub fn handle_configure(paths: &StashPaths, profile_name: &str, args: ConfigureArgs) -> StashResult<()> {
    let mut settings = Settings::load_or_create(paths)?;
    let existing = settings.profiles.get(profile_name).cloned();

    let access_key = match (args.access_key, &existing) {
        (Some(key), _) => key,
        (None, Some(profile)) => profile.access_key.clone(),
        (None, None) => prompt_line("Access key: ")?,
    };
    let secret_key = match (args.secret_key, &existing) {
        (Some(key), _) => key,
        (None, Some(profile)) => profile.secret_key.clone(),
        (None, None) => prompt_secret("Secret key: ")?,
    };
    let bucket = match (args.bucket, &existing) {
        (Some(path), _) => path,
        (None, Some(profile)) => profile.bucket.clone(),
        (None, None) => PathBuf::from(prompt_line("Bucket directory: ")?),
    };
    let vault = match (args.vault, &existing) {
        (Some(path), _) => path,
        (None, Some(profile)) => profile.vault.clone(),
        (None, None) => PathBuf::from(prompt_line("Vault directory: ")?),
    };

    let mut profile = match existing {
        Some(mut profile) => {
            profile.access_key = access_key;
            profile.secret_key = secret_key;
            profile.bucket = bucket;
            profile.vault = vault;
            profile
        }
        None => Profile::new(access_key, secret_key, bucket, vault),
    };
    if let Some(tier) = args.default_tier {
        profile.default_tier = tier;
    }
    if let Some(region) = args.region {
        profile.region = region;
    }
    if let Some(delay) = args.retrieval_delay {
        profile.retrieval_delay_secs = delay;
        profile.retrieval_delay()?;
    }
    if let Some(level) = args.compression_level {
        if level > 9 {
            return Err(StashError::Validation(format!(
                "compression level must be 0-9, got {}",
                level
            )));
        }
        profile.compression_level = level;
    }

    // opening the stores checks the credentials before anything is saved
    Backends::open(&profile)?;

    settings.upsert_profile(profile_name, profile);
    settings.save(paths)?;

    println!("Profile '{}' saved to {}", profile_name, paths.settings_file().display());
    Ok(())
}

/// Store the rotation policy of a profile
pub fn handle_configure_rotation(
    paths: &StashPaths,
    profile_name: &str,
    args: RotationArgs,
) -> StashResult<()> {
    let policy = RotationPolicy::new(args.days, args.weeks, args.months, args.years)
        .with_first_week_day(args.first_week_day);
    policy.validate()?;

    let mut settings = Settings::load_or_create(paths)?;
    settings.profile_mut(profile_name)?.rotation = Some(policy.clone());
    settings.save(paths)?;

    println!("Rotation for '{}': keep {}", profile_name, policy);
    Ok(())
}

/// Print paths and the active profile
pub fn handle_config(paths: &StashPaths, profile_name: &str) -> StashResult<()> {
    println!("coldstash Configuration");
    println!("=======================");
    println!();
    println!("Base directory: {}", paths.base_dir().display());
    println!("Settings file:  {}", paths.settings_file().display());
    println!("Audit log:      {}", paths.audit_log().display());
    println!("Inventory:      {}", paths.inventory_file(profile_name).display());
    println!();

    if !paths.is_initialized() {
        println!("Not configured yet. Run `coldstash configure` to get started.");
        return Ok(());
    }

    let settings = Settings::load_or_create(paths)?;
    let names: Vec<&str> = settings.profiles.keys().map(String::as_str).collect();
    println!("Profiles: {}", names.join(", "));

    match settings.profiles.get(profile_name) {
        None => println!("Profile '{}' is not configured.", profile_name),
        Some(profile) => {
            println!();
            println!("[{}]", profile_name);
            println!("  Access key:        {}", profile.access_key);
            println!("  Bucket:            {}", profile.bucket.display());
            println!("  Vault:             {}", profile.vault.display());
            println!("  Default tier:      {}", profile.default_tier);
            println!("  Region:            {}", profile.region);
            println!("  Mirror key:        {}", profile.mirror_key);
            println!("  Retrieval delay:   {}s", profile.retrieval_delay_secs);
            println!("  Compression level: {}", profile.compression_level);
            match &profile.rotation {
                Some(policy) => println!("  Rotation:          {}", policy),
                None => println!("  Rotation:          not configured"),
            }
        }
    }
    Ok(())
}

fn prompt_line(prompt: &str) -> StashResult<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let value = line.trim().to_string();
    if value.is_empty() {
        return Err(StashError::Validation(format!(
            "{} is required",
            prompt.trim_end_matches(": ")
        )));
    }
    Ok(value)
}

fn prompt_secret(prompt: &str) -> StashResult<String> {
    rpassword::prompt_password(prompt)
        .map_err(|e| StashError::Config(format!("Failed to read secret: {}", e)))
}
