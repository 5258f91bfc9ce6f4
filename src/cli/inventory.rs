//! Inventory commands
//!
//! `info`, `show`, `ls`, `sync`, `pull-inventory` and `show-mirror`.

use clap::Args;

use crate::display::{format_record_details, format_record_list, format_size, format_summary_list};
use crate::error::{StashError, StashResult};
use crate::inventory::InventoryQuery;
use crate::models::Tier;
use crate::services::{InventoryService, Stash};

/// Arguments for `show`
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Backup name or stored-name prefix
    pub query: Option<String>,

    /// Only show backups on this tier
    #[arg(short = 'd', long = "destination")]
    pub tier: Option<Tier>,

    /// Only show backups carrying all of these tags
    #[arg(short, long, value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Print full details of each backup
    #[arg(short, long)]
    pub long: bool,

    /// Only show backups stored under the active credentials
    #[arg(long)]
    pub mine: bool,
}

/// Handle `info`
pub fn handle_info(stash: &Stash, name: Option<&str>) -> StashResult<()> {
    let service = InventoryService::new(stash);

    match name {
        Some(name) => {
            let summary = service
                .info(name)?
                .ok_or_else(|| StashError::backup_not_found(name))?;
            println!("Name:           {}", summary.name);
            println!(
                "Latest backup:  {} UTC",
                summary.latest.created_at.format("%Y-%m-%d %H:%M:%S")
            );
            println!("Latest stored:  {}", summary.latest.stored_name);
            println!("Versions:       {}", summary.versions);
            println!(
                "Total size:     {}",
                format_size(summary.total_size)
            );
        }
        None => println!("{}", format_summary_list(&service.summaries()?)),
    }
    Ok(())
}

/// Handle `show`
pub fn handle_show(stash: &Stash, args: ShowArgs) -> StashResult<()> {
    let mut query = InventoryQuery::new().tier(args.tier).tags(args.tags);
    if let Some(name) = args.query {
        query = query.name(name);
    }

    let mut records = InventoryService::new(stash).show(&query)?;
    if args.mine {
        let credentials = stash.profile().credentials();
        records.retain(|record| {
            let container = stash.backends().for_tier(record.tier);
            record.backend_hash == credentials.backend_hash(container.container())
        });
    }
    if args.long && !records.is_empty() {
        for record in &records {
            println!("{}", format_record_details(record));
        }
    } else {
        println!("{}", format_record_list(&records));
    }
    Ok(())
}

/// Handle `ls`
pub fn handle_ls(stash: &Stash, tier: Option<Tier>) -> StashResult<()> {
    let resolved = stash.profile().tier_or_default(tier);
    let ids = InventoryService::new(stash).list_backend(tier)?;

    if ids.is_empty() {
        println!("The {} tier is empty.", resolved);
        return Ok(());
    }
    for id in &ids {
        println!("{}", id);
    }
    Ok(())
}

/// Handle `sync`
pub fn handle_sync(stash: &Stash) -> StashResult<()> {
    stash.inventory().sync_mirror()?;
    println!(
        "Inventory ({} backups) pushed to {}",
        stash.inventory().list()?.len(),
        stash.inventory().mirror_key()
    );
    Ok(())
}

/// Handle `pull-inventory`
pub fn handle_pull_inventory(stash: &Stash) -> StashResult<()> {
    let count = stash.inventory().restore_from_mirror()?;
    println!(
        "Restored {} backup record(s) from {}",
        count,
        stash.inventory().mirror_key()
    );
    Ok(())
}

/// Handle `show-mirror`
pub fn handle_show_mirror(stash: &Stash) -> StashResult<()> {
    let snapshot = stash.inventory().fetch_mirror()?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
