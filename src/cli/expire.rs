//! Expiry commands: `delete`, `delete-older-than` and `rotate`

use std::io::{self, Write};

use chrono::Utc;

use crate::display::format_rotation_plan;
use crate::error::StashResult;
use crate::services::{ExpireService, Stash};

/// Handle `delete`
pub fn handle_delete(stash: &Stash, stored_name: &str, force: bool) -> StashResult<()> {
    let record = stash.inventory().get(stored_name)?;
    if !force && !confirm(&format!("Delete {} from the {} tier?", record.stored_name, record.tier))? {
        println!("Aborted.");
        return Ok(());
    }

    ExpireService::new(stash).expire(&record, "delete")?;
    println!("Deleted {}", record.stored_name);
    Ok(())
}

/// Handle `delete-older-than`
pub fn handle_delete_older_than(stash: &Stash, name: &str, interval: &str) -> StashResult<()> {
    let deleted = ExpireService::new(stash).delete_older_than(name, interval, Utc::now())?;

    if deleted.is_empty() {
        println!("No backups of '{}' older than {}.", name, interval);
        return Ok(());
    }
    for record in &deleted {
        println!("Deleted {}", record.stored_name);
    }
    println!("{} backup(s) deleted.", deleted.len());
    Ok(())
}

/// Handle `rotate`
pub fn handle_rotate(stash: &Stash, name: &str, dry_run: bool) -> StashResult<()> {
    let plan = ExpireService::new(stash).rotate(name, Utc::now(), dry_run)?;

    println!("{}", format_rotation_plan(&plan));
    if dry_run && !plan.is_noop() {
        println!("Dry run: nothing was deleted.");
    }
    Ok(())
}

fn confirm(question: &str) -> StashResult<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
