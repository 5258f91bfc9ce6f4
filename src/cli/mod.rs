//! CLI command handlers
//!
//! Bridges the clap argument structs with the service layer.

pub mod backup;
pub mod configure;
pub mod expire;
pub mod export;
pub mod inventory;

pub use backup::{handle_backup, handle_restore, BackupArgs, KeyArgs, RestoreArgs};
pub use configure::{handle_config, handle_configure, handle_configure_rotation, ConfigureArgs, RotationArgs};
pub use expire::{handle_delete, handle_delete_older_than, handle_rotate};
pub use export::{handle_export, ExportArgs, ExportFormat};
pub use inventory::{
    handle_info, handle_ls, handle_pull_inventory, handle_show, handle_show_mirror, handle_sync,
    ShowArgs,
};
