use crate::commands::common::{
    format_sync_conflict_lines, open_service, sync_conflict_to_item, SyncConflictItem,
};
use crate::error::CliError;
use crate::settings::CliSettings;

pub async fn run_sync(settings: &CliSettings) -> Result<(), CliError> {
    let service = open_service(settings).await?;
    if !service.remote().is_enabled() {
        return Err(CliError::SyncNotConfigured);
    }

    let report = service.sync().await?;
    let stats = report.stats;
    println!(
        "Sync completed: {} vocabularies, {} changes ({} pulled, {} pushed, {} removed)",
        report.vocabularies.len(),
        stats.changes(),
        stats.materialized + stats.replaced + stats.words_materialized + stats.words_replaced,
        stats.pushed + stats.words_pushed,
        stats.purged
            + stats.words_purged
            + stats.deleted_remotely
            + stats.words_deleted_remotely,
    );
    if stats.push_failures > 0 {
        println!(
            "{} remote writes failed and will be retried on the next sync",
            stats.push_failures
        );
    }
    Ok(())
}

pub async fn run_sync_conflicts(
    limit: usize,
    as_json: bool,
    settings: &CliSettings,
) -> Result<(), CliError> {
    let service = open_service(settings).await?;
    let conflicts = service.list_conflicts(limit).await?;

    if as_json {
        let json_items = conflicts
            .iter()
            .map(sync_conflict_to_item)
            .collect::<Vec<SyncConflictItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if conflicts.is_empty() {
        println!("No sync conflicts recorded.");
        return Ok(());
    }

    for line in format_sync_conflict_lines(&conflicts) {
        println!("{line}");
    }
    Ok(())
}
