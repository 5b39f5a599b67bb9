use voca_core::Nationality;

use crate::commands::common::{
    format_vocabulary_lines, normalize_name, open_service, resolve_vocabulary,
    vocabulary_to_list_item, VocabularyListItem,
};
use crate::error::CliError;
use crate::settings::CliSettings;

pub async fn run_list(as_json: bool, settings: &CliSettings) -> Result<(), CliError> {
    let service = open_service(settings).await?;
    let vocabularies = service.fetch_vocabulary_list().await?;
    let groups = service.groups()?;

    if as_json {
        let json_items = vocabularies
            .iter()
            .map(|vocabulary| vocabulary_to_list_item(vocabulary, &groups))
            .collect::<Vec<VocabularyListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if vocabularies.is_empty() {
        println!("No vocabularies yet. Create one with `voca add <name> --lang <language>`.");
        return Ok(());
    }

    for line in format_vocabulary_lines(&vocabularies, &groups) {
        println!("{line}");
    }
    Ok(())
}

pub async fn run_add(
    name_parts: &[String],
    nationality: Nationality,
    settings: &CliSettings,
) -> Result<(), CliError> {
    let name = normalize_name(name_parts)?;
    let service = open_service(settings).await?;
    let vocabulary = service.create_vocabulary(&name, nationality).await?;
    println!("{}", vocabulary.id);
    Ok(())
}

pub async fn run_pin(id: &str, settings: &CliSettings) -> Result<(), CliError> {
    let service = open_service(settings).await?;
    let vocabulary = resolve_vocabulary(id, &service).await?;
    let vocabulary = service.toggle_pinned(&vocabulary.id).await?;

    let state = if vocabulary.is_pinned { "pinned" } else { "unpinned" };
    println!("{} {state}", vocabulary.id);
    Ok(())
}

pub async fn run_delete(id: &str, settings: &CliSettings) -> Result<(), CliError> {
    let service = open_service(settings).await?;
    let vocabulary = resolve_vocabulary(id, &service).await?;
    service.delete_vocabulary(&vocabulary.id).await?;
    println!("{}", vocabulary.id);
    Ok(())
}
