use crate::commands::common::{
    format_word_lines, normalize_word_input, open_service, resolve_vocabulary, resolve_word,
    word_to_list_item, WordListItem,
};
use crate::error::CliError;
use crate::settings::CliSettings;

pub async fn run_words(deck: &str, as_json: bool, settings: &CliSettings) -> Result<(), CliError> {
    let service = open_service(settings).await?;
    let vocabulary = resolve_vocabulary(deck, &service).await?;
    let words = service.fetch_word_list(&vocabulary.id).await?;

    if as_json {
        let json_items = words
            .iter()
            .map(word_to_list_item)
            .collect::<Vec<WordListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if words.is_empty() {
        println!("No words in '{}'.", vocabulary.name);
        return Ok(());
    }

    for line in format_word_lines(&words) {
        println!("{line}");
    }
    Ok(())
}

pub async fn run_add_word(
    deck: &str,
    word: &str,
    meanings: &[String],
    option: &str,
    settings: &CliSettings,
) -> Result<(), CliError> {
    let (word, meanings) = normalize_word_input(word, meanings)?;
    let service = open_service(settings).await?;
    let vocabulary = resolve_vocabulary(deck, &service).await?;
    let word = service
        .add_word(&vocabulary.id, &word, &meanings, option.trim())
        .await?;
    println!("{}", word.id);
    Ok(())
}

pub async fn run_edit_word(
    id: &str,
    word: &str,
    meanings: &[String],
    option: &str,
    settings: &CliSettings,
) -> Result<(), CliError> {
    let (word, meanings) = normalize_word_input(word, meanings)?;
    let service = open_service(settings).await?;
    let existing = resolve_word(id, &service).await?;
    let updated = service
        .update_word(&existing.id, &word, &meanings, option.trim())
        .await?;
    println!("{}", updated.id);
    Ok(())
}

pub async fn run_delete_word(id: &str, settings: &CliSettings) -> Result<(), CliError> {
    let service = open_service(settings).await?;
    let word = resolve_word(id, &service).await?;
    service.delete_word(&word.id).await?;
    println!("{}", word.id);
    Ok(())
}
