use chrono::Utc;
use serde::Serialize;
use voca_core::channel::{FileKeyValueStore, Group, GroupIndex};
use voca_core::models::SyncConflict;
use voca_core::util::format_timestamp;
use voca_core::{Vocabulary, VocabularyId, VocabularyService, Word, WordId};

use crate::error::CliError;
use crate::remote::CliRemote;
use crate::settings::CliSettings;

pub type CliService = VocabularyService<CliRemote, FileKeyValueStore>;

const SHORT_ID_LEN: usize = 13;
const MAX_PREFIX_MATCHES: usize = 3;

#[derive(Debug, Serialize)]
pub struct VocabularyListItem {
    pub id: String,
    pub name: String,
    pub nationality: String,
    pub is_pinned: bool,
    pub group: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub relative_time: String,
}

#[derive(Debug, Serialize)]
pub struct WordListItem {
    pub id: String,
    pub word: String,
    pub option: String,
    pub meaning: Vec<String>,
    pub updated_at: i64,
}

#[derive(Debug, Serialize)]
pub struct SyncConflictItem {
    pub id: i64,
    pub record_kind: String,
    pub record_id: String,
    pub local_updated_at: i64,
    pub remote_modified_at: i64,
    pub winner: String,
    pub resolved_at: i64,
    pub resolved_at_iso: String,
}

pub async fn open_service(settings: &CliSettings) -> Result<CliService, CliError> {
    for path in [&settings.db_path, &settings.groups_path] {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let remote = CliRemote::from_config(&settings.config.remote)?;
    tracing::debug!(
        db = %settings.db_path.display(),
        remote = remote.is_enabled(),
        "Opening vocabulary store"
    );
    let store = FileKeyValueStore::open(settings.groups_path.clone())?;
    let service = VocabularyService::open_path(settings.db_path.clone(), remote, store)
        .await?
        .with_propagation(settings.config.propagation)
        .with_sync_settings(settings.config.sync);
    Ok(service)
}

pub fn normalize_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyIdentifier)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn normalize_name(parts: &[String]) -> Result<String, CliError> {
    let name = parts.join(" ");
    let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        Err(CliError::EmptyName)
    } else {
        Ok(name)
    }
}

/// Trim the word and its senses, dropping blank senses.
pub fn normalize_word_input(
    word: &str,
    meanings: &[String],
) -> Result<(String, Vec<String>), CliError> {
    let word = word.trim();
    if word.is_empty() {
        return Err(CliError::EmptyWord);
    }

    let meanings = meanings
        .iter()
        .map(|meaning| meaning.trim())
        .filter(|meaning| !meaning.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();
    if meanings.is_empty() {
        return Err(CliError::EmptyMeaning);
    }

    Ok((word.to_string(), meanings))
}

/// Find a live deck by full id or unique id prefix.
pub async fn resolve_vocabulary(query: &str, service: &CliService) -> Result<Vocabulary, CliError> {
    let query = normalize_identifier(query)?;
    if let Ok(id) = query.parse::<VocabularyId>() {
        if let Ok(vocabulary) = service.get_vocabulary(&id).await {
            return Ok(vocabulary);
        }
    }

    let vocabularies = service.fetch_vocabulary_list().await?;
    pick_by_prefix(&query, vocabularies, |vocabulary| vocabulary.id.to_string())
        .map_err(|error| error.unwrap_or_else(|| CliError::VocabularyNotFound(query.clone())))
}

/// Find a live word by full id or unique id prefix across every deck.
pub async fn resolve_word(query: &str, service: &CliService) -> Result<Word, CliError> {
    let query = normalize_identifier(query)?;
    let exact = query.parse::<WordId>().ok();

    let mut words = Vec::new();
    for vocabulary in service.fetch_vocabulary_list().await? {
        let deck_words = service.fetch_word_list(&vocabulary.id).await?;
        if let Some(word) = exact.and_then(|id| deck_words.iter().find(|word| word.id == id)) {
            return Ok(word.clone());
        }
        words.extend(deck_words);
    }

    pick_by_prefix(&query, words, |word| word.id.to_string())
        .map_err(|error| error.unwrap_or_else(|| CliError::WordNotFound(query.clone())))
}

/// Returns `Err(None)` when nothing matched so callers can name the record.
fn pick_by_prefix<T>(
    query: &str,
    candidates: Vec<T>,
    id_of: impl Fn(&T) -> String,
) -> Result<T, Option<CliError>> {
    let mut matches = candidates
        .into_iter()
        .filter(|candidate| id_of(candidate).starts_with(query))
        .take(MAX_PREFIX_MATCHES)
        .collect::<Vec<_>>();

    match matches.len() {
        0 => Err(None),
        1 => Ok(matches.remove(0)),
        _ => {
            let options = matches
                .iter()
                .map(|candidate| short_id(&id_of(candidate)))
                .collect::<Vec<_>>()
                .join(", ");
            Err(Some(CliError::AmbiguousId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            ))))
        }
    }
}

pub fn short_id(id: &str) -> String {
    id.chars().take(SHORT_ID_LEN).collect()
}

pub fn format_vocabulary_lines(vocabularies: &[Vocabulary], groups: &GroupIndex) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    vocabularies
        .iter()
        .map(|vocabulary| {
            let short_id = short_id(&vocabulary.id.to_string());
            let pin = if vocabulary.is_pinned { "*" } else { " " };
            let relative_time = format_relative_time(vocabulary.updated_at, now_ms);
            let group = groups
                .group_of(&vocabulary.id.to_string())
                .map_or("-", Group::label);
            format!(
                "{short_id:<13}  {pin} {:<30}  {}  {group:<8}  {relative_time}",
                truncate(&vocabulary.name, 30),
                vocabulary.nationality
            )
        })
        .collect()
}

pub fn vocabulary_to_list_item(vocabulary: &Vocabulary, groups: &GroupIndex) -> VocabularyListItem {
    let now_ms = Utc::now().timestamp_millis();
    VocabularyListItem {
        id: vocabulary.id.to_string(),
        name: vocabulary.name.clone(),
        nationality: vocabulary.nationality.code().to_string(),
        is_pinned: vocabulary.is_pinned,
        group: groups
            .group_of(&vocabulary.id.to_string())
            .map(|group| group.label().to_string()),
        created_at: vocabulary.created_at,
        updated_at: vocabulary.updated_at,
        relative_time: format_relative_time(vocabulary.updated_at, now_ms),
    }
}

pub fn format_word_lines(words: &[Word]) -> Vec<String> {
    words
        .iter()
        .map(|word| {
            let short_id = short_id(&word.id.to_string());
            let meaning = word.meaning.join("; ");
            if word.option.is_empty() {
                format!("{short_id:<13}  {:<24}  {meaning}", truncate(&word.word, 24))
            } else {
                format!(
                    "{short_id:<13}  {:<24}  {meaning}  ({})",
                    truncate(&word.word, 24),
                    word.option
                )
            }
        })
        .collect()
}

pub fn word_to_list_item(word: &Word) -> WordListItem {
    WordListItem {
        id: word.id.to_string(),
        word: word.word.clone(),
        option: word.option.clone(),
        meaning: word.meaning.clone(),
        updated_at: word.updated_at,
    }
}

pub fn sync_conflict_to_item(conflict: &SyncConflict) -> SyncConflictItem {
    SyncConflictItem {
        id: conflict.id,
        record_kind: conflict.record_kind.to_string(),
        record_id: conflict.record_id.clone(),
        local_updated_at: conflict.local_updated_at,
        remote_modified_at: conflict.remote_modified_at,
        winner: conflict.winner.as_str().to_string(),
        resolved_at: conflict.resolved_at,
        resolved_at_iso: format_timestamp(conflict.resolved_at),
    }
}

pub fn format_sync_conflict_lines(conflicts: &[SyncConflict]) -> Vec<String> {
    conflicts
        .iter()
        .map(|conflict| {
            format!(
                "{}  {:<6}  {}={}  local={} remote={}",
                format_sync_timestamp(conflict.resolved_at),
                conflict.winner.as_str(),
                conflict.record_kind,
                conflict.record_id,
                conflict.local_updated_at,
                conflict.remote_modified_at
            )
        })
        .collect()
}

pub fn format_sync_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        value.to_string()
    } else {
        let mut truncated = value
            .chars()
            .take(max_chars.saturating_sub(3))
            .collect::<String>();
        truncated.push_str("...");
        truncated
    }
}
