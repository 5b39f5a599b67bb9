//! Word list export helpers shared by every client.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::models::{Vocabulary, Word};

/// Export output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

/// Serializable word representation used in JSON exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportWord {
    pub id: String,
    pub word: String,
    pub option: String,
    pub meaning: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Serializable deck with its live words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportVocabulary {
    pub id: String,
    pub name: String,
    pub nationality: String,
    pub words: Vec<ExportWord>,
}

#[must_use]
pub fn word_to_export_item(word: &Word) -> ExportWord {
    ExportWord {
        id: word.id.to_string(),
        word: word.word.clone(),
        option: word.option.clone(),
        meaning: word.meaning.clone(),
        created_at: word.created_at,
        updated_at: word.updated_at,
    }
}

/// Render words as CSV with a `word,option,meaning` header.
///
/// Soft-deleted words are skipped. Senses are joined with commas and the
/// meaning cell is quoted when there is more than one.
#[must_use]
pub fn render_csv_export(words: &[Word]) -> String {
    let mut output = String::from("word,option,meaning\n");

    for word in words.iter().filter(|word| !word.is_deleted()) {
        let meaning = word.meaning.join(",");
        let meaning = if word.meaning.len() > 1 {
            quote(&meaning)
        } else {
            csv_cell(&meaning)
        };
        let _ = writeln!(
            output,
            "{},{},{meaning}",
            csv_cell(&word.word),
            csv_cell(&word.option)
        );
    }

    output
}

/// Render a deck and its live words as pretty-printed JSON.
pub fn render_json_export(vocabulary: &Vocabulary, words: &[Word]) -> serde_json::Result<String> {
    let export = ExportVocabulary {
        id: vocabulary.id.to_string(),
        name: vocabulary.name.clone(),
        nationality: vocabulary.nationality.code().to_string(),
        words: words
            .iter()
            .filter(|word| !word.is_deleted())
            .map(word_to_export_item)
            .collect(),
    };
    serde_json::to_string_pretty(&export)
}

/// Render a deck based on selected export format.
pub fn render_words_export(
    vocabulary: &Vocabulary,
    words: &[Word],
    format: ExportFormat,
) -> serde_json::Result<String> {
    match format {
        ExportFormat::Csv => Ok(render_csv_export(words)),
        ExportFormat::Json => render_json_export(vocabulary, words),
    }
}

/// Build a default file name for export flows.
#[must_use]
pub fn suggested_export_file_name(vocabulary: &Vocabulary, format: ExportFormat) -> String {
    let stem: String = vocabulary
        .name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    let stem = stem.trim_matches('-');
    let stem = if stem.is_empty() { "vocabulary" } else { stem };
    format!("{stem}.{}", format.extension())
}

fn csv_cell(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        quote(value)
    } else {
        value.to_string()
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Nationality;
    use pretty_assertions::assert_eq;

    fn sample_words(vocabulary: &Vocabulary) -> Vec<Word> {
        let single = Word::new(vocabulary.id, "chat", vec!["cat".into()], "n.m.");
        let multi = Word::new(
            vocabulary.id,
            "voler",
            vec!["to fly".into(), "to steal".into()],
            "",
        );
        let mut deleted = Word::new(vocabulary.id, "oublié", vec!["forgotten".into()], "");
        deleted.deleted_at = Some(1);
        vec![single, multi, deleted]
    }

    #[test]
    fn csv_quotes_multi_sense_meanings_and_skips_deleted() {
        let vocabulary = Vocabulary::new("French", Nationality::French);
        let csv = render_csv_export(&sample_words(&vocabulary));

        assert_eq!(
            csv,
            "word,option,meaning\nchat,n.m.,cat\nvoler,,\"to fly,to steal\"\n"
        );
    }

    #[test]
    fn csv_escapes_embedded_quotes() {
        let vocabulary = Vocabulary::new("English", Nationality::English);
        let word = Word::new(vocabulary.id, "say \"hi\"", vec!["greet".into()], "");
        let csv = render_csv_export(&[word]);
        assert!(csv.ends_with("\"say \"\"hi\"\"\",,greet\n"));
    }

    #[test]
    fn json_export_contains_live_words_only() {
        let vocabulary = Vocabulary::new("French", Nationality::French);
        let json = render_json_export(&vocabulary, &sample_words(&vocabulary)).unwrap();
        let parsed: ExportVocabulary = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.nationality, "FR");
        assert_eq!(parsed.words.len(), 2);
        assert_eq!(parsed.words[1].meaning, vec!["to fly", "to steal"]);
    }

    #[test]
    fn suggested_file_name_is_filesystem_friendly() {
        let vocabulary = Vocabulary::new("My words / 2024", Nationality::Korean);
        assert_eq!(
            suggested_export_file_name(&vocabulary, ExportFormat::Csv),
            "My-words---2024.csv"
        );
    }
}
