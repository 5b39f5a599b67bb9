use clap::Parser;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use voca_core::channel::Group;
use voca_core::config::VocaConfig;
use voca_core::models::{ConflictWinner, RecordKind, SyncConflict};
use voca_core::Nationality;

use crate::cli::{Cli, Commands, CompletionShell, ExportFormat, Language, SyncCommands};
use crate::commands::common::{
    format_relative_time, format_sync_timestamp, normalize_identifier, normalize_name,
    normalize_word_input, open_service, resolve_vocabulary, resolve_word, short_id,
    sync_conflict_to_item, truncate,
};
use crate::commands::completions::render_completions;
use crate::commands::export::run_export;
use crate::commands::groups::{format_group_lines, groups_to_map, run_reindex};
use crate::commands::sync::run_sync;
use crate::commands::vocabulary::{run_add, run_delete, run_pin};
use crate::commands::words::{run_add_word, run_delete_word, run_edit_word};
use crate::error::CliError;
use crate::settings::CliSettings;

fn test_settings(dir: &TempDir) -> CliSettings {
    CliSettings {
        db_path: dir.path().join("data").join("voca.db"),
        groups_path: dir.path().join("data").join("groups.json"),
        config: VocaConfig::default(),
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}

#[test]
fn normalize_name_collapses_whitespace() {
    assert_eq!(
        normalize_name(&strings(&["  Basic ", "French  words"])).unwrap(),
        "Basic French words"
    );
    assert!(matches!(
        normalize_name(&strings(&["   "])),
        Err(CliError::EmptyName)
    ));
}

#[test]
fn normalize_word_input_drops_blank_meanings() {
    let (word, meanings) =
        normalize_word_input(" voler ", &strings(&["to fly", "  ", " to steal "])).unwrap();
    assert_eq!(word, "voler");
    assert_eq!(meanings, vec!["to fly", "to steal"]);

    assert!(matches!(
        normalize_word_input("voler", &strings(&[" "])),
        Err(CliError::EmptyMeaning)
    ));
    assert!(matches!(
        normalize_word_input(" ", &strings(&["x"])),
        Err(CliError::EmptyWord)
    ));
}

#[test]
fn normalize_identifier_rejects_blank() {
    assert_eq!(normalize_identifier(" abc ").unwrap(), "abc");
    assert!(matches!(
        normalize_identifier("  "),
        Err(CliError::EmptyIdentifier)
    ));
}

#[test]
fn short_id_and_truncate_limit_width() {
    assert_eq!(short_id("0192f0c1-aaaa-7bbb-8ccc-dddddddddddd"), "0192f0c1-aaaa");
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("a rather long deck name", 10), "a rathe...");
}

#[test]
fn format_relative_time_buckets() {
    let now = 1_700_000_000_000;
    assert_eq!(format_relative_time(now - 10_000, now), "just now");
    assert_eq!(format_relative_time(now - 5 * 60_000, now), "5m ago");
    assert_eq!(format_relative_time(now - 3 * 3_600_000, now), "3h ago");
    assert_eq!(format_relative_time(now - 2 * 86_400_000, now), "2d ago");
}

#[test]
fn format_sync_timestamp_renders_utc() {
    assert_eq!(
        format_sync_timestamp(1_704_067_200_000),
        "2024-01-01 00:00:00 UTC"
    );
}

#[test]
fn conflict_item_carries_rfc3339_time() {
    let conflict = SyncConflict {
        id: 7,
        record_kind: RecordKind::Vocabulary,
        record_id: "0192f0c1-aaaa-7bbb-8ccc-dddddddddddd".to_string(),
        local_updated_at: 1_000,
        remote_modified_at: 2_000,
        winner: ConflictWinner::Remote,
        resolved_at: 1_704_067_200_000,
    };

    let item = sync_conflict_to_item(&conflict);
    assert_eq!(item.resolved_at_iso, "2024-01-01T00:00:00+00:00");
    assert_eq!(item.winner, "remote");
}

#[test]
fn cli_parses_language_aliases() {
    let cli = Cli::try_parse_from(["voca", "add", "Basic", "French", "--lang", "fr"]).unwrap();
    match cli.command {
        Some(Commands::Add { name, lang }) => {
            assert_eq!(name, strings(&["Basic", "French"]));
            assert_eq!(lang, Language::French);
            assert_eq!(Nationality::from(lang), Nationality::French);
        }
        _ => panic!("expected add command"),
    }
}

#[test]
fn cli_add_word_requires_a_meaning() {
    assert!(Cli::try_parse_from(["voca", "add-word", "0192", "chat"]).is_err());

    let cli = Cli::try_parse_from([
        "voca", "add-word", "0192", "voler", "-m", "to fly", "-m", "to steal",
    ])
    .unwrap();
    match cli.command {
        Some(Commands::AddWord {
            meanings, option, ..
        }) => {
            assert_eq!(meanings, strings(&["to fly", "to steal"]));
            assert_eq!(option, "");
        }
        _ => panic!("expected add-word command"),
    }
}

#[test]
fn cli_parses_sync_conflicts() {
    let cli = Cli::try_parse_from(["voca", "sync", "conflicts", "--limit", "3", "--json"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Sync {
            command: Some(SyncCommands::Conflicts {
                limit: 3,
                json: true
            })
        })
    ));
}

#[test]
fn completions_mention_binary_name() {
    let script = String::from_utf8(render_completions(CompletionShell::Bash)).unwrap();
    assert!(script.contains("voca"));
}

#[tokio::test(flavor = "multi_thread")]
async fn add_creates_deck_in_language_group() {
    let dir = tempfile::tempdir().unwrap();
    let settings = test_settings(&dir);

    run_add(&strings(&["Basic", "French"]), Nationality::French, &settings)
        .await
        .unwrap();

    let service = open_service(&settings).await.unwrap();
    let decks = service.fetch_vocabulary_list().await.unwrap();
    assert_eq!(decks.len(), 1);
    assert_eq!(decks[0].name, "Basic French");
    assert_eq!(
        service.groups().unwrap().group_of(&decks[0].id.to_string()),
        Some(Group::French)
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn pin_by_prefix_moves_deck_to_pinned_group() {
    let dir = tempfile::tempdir().unwrap();
    let settings = test_settings(&dir);
    run_add(&strings(&["Hangul"]), Nationality::Korean, &settings)
        .await
        .unwrap();

    let id = {
        let service = open_service(&settings).await.unwrap();
        service.fetch_vocabulary_list().await.unwrap()[0].id
    };
    run_pin(&short_id(&id.to_string()), &settings).await.unwrap();

    let service = open_service(&settings).await.unwrap();
    let deck = service.get_vocabulary(&id).await.unwrap();
    assert!(deck.is_pinned);
    let groups = service.groups().unwrap();
    assert_eq!(groups.groups_of(&id.to_string()), vec![Group::Pinned]);
    assert_eq!(groups_to_map(&groups)["pinned"], vec![id.to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn ambiguous_and_unknown_prefixes_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let settings = test_settings(&dir);
    run_add(&strings(&["One"]), Nationality::English, &settings)
        .await
        .unwrap();
    run_add(&strings(&["Two"]), Nationality::English, &settings)
        .await
        .unwrap();

    let service = open_service(&settings).await.unwrap();
    let decks = service.fetch_vocabulary_list().await.unwrap();
    let shared_prefix = decks[0].id.to_string()[..4].to_string();

    assert!(matches!(
        resolve_vocabulary(&shared_prefix, &service).await,
        Err(CliError::AmbiguousId(_))
    ));
    assert!(matches!(
        resolve_vocabulary("zzzz", &service).await,
        Err(CliError::VocabularyNotFound(_))
    ));

    let full = resolve_vocabulary(&decks[1].id.to_string(), &service)
        .await
        .unwrap();
    assert_eq!(full.id, decks[1].id);
}

#[tokio::test(flavor = "multi_thread")]
async fn word_commands_add_edit_and_delete() {
    let dir = tempfile::tempdir().unwrap();
    let settings = test_settings(&dir);
    run_add(&strings(&["Verbs"]), Nationality::French, &settings)
        .await
        .unwrap();

    let deck_id = {
        let service = open_service(&settings).await.unwrap();
        service.fetch_vocabulary_list().await.unwrap()[0].id
    };
    run_add_word(
        &deck_id.to_string(),
        "voler",
        &strings(&["to fly"]),
        "v.",
        &settings,
    )
    .await
    .unwrap();

    let word_id = {
        let service = open_service(&settings).await.unwrap();
        let words = service.fetch_word_list(&deck_id).await.unwrap();
        assert_eq!(words.len(), 1);
        words[0].id
    };

    run_edit_word(
        &short_id(&word_id.to_string()),
        "voler",
        &strings(&["to fly", "to steal"]),
        "v.",
        &settings,
    )
    .await
    .unwrap();
    {
        let service = open_service(&settings).await.unwrap();
        let word = resolve_word(&word_id.to_string(), &service).await.unwrap();
        assert_eq!(word.meaning, vec!["to fly", "to steal"]);
    }

    run_delete_word(&word_id.to_string(), &settings).await.unwrap();
    let service = open_service(&settings).await.unwrap();
    assert!(service.fetch_word_list(&deck_id).await.unwrap().is_empty());
    assert!(matches!(
        resolve_word(&word_id.to_string(), &service).await,
        Err(CliError::WordNotFound(_))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_removes_deck_and_group_entry() {
    let dir = tempfile::tempdir().unwrap();
    let settings = test_settings(&dir);
    run_add(&strings(&["Kana"]), Nationality::Japanese, &settings)
        .await
        .unwrap();

    let id = {
        let service = open_service(&settings).await.unwrap();
        service.fetch_vocabulary_list().await.unwrap()[0].id
    };
    run_delete(&id.to_string(), &settings).await.unwrap();

    let service = open_service(&settings).await.unwrap();
    assert!(service.fetch_vocabulary_list().await.unwrap().is_empty());
    assert_eq!(service.groups().unwrap().group_of(&id.to_string()), None);
}

#[tokio::test(flavor = "multi_thread")]
async fn export_writes_csv_file() {
    let dir = tempfile::tempdir().unwrap();
    let settings = test_settings(&dir);
    run_add(&strings(&["Animals"]), Nationality::French, &settings)
        .await
        .unwrap();

    let deck_id = {
        let service = open_service(&settings).await.unwrap();
        service.fetch_vocabulary_list().await.unwrap()[0].id
    };
    run_add_word(
        &deck_id.to_string(),
        "chat",
        &strings(&["cat"]),
        "n.m.",
        &settings,
    )
    .await
    .unwrap();

    let output = dir.path().join("animals.csv");
    run_export(
        &deck_id.to_string(),
        ExportFormat::Csv,
        Some(&output),
        &settings,
    )
    .await
    .unwrap();

    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "word,option,meaning\nchat,n.m.,cat\n"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn reindex_rebuilds_groups_from_decks() {
    let dir = tempfile::tempdir().unwrap();
    let settings = test_settings(&dir);
    run_add(&strings(&["Kanji"]), Nationality::Japanese, &settings)
        .await
        .unwrap();
    std::fs::remove_file(&settings.groups_path).unwrap();

    run_reindex(&settings).await.unwrap();

    let service = open_service(&settings).await.unwrap();
    let groups = service.groups().unwrap();
    assert_eq!(groups.ids(Group::Japanese).len(), 1);
    let lines = format_group_lines(&groups);
    assert_eq!(lines.len(), Group::ALL.len());
    assert!(lines[0].starts_with("pinned"));
}

#[tokio::test(flavor = "multi_thread")]
async fn sync_requires_remote_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let settings = test_settings(&dir);

    assert!(matches!(
        run_sync(&settings).await,
        Err(CliError::SyncNotConfigured)
    ));
}
