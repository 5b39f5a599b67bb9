use std::collections::BTreeMap;

use voca_core::channel::{Group, GroupIndex};

use crate::commands::common::{open_service, short_id};
use crate::error::CliError;
use crate::settings::CliSettings;

pub async fn run_groups(as_json: bool, settings: &CliSettings) -> Result<(), CliError> {
    let service = open_service(settings).await?;
    let groups = service.reload_groups()?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&groups_to_map(&groups))?);
    } else {
        for line in format_group_lines(&groups) {
            println!("{line}");
        }
    }
    Ok(())
}

pub async fn run_reindex(settings: &CliSettings) -> Result<(), CliError> {
    let service = open_service(settings).await?;
    let groups = service.reindex_groups().await?;
    println!("Reindexed {} vocabularies", groups.len());
    Ok(())
}

pub fn groups_to_map(groups: &GroupIndex) -> BTreeMap<&'static str, Vec<String>> {
    Group::ALL
        .into_iter()
        .map(|group| (group.label(), groups.ids(group).to_vec()))
        .collect()
}

pub fn format_group_lines(groups: &GroupIndex) -> Vec<String> {
    Group::ALL
        .into_iter()
        .map(|group| {
            let ids = groups
                .ids(group)
                .iter()
                .map(|id| short_id(id))
                .collect::<Vec<_>>();
            if ids.is_empty() {
                format!("{:<9} -", group.label())
            } else {
                format!("{:<9} {}", group.label(), ids.join(" "))
            }
        })
        .collect()
}
