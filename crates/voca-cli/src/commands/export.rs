use std::path::Path;

use crate::cli::ExportFormat;
use crate::commands::common::{open_service, resolve_vocabulary};
use crate::error::CliError;
use crate::settings::CliSettings;

pub async fn run_export(
    deck: &str,
    format: ExportFormat,
    output_path: Option<&Path>,
    settings: &CliSettings,
) -> Result<(), CliError> {
    let service = open_service(settings).await?;
    let vocabulary = resolve_vocabulary(deck, &service).await?;
    let rendered = service.export_words(&vocabulary.id, format.into()).await?;

    if let Some(path) = output_path {
        std::fs::write(path, rendered)?;
        println!("{}", path.display());
    } else {
        print!("{rendered}");
    }

    Ok(())
}
