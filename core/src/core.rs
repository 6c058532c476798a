use crate::{
    artifacts::{
        collection::{collect, collection},
        error::CollectionError,
    },
    error::TomlError,
    filesystem::files::read_file,
    structs::toml::{Artifacts, Backup, OrchardToml, Output},
    utils::logging::create_log_file,
};
use log::{error, info};
use simplelog::{Config, WriteLogger};
use std::path::Path;

/// Parse a TOML file at provided path
pub fn parse_toml_file(path: &str) -> Result<(), TomlError> {
    let buffer_results = read_file(Path::new(path));
    let buffer = match buffer_results {
        Ok(results) => results,
        Err(_) => {
            return Err(TomlError::NoFile);
        }
    };

    parse_toml_data(&buffer)
}

/// Parse an already read TOML file
pub fn parse_toml_data(data: &[u8]) -> Result<(), TomlError> {
    let collector = match OrchardToml::parse_orchard_toml(data) {
        Ok(results) => results,
        Err(_) => {
            return Err(TomlError::BadToml);
        }
    };
    toml_data(&collector, data)
}

/// Run a collection built in code instead of parsed from TOML
pub fn analyze(backup: &Backup, output: &Output, artifacts: &[Artifacts]) -> Result<(), TomlError> {
    let mut output = output.clone();
    output.format = output.format.to_lowercase();
    let collector = OrchardToml {
        output,
        backup: backup.clone(),
        artifacts: artifacts.to_vec(),
    };
    setup_logging(&collector.output);

    match collect(&collector) {
        Ok(_) => {
            info!("[core] Core analyzed backup {}", collector.backup.path);
            Ok(())
        }
        Err(err) => {
            error!("[core] Core failed to analyze backup: {err:?}");
            Err(collection_error(err))
        }
    }
}

/// Install the log file then run the collection described by the TOML data
fn toml_data(collector: &OrchardToml, toml_data: &[u8]) -> Result<(), TomlError> {
    setup_logging(&collector.output);

    let result = collection(toml_data);
    match result {
        Ok(_) => info!("[core] Core parsed iOS TOML data"),
        Err(err) => {
            error!("[core] Core failed to parse iOS TOML data: {err:?}");
            return Err(collection_error(err));
        }
    }
    Ok(())
}

fn setup_logging(output: &Output) {
    if let Ok((log_file, level)) = create_log_file(output) {
        let _ = WriteLogger::init(level, Config::default(), log_file);
    }
}

fn collection_error(err: CollectionError) -> TomlError {
    match err {
        CollectionError::Backup => TomlError::BadBackup,
        _ => TomlError::BadToml,
    }
}
