use super::{error::OrchardError, uuid::generate_uuid};
use crate::structs::toml::Output;
use log::{error, LevelFilter};
use std::{
    fs::{create_dir_all, File, OpenOptions},
    io::Write,
};

/// Create log output file and logging level based on TOML `Output` configuration
pub(crate) fn create_log_file(output: &Output) -> Result<(File, LevelFilter), OrchardError> {
    let path = format!("{}/{}", output.directory, output.name);
    let result = create_dir_all(&path);
    match result {
        Ok(_) => {}
        Err(err) => {
            error!("[core] Failed to create logging output directory for {path}. Error: {err:?}");
            return Err(OrchardError::CreateDirectory);
        }
    }

    let output_result = File::create(format!("{path}/{}.log", generate_uuid()));
    let log_file = match output_result {
        Ok(result) => result,
        Err(err) => {
            error!("[core] Failed to create log file at {path}. Error: {err:?}");
            return Err(OrchardError::LogFile);
        }
    };

    Ok((log_file, log_level(&output.logging)))
}

/// Map the configured level name to a filter. Defaults to `warn`
pub(crate) fn log_level(logging: &Option<String>) -> LevelFilter {
    if let Some(log_level) = logging {
        match log_level.to_lowercase().as_str() {
            "warn" => LevelFilter::Warn,
            "error" => LevelFilter::Error,
            "info" => LevelFilter::Info,
            "debug" => LevelFilter::Debug,
            _ => LevelFilter::Warn,
        }
    } else {
        LevelFilter::Warn
    }
}

/// Create and update a simple `status.log` file to track our output data
pub(crate) fn collection_status(
    artifact_name: &str,
    output: &Output,
    filename: &str,
) -> Result<(), OrchardError> {
    let path = format!("{}/{}", output.directory, output.name);
    let result = create_dir_all(&path);
    match result {
        Ok(_) => {}
        Err(err) => {
            error!("[core] Failed to create status output directory for {path}. Error: {err:?}");
            return Err(OrchardError::CreateDirectory);
        }
    }

    let status_log = format!("{path}/status.log");
    let status_result = OpenOptions::new().append(true).create(true).open(status_log);

    let mut status = match status_result {
        Ok(result) => result,
        Err(err) => {
            error!("[core] Failed to open or create status.log at {path}. Error: {err:?}");
            return Err(OrchardError::LogFile);
        }
    };

    /*
     * Maps artifact names to the uuid filename
     * Ex: sms:c639679b-40ec-4aca-9ed1-dc740c38731c.json
     */
    let status_message = format!("{artifact_name}:{filename}\n");
    let write_result = status.write_all(status_message.as_bytes());
    if let Err(err) = write_result {
        error!("[core] Failed to update status.log at {path}. Error: {err:?}");
    }
    Ok(())
}
