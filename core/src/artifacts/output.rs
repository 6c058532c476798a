use crate::{
    artifacts::error::CollectionError,
    output::formats::{json::json_format, jsonl::jsonl_format, ArtifactStatus},
    structs::toml::Output,
};
use common::ios::BackupMetadata;
use log::{error, warn};
use serde::Serialize;
use serde_json::Value;
use std::fmt::{Debug, Display};

/// Output forensic artifacts
pub(crate) fn output_artifact(
    serde_data: &Value,
    output_name: &str,
    output: &Output,
    status: &ArtifactStatus,
    device: &BackupMetadata,
) -> Result<(), CollectionError> {
    let output_status = if output.format == "json" {
        json_format(serde_data, output_name, output, status, device)
    } else if output.format == "jsonl" {
        jsonl_format(serde_data, output_name, output, status, device)
    } else {
        error!("[core] Unknown formatter provided: {}", output.format);
        return Err(CollectionError::Format);
    };
    match output_status {
        Ok(_) => {}
        Err(err) => {
            error!("[core] Could not output data: {err:?}");
            return Err(CollectionError::Output);
        }
    }
    Ok(())
}

/**
 * Serialize a decoder result and write it.
 * A failed decoder still writes an envelope with `success = false` and the error message, then returns `Artifact`
 */
pub(crate) fn output_data<T, E>(
    results: Result<T, E>,
    output_name: &str,
    output: &Output,
    device: &BackupMetadata,
    start_time: u64,
) -> Result<(), CollectionError>
where
    T: Serialize,
    E: Debug + Display,
{
    let data = match results {
        Ok(result) => result,
        Err(err) => {
            warn!("[core] Failed to get {output_name}: {err:?}");
            let status = ArtifactStatus {
                start_time,
                success: false,
                message: err.to_string(),
            };
            output_artifact(&Value::Array(Vec::new()), output_name, output, &status, device)?;
            return Err(CollectionError::Artifact);
        }
    };

    let serde_data = match serde_json::to_value(data) {
        Ok(result) => result,
        Err(err) => {
            error!("[core] Failed to serialize {output_name}: {err:?}");
            return Err(CollectionError::Serialize);
        }
    };
    let status = ArtifactStatus {
        start_time,
        success: true,
        message: String::new(),
    };
    output_artifact(&serde_data, output_name, output, &status, device)
}

#[cfg(test)]
mod tests {
    use super::{output_artifact, output_data};
    use crate::{
        output::formats::ArtifactStatus, structs::toml::Output, utils::time::time_now,
    };
    use common::ios::BackupMetadata;
    use serde_json::Value;
    use std::fs::{read_dir, read_to_string};

    fn output_options(directory: &str, format: &str) -> Output {
        Output {
            name: String::from("output_test"),
            directory: directory.to_string(),
            format: format.to_string(),
            compress: false,
            logging: None,
        }
    }

    fn written_json(directory: &std::path::Path) -> Vec<Value> {
        let mut values = Vec::new();
        for entry in read_dir(directory.join("output_test")).unwrap() {
            let path = entry.unwrap().path();
            if path.extension().unwrap() == "json" {
                values.push(serde_json::from_str(&read_to_string(path).unwrap()).unwrap());
            }
        }
        values
    }

    #[test]
    fn test_output_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let output = output_options(&dir.path().display().to_string(), "json");
        let status = ArtifactStatus {
            start_time: time_now(),
            success: true,
            message: String::new(),
        };

        let data = Value::String(String::from("test"));
        output_artifact(&data, "test", &output, &status, &BackupMetadata::default()).unwrap();
        assert_eq!(written_json(dir.path())[0]["data"], "test");
    }

    #[test]
    #[should_panic(expected = "Format")]
    fn test_unknown_format() {
        let dir = tempfile::tempdir().unwrap();
        let output = output_options(&dir.path().display().to_string(), "csv");
        let status = ArtifactStatus {
            start_time: time_now(),
            success: true,
            message: String::new(),
        };
        output_artifact(&Value::Null, "test", &output, &status, &BackupMetadata::default())
            .unwrap();
    }

    #[test]
    fn test_output_failed_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let output = output_options(&dir.path().display().to_string(), "json");
        let results: Result<Vec<u8>, std::fmt::Error> = Err(std::fmt::Error);

        let status = output_data(results, "line", &output, &BackupMetadata::default(), 1);
        assert!(status.is_err());

        let written = written_json(dir.path());
        assert_eq!(written.len(), 1);
        assert_eq!(written[0]["metadata"]["success"], false);
        assert_eq!(written[0]["metadata"]["artifact_name"], "line");
        assert!(!written[0]["metadata"]["message"].as_str().unwrap().is_empty());
        assert_eq!(written[0]["data"], Value::Array(Vec::new()));
    }
}
