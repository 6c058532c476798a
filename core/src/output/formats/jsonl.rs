use super::{envelope, error::FormatError, ArtifactStatus};
use crate::{
    structs::toml::Output,
    utils::{
        logging::collection_status, output::final_output, time::time_now, uuid::generate_uuid,
    },
};
use common::ios::BackupMetadata;
use log::{error, info};
use serde_json::Value;

/// Output to `jsonl` files. Every array element becomes its own line with the metadata attached
pub(crate) fn jsonl_format(
    serde_data: &Value,
    output_name: &str,
    output: &Output,
    status: &ArtifactStatus,
    device: &BackupMetadata,
) -> Result<(), FormatError> {
    let uuid = generate_uuid();
    let complete_time = time_now();
    let mut collection_output = envelope(output_name, &uuid, status, device, complete_time);

    let mut json_lines = Vec::new();
    // If our data is an array loop through each element and output as a separate line
    if let Some(entries) = serde_data.as_array() {
        // If array is empty just output metadata
        if entries.is_empty() {
            json_lines.push(create_line(&mut collection_output, None)?);
        }
        for entry in entries {
            // Each line gets its own uuid
            collection_output["metadata"]["uuid"] = Value::String(generate_uuid());
            json_lines.push(create_line(&mut collection_output, Some(entry))?);
        }
    } else {
        json_lines.push(create_line(&mut collection_output, Some(serde_data))?);
    }

    let output_result = final_output(json_lines.join("").as_bytes(), output, &uuid);
    let filename = match output_result {
        Ok(result) => {
            info!("[core] {output_name} jsonl output success");
            result
        }
        Err(err) => {
            error!("[core] Failed to output {output_name} jsonl: {err:?}");
            return Err(FormatError::Write);
        }
    };
    let _ = collection_status(output_name, output, &filename);

    Ok(())
}

/// Create a single JSON line ending with a new line
fn create_line(base_data: &mut Value, entry: Option<&Value>) -> Result<String, FormatError> {
    match entry {
        Some(value) => base_data["data"] = value.clone(),
        None => {
            if let Some(object) = base_data.as_object_mut() {
                object.remove("data");
            }
        }
    }

    let line_result = serde_json::to_string(base_data);
    match line_result {
        Ok(result) => Ok(format!("{result}\n")),
        Err(err) => {
            error!("[core] Failed to serialize jsonl line: {err:?}");
            Err(FormatError::Serialize)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{create_line, jsonl_format};
    use crate::{
        output::formats::ArtifactStatus, structs::toml::Output, utils::time::time_now,
    };
    use common::ios::BackupMetadata;
    use serde_json::{json, Value};
    use std::fs::{read_dir, read_to_string};

    #[test]
    fn test_jsonl_format() {
        let dir = tempfile::tempdir().unwrap();
        let output = Output {
            name: String::from("jsonl_test"),
            directory: dir.path().display().to_string(),
            format: String::from("jsonl"),
            compress: false,
            logging: None,
        };
        let status = ArtifactStatus {
            start_time: time_now(),
            success: false,
            message: String::from("Database not found"),
        };

        let data = json!([{"ssid": "home"}, {"ssid": "office"}]);
        jsonl_format(&data, "wifi", &output, &status, &BackupMetadata::default()).unwrap();

        let mut lines = Vec::new();
        for entry in read_dir(dir.path().join("jsonl_test")).unwrap() {
            let path = entry.unwrap().path();
            if path.extension().unwrap() == "jsonl" {
                lines = read_to_string(path)
                    .unwrap()
                    .lines()
                    .map(|line| serde_json::from_str::<Value>(line).unwrap())
                    .collect();
            }
        }
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["data"]["ssid"], "office");
        assert_eq!(lines[0]["metadata"]["success"], false);
        assert_ne!(lines[0]["metadata"]["uuid"], lines[1]["metadata"]["uuid"]);
    }

    #[test]
    fn test_create_line_metadata_only() {
        let mut base = json!({"metadata": {"uuid": "a"}, "data": 1});
        let line = create_line(&mut base, None).unwrap();
        assert_eq!(line, "{\"metadata\":{\"uuid\":\"a\"}}\n");
    }
}
