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

/// Output to `json` format. One file per artifact
pub(crate) fn json_format(
    serde_data: &Value,
    output_name: &str,
    output: &Output,
    status: &ArtifactStatus,
    device: &BackupMetadata,
) -> Result<(), FormatError> {
    let uuid = generate_uuid();
    let mut collection_output = envelope(output_name, &uuid, status, device, time_now());
    collection_output["data"] = serde_data.clone();

    let serde_collection_results = serde_json::to_vec(&collection_output);
    let serde_collection = match serde_collection_results {
        Ok(results) => results,
        Err(err) => {
            error!("[core] Failed to serialize json output: {err:?}");
            return Err(FormatError::Serialize);
        }
    };

    let output_result = final_output(&serde_collection, output, &uuid);
    let filename = match output_result {
        Ok(result) => {
            info!("[core] {output_name} json output success");
            result
        }
        Err(err) => {
            error!("[core] Failed to output {output_name} json: {err:?}");
            return Err(FormatError::Write);
        }
    };
    let _ = collection_status(output_name, output, &filename);

    Ok(())
}
