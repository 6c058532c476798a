pub(crate) mod error;
pub(crate) mod json;
pub(crate) mod jsonl;

use common::ios::BackupMetadata;
use serde_json::{json, Value};

/// Result of a single artifact run, stored in the output metadata
pub(crate) struct ArtifactStatus {
    pub(crate) start_time: u64,
    pub(crate) success: bool,
    pub(crate) message: String,
}

/// Build the metadata envelope shared by every output format
pub(crate) fn envelope(
    output_name: &str,
    uuid: &str,
    status: &ArtifactStatus,
    device: &BackupMetadata,
    complete_time: u64,
) -> Value {
    json![{
        "metadata": {
            "uuid": uuid,
            "artifact_name": output_name,
            "start_time": status.start_time,
            "complete_time": complete_time,
            "success": status.success,
            "message": status.message,
            "device_name": device.device_name,
            "unique_identifier": device.unique_device_id,
            "product_version": device.product_version,
        }
    }]
}
