use super::{compression::compress::compress_gzip_data, error::OrchardError};
use crate::{output::local::output::local_output, structs::toml::Output};
use log::error;

/**
 * Write artifact bytes to the output directory. Compresses first if the TOML asks for it.
 * Returns the filename that was written
 */
pub(crate) fn final_output(
    artifact_data: &[u8],
    output: &Output,
    output_name: &str,
) -> Result<String, OrchardError> {
    let data = if output.compress {
        match compress_gzip_data(artifact_data) {
            Ok(result) => result,
            Err(err) => {
                error!("[core] Failed to compress data: {err:?}");
                return Err(OrchardError::Compress);
            }
        }
    } else {
        artifact_data.to_vec()
    };

    let local_result = local_output(&data, output, output_name, &output.format);
    match local_result {
        Ok(filename) => Ok(filename),
        Err(err) => {
            error!("[core] Failed to output to local system: {err:?}");
            Err(OrchardError::Local)
        }
    }
}
