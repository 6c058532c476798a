use super::error::OrchardError;
use crate::structs::toml::OrchardToml;
use log::error;
use std::str::from_utf8;

impl OrchardToml {
    /// Parse the Orchard TOML collector file
    pub(crate) fn parse_orchard_toml(toml_data: &[u8]) -> Result<OrchardToml, OrchardError> {
        let toml_results = toml::from_str(from_utf8(toml_data).unwrap_or_default());
        let mut collector: OrchardToml = match toml_results {
            Ok(results) => results,
            Err(err) => {
                error!("[core] Orchard failed to parse TOML data. Error: {err:?}");
                return Err(OrchardError::BadToml);
            }
        };

        // Format is always lowercase
        collector.output.format = collector.output.format.to_lowercase();
        Ok(collector)
    }
}
