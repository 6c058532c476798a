use super::error::LocalError;
use crate::structs::toml::Output;
use log::error;
use std::{
    fs::{create_dir_all, OpenOptions},
    io::Write,
};

/// Output to local directory provided by TOML input. Returns the filename written
pub(crate) fn local_output(
    data: &[u8],
    output: &Output,
    output_name: &str,
    extension: &str,
) -> Result<String, LocalError> {
    let output_path = format!("{}/{}", output.directory, output.name);

    let result = create_dir_all(&output_path);
    match result {
        Ok(_) => {}
        Err(err) => {
            error!("[core] Failed to create output directory for {output_path}. Error: {err:?}");
            return Err(LocalError::CreateDirectory);
        }
    }

    let file_extension = if output.compress {
        format!("{extension}.gz")
    } else {
        extension.to_string()
    };
    let filename = format!("{output_name}.{file_extension}");

    let json_file_result = OpenOptions::new()
        .append(true)
        .create(true)
        .open(format!("{output_path}/{filename}"));

    let mut json_file = match json_file_result {
        Ok(results) => results,
        Err(err) => {
            error!("[core] Failed to create output file {filename} at {output_path}. Error: {err:?}");
            return Err(LocalError::OpenFile);
        }
    };

    let write_result = json_file.write_all(data);
    match write_result {
        Ok(_) => {}
        Err(err) => {
            error!("[core] Failed to write output to file {filename} at {output_path}. Error: {err:?}");
            return Err(LocalError::WriteData);
        }
    }
    Ok(filename)
}

#[cfg(test)]
mod tests {
    use crate::{output::local::output::local_output, structs::toml::Output};

    fn output_options(directory: &str, compress: bool) -> Output {
        Output {
            name: String::from("test_output"),
            directory: directory.to_string(),
            format: String::from("json"),
            compress,
            logging: None,
        }
    }

    #[test]
    fn test_output_json() {
        let dir = tempfile::tempdir().unwrap();
        let output = output_options(&dir.path().display().to_string(), false);

        let test = "A rust program";
        let name = local_output(test.as_bytes(), &output, "output", &output.format).unwrap();
        assert_eq!(name, "output.json");
        let data = std::fs::read_to_string(dir.path().join("test_output/output.json")).unwrap();
        assert_eq!(data, test);
    }

    #[test]
    fn test_output_json_compress_name() {
        let dir = tempfile::tempdir().unwrap();
        let output = output_options(&dir.path().display().to_string(), true);

        let name = local_output(b"data", &output, "output", "jsonl").unwrap();
        assert_eq!(name, "output.jsonl.gz");
    }
}
