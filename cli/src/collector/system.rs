use clap::Subcommand;
use orchard_core::{
    core::analyze,
    structs::toml::{Artifacts, Backup, Output},
};

/// Every artifact a collection can run
pub(crate) const ALL_ARTIFACTS: [&str; 22] = [
    "device_info",
    "backup_files",
    "contacts",
    "calendar",
    "call_history",
    "call_recents",
    "sms",
    "kakaotalk",
    "line",
    "instagram_account",
    "instagram_direct",
    "instagram_following",
    "notes",
    "safari_history",
    "safari_bookmarks",
    "safari_thumbnails",
    "chrome_sessions",
    "wifi",
    "bluetooth",
    "accounts",
    "subscriber",
    "installed_apps",
];

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Analyze a backup directory without a TOML file
    Analyze {
        /// Path to the unencrypted backup directory
        #[arg(long)]
        backup: String,
        /// Artifact to parse. Repeat for more. Defaults to every artifact
        #[arg(long)]
        artifact: Vec<String>,
        /// Case-insensitive filter for artifacts that support searching
        #[arg(long, default_value = None)]
        query: Option<String>,
        /// Output format. JSON or JSONL
        #[arg(long, default_value_t = String::from("JSON"))]
        format: String,
        /// Optional output directory for storing results
        #[arg(long, default_value_t = String::from("./tmp"))]
        output_dir: String,
        /// GZIP Compress results
        #[arg(long)]
        compress: bool,
    },
}

/// Run the collector against a backup and parse specified artifacts
pub(crate) fn run_collector(command: &Commands) {
    match command {
        Commands::Analyze {
            backup,
            artifact,
            query,
            format,
            output_dir,
            compress,
        } => {
            let output = Output {
                name: String::from("local_collector"),
                directory: output_dir.to_string(),
                format: format.to_lowercase(),
                compress: *compress,
                logging: Some(String::from("warn")),
            };
            let artifacts = setup_artifacts(artifact, query);
            println!("[orchard] Writing output to: {}", output.directory);

            let backup = Backup {
                path: backup.to_string(),
            };
            if let Err(err) = analyze(&backup, &output, &artifacts) {
                println!("[orchard] Failed to analyze backup: {err:?}");
            }
        }
    }
}

/// Build the artifact list. No names means every artifact
fn setup_artifacts(names: &[String], query: &Option<String>) -> Vec<Artifacts> {
    let selected: Vec<String> = if names.is_empty() {
        ALL_ARTIFACTS.iter().map(|name| name.to_string()).collect()
    } else {
        names.to_vec()
    };
    selected
        .into_iter()
        .map(|artifact_name| Artifacts {
            artifact_name,
            query: query.clone(),
            calendar: None,
        })
        .collect()
}
