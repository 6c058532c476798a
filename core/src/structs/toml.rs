use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct OrchardToml {
    pub output: Output,
    pub backup: Backup,
    pub artifacts: Vec<Artifacts>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Output {
    pub name: String,
    pub directory: String,
    pub format: String,
    pub compress: bool,
    pub logging: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Backup {
    /**Path to the unencrypted iTunes/Finder backup directory */
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Artifacts {
    /**Based on artifact parse one of the artifact types */
    pub artifact_name: String,
    /**Case-insensitive substring filter for artifacts that support searching */
    pub query: Option<String>,
    pub calendar: Option<CalendarOptions>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CalendarOptions {
    /**RFC3339 start of the event window */
    pub start: Option<String>,
    pub end: Option<String>,
}
