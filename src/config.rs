use json::JsonValue;

use crate::error::IngestError;

/// Options that control how strictly a mesh file is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestConfig {
    /// Treat rows beyond the declared counts as an error instead of a warning
    pub strict_counts: bool,
    /// Reject elements that reference nodes past the end of the node list
    pub validate_connectivity: bool,
    /// Draw a progress bar while reading rows
    pub show_progress: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        IngestConfig {
            strict_counts: true,
            validate_connectivity: false,
            show_progress: false,
        }
    }
}

/// Loads ingestion options from a json file
///
/// # Arguments
/// * `config_file` - The path to the json file
///
/// # Returns
/// An IngestConfig, with defaults for every key the file leaves out
pub fn load_config(config_file: &str) -> Result<IngestConfig, IngestError> {
    let file_string = match std::fs::read_to_string(config_file) {
        Ok(f) => f,
        Err(err) => {
            return Err(IngestError::io(
                format!("unable to open config file {}", config_file),
                err,
            ))
        }
    };

    parse_config(&file_string)
}

/// Parses ingestion options from json text
///
/// # Arguments
/// * `contents` - The json document. Options live under an `ingest` object.
pub fn parse_config(contents: &str) -> Result<IngestConfig, IngestError> {
    let config_json = match json::parse(contents) {
        Ok(j) => j,
        Err(err) => return Err(IngestError::Config(format!("Error in config json: {err}"))),
    };

    if !config_json.has_key("ingest") {
        return Err(IngestError::Config(
            "Config json missing ingest field".to_owned(),
        ));
    }
    let section = &config_json["ingest"];
    if !section.is_object() {
        return Err(IngestError::Config(
            "ingest field must be an object".to_owned(),
        ));
    }

    let defaults = IngestConfig::default();

    Ok(IngestConfig {
        strict_counts: read_flag(section, "strict_counts", defaults.strict_counts)?,
        validate_connectivity: read_flag(
            section,
            "validate_connectivity",
            defaults.validate_connectivity,
        )?,
        show_progress: read_flag(section, "show_progress", defaults.show_progress)?,
    })
}

fn read_flag(section: &JsonValue, key: &str, default: bool) -> Result<bool, IngestError> {
    if !section.has_key(key) {
        return Ok(default);
    }

    match section[key].as_bool() {
        Some(b) => Ok(b),
        None => Err(IngestError::Config(format!(
            "Bad value for {key}: expected true or false"
        ))),
    }
}
