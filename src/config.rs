use serde::Deserialize;

/// API credentials loaded from a local JSON config file.
///
/// Loaded once at startup and passed into each collaborator at
/// construction; there is no process-wide credential cache.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// API key for the YouTube Data API (comment fetching)
    pub youtube_api_key: String,
    /// API key for the chat-completion service (comment labeling)
    pub deepseek_api_key: String,
}

impl Config {
    /// Load credentials from a JSON file, failing fast if unreadable
    pub fn load_from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path, e))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path, e))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_keys() {
        let json = r#"{"youtube_api_key": "yt-key", "deepseek_api_key": "ds-key"}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.youtube_api_key, "yt-key");
        assert_eq!(config.deepseek_api_key, "ds-key");
    }

    #[test]
    fn missing_key_is_an_error() {
        let json = r#"{"youtube_api_key": "yt-key"}"#;
        assert!(serde_json::from_str::<Config>(json).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Config::load_from_file("/nonexistent/config.json").is_err());
    }
}
