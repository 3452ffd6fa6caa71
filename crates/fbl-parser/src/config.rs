use crate::error::ConfigError;
use crate::field::ArfField;
use ordermap::OrderMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Name of the feed used when no alias rule names a more
/// specific feed section
pub const DEFAULT_FEED: &str = "default";

/// Read-only configuration snapshot for the feedback loop parser
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FblConfig {
    #[serde(default)]
    pub parser: ParserSection,
    #[serde(default)]
    pub feeds: BTreeMap<String, FeedConfig>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ParserSection {
    /// Maps a regex that is matched against the From header of the
    /// outer message to the name of the feed that sent it.
    /// Rules are evaluated in document order and the last match wins.
    #[serde(default)]
    pub aliases: OrderMap<String, String>,

    /// Fields that every report must carry, regardless of feed
    #[serde(default = "ParserSection::default_required_fields")]
    pub required_fields: Vec<ArfField>,
}

impl ParserSection {
    fn default_required_fields() -> Vec<ArfField> {
        vec![ArfField::SourceIp, ArfField::ReceivedDate]
    }
}

impl Default for ParserSection {
    fn default() -> Self {
        Self {
            aliases: OrderMap::new(),
            required_fields: Self::default_required_fields(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FeedConfig {
    #[serde(default = "FeedConfig::default_enabled")]
    pub enabled: bool,
    pub class: String,
    #[serde(rename = "type")]
    pub kind: String,

    /// Additional required fields for this feed only
    #[serde(default)]
    pub fields: Vec<ArfField>,

    /// Report fields to remove before the incident is built
    #[serde(default)]
    pub filters: Vec<String>,
}

impl FeedConfig {
    fn default_enabled() -> bool {
        true
    }
}

impl FblConfig {
    pub fn feed(&self, name: &str) -> Option<&FeedConfig> {
        self.feeds.get(name)
    }

    pub fn from_toml_str(data: &str) -> Result<Self, ConfigError> {
        toml::from_str(data).map_err(|err| ConfigError::Decode {
            file_name: "<string>".to_string(),
            reason: format!("{err:#}"),
        })
    }

    pub fn from_json_str(data: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(data).map_err(|err| ConfigError::Decode {
            file_name: "<string>".to_string(),
            reason: format!("{err:#}"),
        })
    }

    /// Load a snapshot from a `.toml` or `.json` file
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file_name = path.display().to_string();

        let is_toml = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => true,
            Some("json") => false,
            _ => return Err(ConfigError::UnsupportedExtension(file_name)),
        };

        let data = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            file_name: file_name.clone(),
            reason: format!("{err:#}"),
        })?;

        let decoded = if is_toml {
            toml::from_str(&data).map_err(|err| format!("{err:#}"))
        } else {
            serde_json::from_str(&data).map_err(|err| format!("{err:#}"))
        };

        decoded.map_err(|reason| ConfigError::Decode { file_name, reason })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SAMPLE: &str = r#"
[parser]
aliases = { "@arf\\.mail\\.yahoo\\.com" = "Yahoo", "@fbl\\.hotmail\\.com" = "Microsoft", "@feedback\\.aol\\.com" = "AOL" }

[feeds.default]
class = "SPAM"
type = "Abuse"

[feeds.Yahoo]
class = "SPAM"
type = "Abuse"
fields = ["Reported-Domain"]
filters = ["Original-Rcpt-To"]

[feeds.AOL]
enabled = false
class = "SPAM"
type = "Info"
"#;

    #[test]
    fn toml_snapshot() {
        let config = FblConfig::from_toml_str(SAMPLE).unwrap();

        let aliases: Vec<(&str, &str)> = config
            .parser
            .aliases
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        k9::assert_equal!(
            aliases,
            vec![
                ("@arf\\.mail\\.yahoo\\.com", "Yahoo"),
                ("@fbl\\.hotmail\\.com", "Microsoft"),
                ("@feedback\\.aol\\.com", "AOL"),
            ]
        );
        k9::assert_equal!(
            config.parser.required_fields,
            vec![ArfField::SourceIp, ArfField::ReceivedDate]
        );

        let yahoo = config.feed("Yahoo").unwrap();
        assert!(yahoo.enabled);
        k9::assert_equal!(yahoo.kind, "Abuse");
        k9::assert_equal!(yahoo.fields, vec![ArfField::ReportedDomain]);
        k9::assert_equal!(yahoo.filters, vec!["Original-Rcpt-To".to_string()]);

        assert!(!config.feed("AOL").unwrap().enabled);
        assert!(config.feed("Microsoft").is_none());
    }

    #[test]
    fn json_matches_toml() {
        let config = FblConfig::from_json_str(
            r#"{
                "parser": {"aliases": {"b": "B", "a": "A"}, "required_fields": ["Source-IP"]},
                "feeds": {"A": {"class": "SPAM", "type": "Abuse", "enabled": false}}
            }"#,
        )
        .unwrap();
        let keys: Vec<&String> = config.parser.aliases.keys().collect();
        k9::assert_equal!(keys, vec!["b", "a"]);
        k9::assert_equal!(config.parser.required_fields, vec![ArfField::SourceIp]);
        assert!(!config.feed("A").unwrap().enabled);
    }

    #[test]
    fn rejects_unknown_required_field() {
        let err = FblConfig::from_toml_str(
            r#"
[parser]
required_fields = ["Source-Ip"]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Decode { .. }), "{err:#}");
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(FblConfig::from_toml_str("[feeds.x]\nclass='a'\ntype='b'\ncolour='red'\n").is_err());
    }

    #[test]
    fn load_file_extension() {
        // The extension is checked before the file is read
        let err = FblConfig::load_file("/nonexistent/fbl.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedExtension(_)), "{err:#}");

        let err = FblConfig::load_file("/nonexistent/fbl.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }), "{err:#}");
    }
}
