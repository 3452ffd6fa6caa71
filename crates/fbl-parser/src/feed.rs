use crate::config::{FeedConfig, DEFAULT_FEED};
use crate::error::ConfigError;
use ordermap::OrderMap;
use regex::{Regex, RegexSet, RegexSetBuilder};
use std::collections::BTreeMap;

/// The outcome of matching the sender of a feedback message
/// against the configured alias rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Alias of the last matching rule, or the raw From header
    /// when nothing matched
    pub source: String,
    /// The most specific feed that has its own configuration section
    pub feed_name: String,
}

#[derive(Debug)]
pub struct FeedResolver {
    set: RegexSet,
    pattern_to_alias: Vec<String>,
}

impl FeedResolver {
    pub fn new(aliases: &OrderMap<String, String>) -> Result<Self, ConfigError> {
        // Compile each rule on its own so the error names the bad pattern
        for pattern in aliases.keys() {
            Regex::new(pattern).map_err(|err| ConfigError::InvalidAliasPattern {
                pattern: pattern.to_string(),
                reason: format!("{err:#}"),
            })?;
        }

        let set = RegexSetBuilder::new(aliases.keys())
            .build()
            .map_err(|err| ConfigError::InvalidAliasPattern {
                pattern: aliases
                    .keys()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(" | "),
                reason: format!("{err:#}"),
            })?;

        Ok(Self {
            set,
            pattern_to_alias: aliases.values().cloned().collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.pattern_to_alias.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pattern_to_alias.is_empty()
    }

    /// Folds the matching rules in configuration order. Each match
    /// replaces the source name; it also replaces the feed name when
    /// `feeds` has a section for that alias.
    pub fn resolve(&self, from: &str, feeds: &BTreeMap<String, FeedConfig>) -> Resolution {
        let initial = Resolution {
            source: from.to_string(),
            feed_name: DEFAULT_FEED.to_string(),
        };

        let resolution = self
            .set
            .matches(from)
            .into_iter()
            .filter_map(|idx| self.pattern_to_alias.get(idx))
            .fold(initial, |acc, alias| Resolution {
                feed_name: if feeds.contains_key(alias) {
                    alias.clone()
                } else {
                    acc.feed_name
                },
                source: alias.clone(),
            });

        tracing::debug!(
            "resolved sender {from:?} to source={} feed={}",
            resolution.source,
            resolution.feed_name
        );
        resolution
    }
}
