//! Process settings read once from the environment.

use std::path::PathBuf;
use std::time::Duration;

use engine_logging::engine_warn;
use feedpost_core::CaptionSettings;
use feedpost_engine::{EngineConfig, StorePaths};

pub const DEFAULT_FEED_URL: &str = "https://www.montagneepaesi.com/feed/";
const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Settings {
    pub check_interval: Duration,
    pub default_feed_url: String,
    pub caption: CaptionSettings,
    pub store: StorePaths,
    pub images_dir: PathBuf,
    pub platform_api_url: String,
    pub bind_addr: String,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    /// Read ahead of everything else so parse warnings reach the log.
    pub fn log_file_from_env() -> Option<PathBuf> {
        Self::log_file_from_lookup(env_lookup)
    }

    pub fn log_file_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
        non_blank(&lookup, "LOG_FILE").map(PathBuf::from)
    }

    /// Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| non_blank(&lookup, key);
        let path_or =
            |key: &str, default: &str| PathBuf::from(get(key).unwrap_or_else(|| default.to_string()));

        let defaults = CaptionSettings::default();
        let caption = CaptionSettings {
            fixed_tags: get("HASHTAGS")
                .map(|raw| parse_hashtags(&raw))
                .unwrap_or(defaults.fixed_tags),
            hub_link: get("HUB_LINK").unwrap_or(defaults.hub_link),
            ..CaptionSettings::default()
        };

        Self {
            check_interval: Duration::from_secs(parse_interval(get("CHECK_INTERVAL"))),
            default_feed_url: get("DEFAULT_RSS").unwrap_or_else(|| DEFAULT_FEED_URL.to_string()),
            caption,
            store: StorePaths {
                config: path_or("CONFIG_PATH", "/data/config.json"),
                last_published: path_or("LAST_POST_PATH", "/data/last_post.txt"),
                session: path_or("SESSION_PATH", "/data/session.json"),
                device: path_or("DEVICE_PATH", "/data/device.json"),
            },
            images_dir: path_or("IMAGES_DIR", "/data/images"),
            platform_api_url: get("PLATFORM_API_URL")
                .unwrap_or_else(|| "http://127.0.0.1:8090".to_string()),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            default_feed_url: self.default_feed_url.clone(),
            check_interval: self.check_interval,
            media_dir: self.images_dir.clone(),
            caption: self.caption.clone(),
        }
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn non_blank(lookup: impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_interval(raw: Option<String>) -> u64 {
    let Some(raw) = raw else {
        return DEFAULT_CHECK_INTERVAL_SECS;
    };
    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => secs,
        _ => {
            engine_warn!(
                "Invalid CHECK_INTERVAL {:?}; using {} seconds",
                raw,
                DEFAULT_CHECK_INTERVAL_SECS
            );
            DEFAULT_CHECK_INTERVAL_SECS
        }
    }
}

/// Comma separated; a missing `#` is added.
fn parse_hashtags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty() && *tag != "#")
        .map(|tag| {
            if tag.starts_with('#') {
                tag.to_string()
            } else {
                format!("#{tag}")
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> Settings {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let settings = settings(&[]);
        assert_eq!(settings.check_interval, Duration::from_secs(60));
        assert_eq!(settings.default_feed_url, DEFAULT_FEED_URL);
        assert_eq!(settings.store.config, PathBuf::from("/data/config.json"));
        assert_eq!(settings.images_dir, PathBuf::from("/data/images"));
        assert_eq!(settings.bind_addr, "0.0.0.0:8080");
        assert_eq!(settings.caption, CaptionSettings::default());
    }

    #[test]
    fn invalid_interval_falls_back() {
        assert_eq!(
            settings(&[("CHECK_INTERVAL", "soon")]).check_interval,
            Duration::from_secs(60)
        );
        assert_eq!(
            settings(&[("CHECK_INTERVAL", "0")]).check_interval,
            Duration::from_secs(60)
        );
        assert_eq!(
            settings(&[("CHECK_INTERVAL", " 300 ")]).check_interval,
            Duration::from_secs(300)
        );
    }

    #[test]
    fn hashtags_and_hub_are_configurable() {
        let settings = settings(&[("HASHTAGS", "news, #alpi,,#"), ("HUB_LINK", "example.org/hub")]);
        assert_eq!(settings.caption.fixed_tags, vec!["#news", "#alpi"]);
        assert_eq!(settings.caption.hub_link, "example.org/hub");
    }

    #[test]
    fn log_file_is_resolved_from_its_own_variable_only() {
        let asked = std::cell::RefCell::new(Vec::new());
        let log_file = Settings::log_file_from_lookup(|key| {
            asked.borrow_mut().push(key.to_string());
            Some(" /var/log/feedpost.log ".to_string())
        });
        assert_eq!(log_file, Some(PathBuf::from("/var/log/feedpost.log")));
        assert_eq!(asked.into_inner(), vec!["LOG_FILE"]);

        assert_eq!(Settings::log_file_from_lookup(|_| Some("  ".to_string())), None);
    }
}
