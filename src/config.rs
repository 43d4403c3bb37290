// src/config.rs

//! Configuration loading utilities.
//!
//! File settings come from [`Config`]; GitHub credentials may also come from
//! the `GITHUB_USERNAME` and `GITHUB_TOKEN` environment variables, which win
//! over the file.

use std::path::Path;

use crate::models::{Config, GitHubConfig};
use crate::utils::http::Credentials;

pub const USERNAME_VAR: &str = "GITHUB_USERNAME";
pub const TOKEN_VAR: &str = "GITHUB_TOKEN";

/// Load configuration from a TOML file.
///
/// Falls back to defaults if loading fails.
pub fn load_config(path: &Path) -> Config {
    if !path.exists() {
        log::debug!("No config at {}, using defaults", path.display());
        return Config::default();
    }
    Config::load_or_default(path)
}

/// GitHub credentials from the environment, then the config file.
pub fn resolve_credentials(github: &GitHubConfig) -> Option<Credentials> {
    credentials_from(github, |key| std::env::var(key).ok())
}

fn credentials_from(
    github: &GitHubConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Option<Credentials> {
    let pick = |key: &str, file: &Option<String>| {
        env(key)
            .filter(|v| !v.is_empty())
            .or_else(|| file.clone())
    };

    match (pick(USERNAME_VAR, &github.username), pick(TOKEN_VAR, &github.token)) {
        (Some(username), Some(token)) => Some(Credentials::new(username, token)),
        (None, None) => None,
        _ => {
            log::warn!("GitHub credentials need both a username and a token; searching anonymously");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn github(username: Option<&str>, token: Option<&str>) -> GitHubConfig {
        GitHubConfig {
            username: username.map(str::to_string),
            token: token.map(str::to_string),
            ..GitHubConfig::default()
        }
    }

    #[test]
    fn test_environment_overrides_file() {
        let env = |key: &str| (key == TOKEN_VAR).then(|| "from-env".to_string());
        let creds = credentials_from(&github(Some("octocat"), Some("from-file")), env).unwrap();
        assert_eq!(creds, Credentials::new("octocat", "from-env"));
    }

    #[test]
    fn test_empty_environment_value_is_ignored() {
        let env = |_: &str| Some(String::new());
        let creds = credentials_from(&github(Some("octocat"), Some("t")), env).unwrap();
        assert_eq!(creds, Credentials::new("octocat", "t"));
    }

    #[test]
    fn test_partial_credentials_are_dropped() {
        assert!(credentials_from(&github(Some("octocat"), None), |_| None).is_none());
        assert!(credentials_from(&github(None, None), |_| None).is_none());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = load_config(Path::new("/definitely/not/here.toml"));
        assert_eq!(config.lake.zone, "raw");
    }
}
