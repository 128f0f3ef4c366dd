use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, bail};
use log::debug;

/// Config file looked up in the working directory when none is given explicitly.
pub const DEFAULT_CONFIG_FILE: &str = "flurry.config";

/// Defaults for the CLI flags, read from a `key=value` properties file.
///
/// Every field is optional: flags and environment variables take precedence, and the upload
/// itself reports whatever is still missing.
#[derive(Debug, Default, PartialEq)]
pub struct UploaderConfig {
    pub api_key: Option<String>,
    pub token: Option<String>,
    pub build_id: Option<String>,
    pub timeout: Option<Duration>,
    pub ndk: Option<bool>,
}

impl UploaderConfig {
    /// Load the configuration.
    ///
    /// An explicitly requested file must exist. Otherwise [`DEFAULT_CONFIG_FILE`] is used if
    /// present, and an empty configuration if not.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match config_path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        match fs::read_to_string(&path) {
            Ok(content) => {
                let config = Self::parse(&content)
                    .with_context(|| format!("Bad config file {}", path.display()))?;
                debug!("Config loaded from {}", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !explicit => {
                debug!("Config file not found at {}", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e).with_context(|| format!("Bad config file {}", path.display())),
        }
    }

    /// Parse properties content: `key=value` (or `key: value`) lines, `#`/`!` comments and
    /// `[section]` headers are skipped.
    pub fn parse(content: &str) -> Result<Self> {
        let mut config = Self::default();
        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty()
                || line.starts_with('#')
                || line.starts_with('!')
                || (line.starts_with('[') && line.ends_with(']'))
            {
                continue;
            }
            let Some((key, value)) = line.split_once(['=', ':']) else {
                bail!("Line {}: expected `key=value`, got `{line}`", index + 1);
            };
            let (key, value) = (key.trim(), value.trim().to_string());

            match key {
                "api-key" => config.api_key = Some(value),
                "token" => config.token = Some(value),
                "uuid" | "build-id" => config.build_id = Some(value),
                "timeout" => {
                    let millis = value
                        .parse::<u64>()
                        .with_context(|| format!("Line {}: invalid timeout `{value}`", index + 1))?;
                    config.timeout = Some(Duration::from_millis(millis));
                }
                "ndk" => {
                    let ndk = value
                        .parse::<bool>()
                        .with_context(|| format!("Line {}: invalid ndk flag `{value}`", index + 1))?;
                    config.ndk = Some(ndk);
                }
                _ => debug!("Ignoring unknown config key `{key}`"),
            }
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_properties() {
        let config = UploaderConfig::parse(
            "# Upload settings\napi-key=FOO_API_KEY\ntoken = FOO_TOKEN\n\ntimeout=60000\n",
        )
        .unwrap();

        assert_eq!(
            config,
            UploaderConfig {
                api_key: Some("FOO_API_KEY".into()),
                token: Some("FOO_TOKEN".into()),
                build_id: None,
                timeout: Some(Duration::from_secs(60)),
                ndk: None,
            }
        );
    }

    #[test]
    fn test_parse_ini_style_with_section() {
        let config =
            UploaderConfig::parse("[flurry]\ntoken: TOKEN\napi-key=KEY\nuuid=build-7\nndk=true\n")
                .unwrap();

        assert_eq!(config.token.as_deref(), Some("TOKEN"));
        assert_eq!(config.api_key.as_deref(), Some("KEY"));
        assert_eq!(config.build_id.as_deref(), Some("build-7"));
        assert_eq!(config.ndk, Some(true));
    }

    #[test]
    fn test_parse_ignores_unknown_keys() {
        let config = UploaderConfig::parse("color=blue\n! legacy comment\n").unwrap();
        assert_eq!(config, UploaderConfig::default());
    }

    #[test]
    fn test_value_may_contain_separator() {
        let config = UploaderConfig::parse("token=abc=def\n").unwrap();
        assert_eq!(config.token.as_deref(), Some("abc=def"));
    }

    #[test]
    fn test_parse_rejects_bad_values() {
        assert!(UploaderConfig::parse("timeout=soon\n").is_err());
        assert!(UploaderConfig::parse("ndk=maybe\n").is_err());
        assert!(UploaderConfig::parse("just-a-key\n").is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.config");
        std::fs::write(&path, "api-key=KEY\ntimeout=1000\n").unwrap();

        let config = UploaderConfig::load(Some(&path)).unwrap();

        assert_eq!(config.api_key.as_deref(), Some("KEY"));
        assert_eq!(config.timeout, Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = UploaderConfig::load(Some(&dir.path().join("missing.config"))).unwrap_err();
        assert!(err.to_string().starts_with("Bad config file"));
    }
}
