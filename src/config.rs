use std::path::PathBuf;

use crate::clients::errors::{Error, Result};

pub const DEFAULT_API_ROOT: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_PLAYER: &str = "mpv --no-video --really-quiet";
pub const DEFAULT_GRID_COLUMNS: usize = 3;

// Configuration for the player App
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_root: String,
    pub player_command: Vec<String>,
    pub cover_path: Option<PathBuf>,
    pub grid_columns: usize,
}

/// Explicit values win over the environment (`BUM_API_ROOT`, `BUM_PLAYER`,
/// `BUM_COVER_PATH`, `BUM_GRID_COLUMNS`), which wins over the defaults.
#[derive(Default)]
pub struct ConfigBuilder {
    api_root: Option<String>,
    player_command: Option<String>,
    cover_path: Option<PathBuf>,
    grid_columns: Option<usize>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn api_root(mut self, api_root: Option<String>) -> Self {
        self.api_root = api_root.or(self.api_root);
        self
    }

    #[must_use]
    pub fn player_command(mut self, command: Option<String>) -> Self {
        self.player_command = command.or(self.player_command);
        self
    }

    #[must_use]
    pub fn cover_path(mut self, path: Option<PathBuf>) -> Self {
        self.cover_path = path.or(self.cover_path);
        self
    }

    #[must_use]
    pub fn grid_columns(mut self, columns: Option<usize>) -> Self {
        self.grid_columns = columns.or(self.grid_columns);
        self
    }

    pub fn build(self) -> Result<Config> {
        self.build_with(|key| std::env::var(key).ok())
    }

    /// Like [`ConfigBuilder::build`] but reads variables through `lookup`.
    pub fn build_with<F>(self, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_root = self
            .api_root
            .or_else(|| lookup("BUM_API_ROOT"))
            .unwrap_or_else(|| DEFAULT_API_ROOT.to_string());
        if !api_root.starts_with("http://") && !api_root.starts_with("https://") {
            return Err(Error::ConfigurationError(format!(
                "API root must be an http(s) URL, got {api_root:?}"
            )));
        }

        let player = self
            .player_command
            .or_else(|| lookup("BUM_PLAYER"))
            .unwrap_or_else(|| DEFAULT_PLAYER.to_string());
        let player_command: Vec<String> = player.split_whitespace().map(String::from).collect();
        if player_command.is_empty() {
            return Err(Error::ConfigurationError("BUM_PLAYER is empty".into()));
        }

        // An empty BUM_COVER_PATH turns the cover file off
        let cover_path = match self.cover_path {
            Some(path) => Some(path),
            None => match lookup("BUM_COVER_PATH") {
                Some(path) if path.is_empty() => None,
                Some(path) => Some(PathBuf::from(path)),
                None => Some(default_cover_path()),
            },
        };

        let grid_columns = match self.grid_columns {
            Some(columns) => columns,
            None => match lookup("BUM_GRID_COLUMNS") {
                Some(raw) => raw.parse().map_err(|_| {
                    Error::ConfigurationError(format!("BUM_GRID_COLUMNS is not a number: {raw:?}"))
                })?,
                None => DEFAULT_GRID_COLUMNS,
            },
        };

        Ok(Config {
            api_root: api_root.trim_end_matches('/').to_string(),
            player_command,
            cover_path,
            grid_columns: grid_columns.max(1),
        })
    }
}

fn default_cover_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp")) // Fallback to /tmp if cache directory can't be determined
        .join("bumplayer")
        .join("cover.jpg")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = ConfigBuilder::new().build_with(env(&[])).unwrap();
        assert_eq!(config.api_root, DEFAULT_API_ROOT);
        assert_eq!(config.player_command, vec!["mpv", "--no-video", "--really-quiet"]);
        assert!(config.cover_path.unwrap().ends_with("bumplayer/cover.jpg"));
        assert_eq!(config.grid_columns, DEFAULT_GRID_COLUMNS);
    }

    #[test]
    fn environment_is_read_and_explicit_values_win() {
        let lookup = env(&[
            ("BUM_API_ROOT", "https://music.example.org/api/"),
            ("BUM_PLAYER", "ffplay -nodisp -autoexit"),
            ("BUM_COVER_PATH", ""),
            ("BUM_GRID_COLUMNS", "5"),
        ]);
        let config = ConfigBuilder::new()
            .grid_columns(Some(2))
            .build_with(lookup)
            .unwrap();

        assert_eq!(config.api_root, "https://music.example.org/api");
        assert_eq!(config.player_command[0], "ffplay");
        assert_eq!(config.cover_path, None);
        assert_eq!(config.grid_columns, 2);
    }

    #[test]
    fn invalid_values_are_configuration_errors() {
        let bad_root = ConfigBuilder::new()
            .api_root(Some("localhost:8000".into()))
            .build_with(env(&[]));
        assert!(matches!(bad_root, Err(Error::ConfigurationError(_))));

        let bad_columns = ConfigBuilder::new().build_with(env(&[("BUM_GRID_COLUMNS", "many")]));
        assert!(matches!(bad_columns, Err(Error::ConfigurationError(_))));

        let no_player = ConfigBuilder::new().build_with(env(&[("BUM_PLAYER", "  ")]));
        assert!(matches!(no_player, Err(Error::ConfigurationError(_))));
    }
}
