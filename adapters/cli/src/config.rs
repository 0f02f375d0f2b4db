use std::{fs, path::Path};

use anyhow::{Context, Result};
use skyline_runner_session::SessionConfig;

/// Loads the session configuration, falling back to defaults without a path.
pub(crate) fn load_session_config(path: Option<&Path>) -> Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read session config at {}", path.display()))?;
    parse_session_config(&contents)
        .with_context(|| format!("invalid session config at {}", path.display()))
}

fn parse_session_config(contents: &str) -> Result<SessionConfig> {
    let config: SessionConfig =
        toml::from_str(contents).context("failed to parse session config toml contents")?;
    config
        .validate()
        .context("session config failed validation")?;
    Ok(config)
}
