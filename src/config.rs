use crate::types::*;
use std::{env, fs, path::PathBuf};

pub fn repo_root() -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn resolve_repo_path(raw: &str) -> PathBuf {
  let path = PathBuf::from(raw);
  if path.is_absolute() {
    path
  } else {
    repo_root().join(path)
  }
}

pub fn config_path() -> PathBuf {
  repo_root().join("config.json")
}

pub fn env_override(key: &str) -> Option<String> {
  env::var(key)
    .ok()
    .map(|value| value.trim().to_string())
    .filter(|value| !value.is_empty())
}

// Environment overrides win over config.json so a stream setup can be
// repointed without editing the file.
pub fn apply_env_overrides(mut config: AppConfig) -> AppConfig {
  if let Some(value) = env_override("OVERLAY_DIR") {
    config.overlay_dir = value;
  }
  if let Some(value) = env_override("OVERLAY_STATE_PATH") {
    config.state_path = value;
  }
  if let Some(value) = env_override("OVERLAY_BIND_ADDR") {
    config.bind_addr = value;
  }
  config
}

pub fn load_config() -> Result<AppConfig, String> {
  let path = config_path();
  if !path.is_file() {
    return Ok(apply_env_overrides(AppConfig::default()));
  }
  let data = fs::read_to_string(&path).map_err(|e| format!("read config {}: {e}", path.display()))?;
  let config =
    serde_json::from_str::<AppConfig>(&data).map_err(|e| format!("parse config {}: {e}", path.display()))?;
  Ok(apply_env_overrides(config))
}

pub fn load_env_file() {
  let env_path = repo_root().join(".env");
  if !env_path.is_file() {
    return;
  }
  let contents = match fs::read_to_string(&env_path) {
    Ok(data) => data,
    Err(_) => return,
  };
  for line in contents.lines() {
    if let Some((key, value)) = parse_env_line(line) {
      if env::var_os(&key).is_none() {
        env::set_var(key, value);
      }
    }
  }
}

pub fn parse_env_line(line: &str) -> Option<(String, String)> {
  let trimmed = line.trim();
  if trimmed.is_empty() || trimmed.starts_with('#') {
    return None;
  }
  let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
  let (key, raw_value) = trimmed.split_once('=')?;
  let key = key.trim();
  if key.is_empty() {
    return None;
  }
  let mut value = raw_value.trim();
  if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
    value = &value[1..value.len() - 1];
  } else if value.starts_with('\'') && value.ends_with('\'') && value.len() >= 2 {
    value = &value[1..value.len() - 1];
  } else if let Some(idx) = value.find('#') {
    value = value[..idx].trim_end();
  }
  Some((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_env_line() {
    assert_eq!(
      parse_env_line("OVERLAY_BIND_ADDR=0.0.0.0:17890"),
      Some(("OVERLAY_BIND_ADDR".to_string(), "0.0.0.0:17890".to_string()))
    );
    assert_eq!(
      parse_env_line("export OVERLAY_DIR=\"my overlay\""),
      Some(("OVERLAY_DIR".to_string(), "my overlay".to_string()))
    );
    assert_eq!(
      parse_env_line("OVERLAY_STATE_PATH=state.json # comment"),
      Some(("OVERLAY_STATE_PATH".to_string(), "state.json".to_string()))
    );
    assert_eq!(parse_env_line("# comment"), None);
    assert_eq!(parse_env_line(""), None);
  }

  #[test]
  fn test_resolve_repo_path() {
    assert!(resolve_repo_path("overlay").starts_with(repo_root()));
    assert_eq!(resolve_repo_path("/tmp/state.json"), PathBuf::from("/tmp/state.json"));
  }
}
