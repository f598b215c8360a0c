use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use directories::BaseDirs;

use crate::fetch::Credentials;

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    overrides: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        Self::load_from(&default_config_path())
    }

    /// Defaults, then `KEY=VALUE` lines from `path` if it exists, then the environment.
    pub fn load_from(path: &Path) -> Self {
        let mut map = default_map();

        if path.exists() {
            if let Ok(file) = fs::File::open(path) {
                let reader = BufReader::new(file);
                for line in reader.lines().map_while(Result::ok) {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if let Some((k, v)) = line.split_once('=') {
                        map.insert(k.trim().to_string(), v.trim().to_string());
                    }
                }
            }
        }

        // Overlay environment variables (take precedence)
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self { inner: map, overrides: HashMap::new(), config_path: path.to_path_buf() }
    }

    /// Lookup order: values from [`set`](Self::set), the environment, the rc file, defaults.
    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(v) = self.overrides.get(key) {
            return Some(v.clone());
        }
        if let Ok(v) = env::var(key) {
            return Some(v);
        }
        self.inner.get(key).cloned()
    }

    /// Override `key` for this process, ahead of the environment.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.overrides.insert(key.to_string(), value.into());
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.parse::<u64>().ok())
    }

    /// Request timeout in seconds.
    pub fn request_timeout(&self) -> u64 {
        self.get_u64("REQUEST_TIMEOUT").unwrap_or(60)
    }

    pub fn preview_bytes(&self) -> u64 {
        self.get_u64("PREVIEW_BYTES").unwrap_or(64)
    }

    pub fn output_url(&self) -> Option<String> {
        self.get("RUNOUT_OUTPUT_URL").filter(|s| !s.trim().is_empty())
    }

    /// Basic credentials when both user name and password are configured.
    pub fn credentials(&self) -> Option<Credentials> {
        let username = self.get("RUNOUT_USERNAME").filter(|s| !s.is_empty())?;
        let password = self.get("RUNOUT_PASSWORD")?;
        Some(Credentials::new(username, password))
    }
}

fn is_config_key(k: &str) -> bool {
    // Accept known keys or RUNOUT_* for forward-compat
    const KEYS: &[&str] = &["REQUEST_TIMEOUT", "DEFAULT_COLOR", "PREVIEW_BYTES"];

    KEYS.contains(&k) || k.starts_with("RUNOUT_")
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("runout").join(".runoutrc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();

    // Numbers
    m.insert("REQUEST_TIMEOUT".into(), "60".into());
    m.insert("PREVIEW_BYTES".into(), "64".into());

    // Strings
    m.insert("DEFAULT_COLOR".into(), "cyan".into());

    m
}
