use serde::Deserialize;

pub const CONFIG_ENV: &str = "OPENINGSTATS_CONFIG";

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub batch_size: usize,         // records per parallel chunk
    pub parallel_threshold: usize, // fewer records than this => single pass
    pub rayon_threads: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            parallel_threshold: 10_000,
            rayon_threads: None,
        }
    }
}

impl Config {
    /// Load `config.toml` (or `$OPENINGSTATS_CONFIG`); any problem yields defaults.
    pub fn load() -> Self {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| "config.toml".to_string());
        match std::fs::read_to_string(&path) {
            Ok(s) => Self::from_toml(&s).unwrap_or_else(|e| {
                vprintln!("config: {} is invalid ({}), using defaults", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        let mut cfg: Self = toml::from_str(s)?;
        if cfg.batch_size == 0 {
            cfg.batch_size = Self::default().batch_size;
        }
        Ok(cfg)
    }
}
