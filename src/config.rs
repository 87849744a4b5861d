use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::picks::{ColumnMapping, default_column_map};
use crate::player_stats::{TiebreakerSource, default_tiebreakers};
use crate::standings::PlayoffBands;

const DEFAULT_CONFIG_FILE: &str = "sheet_info.json";
const DEFAULT_SERVICE_KEY_FILE: &str = "service_key.json";
const STANDINGS_URL: &str = "https://www.foxsports.com/nba/standings";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sheet_id: Option<String>,
    #[serde(alias = "responses_ws_name")]
    pub responses_sheet: String,
    pub sheets: SheetNames,
    pub standings_url: String,
    pub tiebreakers: Vec<TiebreakerSource>,
    pub service_key_path: PathBuf,
    pub http: HttpSettings,
    pub playoff_bands: PlayoffBands,
    pub response_columns: Vec<ColumnMapping>,
    pub debug_dump: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetNames {
    pub standings: String,
    pub tiebreakers: String,
    pub standings_picks: String,
    pub tiebreaker_picks: String,
    pub picks_summary: String,
    pub ledger: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub retries: u32,
    pub backoff_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sheet_id: None,
            responses_sheet: "Form Responses 1".to_string(),
            sheets: SheetNames::default(),
            standings_url: STANDINGS_URL.to_string(),
            tiebreakers: default_tiebreakers(),
            service_key_path: PathBuf::from(DEFAULT_SERVICE_KEY_FILE),
            http: HttpSettings::default(),
            playoff_bands: PlayoffBands::default(),
            response_columns: default_column_map(),
            debug_dump: None,
        }
    }
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            standings: "Standings".to_string(),
            tiebreakers: "Tiebreakers".to_string(),
            standings_picks: "Standings Picks".to_string(),
            tiebreaker_picks: "Tiebreaker Picks".to_string(),
            picks_summary: "Picks Summary".to_string(),
            ledger: "Last Updated".to_string(),
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            retries: 3,
            backoff_ms: 500,
        }
    }
}

impl Config {
    /// Reads the JSON config (explicit path, `NBA_SHEETS_CONFIG`, or
    /// `sheet_info.json` if present) and applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| env_string("NBA_SHEETS_CONFIG").map(PathBuf::from));
        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::from_file(fallback)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("invalid config json")
    }

    pub fn apply_env(&mut self) {
        if let Some(id) = env_string("SHEET_ID") {
            self.sheet_id = Some(id);
        }
        if let Some(name) = env_string("RESPONSE_WORKSHEET_NAME") {
            self.responses_sheet = name;
        }
        if let Some(url) = env_string("STANDINGS_URL") {
            self.standings_url = url;
        }
        if let Some(path) = env_string("SERVICE_KEY_PATH") {
            self.service_key_path = PathBuf::from(path);
        }
        if let Some(path) = env_string("DEBUG_DUMP_PATH") {
            self.debug_dump = Some(PathBuf::from(path));
        }
        if let Some(secs) = env_string("HTTP_TIMEOUT_SECS").and_then(|v| v.parse::<u64>().ok()) {
            self.http.timeout_secs = secs.max(1);
        }
        if let Some(retries) = env_string("HTTP_RETRIES").and_then(|v| v.parse::<u32>().ok()) {
            self.http.retries = retries.max(1);
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
