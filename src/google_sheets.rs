use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::Url;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::config::HttpSettings;
use crate::http_client::{http_client, send_with_retry};
use crate::sheets::{Cell, CellRef, SheetStore, ValueInput, a1_columns, a1_range, quote_sheet};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets/";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const TOKEN_LIFETIME_SECS: i64 = 3600;
const TOKEN_SLACK: Duration = Duration::from_secs(60);

/// The parts of a service-account key needed to mint access tokens.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceKey {
    /// `GKEY_*` environment variables take precedence over the key file.
    pub fn load(path: &Path) -> Result<Self> {
        if let Some(key) = Self::from_env() {
            return Ok(key);
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read service key {}", path.display()))?;
        serde_json::from_str(&raw).context("invalid service key json")
    }

    fn from_env() -> Option<Self> {
        let client_email = std::env::var("GKEY_CLIENT_EMAIL").ok()?;
        let private_key = std::env::var("GKEY_PRIVATE_KEY").ok()?.replace("\\n", "\n");
        let token_uri = std::env::var("GKEY_TOKEN_URI").unwrap_or_else(|_| default_token_uri());
        Some(Self {
            client_email,
            private_key,
            token_uri,
        })
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct SheetMeta {
    id: i64,
    title: String,
    rows: u32,
    cols: u32,
}

/// Sheets v4 REST store for one spreadsheet.
pub struct GoogleSheetsStore {
    client: &'static Client,
    settings: HttpSettings,
    spreadsheet_id: String,
    key: ServiceKey,
    token: Option<(String, Instant)>,
    meta: Vec<SheetMeta>,
}

impl GoogleSheetsStore {
    /// Loads the key, mints a token and lists the sheets. Any failure here
    /// means the store is unusable for the whole run.
    pub fn connect(spreadsheet_id: &str, key: ServiceKey, settings: HttpSettings) -> Result<Self> {
        let client = http_client(&settings)?;
        let mut store = Self {
            client,
            settings,
            spreadsheet_id: spreadsheet_id.to_string(),
            key,
            token: None,
            meta: Vec::new(),
        };
        store.refresh_meta().context("list sheets")?;
        info!(
            spreadsheet = spreadsheet_id,
            sheets = store.meta.len(),
            "connected to spreadsheet"
        );
        Ok(store)
    }

    fn access_token(&mut self) -> Result<String> {
        if let Some((token, expires)) = &self.token
            && Instant::now() + TOKEN_SLACK < *expires
        {
            return Ok(token.clone());
        }

        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: SHEETS_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        };
        let signing_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .context("invalid service key private key")?;
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &signing_key)
            .context("sign token assertion")?;

        let token_uri = self.key.token_uri.clone();
        let resp = send_with_retry(&self.settings, "token exchange", || {
            self.client.post(&token_uri).form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
        })?;
        let body: TokenResponse = resp.json().context("invalid token response")?;
        let ttl = Duration::from_secs(body.expires_in.unwrap_or(TOKEN_LIFETIME_SECS as u64));
        debug!(ttl_secs = ttl.as_secs(), "obtained access token");
        self.token = Some((body.access_token.clone(), Instant::now() + ttl));
        Ok(body.access_token)
    }

    fn spreadsheet_url(&self, suffix: &str) -> String {
        format!("{SHEETS_API}{}{suffix}", self.spreadsheet_id)
    }

    fn values_url(&self, range: &str) -> Result<Url> {
        let mut url = Url::parse(&self.spreadsheet_url("/values")).context("invalid sheets url")?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("sheets url cannot be a base"))?
            .push(range);
        Ok(url)
    }

    fn get_json(&mut self, url: Url, what: &str) -> Result<Value> {
        let token = self.access_token()?;
        let resp = send_with_retry(&self.settings, what, || {
            self.client.get(url.clone()).bearer_auth(&token)
        })?;
        resp.json().with_context(|| format!("invalid json for {what}"))
    }

    fn batch_update(&mut self, requests: Value) -> Result<()> {
        let token = self.access_token()?;
        let url = self.spreadsheet_url(":batchUpdate");
        let body = json!({ "requests": requests });
        send_with_retry(&self.settings, "batch update", || {
            self.client.post(&url).bearer_auth(&token).json(&body)
        })?;
        Ok(())
    }

    fn refresh_meta(&mut self) -> Result<()> {
        let mut url = Url::parse(&self.spreadsheet_url("")).context("invalid sheets url")?;
        url.query_pairs_mut().append_pair(
            "fields",
            "sheets.properties(sheetId,title,gridProperties(rowCount,columnCount))",
        );
        let root = self.get_json(url, "spreadsheet metadata")?;
        self.meta = parse_sheet_meta(&root);
        Ok(())
    }

    fn meta_for(&self, title: &str) -> Result<SheetMeta> {
        self.meta
            .iter()
            .find(|m| m.title == title)
            .cloned()
            .ok_or_else(|| anyhow!("sheet {title:?} not found"))
    }

    // Values updates fail past the grid edge, so grow it first.
    fn ensure_grid(&mut self, title: &str, rows: u32, cols: u32) -> Result<()> {
        let meta = self.meta_for(title)?;
        let mut requests = Vec::new();
        if rows > meta.rows {
            requests.push(json!({
                "appendDimension": { "sheetId": meta.id, "dimension": "ROWS", "length": rows - meta.rows }
            }));
        }
        if cols > meta.cols {
            requests.push(json!({
                "appendDimension": { "sheetId": meta.id, "dimension": "COLUMNS", "length": cols - meta.cols }
            }));
        }
        if requests.is_empty() {
            return Ok(());
        }
        self.batch_update(Value::Array(requests))?;
        if let Some(m) = self.meta.iter_mut().find(|m| m.title == title) {
            m.rows = m.rows.max(rows);
            m.cols = m.cols.max(cols);
        }
        Ok(())
    }
}

fn parse_sheet_meta(root: &Value) -> Vec<SheetMeta> {
    root.get("sheets")
        .and_then(Value::as_array)
        .map(|sheets| {
            sheets
                .iter()
                .filter_map(|s| {
                    let props = s.get("properties")?;
                    let grid = props.get("gridProperties");
                    let dim = |key: &str| {
                        grid.and_then(|g| g.get(key))
                            .and_then(Value::as_u64)
                            .unwrap_or(0) as u32
                    };
                    Some(SheetMeta {
                        id: props.get("sheetId").and_then(Value::as_i64).unwrap_or(0),
                        title: props.get("title")?.as_str()?.to_string(),
                        rows: dim("rowCount"),
                        cols: dim("columnCount"),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn parse_values(root: &Value) -> Vec<Vec<String>> {
    root.get("values")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .map(|row| {
                    row.as_array()
                        .map(|cells| cells.iter().map(value_text).collect())
                        .unwrap_or_default()
                })
                .collect()
        })
        .unwrap_or_default()
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl SheetStore for GoogleSheetsStore {
    fn sheet_names(&mut self) -> Result<Vec<String>> {
        self.refresh_meta()?;
        Ok(self.meta.iter().map(|m| m.title.clone()).collect())
    }

    fn add_sheet(&mut self, name: &str, rows: u32, cols: u32) -> Result<()> {
        self.batch_update(json!([{
            "addSheet": {
                "properties": {
                    "title": name,
                    "gridProperties": { "rowCount": rows.max(1), "columnCount": cols.max(1) }
                }
            }
        }]))
        .with_context(|| format!("add sheet {name:?}"))?;
        self.refresh_meta()
    }

    fn read_rows(&mut self, sheet: &str, first: u32, last: Option<u32>) -> Result<Vec<Vec<String>>> {
        let range = match last {
            Some(last) => format!("{}!{}:{}", quote_sheet(sheet), first + 1, last + 1),
            None => {
                let meta = self.meta_for(sheet)?;
                format!("{}!{}:{}", quote_sheet(sheet), first + 1, meta.rows.max(first + 1))
            }
        };
        let url = self.values_url(&range)?;
        let root = self.get_json(url, &format!("read {range}"))?;
        Ok(parse_values(&root))
    }

    fn read_column(&mut self, sheet: &str, col: u32) -> Result<Vec<String>> {
        let range = a1_columns(sheet, col, col);
        let url = self.values_url(&range)?;
        let root = self.get_json(url, &format!("read {range}"))?;
        Ok(parse_values(&root)
            .into_iter()
            .map(|row| row.into_iter().next().unwrap_or_default())
            .collect())
    }

    fn write_range(
        &mut self,
        sheet: &str,
        start: CellRef,
        rows: &[Vec<Cell>],
        input: ValueInput,
    ) -> Result<()> {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0) as u32;
        if rows.is_empty() || width == 0 {
            return Ok(());
        }
        let end = start.offset(rows.len() as u32 - 1, width - 1);
        self.ensure_grid(sheet, end.row + 1, end.col + 1)?;

        let range = a1_range(sheet, start, end);
        let values = rows
            .iter()
            .map(|row| {
                let mut out = row.iter().map(Cell::to_json).collect::<Vec<_>>();
                out.resize(width as usize, Value::String(String::new()));
                Value::Array(out)
            })
            .collect::<Vec<_>>();
        let body = json!({ "range": range, "majorDimension": "ROWS", "values": values });

        let mut url = self.values_url(&range)?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", input.as_param());
        let token = self.access_token()?;
        send_with_retry(&self.settings, &format!("write {range}"), || {
            self.client.put(url.clone()).bearer_auth(&token).json(&body)
        })?;
        debug!(range = %range, rows = rows.len(), "wrote range");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sheet_metadata() {
        let root = json!({
            "sheets": [
                {"properties": {"sheetId": 0, "title": "Form Responses 1",
                    "gridProperties": {"rowCount": 1000, "columnCount": 26}}},
                {"properties": {"sheetId": 42, "title": "Standings"}}
            ]
        });
        let meta = parse_sheet_meta(&root);
        assert_eq!(meta.len(), 2);
        assert_eq!(meta[0].rows, 1000);
        assert_eq!(meta[1].id, 42);
        assert_eq!(meta[1].cols, 0);
    }

    #[test]
    fn parses_ragged_values() {
        let root = json!({"range": "x", "values": [["a", "b"], [], ["c", 3]]});
        assert_eq!(
            parse_values(&root),
            vec![
                vec!["a".to_string(), "b".to_string()],
                vec![],
                vec!["c".to_string(), "3".to_string()]
            ]
        );
        assert!(parse_values(&json!({"range": "x"})).is_empty());
    }

    #[test]
    fn service_key_defaults_token_uri() {
        let key: ServiceKey =
            serde_json::from_str(r#"{"client_email":"a@b.iam","private_key":"pem"}"#).unwrap();
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
    }
}
