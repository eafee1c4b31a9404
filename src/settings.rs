use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dates::{DateOptions, DateOrder, OcrScope};
use crate::db::DB_FILE;
use crate::error::Result;
use crate::importer::{ImportOptions, ScanMode};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default)]
    pub date_order: DateOrder,
    #[serde(default)]
    pub ocr_scope: OcrScope,
    #[serde(default)]
    pub scan_mode: ScanMode,
    #[serde(default = "default_ocr_program")]
    pub ocr_program: String,
    #[serde(default = "default_ocr_language")]
    pub ocr_language: String,
}

fn default_currency_symbol() -> String {
    "₹".to_string()
}

fn default_ocr_program() -> String {
    "tesseract".to_string()
}

fn default_ocr_language() -> String {
    "eng".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            currency_symbol: default_currency_symbol(),
            date_order: DateOrder::default(),
            ocr_scope: OcrScope::default(),
            scan_mode: ScanMode::default(),
            ocr_program: default_ocr_program(),
            ocr_language: default_ocr_language(),
        }
    }
}

impl Settings {
    pub fn date_options(&self) -> DateOptions {
        DateOptions {
            order: self.date_order,
            ocr_scope: self.ocr_scope,
        }
    }

    pub fn import_options(&self, today: NaiveDate) -> ImportOptions {
        ImportOptions {
            dates: self.date_options(),
            scan_mode: self.scan_mode,
            today,
        }
    }

    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(DB_FILE)
    }
}

fn config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("DAYBOOK_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("daybook")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("daybook")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if !path.exists() {
        return Settings::default();
    }
    let content = std::fs::read_to_string(&path).unwrap_or_default();
    serde_json::from_str(&content).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "unreadable settings, using defaults");
        Settings::default()
    })
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            data_dir: "/tmp/test".to_string(),
            currency_symbol: "Rs ".to_string(),
            date_order: DateOrder::MonthFirst,
            ocr_scope: OcrScope::NumericOnly,
            scan_mode: ScanMode::DateAware,
            ocr_program: "/opt/tesseract".to_string(),
            ocr_language: "hin".to_string(),
        };
        let json = serde_json::to_string_pretty(&settings).unwrap();
        std::fs::write(&path, &json).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let loaded: Settings = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded.data_dir, "/tmp/test");
        assert_eq!(loaded.date_order, DateOrder::MonthFirst);
        assert_eq!(loaded.ocr_scope, OcrScope::NumericOnly);
        assert_eq!(loaded.scan_mode, ScanMode::DateAware);
        assert_eq!(loaded.ocr_language, "hin");
    }

    #[test]
    fn test_enums_serialize_snake_case() {
        let json = serde_json::to_string(&Settings {
            date_order: DateOrder::MonthFirst,
            ..Settings::default()
        })
        .unwrap();
        assert!(json.contains("\"date_order\":\"month_first\""));
        assert!(json.contains("\"scan_mode\":\"independent\""));
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"data_dir": "/tmp/test"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.currency_symbol, "₹");
        assert_eq!(s.date_order, DateOrder::DayFirst);
        assert_eq!(s.ocr_scope, OcrScope::WholeToken);
        assert_eq!(s.ocr_program, "tesseract");
        assert_eq!(s.ocr_language, "eng");
    }

    #[test]
    fn test_import_options_follow_settings() {
        let s = Settings {
            date_order: DateOrder::MonthFirst,
            scan_mode: ScanMode::DateAware,
            ..Settings::default()
        };
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let opts = s.import_options(today);
        assert_eq!(opts.dates.order, DateOrder::MonthFirst);
        assert_eq!(opts.scan_mode, ScanMode::DateAware);
        assert_eq!(opts.today, today);
    }

    #[test]
    fn test_db_path_is_inside_data_dir() {
        let s = Settings {
            data_dir: "/tmp/books".to_string(),
            ..Settings::default()
        };
        assert_eq!(s.db_path(), PathBuf::from("/tmp/books").join("daybook.db"));
    }
}
