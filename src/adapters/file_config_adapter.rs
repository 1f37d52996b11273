//! INI file configuration adapter.
//!
//! Values are read as trimmed strings and parsed here, so a malformed number
//! or flag falls back to the caller's default the same way a missing key does.

use configparser::ini::Ini;
use std::path::Path;
use std::str::FromStr;

use crate::domain::error::StocklensError;
use crate::ports::config_port::ConfigPort;

pub struct FileConfigAdapter {
    ini: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StocklensError> {
        let path = path.as_ref();
        let mut ini = Ini::new();
        ini.load(path).map_err(|reason| StocklensError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { ini })
    }

    pub fn from_string(content: &str) -> Result<Self, StocklensError> {
        let mut ini = Ini::new();
        ini.read(content.to_string())
            .map_err(|reason| StocklensError::ConfigParse {
                file: "<inline>".to_string(),
                reason,
            })?;
        Ok(Self { ini })
    }

    fn parsed<T: FromStr>(&self, section: &str, key: &str) -> Option<T> {
        self.get_string(section, key)?.trim().parse().ok()
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.ini.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.parsed(section, key).unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.parsed(section, key).unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.get_string(section, key)
            .as_deref()
            .and_then(Self::parse_bool)
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[data]
dir = /var/lib/stocklens/prices

[strategy]
name = Golden Cross
type = sma_crossover
parameters = {"short_period": 10, "long_period": 30}
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("data", "dir"),
            Some("/var/lib/stocklens/prices".to_string())
        );
        assert_eq!(
            adapter.get_string("strategy", "parameters"),
            Some(r#"{"short_period": 10, "long_period": 30}"#.to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\ninitial_capital = 100\n").unwrap();
        assert_eq!(adapter.get_string("backtest", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_string_or_falls_back_on_blank() {
        let adapter = FileConfigAdapter::from_string("[live]\nstrategy =\n").unwrap();
        assert_eq!(adapter.get_string_or("live", "strategy", "composite"), "composite");
        assert_eq!(adapter.get_string_or("live", "missing", "momentum"), "momentum");
    }

    #[test]
    fn get_int_returns_value() {
        let adapter = FileConfigAdapter::from_string("[screener]\nlimit = 5\n").unwrap();
        assert_eq!(adapter.get_int("screener", "limit", 20), 5);
    }

    #[test]
    fn get_int_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[screener]\n").unwrap();
        assert_eq!(adapter.get_int("screener", "concurrency", 10), 10);
    }

    #[test]
    fn get_int_returns_default_for_non_numeric() {
        let adapter = FileConfigAdapter::from_string("[screener]\nlimit = abc\n").unwrap();
        assert_eq!(adapter.get_int("screener", "limit", 42), 42);
    }

    #[test]
    fn get_double_returns_value() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\ncommission_rate = 0.0015\n").unwrap();
        assert_eq!(adapter.get_double("backtest", "commission_rate", 0.0), 0.0015);
    }

    #[test]
    fn get_double_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\nrisk_per_trade = lots\n").unwrap();
        assert_eq!(adapter.get_double("backtest", "risk_per_trade", 0.1), 0.1);
    }

    #[test]
    fn get_bool_accepts_common_spellings() {
        let adapter = FileConfigAdapter::from_string(
            "[backtest]\na = true\nb = yes\nc = 1\nd = off\ne = No\n",
        )
        .unwrap();
        assert!(adapter.get_bool("backtest", "a", false));
        assert!(adapter.get_bool("backtest", "b", false));
        assert!(adapter.get_bool("backtest", "c", false));
        assert!(!adapter.get_bool("backtest", "d", true));
        assert!(!adapter.get_bool("backtest", "e", true));
    }

    #[test]
    fn get_bool_returns_default_for_missing_or_garbage() {
        let adapter = FileConfigAdapter::from_string("[backtest]\nx = maybe\n").unwrap();
        assert!(adapter.get_bool("backtest", "missing", true));
        assert!(!adapter.get_bool("backtest", "x", false));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[signals]\nstore = /etc/stocklens/rules.json\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("signals", "store"),
            Some("/etc/stocklens/rules.json".to_string())
        );
    }

    #[test]
    fn missing_file_is_config_parse_error() {
        let err = FileConfigAdapter::from_file("/nonexistent/path/config.ini")
            .err()
            .unwrap();
        match err {
            StocklensError::ConfigParse { file, .. } => assert!(file.ends_with("config.ini")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn padded_numbers_still_parse() {
        let adapter =
            FileConfigAdapter::from_string("[screener]
limit =   7  
concurrency = 2.5
").unwrap();
        assert_eq!(adapter.get_int("screener", "limit", 20), 7);
        assert_eq!(adapter.get_int("screener", "concurrency", 10), 10);
        assert_eq!(adapter.get_double("screener", "concurrency", 1.0), 2.5);
    }
}
