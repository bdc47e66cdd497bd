use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{AuditError, Result};

/// Default programs compared by the overlap view.
pub const DEFAULT_FIRST_PROGRAM: &str = "APC1";
pub const DEFAULT_SECOND_PROGRAM: &str = "APC2";

/// Percentile above which a provider counts as high-volume.
pub const DEFAULT_HIGH_VOLUME_PERCENTILE: f64 = 95.0;

/// Histogram bin count for the distribution view.
pub const DEFAULT_HISTOGRAM_BINS: u32 = 10;

// ── AnalysisView ───────────────────────────────────────────────────────────────

/// Which analysis the invocation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisView {
    Summary,
    Overlap,
    NewProviders,
    Outliers,
    Trend,
    Distributions,
}

impl AnalysisView {
    pub const ALL: [AnalysisView; 6] = [
        AnalysisView::Summary,
        AnalysisView::Overlap,
        AnalysisView::NewProviders,
        AnalysisView::Outliers,
        AnalysisView::Trend,
        AnalysisView::Distributions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Overlap => "overlap",
            Self::NewProviders => "new-providers",
            Self::Outliers => "outliers",
            Self::Trend => "trend",
            Self::Distributions => "distributions",
        }
    }
}

impl fmt::Display for AnalysisView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisView {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| AuditError::Config(format!("unknown view: {s}")))
    }
}

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Audit-performance metrics for claim providers
#[derive(Parser, Debug, Clone)]
#[command(
    name = "provider-audit",
    about = "Audit-performance metrics for claim providers",
    version
)]
pub struct Settings {
    /// Audit CSV file, or a directory of CSV files
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Analysis view
    #[arg(long, default_value = "summary", value_parser = ["summary", "overlap", "new-providers", "outliers", "trend", "distributions"])]
    pub view: String,

    /// First program of the overlap comparison
    #[arg(long, default_value = DEFAULT_FIRST_PROGRAM)]
    pub first_program: String,

    /// Second program of the overlap comparison
    #[arg(long, default_value = DEFAULT_SECOND_PROGRAM)]
    pub second_program: String,

    /// Program whose new providers are counted per month
    #[arg(long, default_value = DEFAULT_SECOND_PROGRAM)]
    pub program: String,

    /// Claim-count percentile above which a provider is high-volume (0-100)
    #[arg(long, default_value_t = DEFAULT_HIGH_VOLUME_PERCENTILE)]
    pub percentile: f64,

    /// Histogram bins for the distribution view (1-200)
    #[arg(long, default_value_t = DEFAULT_HISTOGRAM_BINS, value_parser = clap::value_parser!(u32).range(1..=200))]
    pub bins: u32,

    /// Output mode
    #[arg(long, default_value = "tui", value_parser = ["tui", "json"])]
    pub output: String,

    /// Display theme
    #[arg(long, default_value = "auto", value_parser = ["light", "dark", "classic", "auto"])]
    pub theme: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.provider-audit/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_program: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_program: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentile: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bins: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

impl LastUsedParams {
    /// Default path of the persisted file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// The config path rooted at `base_dir`.
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".provider-audit").join("last_used.json")
    }

    /// Load persisted params; `Default` when the file is absent or unreadable.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the file at `path` if it exists.
    pub fn clear_at(path: &Path) -> Result<()> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments, merge remembered values and persist the
    /// result if it is valid.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Parse `args`, fill every option not given on the command line from the
    /// params stored at `config_path`, then save the merged values back when
    /// they pass [`Settings::validate`].
    pub fn load_with_last_used_impl(args: Vec<std::ffi::OsString>, config_path: &Path) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(err) = LastUsedParams::clear_at(config_path) {
                tracing::warn!("Could not clear {}: {}", config_path.display(), err);
            }
            return settings.apply_debug();
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins.  clap ids are field names (underscores).
        if settings.input.is_none() {
            settings.input = last.input;
        }
        if !is_arg_explicitly_set(&matches, "view") {
            if let Some(v) = last.view {
                settings.view = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "first_program") {
            if let Some(v) = last.first_program {
                settings.first_program = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "second_program") {
            if let Some(v) = last.second_program {
                settings.second_program = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "program") {
            if let Some(v) = last.program {
                settings.program = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "percentile") {
            if let Some(v) = last.percentile {
                settings.percentile = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "bins") {
            if let Some(v) = last.bins {
                settings.bins = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "theme") {
            if let Some(v) = last.theme {
                settings.theme = v;
            }
        }

        match settings.validate() {
            Ok(()) => {
                let params = LastUsedParams::from(&settings);
                if let Err(err) = params.save_to(config_path) {
                    tracing::warn!("Could not persist settings to {}: {}", config_path.display(), err);
                }
            }
            Err(err) => tracing::debug!("Not persisting settings: {}", err),
        }

        settings.apply_debug()
    }

    /// Check the values clap cannot: a resolvable input and the numeric ranges.
    pub fn validate(&self) -> Result<()> {
        if self.input.is_none() {
            return Err(AuditError::Config(
                "no input given; pass --input <CSV file or directory>".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.percentile) {
            return Err(AuditError::Config(format!(
                "percentile must be within 0..=100, got {}",
                self.percentile
            )));
        }
        if self.bins == 0 {
            return Err(AuditError::Config("bins must be at least 1".to_string()));
        }
        self.analysis_view().map(|_| ())
    }

    /// The typed form of `--view`.
    pub fn analysis_view(&self) -> Result<AnalysisView> {
        self.view.parse()
    }

    /// `true` when results are printed as JSON instead of the terminal UI.
    pub fn json_output(&self) -> bool {
        self.output == "json"
    }

    fn apply_debug(mut self) -> Self {
        if self.debug {
            self.log_level = "DEBUG".to_string();
        }
        self
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            input: s.input.clone(),
            view: Some(s.view.clone()),
            first_program: Some(s.first_program.clone()),
            second_program: Some(s.second_program.clone()),
            program: Some(s.program.clone()),
            percentile: Some(s.percentile),
            bins: Some(s.bins),
            theme: Some(s.theme.clone()),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tmp_config_path(tmp: &TempDir) -> PathBuf {
        LastUsedParams::config_path_in(tmp.path())
    }

    fn args(list: &[&str]) -> Vec<std::ffi::OsString> {
        std::iter::once("provider-audit")
            .chain(list.iter().copied())
            .map(Into::into)
            .collect()
    }

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["provider-audit"]);

        assert!(settings.input.is_none());
        assert_eq!(settings.view, "summary");
        assert_eq!(settings.first_program, "APC1");
        assert_eq!(settings.second_program, "APC2");
        assert_eq!(settings.program, "APC2");
        assert!((settings.percentile - 95.0).abs() < f64::EPSILON);
        assert_eq!(settings.bins, 10);
        assert_eq!(settings.output, "tui");
        assert_eq!(settings.theme, "auto");
        assert_eq!(settings.log_level, "INFO");
        assert!(!settings.debug);
        assert!(!settings.clear);
    }

    #[test]
    fn test_settings_cli_parsing() {
        let settings = Settings::parse_from([
            "provider-audit",
            "--input",
            "/data/audits.csv",
            "--view",
            "new-providers",
            "--program",
            "APC1",
            "--output",
            "json",
        ]);
        assert_eq!(settings.input, Some(PathBuf::from("/data/audits.csv")));
        assert_eq!(settings.analysis_view().unwrap(), AnalysisView::NewProviders);
        assert_eq!(settings.program, "APC1");
        assert!(settings.json_output());
    }

    #[test]
    fn test_settings_rejects_unknown_view() {
        let result = Settings::try_parse_from(["provider-audit", "--view", "pie"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_rejects_zero_bins() {
        let result = Settings::try_parse_from(["provider-audit", "--bins", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_requires_input() {
        let settings = Settings::parse_from(["provider-audit"]);
        assert!(matches!(settings.validate(), Err(AuditError::Config(_))));
    }

    #[test]
    fn test_validate_percentile_range() {
        let mut settings = Settings::parse_from(["provider-audit", "--input", "a.csv"]);
        assert!(settings.validate().is_ok());
        settings.percentile = 101.0;
        assert!(matches!(settings.validate(), Err(AuditError::Config(_))));
        settings.percentile = -1.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_analysis_view_round_trip_names() {
        for view in AnalysisView::ALL {
            assert_eq!(view.as_str().parse::<AnalysisView>().unwrap(), view);
        }
        assert!("pie".parse::<AnalysisView>().is_err());
    }

    #[test]
    fn test_last_used_params_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        let params = LastUsedParams {
            input: Some(PathBuf::from("/data/audits.csv")),
            view: Some("trend".to_string()),
            percentile: Some(90.0),
            bins: Some(20),
            ..Default::default()
        };
        params.save_to(&path).expect("save");

        let loaded = LastUsedParams::load_from(&path);
        assert_eq!(loaded.input, Some(PathBuf::from("/data/audits.csv")));
        assert_eq!(loaded.view, Some("trend".to_string()));
        assert_eq!(loaded.percentile, Some(90.0));
        assert_eq!(loaded.bins, Some(20));
        assert!(loaded.theme.is_none());
    }

    #[test]
    fn test_last_used_params_default_when_missing() {
        let tmp = TempDir::new().expect("tempdir");
        let loaded = LastUsedParams::load_from(&tmp_config_path(&tmp));
        assert!(loaded.input.is_none());
        assert!(loaded.view.is_none());
    }

    #[test]
    fn test_last_used_params_default_when_corrupt() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();
        assert!(LastUsedParams::load_from(&path).view.is_none());
    }

    #[test]
    fn test_load_with_last_used_merges_persisted_values() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            input: Some(PathBuf::from("/data/q1.csv")),
            view: Some("outliers".to_string()),
            percentile: Some(80.0),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(args(&[]), &config_path);
        assert_eq!(settings.input, Some(PathBuf::from("/data/q1.csv")));
        assert_eq!(settings.view, "outliers");
        assert!((settings.percentile - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_with_last_used_cli_overrides_persisted() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            view: Some("outliers".to_string()),
            first_program: Some("APC3".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(
            args(&["--view", "overlap", "--first-program", "APC1"]),
            &config_path,
        );
        assert_eq!(settings.view, "overlap");
        assert_eq!(settings.first_program, "APC1");
    }

    #[test]
    fn test_load_with_last_used_persists_after_run() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        Settings::load_with_last_used_impl(
            args(&["--input", "/data/q2.csv", "--bins", "25"]),
            &config_path,
        );

        assert!(config_path.exists(), "config file must be persisted after run");
        let loaded = LastUsedParams::load_from(&config_path);
        assert_eq!(loaded.input, Some(PathBuf::from("/data/q2.csv")));
        assert_eq!(loaded.bins, Some(25));
    }

    #[test]
    fn test_load_with_last_used_does_not_persist_invalid_values() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            percentile: Some(80.0),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let rejected = Settings::load_with_last_used_impl(
            args(&["--input", "a.csv", "--percentile", "150"]),
            &config_path,
        );
        assert!(rejected.validate().is_err());
        assert_eq!(LastUsedParams::load_from(&config_path).percentile, Some(80.0));

        let next = Settings::load_with_last_used_impl(args(&["--input", "a.csv"]), &config_path);
        assert!((next.percentile - 80.0).abs() < f64::EPSILON);
        assert!(next.validate().is_ok());
    }

    #[test]
    fn test_load_with_last_used_clear_removes_file() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            theme: Some("classic".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(args(&["--clear"]), &config_path);

        assert!(!config_path.exists(), "file must be gone after --clear");
        assert_eq!(settings.theme, "auto");
    }

    #[test]
    fn test_load_with_last_used_debug_overrides_log_level() {
        let tmp = TempDir::new().expect("tempdir");
        let settings =
            Settings::load_with_last_used_impl(args(&["--debug"]), &tmp_config_path(&tmp));
        assert_eq!(settings.log_level, "DEBUG");
    }
}
