use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Level;

use super::error::CollectError;
use super::query::ClassQuery;

pub const DEFAULT_PERIOD: &str = "1s";
pub const DEFAULT_NAMESPACE: &str = "ROOT\\CIMV2";
pub const DEFAULT_CONFIG_FILE: &str = "wmibeat.yml";
pub const CONFIG_ENV_VAR: &str = "WMIBEAT_CONFIG";

/// Root of the YAML file. Everything lives under the `wmibeat:` key.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub wmibeat: WmibeatConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct WmibeatConfig {
    #[serde(default)]
    pub period: Option<String>,

    #[serde(default)]
    pub namespace: Option<String>,

    #[serde(default)]
    pub emit: EmitMode,

    #[serde(default)]
    pub on_error: ErrorPolicy,

    #[serde(default)]
    pub classes: Vec<ClassConfig>,
}

/// One monitored class as written in the file.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassConfig {
    pub class: String,

    #[serde(default)]
    pub fields: Vec<String>,

    #[serde(default)]
    pub whereclause: Option<String>,

    #[serde(default)]
    pub objecttitlecolumn: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmitMode {
    /// One event per cycle with every class nested under the `wmi` field.
    #[default]
    Cycle,
    /// One flat event per result row, tagged with its class.
    Row,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    #[default]
    Stop,
    Continue,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl ClassConfig {
    pub fn to_query(&self) -> ClassQuery {
        ClassQuery {
            class_name: self.class.clone(),
            fields: self.fields.clone(),
            where_clause: self.whereclause.clone().filter(|w| !w.is_empty()),
            title_field: self.objecttitlecolumn.clone().filter(|t| !t.is_empty()),
        }
    }
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Self, CollectError> {
        // An empty document deserializes to unit, not to an empty mapping.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| CollectError::config(e.to_string()))
    }

    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, CollectError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            CollectError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    pub fn class_queries(&self) -> Vec<ClassQuery> {
        self.wmibeat.classes.iter().map(ClassConfig::to_query).collect()
    }
}

/// Config path precedence: explicit flag, then `WMIBEAT_CONFIG`, then `./wmibeat.yml`.
pub fn resolve_config_path(flag: Option<&str>) -> PathBuf {
    if let Some(path) = flag {
        return PathBuf::from(path);
    }
    match std::env::var(CONFIG_ENV_VAR) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_CONFIG_FILE),
    }
}

/// Validated runtime settings derived from [`Config`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub period: Duration,
    pub namespace: String,
    pub emit: EmitMode,
    pub on_error: ErrorPolicy,
    pub log_level: Level,
}

impl Settings {
    pub fn resolve(config: &Config) -> Result<Self, CollectError> {
        let period = parse_period(config.wmibeat.period.as_deref())?;
        let namespace = config
            .wmibeat
            .namespace
            .clone()
            .filter(|ns| !ns.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        let log_level = parse_level(&config.logging.level)?;
        Ok(Self {
            period,
            namespace,
            emit: config.wmibeat.emit,
            on_error: config.wmibeat.on_error,
            log_level,
        })
    }
}

pub fn parse_period(raw: Option<&str>) -> Result<Duration, CollectError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => DEFAULT_PERIOD,
        Some(value) => value,
    };
    let period = humantime::parse_duration(raw)
        .map_err(|e| CollectError::config(format!("invalid period {:?}: {}", raw, e)))?;
    if period.is_zero() {
        return Err(CollectError::config(format!(
            "invalid period {:?}: must be greater than zero",
            raw
        )));
    }
    Ok(period)
}

fn parse_level(raw: &str) -> Result<Level, CollectError> {
    raw.trim()
        .parse::<Level>()
        .map_err(|_| CollectError::config(format!("unknown logging level {:?}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
wmibeat:
  period: 10s
  classes:
    - class: Win32_OperatingSystem
      fields:
        - FreePhysicalMemory
        - FreeSpaceInPagingFiles
    - class: Win32_PerfFormattedData_PerfDisk_LogicalDisk
      fields: [Name, FreeMegabytes, PercentFreeSpace]
      whereclause: Name != "_Total"
      objecttitlecolumn: Name
"#;

    #[test]
    fn parses_class_entries() {
        let config = Config::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.wmibeat.period.as_deref(), Some("10s"));
        assert_eq!(config.wmibeat.classes.len(), 2);

        let disk = &config.wmibeat.classes[1];
        assert_eq!(disk.class, "Win32_PerfFormattedData_PerfDisk_LogicalDisk");
        assert_eq!(disk.fields, vec!["Name", "FreeMegabytes", "PercentFreeSpace"]);
        assert_eq!(disk.whereclause.as_deref(), Some("Name != \"_Total\""));
        assert_eq!(disk.objecttitlecolumn.as_deref(), Some("Name"));
    }

    #[test]
    fn empty_strings_become_absent_in_queries() {
        let class = ClassConfig {
            class: "Win32_Process".into(),
            fields: vec!["Name".into()],
            whereclause: Some(String::new()),
            objecttitlecolumn: Some(String::new()),
        };
        let query = class.to_query();
        assert!(query.where_clause.is_none());
        assert!(query.title_field.is_none());
    }

    #[test]
    fn defaults_apply_when_keys_absent() {
        let config = Config::from_yaml("wmibeat:\n  classes: []\n").unwrap();
        let settings = Settings::resolve(&config).unwrap();
        assert_eq!(settings.period, Duration::from_secs(1));
        assert_eq!(settings.namespace, DEFAULT_NAMESPACE);
        assert_eq!(settings.emit, EmitMode::Cycle);
        assert_eq!(settings.on_error, ErrorPolicy::Stop);
        assert_eq!(settings.log_level, Level::INFO);
    }

    #[test]
    fn empty_document_is_default_config() {
        let config = Config::from_yaml("  \n").unwrap();
        assert!(config.wmibeat.classes.is_empty());
        assert!(config.output.file.is_none());
    }

    #[test]
    fn period_accepts_go_style_durations() {
        assert_eq!(parse_period(Some("10s")).unwrap(), Duration::from_secs(10));
        assert_eq!(parse_period(Some("5m")).unwrap(), Duration::from_secs(300));
        assert_eq!(
            parse_period(Some("500ms")).unwrap(),
            Duration::from_millis(500)
        );
        assert_eq!(parse_period(Some("")).unwrap(), Duration::from_secs(1));
        assert_eq!(parse_period(None).unwrap(), Duration::from_secs(1));
    }

    #[test]
    fn unparsable_period_is_configuration_error() {
        let err = parse_period(Some("every so often")).unwrap_err();
        assert!(matches!(err, CollectError::Configuration(_)));
        assert!(err.to_string().contains("every so often"));
    }

    #[test]
    fn zero_period_is_rejected() {
        assert!(matches!(
            parse_period(Some("0s")),
            Err(CollectError::Configuration(_))
        ));
    }

    #[test]
    fn supplementary_keys_parse() {
        let yaml = r#"
wmibeat:
  namespace: ROOT\StandardCimv2
  emit: row
  on_error: continue
output:
  file: /var/log/wmibeat/events.json
logging:
  level: debug
"#;
        let config = Config::from_yaml(yaml).unwrap();
        let settings = Settings::resolve(&config).unwrap();
        assert_eq!(settings.namespace, "ROOT\\StandardCimv2");
        assert_eq!(settings.emit, EmitMode::Row);
        assert_eq!(settings.on_error, ErrorPolicy::Continue);
        assert_eq!(settings.log_level, Level::DEBUG);
        assert_eq!(
            config.output.file,
            Some(PathBuf::from("/var/log/wmibeat/events.json"))
        );
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let config = Config::from_yaml("logging:\n  level: chatty\n").unwrap();
        assert!(matches!(
            Settings::resolve(&config),
            Err(CollectError::Configuration(_))
        ));
    }

    #[test]
    fn malformed_yaml_is_configuration_error() {
        let err = Config::from_yaml("wmibeat: [unclosed").unwrap_err();
        assert!(matches!(err, CollectError::Configuration(_)));
    }

    #[test]
    fn explicit_config_flag_wins() {
        assert_eq!(
            resolve_config_path(Some("/etc/wmibeat/custom.yml")),
            PathBuf::from("/etc/wmibeat/custom.yml")
        );
    }

    #[tokio::test]
    async fn load_missing_file_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("absent.yml")).await.unwrap_err();
        assert!(matches!(err, CollectError::Configuration(_)));
    }

    #[tokio::test]
    async fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wmibeat.yml");
        std::fs::write(&path, SAMPLE).unwrap();
        let config = Config::load(&path).await.unwrap();
        assert_eq!(config.class_queries().len(), 2);
    }
}
