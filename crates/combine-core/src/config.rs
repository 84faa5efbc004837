// Engine configuration: physical constants, processing toggles, audit limits,
// and loading of `config/combine.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Constants bag
// ---------------------------------------------------------------------------

/// Named scalars used by every unit conversion and kinematic formula.
///
/// Keys mirror the canonical constants table (`LB_TO_KG`, `TEN_YD_M`, ...).
/// Each key falls back to its default individually, so a document may
/// override only the constants it cares about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct Constants {
    pub lb_to_kg: f64,
    pub in_to_cm: f64,
    pub ten_yd_m: f64,
    pub twenty_yd_m: f64,
    /// Gravitational acceleration, m/s^2.
    pub g: f64,
    pub sayers_a: f64,
    pub sayers_b: f64,
    pub sayers_c: f64,
    pub mps_to_mph: f64,
}

impl Default for Constants {
    fn default() -> Self {
        Constants {
            lb_to_kg: 0.45359237,
            in_to_cm: 2.54,
            ten_yd_m: 9.144,
            twenty_yd_m: 18.288,
            g: 9.80665,
            sayers_a: 60.7,
            sayers_b: 45.3,
            sayers_c: -2055.0,
            mps_to_mph: 2.236936,
        }
    }
}

// ---------------------------------------------------------------------------
// Processing options
// ---------------------------------------------------------------------------

/// Caller toggles for a single pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessOptions {
    /// Scale grade thresholds by the athlete's school grade.
    pub age_adjusted: bool,
    /// Scale grade thresholds by the athlete's weight and height band.
    pub body_adjusted: bool,
    /// Compute like-to-like cohort percentiles.
    pub cohort_mode: bool,
}

// ---------------------------------------------------------------------------
// Audit limits
// ---------------------------------------------------------------------------

/// Plausibility limits applied by the data-quality audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditLimits {
    pub min_weight_lb: f64,
    pub max_weight_lb: f64,
    pub min_height_in: f64,
    pub max_height_in: f64,
    pub min_forty_s: f64,
    pub max_forty_s: f64,
    /// Squat / bodyweight below this is suspicious (likely a unit or entry slip).
    pub min_squat_ratio: f64,
    pub max_bench_ratio: f64,
    pub max_squat_ratio: f64,
    pub max_vert_in: f64,
}

impl Default for AuditLimits {
    fn default() -> Self {
        AuditLimits {
            min_weight_lb: 70.0,
            max_weight_lb: 400.0,
            min_height_in: 48.0,
            max_height_in: 88.0,
            min_forty_s: 4.0,
            max_forty_s: 9.0,
            min_squat_ratio: 0.5,
            max_bench_ratio: 2.5,
            max_squat_ratio: 3.5,
            max_vert_in: 46.0,
        }
    }
}

// ---------------------------------------------------------------------------
// combine.toml
// ---------------------------------------------------------------------------

/// Optional override files for the reference data.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DataOverrides {
    pub standards: Option<String>,
    pub positions: Option<String>,
}

/// Everything read from `config/combine.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub constants: Constants,
    pub options: ProcessOptions,
    pub audit: AuditLimits,
    pub data: DataOverrides,
}

const CONFIG_FILE: &str = "combine.toml";

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/combine.toml` relative to `base_dir`.
///
/// Does not copy defaults; prefer `load_config()` for normal startup.
pub fn load_config_from(base_dir: &Path) -> Result<EngineConfig, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let config: EngineConfig = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Load config relative to the current working directory, copying defaults
/// first.
pub fn load_config() -> Result<EngineConfig, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validation failures in a constants bag as `(field, message)` pairs.
/// Every constant must be finite; all but `SAYERS_C` must also be positive.
pub fn constant_errors(c: &Constants) -> Vec<(&'static str, String)> {
    let positive: [(&'static str, f64); 8] = [
        ("constants.LB_TO_KG", c.lb_to_kg),
        ("constants.IN_TO_CM", c.in_to_cm),
        ("constants.TEN_YD_M", c.ten_yd_m),
        ("constants.TWENTY_YD_M", c.twenty_yd_m),
        ("constants.G", c.g),
        ("constants.SAYERS_A", c.sayers_a),
        ("constants.SAYERS_B", c.sayers_b),
        ("constants.MPS_TO_MPH", c.mps_to_mph),
    ];
    let mut errors: Vec<(&'static str, String)> = positive
        .into_iter()
        .filter(|(_, val)| !val.is_finite() || *val <= 0.0)
        .map(|(name, val)| (name, format!("must be a finite number > 0, got {val}")))
        .collect();
    if !c.sayers_c.is_finite() {
        errors.push((
            "constants.SAYERS_C",
            format!("must be finite, got {}", c.sayers_c),
        ));
    }
    errors
}

fn validate(config: &EngineConfig) -> Result<(), ConfigError> {
    if let Some((field, message)) = constant_errors(&config.constants).into_iter().next() {
        return Err(ConfigError::ValidationError {
            field: field.to_string(),
            message,
        });
    }

    let a = &config.audit;
    let ranges: &[(&str, f64, f64)] = &[
        ("audit.weight", a.min_weight_lb, a.max_weight_lb),
        ("audit.height", a.min_height_in, a.max_height_in),
        ("audit.forty", a.min_forty_s, a.max_forty_s),
    ];
    for (name, lo, hi) in ranges {
        if lo >= hi {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: format!("minimum {lo} must be below maximum {hi}"),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Locate the workspace root holding `defaults/` (cargo runs crate tests
    /// from the crate directory).
    fn project_root() -> PathBuf {
        let cwd = std::env::current_dir().unwrap();
        if cwd.join("defaults").exists() {
            cwd
        } else if cwd.join("../../defaults").exists() {
            cwd.join("../..")
        } else {
            panic!("Cannot locate defaults/ directory from CWD {:?}", cwd);
        }
    }

    fn fresh_dir(name: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        tmp
    }

    #[test]
    fn load_valid_config_from_defaults() {
        let tmp = fresh_dir("combine_config_defaults");
        let root = project_root();
        fs::copy(
            root.join("defaults/combine.toml"),
            tmp.join("config/combine.toml"),
        )
        .unwrap();

        let config = load_config_from(&tmp).expect("should load default config");
        assert_eq!(config.constants, Constants::default());
        assert!(!config.options.age_adjusted);
        assert!(!config.options.body_adjusted);
        assert!(!config.options.cohort_mode);
        assert_eq!(config.audit, AuditLimits::default());
        assert!(config.data.standards.is_none());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn partial_constants_fall_back_to_defaults() {
        let tmp = fresh_dir("combine_config_partial");
        fs::write(
            tmp.join("config/combine.toml"),
            "[constants]\nLB_TO_KG = 0.4536\n\n[options]\ncohort_mode = true\n",
        )
        .unwrap();

        let config = load_config_from(&tmp).unwrap();
        assert!((config.constants.lb_to_kg - 0.4536).abs() < f64::EPSILON);
        assert!((config.constants.ten_yd_m - 9.144).abs() < f64::EPSILON);
        assert!(config.options.cohort_mode);
        assert!(!config.options.age_adjusted);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_distance_constant() {
        let tmp = fresh_dir("combine_config_zero_distance");
        fs::write(tmp.join("config/combine.toml"), "[constants]\nTEN_YD_M = 0.0\n").unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "constants.TEN_YD_M");
            }
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn constant_errors_lists_every_bad_field() {
        assert!(constant_errors(&Constants::default()).is_empty());

        let c = Constants {
            ten_yd_m: 0.0,
            g: f64::NAN,
            sayers_c: f64::INFINITY,
            ..Constants::default()
        };
        let fields: Vec<&str> = constant_errors(&c).into_iter().map(|(f, _)| f).collect();
        assert_eq!(
            fields,
            vec!["constants.TEN_YD_M", "constants.G", "constants.SAYERS_C"]
        );

        // Negative intercept is the normal case.
        let c = Constants {
            sayers_c: -3000.0,
            ..Constants::default()
        };
        assert!(constant_errors(&c).is_empty());
    }

    #[test]
    fn rejects_inverted_audit_range() {
        let tmp = fresh_dir("combine_config_audit_range");
        fs::write(
            tmp.join("config/combine.toml"),
            "[audit]\nmin_forty_s = 9.5\nmax_forty_s = 4.0\n",
        )
        .unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "audit.forty"),
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_not_found_for_missing_config() {
        let tmp = fresh_dir("combine_config_missing");

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::FileNotFound { path } => assert!(path.ends_with("combine.toml")),
            other => panic!("expected FileNotFound, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = fresh_dir("combine_config_invalid");
        fs::write(tmp.join("config/combine.toml"), "this is not valid [[[ toml").unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_and_skips_examples() {
        let tmp = std::env::temp_dir().join("combine_config_ensure");
        let _ = fs::remove_dir_all(&tmp);
        let defaults_dir = tmp.join("defaults");
        fs::create_dir_all(&defaults_dir).unwrap();

        let root = project_root();
        fs::copy(root.join("defaults/combine.toml"), defaults_dir.join("combine.toml")).unwrap();
        fs::write(defaults_dir.join("standards.toml.example"), "# sample\n").unwrap();

        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert_eq!(copied.len(), 1);
        assert!(tmp.join("config/combine.toml").exists());
        assert!(!tmp.join("config/standards.toml.example").exists());

        // Second run leaves the existing file alone.
        fs::write(tmp.join("config/combine.toml"), "# custom\n").unwrap();
        let copied = ensure_config_files(&tmp).unwrap();
        assert!(copied.is_empty());
        let content = fs::read_to_string(tmp.join("config/combine.toml")).unwrap();
        assert_eq!(content, "# custom\n");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_errors_when_both_dirs_missing() {
        let tmp = std::env::temp_dir().join("combine_config_both_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        let err = ensure_config_files(&tmp).unwrap_err();
        match &err {
            ConfigError::DefaultsCopyError { message } => {
                assert!(message.contains("neither defaults/ nor config/"));
            }
            other => panic!("expected DefaultsCopyError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }
}
