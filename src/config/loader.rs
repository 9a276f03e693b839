//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::GeoMigrateConfig;
use super::secret::secret_string;
use crate::domain::errors::GeoMigrateError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// File looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "geomigrate.toml";

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into GeoMigrateConfig
/// 4. Applies environment variable overrides (GEOMIGRATE_* prefix and DB_URL)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use geomigrate::config::loader::load_config;
///
/// let config = load_config("geomigrate.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<GeoMigrateConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(GeoMigrateError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        GeoMigrateError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let config: GeoMigrateConfig = toml::from_str(&contents)?;

    finish(config)
}

/// Resolves the configuration for a run
///
/// An explicit path must exist. Without one, `geomigrate.toml` in the working
/// directory is used when present; otherwise the built-in defaults are taken
/// and completed from the environment, which is how a bare `DB_URL` setup runs.
pub fn resolve_config(path: Option<&Path>) -> Result<GeoMigrateConfig> {
    match path {
        Some(path) => load_config(path),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => load_config(DEFAULT_CONFIG_FILE),
        None => load_from_env(),
    }
}

/// Builds a configuration from defaults plus environment overrides only
pub fn load_from_env() -> Result<GeoMigrateConfig> {
    finish(GeoMigrateConfig::default())
}

fn finish(mut config: GeoMigrateConfig) -> Result<GeoMigrateConfig> {
    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        GeoMigrateError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied through untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| GeoMigrateError::Configuration(format!("Invalid placeholder pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        let trimmed = line.trim_start();

        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(GeoMigrateError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(val) => val.trim().parse().map(Some).map_err(|_| {
            GeoMigrateError::Configuration(format!("Invalid value '{val}' for {name}"))
        }),
        Err(_) => Ok(None),
    }
}

/// Applies environment variable overrides
///
/// Variables follow the pattern GEOMIGRATE_<SECTION>_<KEY>, for example
/// GEOMIGRATE_MIGRATION_WORKERS. `DB_URL` sets the destination connection
/// string and loses to GEOMIGRATE_DESTINATION_CONNECTION_STRING.
fn apply_env_overrides(config: &mut GeoMigrateConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("GEOMIGRATE_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Some(dry_run) = parse_env("GEOMIGRATE_APPLICATION_DRY_RUN")? {
        config.application.dry_run = dry_run;
    }

    // Source overrides
    if let Ok(val) = std::env::var("GEOMIGRATE_SOURCE_PATH") {
        config.source.path = val;
    }

    // Destination overrides
    if let Ok(val) = std::env::var("DB_URL") {
        config.destination.connection_string = secret_string(val);
    }
    if let Ok(val) = std::env::var("GEOMIGRATE_DESTINATION_CONNECTION_STRING") {
        config.destination.connection_string = secret_string(val);
    }
    if let Some(max) = parse_env("GEOMIGRATE_DESTINATION_MAX_CONNECTIONS")? {
        config.destination.max_connections = max;
    }
    if let Some(secs) = parse_env("GEOMIGRATE_DESTINATION_CONNECTION_TIMEOUT_SECONDS")? {
        config.destination.connection_timeout_seconds = secs;
    }
    if let Some(secs) = parse_env("GEOMIGRATE_DESTINATION_STATEMENT_TIMEOUT_SECONDS")? {
        config.destination.statement_timeout_seconds = secs;
    }
    if let Ok(val) = std::env::var("GEOMIGRATE_DESTINATION_SSL_MODE") {
        config.destination.ssl_mode = val;
    }

    // Migration overrides
    if let Some(multiplier) = parse_env("GEOMIGRATE_MIGRATION_WORKER_MULTIPLIER")? {
        config.migration.worker_multiplier = multiplier;
    }
    if let Some(workers) = parse_env("GEOMIGRATE_MIGRATION_WORKERS")? {
        config.migration.workers = Some(workers);
    }
    if let Some(factor) = parse_env("GEOMIGRATE_MIGRATION_RELAY_CAPACITY_FACTOR")? {
        config.migration.relay_capacity_factor = factor;
    }
    if let Ok(val) = std::env::var("GEOMIGRATE_MIGRATION_ORPHAN_CITIES") {
        config.migration.orphan_cities = val.parse().map_err(GeoMigrateError::Configuration)?;
    }

    // Logging overrides
    if let Some(enabled) = parse_env("GEOMIGRATE_LOGGING_LOCAL_ENABLED")? {
        config.logging.local_enabled = enabled;
    }
    if let Ok(val) = std::env::var("GEOMIGRATE_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("GEOMIGRATE_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}
