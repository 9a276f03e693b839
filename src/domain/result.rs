//! Result type alias for GeoMigrate

use super::errors::GeoMigrateError;

/// Result type alias for GeoMigrate operations
///
/// # Examples
///
/// ```
/// use geomigrate::domain::result::Result;
/// use geomigrate::domain::errors::GeoMigrateError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(GeoMigrateError::Configuration("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, GeoMigrateError>;
