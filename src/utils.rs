use chrono::{Datelike, NaiveDate};
use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Profile mode for the application (dev or prod)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Dev,
    Prod,
}

impl Profile {
    fn app_name(self) -> &'static str {
        match self {
            Profile::Dev => "planner-dev",
            Profile::Prod => "planner",
        }
    }
}

/// Get the configuration directory path for the planner
/// If profile is Dev, uses "planner-dev" instead of "planner"
pub fn get_config_dir(profile: Profile) -> Option<PathBuf> {
    // On macOS this lands in ~/Library/Application Support/<app>/
    ProjectDirs::from("com", "planner", profile.app_name())
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the data directory path for the planner
pub fn get_data_dir(profile: Profile) -> Option<PathBuf> {
    ProjectDirs::from("com", "planner", profile.app_name())
        .map(|dirs| dirs.data_dir().to_path_buf())
}

/// Expand `~` in a path string to the user's home directory
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Parse a date string in ISO 8601 format (YYYY-MM-DD)
pub fn parse_date(date_str: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
}

/// Format a date the way it is stored: zero-padded, fixed width
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Format the month key of a date (YYYY-MM)
pub fn format_month(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Stored timestamp layout: fixed width, so stored values order lexically
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub fn format_timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Latest instant that formats with a four-digit year. Later instants would
/// break lexical ordering of stored timestamps.
pub fn max_timestamp() -> chrono::DateTime<chrono::Utc> {
    NaiveDate::from_ymd_opt(9999, 12, 31)
        .and_then(|date| date.and_hms_opt(23, 59, 59))
        .map(|at| at.and_utc())
        .unwrap_or(chrono::DateTime::<chrono::Utc>::MAX_UTC)
}

/// Current UTC timestamp, RFC 3339 with second precision
pub fn now_timestamp() -> String {
    format_timestamp(chrono::Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_path_leaves_plain_paths_alone() {
        assert_eq!(expand_path("/tmp/planner.db"), PathBuf::from("/tmp/planner.db"));
        assert_eq!(expand_path("relative/x"), PathBuf::from("relative/x"));
    }

    #[test]
    fn format_helpers_zero_pad() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert_eq!(format_date(date), "2026-03-09");
        assert_eq!(format_month(date), "2026-03");
    }

    #[test]
    fn max_timestamp_keeps_four_digit_year() {
        assert_eq!(format_timestamp(max_timestamp()), "9999-12-31T23:59:59Z");
    }

    #[test]
    fn dev_and_prod_profiles_use_separate_dirs() {
        let dev = get_config_dir(Profile::Dev);
        let prod = get_config_dir(Profile::Prod);
        if let (Some(dev), Some(prod)) = (dev, prod) {
            assert_ne!(dev, prod);
        }
    }
}
