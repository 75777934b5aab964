/// Application-level constants
pub const APP_NAME: &str = "redflag";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Env var holding the tracing filter. Falls back to `RUST_LOG`.
pub const LOG_ENV: &str = "REDFLAG_LOG";

/// Env var overriding the section delimiter length (count of spaces).
pub const SECTION_DELIMITER_LEN_ENV: &str = "REDFLAG_SECTION_DELIMITER_LEN";

/// Env var overriding the minimum whitespace run that separates sentences.
pub const SENTENCE_MIN_WS_ENV: &str = "REDFLAG_SENTENCE_MIN_WS";

/// Default tracing filter when neither `REDFLAG_LOG` nor `RUST_LOG` is set.
pub fn default_log_filter() -> &'static str {
    if is_dev() {
        "redflag_lib=debug,redflag=debug"
    } else {
        "redflag_lib=info,redflag=info"
    }
}

/// Debug builds log at debug level by default.
pub fn is_dev() -> bool {
    cfg!(debug_assertions)
}

/// Read a positive integer override from the environment.
///
/// Unset, empty, zero or unparseable values are ignored.
pub fn env_usize(name: &str) -> Option<usize> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<usize>() {
        Ok(0) => None,
        Ok(n) => Some(n),
        Err(_) => {
            tracing::warn!(var = name, "Ignoring non-numeric environment override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_name_is_redflag() {
        assert_eq!(APP_NAME, "redflag");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn default_filter_targets_crate() {
        assert!(default_log_filter().contains("redflag_lib="));
    }

    #[test]
    fn env_usize_ignores_missing_var() {
        assert_eq!(env_usize("REDFLAG_TEST_VAR_THAT_IS_NEVER_SET"), None);
    }
}
