//! Naming helpers shared by translators

use once_cell::sync::Lazy;
use regex::Regex;

static NON_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid service name pattern"));

static NON_ENV_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Z0-9]+").expect("valid env var pattern"));

/// Compose-safe service name: lowercase alphanumerics separated by single dashes
pub fn service_name(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let slug = NON_NAME_CHARS
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string();

    if slug.is_empty() {
        "service".to_string()
    } else {
        slug
    }
}

/// Environment variable name derived from an arbitrary label
pub fn env_var_name(raw: &str) -> String {
    let upper = raw.to_uppercase();
    let name = NON_ENV_CHARS
        .replace_all(&upper, "_")
        .trim_matches('_')
        .to_string();

    match name.chars().next() {
        None => "VALUE".to_string(),
        Some(c) if c.is_ascii_digit() => format!("_{}", name),
        Some(_) => name,
    }
}

/// Heuristic: variables named like credentials are treated as secrets
pub fn is_secret_key(key: &str) -> bool {
    let upper = key.to_uppercase();
    ["SECRET", "PASSWORD", "TOKEN", "KEY", "CREDENTIAL"]
        .iter()
        .any(|marker| upper.contains(marker))
}

/// Compose interpolation reference to a variable supplied via `.env`
pub fn env_reference(name: &str) -> String {
    format!("${{{}}}", name)
}
