//! Entity type name to table name conversion.

use once_cell::sync::Lazy;
use regex::Regex;

static ACRONYM_BOUNDARY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("valid acronym regex"));
static WORD_BOUNDARY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z\d])([A-Z])").expect("valid word boundary regex"));

/// Converts a CamelCase type name into its snake_case table name.
///
/// `AlertConfig` -> `alert_config`, `HTTPRequestLog` -> `http_request_log`.
pub fn table_name(type_name: &str) -> String {
    let split_acronyms = ACRONYM_BOUNDARY_RE.replace_all(type_name, "${1}_${2}");
    let split_words = WORD_BOUNDARY_RE.replace_all(&split_acronyms, "${1}_${2}");
    split_words.replace('-', "_").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::table_name;

    #[test]
    fn camel_case_becomes_snake_case() {
        assert_eq!(table_name("AaaBbbCcc"), "aaa_bbb_ccc");
        assert_eq!(table_name("DdFf"), "dd_ff");
        assert_eq!(table_name("ConfiguredFilter"), "configured_filter");
    }

    #[test]
    fn acronyms_and_digits_are_split_once() {
        assert_eq!(table_name("HTTPRequestLog"), "http_request_log");
        assert_eq!(table_name("Covid19Center"), "covid19_center");
        assert_eq!(table_name("state"), "state");
    }
}
