//! Small pure helpers: TTL string parsing and permission key templating.

use chrono::Duration;
use std::collections::HashMap;

use crate::error::AuthzError;

/// Parse a time-to-live string like `"30s"`, `"15m"`, `"12h"` or `"7d"`.
pub fn parse_ttl(value: &str) -> Result<Duration, AuthzError> {
    let value = value.trim();
    if value.len() < 2 {
        return Err(AuthzError::invalid_input(format!(
            "invalid ttl '{}': expected <number><s|m|h|d>",
            value
        )));
    }

    let (amount, unit) = value.split_at(value.len() - 1);
    let amount: i64 = amount.parse().map_err(|_| {
        AuthzError::invalid_input(format!("invalid ttl '{}': '{}' is not a number", value, amount))
    })?;
    if amount <= 0 {
        return Err(AuthzError::invalid_input(format!(
            "invalid ttl '{}': must be positive",
            value
        )));
    }

    match unit {
        "s" => Ok(Duration::seconds(amount)),
        "m" => Ok(Duration::minutes(amount)),
        "h" => Ok(Duration::hours(amount)),
        "d" => Ok(Duration::days(amount)),
        _ => Err(AuthzError::invalid_input(format!(
            "invalid ttl '{}': unknown unit '{}'",
            value, unit
        ))),
    }
}

/// Expand `{placeholder}` segments in a permission key template.
///
/// Boundary layers use templated keys like `"roles:{type}:create"`; the
/// resolver only ever sees fully-resolved keys, so an unresolved placeholder
/// is an error here, not a deny later.
pub fn expand_permission_key(
    template: &str,
    vars: &HashMap<&str, &str>,
) -> Result<String, AuthzError> {
    let mut expanded = template.to_string();
    for (name, value) in vars {
        expanded = expanded.replace(&format!("{{{}}}", name), value);
    }

    if expanded.contains('{') || expanded.contains('}') {
        return Err(AuthzError::invalid_input(format!(
            "unresolved placeholder in permission key template '{}'",
            template
        )));
    }
    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_unit() {
        assert_eq!(parse_ttl("30s").unwrap(), Duration::seconds(30));
        assert_eq!(parse_ttl("15m").unwrap(), Duration::minutes(15));
        assert_eq!(parse_ttl("12h").unwrap(), Duration::hours(12));
        assert_eq!(parse_ttl("7d").unwrap(), Duration::days(7));
    }

    #[test]
    fn rejects_malformed_ttls() {
        for bad in ["", "m", "15", "-5m", "0d", "15w", "abcm"] {
            assert!(parse_ttl(bad).is_err(), "'{}' should be rejected", bad);
        }
    }

    #[test]
    fn expands_placeholders() {
        let vars = HashMap::from([("type", "team")]);
        assert_eq!(
            expand_permission_key("roles:{type}:create", &vars).unwrap(),
            "roles:team:create"
        );
    }

    #[test]
    fn unresolved_placeholder_is_an_error() {
        let vars = HashMap::new();
        assert!(expand_permission_key("roles:{type}:create", &vars).is_err());
    }

    #[test]
    fn plain_keys_pass_through() {
        let vars = HashMap::new();
        assert_eq!(
            expand_permission_key("example:read", &vars).unwrap(),
            "example:read"
        );
    }
}
