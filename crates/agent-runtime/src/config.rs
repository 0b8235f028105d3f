//! Layered configuration support: defaults, environment variable
//! expansion inside TOML/instance values, and secret-key heuristics.

use anyhow::{Context, Result};

/// Expand environment variable references in a string.
///
/// Supports formats:
/// - `${VAR}` - Required env var, errors if not set
/// - `${VAR:-default}` - With default value
/// - `${VAR:?error message}` - Required with custom error
pub fn expand_env_vars(input: &str) -> Result<String> {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut var_expr = String::new();
            let mut depth = 1;

            for c in chars.by_ref() {
                if c == '{' {
                    depth += 1;
                    var_expr.push(c);
                } else if c == '}' {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    var_expr.push(c);
                } else {
                    var_expr.push(c);
                }
            }

            let value = if let Some(pos) = var_expr.find(":-") {
                let var_name = &var_expr[..pos];
                let default_value = &var_expr[pos + 2..];
                std::env::var(var_name).unwrap_or_else(|_| default_value.to_string())
            } else if let Some(pos) = var_expr.find(":?") {
                let var_name = &var_expr[..pos];
                let error_msg = &var_expr[pos + 2..];
                std::env::var(var_name)
                    .with_context(|| format!("Environment variable {} not set: {}", var_name, error_msg))?
            } else {
                std::env::var(&var_expr)
                    .with_context(|| format!("Environment variable {} not set", var_expr))?
            };

            result.push_str(&value);
        } else {
            result.push(c);
        }
    }

    Ok(result)
}

/// Heuristic for whether a configuration key names a secret and should be
/// routed through the keyring rather than stored as plain config.
pub fn is_likely_secret(key: &str) -> bool {
    let key_lower = key.to_lowercase();
    key_lower.contains("secret")
        || key_lower.contains("password")
        || key_lower.contains("token")
        || key_lower.contains("key")
        || key_lower.contains("credential")
        || key_lower.contains("auth")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("TEST_VAR", "hello");

        assert_eq!(expand_env_vars("${TEST_VAR}").unwrap(), "hello");
        assert_eq!(expand_env_vars("prefix_${TEST_VAR}_suffix").unwrap(), "prefix_hello_suffix");
        assert_eq!(expand_env_vars("${MISSING:-default}").unwrap(), "default");
        assert!(expand_env_vars("${MISSING}").is_err());
        assert!(expand_env_vars("${MISSING:?custom error}").is_err());

        std::env::remove_var("TEST_VAR");
    }

    #[test]
    fn test_is_likely_secret() {
        assert!(is_likely_secret("api_key"));
        assert!(is_likely_secret("AWS_SECRET_ACCESS_KEY"));
        assert!(is_likely_secret("password"));
        assert!(is_likely_secret("auth_token"));
        assert!(!is_likely_secret("region"));
        assert!(!is_likely_secret("bucket_name"));
    }
}
