use std::{path::Path, str::FromStr};

use anyhow::bail;
use indoc::indoc;
use serde::Deserialize;
use serde_dynamic_string::DynamicString;
use std::fmt::Write;
use toml::Value;

use crate::Config;

/// Fields that are dropped instead of failing the load when their environment variable is unset.
const OPTIONAL_ENV_FIELDS: &[&str] = &["completion.api_key", "completion.base_url"];

fn is_optional_env_field(path: &str) -> bool {
    OPTIONAL_ENV_FIELDS.iter().any(|&field| path == field)
}

/// Check if the error is specifically about a missing environment variable
fn is_missing_env_var_error<E: std::fmt::Display>(err: &E) -> bool {
    let err_str = err.to_string().to_lowercase();
    err_str.contains("environment variable not found")
        || err_str.contains("env var")
        || (err_str.contains("variable") && err_str.contains("not found"))
}

/// Extract the path from an error message like "Failed to expand dynamic string at path 'path': error"
fn extract_path_from_error(error_message: &str) -> Option<&str> {
    let start = error_message.find("path '")? + 6;
    let end = error_message[start..].find("':")?;

    Some(&error_message[start..start + end])
}

/// Remove a field from the TOML configuration by dotted path
fn remove_field_from_config(config: &mut Value, path: &str) {
    let Some((parents, key)) = path.rsplit_once('.') else {
        if let Some(table) = config.as_table_mut() {
            table.remove(path);
        }
        return;
    };

    let mut current = config;

    for part in parents.split('.') {
        match current.as_table_mut().and_then(|table| table.get_mut(part)) {
            Some(value) => current = value,
            None => return,
        }
    }

    if let Some(table) = current.as_table_mut() {
        table.remove(key);
        log::debug!("Removed optional field '{path}' due to missing environment variable");
    }
}

pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let path = path.as_ref().to_path_buf();
    let content = std::fs::read_to_string(&path)?;

    from_toml_str(&content)
}

pub(crate) fn from_toml_str(content: &str) -> anyhow::Result<Config> {
    let mut raw_config: Value = toml::from_str(content)?;

    // Every retry removes one field, so this terminates.
    loop {
        let Err(err) = expand_dynamic_strings(&mut Vec::new(), &mut raw_config) else {
            break;
        };

        let message = err.to_string();

        match extract_path_from_error(&message) {
            Some(path) if is_optional_env_field(path) && is_missing_env_var_error(&err) => {
                remove_field_from_config(&mut raw_config, path);
            }
            _ => return Err(err),
        }
    }

    let config = Config::deserialize(raw_config)?;
    validate_routes(&config)?;

    if !config.completion.has_api_key() {
        log::debug!("No API key in the configuration file, expecting one from the environment");
    }

    Ok(config)
}

pub(crate) fn validate_routes(config: &Config) -> anyhow::Result<()> {
    let listing_path = config.listing.path.as_ref();
    let health = &config.server.health;

    if !listing_path.starts_with('/') {
        bail!("The listing path must start with '/', got '{listing_path}'");
    }

    if health.enabled && !health.path.starts_with('/') {
        bail!("The health path must start with '/', got '{}'", health.path);
    }

    if health.enabled && health.path == config.listing.path {
        bail!(indoc! {r#"
            The listing endpoint and the health endpoint cannot share a path.

            Either move the listing endpoint:

              [listing]
              path = "/generate-listing"

            or disable the health endpoint:

              [server.health]
              enabled = false
        "#});
    }

    if config.completion.timeout.is_zero() {
        bail!("The completion timeout must be greater than zero");
    }

    Ok(())
}

fn expand_dynamic_strings<'a>(path: &mut Vec<Result<&'a str, usize>>, value: &'a mut Value) -> anyhow::Result<()> {
    match value {
        Value::String(s) => match DynamicString::<String>::from_str(s) {
            Ok(out) => *s = out.into_inner(),
            Err(err) => {
                let mut p = String::new();
                for segment in path {
                    match segment {
                        Ok(s) => {
                            p.push_str(s);
                            p.push('.');
                        }
                        Err(i) => write!(p, "[{i}]")?,
                    }
                }
                if p.ends_with('.') {
                    p.pop();
                }

                bail!("Failed to expand dynamic string at path '{p}': {err}");
            }
        },
        Value::Array(values) => {
            for (i, value) in values.iter_mut().enumerate() {
                path.push(Err(i));
                expand_dynamic_strings(path, value)?;
                path.pop();
            }
        }
        Value::Table(map) => {
            for (key, value) in map {
                path.push(Ok(key.as_str()));
                expand_dynamic_strings(path, value)?;
                path.pop();
            }
        }
        Value::Integer(_) | Value::Float(_) | Value::Boolean(_) | Value::Datetime(_) => (),
    }

    Ok(())
}
