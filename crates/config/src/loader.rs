use std::{path::Path, str::FromStr};

use anyhow::bail;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_dynamic_string::DynamicString;
use std::fmt::Write;
use toml::Value;

use crate::Config;

pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let mut raw_config: Value = toml::from_str(&content)?;

    expand_dynamic_strings(&mut Vec::new(), &mut raw_config)?;

    let config = Config::deserialize(raw_config)?;
    validate(&config)?;

    Ok(config)
}

pub(crate) fn validate(config: &Config) -> anyhow::Result<()> {
    if config.upstream.host.is_empty() {
        bail!("No upstream host configured. Set host in the [upstream] section.");
    }

    require_secret(&config.auth.proxy_secret, "proxy_secret", "[auth]")?;
    require_secret(&config.token.api_key, "api_key", "[token]")?;
    require_secret(&config.token.signing_secret, "signing_secret", "[token]")?;

    for (id, tier) in config.tiers.ordered() {
        if tier.connections == 0 {
            bail!("Tier '{id}' must allow at least one connection.");
        }
    }

    Ok(())
}

fn require_secret(secret: &Option<SecretString>, name: &str, section: &str) -> anyhow::Result<()> {
    match secret {
        Some(secret) if !secret.expose_secret().is_empty() => Ok(()),
        _ => bail!("Missing required secret '{name}'. Set it in the {section} section."),
    }
}

fn expand_dynamic_strings<'a>(path: &mut Vec<Result<&'a str, usize>>, value: &'a mut Value) -> anyhow::Result<()> {
    match value {
        Value::String(s) => match DynamicString::<String>::from_str(s) {
            Ok(out) => *s = out.into_inner(),
            Err(err) => {
                // Build the path string for error reporting
                let mut p = String::new();
                for segment in path {
                    match segment {
                        Ok(s) => {
                            p.push_str(s);
                            p.push('.');
                        }
                        Err(i) => write!(p, "[{i}]").unwrap(),
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

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use insta::assert_snapshot;
    use secrecy::ExposeSecret;

    use crate::{Config, TierId};

    fn valid_config() -> &'static str {
        indoc! {r#"
            [upstream]
            host = "rest-api"

            [auth]
            proxy_secret = "s3cr3t"

            [token]
            api_key = "key"
            signing_secret = "signing"
        "#}
    }

    #[test]
    fn defaults_fill_in_everything_but_secrets() {
        let config: Config = toml::from_str(valid_config()).unwrap();
        assert!(super::validate(&config).is_ok());

        assert_eq!(config.upstream.base_url(), "http://rest-api:80");
        assert!(config.server.listen_address.is_none());
        assert!(config.server.health.enabled);
        assert_eq!(config.server.health.path, "/health");

        let basic = config.tiers.get(TierId::Basic);
        assert_eq!(basic.rate, "20M");
        assert_eq!(basic.connections, 2);
    }

    #[test]
    fn explicit_settings_override_defaults() {
        let config_str = indoc! {r#"
            [server]
            listen_address = "0.0.0.0:9000"

            [upstream]
            host = "rest-api"
            port = 8080

            [auth]
            proxy_secret = "s3cr3t"

            [token]
            api_key = "key"
            signing_secret = "signing"

            [tiers.mega]
            rate = "2000M"
            connections = 200
        "#};

        let config: Config = toml::from_str(config_str).unwrap();
        assert!(super::validate(&config).is_ok());

        assert_eq!(config.upstream.base_url(), "http://rest-api:8080");
        assert_eq!(config.tiers.mega.rate, "2000M");
        assert_eq!(config.tiers.mega.connections, 200);

        // untouched tiers keep their defaults
        assert_eq!(config.tiers.ultra.rate, "250M");
    }

    #[test]
    fn validation_requires_an_upstream_host() {
        let config = Config::default();
        let error = super::validate(&config).unwrap_err().to_string();

        assert_snapshot!(error, @"No upstream host configured. Set host in the [upstream] section.");
    }

    #[test]
    fn validation_requires_the_proxy_secret() {
        let config_str = indoc! {r#"
            [upstream]
            host = "rest-api"

            [token]
            api_key = "key"
            signing_secret = "signing"
        "#};

        let config: Config = toml::from_str(config_str).unwrap();
        let error = super::validate(&config).unwrap_err().to_string();

        assert_snapshot!(error, @"Missing required secret 'proxy_secret'. Set it in the [auth] section.");
    }

    #[test]
    fn validation_rejects_an_empty_signing_secret() {
        let config_str = indoc! {r#"
            [upstream]
            host = "rest-api"

            [auth]
            proxy_secret = "s3cr3t"

            [token]
            api_key = "key"
            signing_secret = ""
        "#};

        let config: Config = toml::from_str(config_str).unwrap();
        let error = super::validate(&config).unwrap_err().to_string();

        assert_snapshot!(error, @"Missing required secret 'signing_secret'. Set it in the [token] section.");
    }

    #[test]
    fn validation_rejects_a_zero_connection_tier() {
        let config_str = indoc! {r#"
            [upstream]
            host = "rest-api"

            [auth]
            proxy_secret = "s3cr3t"

            [token]
            api_key = "key"
            signing_secret = "signing"

            [tiers.pro]
            rate = "100M"
            connections = 0
        "#};

        let config: Config = toml::from_str(config_str).unwrap();
        let error = super::validate(&config).unwrap_err().to_string();

        assert_snapshot!(error, @"Tier 'pro' must allow at least one connection.");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let config_str = indoc! {r#"
            [gateway]
            host = "rest-api"
        "#};

        let result: Result<Config, _> = toml::from_str(config_str);
        assert!(result.is_err());
    }

    #[test]
    fn environment_placeholders_are_expanded() {
        let toml = indoc! {r#"
            [upstream]
            host = "rest-api"

            [auth]
            proxy_secret = "{{ env.PATH }}"

            [token]
            api_key = "key"
            signing_secret = "signing"
        "#};

        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), toml).unwrap();

        let config = super::load(file.path()).unwrap();
        let expected = std::env::var("PATH").unwrap();

        assert_eq!(config.auth.proxy_secret.unwrap().expose_secret(), expected);
    }

    #[test]
    fn missing_environment_variable_points_at_the_field() {
        let toml = indoc! {r#"
            [upstream]
            host = "rest-api"

            [auth]
            proxy_secret = "{{ env.TOLLGATE_SECRET_THAT_DOES_NOT_EXIST }}"

            [token]
            api_key = "key"
            signing_secret = "signing"
        "#};

        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), toml).unwrap();

        let error = super::load(file.path()).unwrap_err().to_string();
        assert!(error.contains("auth.proxy_secret"), "{error}");
    }
}
