use std::net::SocketAddr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Env {
    Dev,
    Staging,
    Production,
}

impl Env {
    pub fn from_env() -> Self {
        match var("ENVIRONMENT") {
            Ok(Some(env)) => match env.as_str() {
                "dev" => Env::Dev,
                "staging" => Env::Staging,
                "production" => Env::Production,
                _ => Env::Dev,
            },
            _ => Env::Dev,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub env: Env,
    pub database_url: String,
    pub listen_addr: SocketAddr,
    /// Origin allowed to call the API from a browser. Any origin is allowed
    /// in [`Env::Dev`].
    pub site_url: String,
    pub comment_page_size: i64,
    pub reply_page_size: i64,
}

pub const DEFAULT_PAGE_SIZE: i64 = 5;

fn var(key: &str) -> Result<Option<String>, String> {
    match std::env::var(key) {
        Ok(env) => Ok(Some(env)),
        Err(e) => {
            tracing::warn!("Missing environment variable `{key}`");
            match e {
                std::env::VarError::NotPresent => Ok(None),
                std::env::VarError::NotUnicode(_) => Err(format!(
                    "Could not get the environment variable `{key}` due to unicode error"
                )),
            }
        }
    }
}

fn required_var(key: &str) -> String {
    let val = var(key);
    match val {
        Ok(val) => match val {
            Some(val) => val,
            None => {
                tracing::error!("Environment variable `{key}` is required");
                std::process::exit(1)
            }
        },
        Err(e) => {
            tracing::error!(
                "Environment variable `{key}` is required, but could not retrieve: {e}"
            );
            std::process::exit(1)
        }
    }
}

/// Parses a positive number, falling back to `default` when the variable is
/// unset or invalid.
fn positive_var(key: &str, default: i64) -> i64 {
    match var(key) {
        Ok(Some(val)) => match val.parse::<i64>() {
            Ok(n) if n > 0 => n,
            _ => {
                tracing::warn!("Invalid value `{val}` for `{key}`, using {default}");
                default
            }
        },
        _ => default,
    }
}

impl ServerConfig {
    pub fn new_from_env(env: Env) -> Self {
        let port = positive_var("PORT", 3000);
        let port = u16::try_from(port).unwrap_or_else(|_| {
            tracing::warn!("`PORT` {port} is out of range, using 3000");
            3000
        });

        ServerConfig {
            env,
            database_url: required_var("DATABASE_URL"),
            listen_addr: SocketAddr::from(([0, 0, 0, 0], port)),
            site_url: var("SITE_URL")
                .ok()
                .flatten()
                .unwrap_or_else(|| "http://localhost:4321".to_string()),
            comment_page_size: positive_var("COMMENT_PAGE_SIZE", DEFAULT_PAGE_SIZE),
            reply_page_size: positive_var("REPLY_PAGE_SIZE", DEFAULT_PAGE_SIZE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_var_falls_back_on_missing_or_invalid_values() {
        assert_eq!(positive_var("BLOG_API_TEST_UNSET_PAGE_SIZE", 5), 5);

        // Each key is only touched by this test.
        for (key, val, expected) in [
            ("BLOG_API_TEST_VALID_PAGE_SIZE", "12", 12),
            ("BLOG_API_TEST_ZERO_PAGE_SIZE", "0", 5),
            ("BLOG_API_TEST_NEGATIVE_PAGE_SIZE", "-3", 5),
            ("BLOG_API_TEST_GARBAGE_PAGE_SIZE", "abc", 5),
        ] {
            unsafe { std::env::set_var(key, val) };
            assert_eq!(positive_var(key, 5), expected, "{key}={val}");
            unsafe { std::env::remove_var(key) };
        }
    }
}
