use crate::error::{AppError, AppResult};

/// Runtime configuration, loaded once at startup and passed explicitly to
/// every adapter. The Supabase credentials are the only hard requirement;
/// everything else degrades to an optional or defaulted value.
#[derive(Debug, Clone)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_key: String,
    pub openai_api_key: Option<String>,
    /// Override for the completion service endpoint; defaults to the
    /// public API when unset.
    pub openai_api_base: Option<String>,
    pub openai_model: String,
    /// Map-tile token handed through to clients. Not used by any route here.
    pub mapbox_token: Option<String>,
    pub zapier_webhook: Option<String>,
    pub stripe_secret: Option<String>,
    /// Accepted `x-api-key` values. Empty means the surface is open.
    pub api_keys: Vec<String>,
    pub host: String,
    pub port: u16,
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_api_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect()
}

fn parse_port(raw: &str) -> AppResult<u16> {
    raw.parse::<u16>()
        .map_err(|_| AppError::InvalidInput(format!("PORT is not a port: {}", raw)))
}

impl Config {
    /// Reads configuration from the environment.
    ///
    /// # Errors
    /// Returns `AppError::MissingConfig` when `SUPABASE_URL` or
    /// `SUPABASE_KEY` is absent, which callers should treat as fatal.
    pub fn from_env() -> AppResult<Self> {
        let supabase_url = optional("SUPABASE_URL")
            .ok_or_else(|| AppError::MissingConfig("SUPABASE_URL".to_string()))?;
        let supabase_key = optional("SUPABASE_KEY")
            .ok_or_else(|| AppError::MissingConfig("SUPABASE_KEY".to_string()))?;

        let port = optional("PORT")
            .map(|p| parse_port(&p))
            .transpose()?
            .unwrap_or(10000);

        Ok(Self {
            supabase_url,
            supabase_key,
            openai_api_key: optional("OPENAI_API_KEY"),
            openai_api_base: optional("OPENAI_API_BASE"),
            openai_model: optional("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o".to_string()),
            mapbox_token: optional("MAPBOX_TOKEN"),
            zapier_webhook: optional("ZAPIER_WEBHOOK"),
            stripe_secret: optional("STRIPE_SECRET"),
            api_keys: optional("API_KEYS")
                .map(|keys| parse_api_keys(&keys))
                .unwrap_or_default(),
            host: optional("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_keys_split_on_commas_and_trimmed() {
        assert_eq!(parse_api_keys("k1,k2"), vec!["k1", "k2"]);
        assert_eq!(parse_api_keys(" k1 , ,k2,"), vec!["k1", "k2"]);
        assert!(parse_api_keys("").is_empty());
    }

    #[test]
    fn bad_port_reads_as_invalid_input() {
        match parse_port("abc") {
            Err(AppError::InvalidInput(msg)) => assert_eq!(msg, "PORT is not a port: abc"),
            other => panic!("expected InvalidInput, got {:?}", other),
        }
        assert_eq!(parse_port("8080").unwrap(), 8080);
    }
}
