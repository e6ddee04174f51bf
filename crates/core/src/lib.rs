pub mod analysis;
pub mod domain;
pub mod ingest;
pub mod llm;
pub mod research;
pub mod storage;

pub mod config {
    use anyhow::Context;
    use std::time::Duration;

    const DEFAULT_STORE_DIR: &str = ".dealscope";
    const DEFAULT_FINANCIAL_CACHE_TTL_SECS: u64 = 3600;
    const DEFAULT_MAX_DOCUMENT_LENGTH: usize = 10_000;
    const DEFAULT_MAX_UPLOADED_FILES: usize = 2;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub store_dir: String,
        pub llm_provider: Option<String>,
        pub gemini_api_key: Option<String>,
        pub anthropic_api_key: Option<String>,
        pub alpha_vantage_api_key: Option<String>,
        pub sentry_dsn: Option<String>,
        pub financial_cache_ttl: Duration,
        pub max_document_length: usize,
        pub max_uploaded_files: usize,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                database_url: std::env::var("DATABASE_URL").ok(),
                store_dir: std::env::var("STORE_DIR")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_STORE_DIR.to_string()),
                llm_provider: std::env::var("LLM_PROVIDER").ok(),
                gemini_api_key: std::env::var("GEMINI_API_KEY").ok(),
                anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
                alpha_vantage_api_key: std::env::var("ALPHA_VANTAGE_API_KEY").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                financial_cache_ttl: Duration::from_secs(env_parse(
                    "FINANCIAL_CACHE_TTL_SECS",
                    DEFAULT_FINANCIAL_CACHE_TTL_SECS,
                )?),
                max_document_length: env_parse("MAX_DOCUMENT_LENGTH", DEFAULT_MAX_DOCUMENT_LENGTH)?,
                max_uploaded_files: env_parse("MAX_UPLOADED_FILES", DEFAULT_MAX_UPLOADED_FILES)?,
            })
        }

        pub fn require_gemini_api_key(&self) -> anyhow::Result<&str> {
            require_credential(self.gemini_api_key.as_deref(), "GEMINI_API_KEY")
        }

        pub fn require_anthropic_api_key(&self) -> anyhow::Result<&str> {
            require_credential(self.anthropic_api_key.as_deref(), "ANTHROPIC_API_KEY")
        }

        pub fn require_alpha_vantage_api_key(&self) -> anyhow::Result<&str> {
            require_credential(self.alpha_vantage_api_key.as_deref(), "ALPHA_VANTAGE_API_KEY")
        }
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                database_url: None,
                store_dir: DEFAULT_STORE_DIR.to_string(),
                llm_provider: None,
                gemini_api_key: None,
                anthropic_api_key: None,
                alpha_vantage_api_key: None,
                sentry_dsn: None,
                financial_cache_ttl: Duration::from_secs(DEFAULT_FINANCIAL_CACHE_TTL_SECS),
                max_document_length: DEFAULT_MAX_DOCUMENT_LENGTH,
                max_uploaded_files: DEFAULT_MAX_UPLOADED_FILES,
            }
        }
    }

    /// Placeholder values shipped in sample configs (`YOUR_..._HERE`) count as missing.
    pub fn is_placeholder_credential(value: &str) -> bool {
        let v = value.trim();
        v.is_empty() || (v.starts_with("YOUR_") && v.ends_with("_HERE"))
    }

    fn require_credential<'a>(value: Option<&'a str>, name: &str) -> anyhow::Result<&'a str> {
        let value = value.with_context(|| format!("{name} is required"))?;
        anyhow::ensure!(
            !is_placeholder_credential(value),
            "{name} is not configured (placeholder value)"
        );
        Ok(value.trim())
    }

    fn env_parse<T>(name: &str, default: T) -> anyhow::Result<T>
    where
        T: std::str::FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match std::env::var(name) {
            Ok(s) if !s.trim().is_empty() => s
                .trim()
                .parse::<T>()
                .with_context(|| format!("{name} must be a valid number (got {s:?})")),
            _ => Ok(default),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn placeholder_credentials_fail_fast() {
            let settings = Settings {
                alpha_vantage_api_key: Some("YOUR_ALPHA_VANTAGE_KEY_HERE".to_string()),
                gemini_api_key: Some("   ".to_string()),
                ..Default::default()
            };
            assert!(settings.require_alpha_vantage_api_key().is_err());
            assert!(settings.require_gemini_api_key().is_err());
            assert!(settings.require_anthropic_api_key().is_err());
        }

        #[test]
        fn real_credentials_are_trimmed() {
            let settings = Settings {
                alpha_vantage_api_key: Some(" demo-key ".to_string()),
                ..Default::default()
            };
            assert_eq!(settings.require_alpha_vantage_api_key().unwrap(), "demo-key");
        }
    }
}
