pub mod api;
pub mod dashboard;
pub mod domain;
pub mod hooks;
pub mod present;
pub mod resource;
pub mod view;

pub mod config {
    use anyhow::Context;

    pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub api_base_url: String,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let api_base_url = std::env::var("SCOREBOARD_API_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

            let settings = Self {
                api_base_url,
                sentry_dsn: std::env::var("SENTRY_DSN")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
            };
            settings.validate()?;
            Ok(settings)
        }

        /// Replaces the base URL, e.g. from a `--api-url` flag.
        pub fn with_api_base_url(mut self, url: impl Into<String>) -> anyhow::Result<Self> {
            self.api_base_url = url.into();
            self.validate()?;
            Ok(self)
        }

        fn validate(&self) -> anyhow::Result<()> {
            let url = self.api_base_url.trim();
            anyhow::ensure!(!url.is_empty(), "SCOREBOARD_API_URL cannot be empty");
            anyhow::ensure!(
                url.starts_with("http://") || url.starts_with("https://"),
                "SCOREBOARD_API_URL must start with http:// or https:// (got {url})"
            );
            reqwest::Url::parse(url)
                .with_context(|| format!("SCOREBOARD_API_URL is not a valid URL: {url}"))?;
            Ok(())
        }
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                api_base_url: DEFAULT_API_BASE_URL.to_string(),
                sentry_dsn: None,
            }
        }
    }

}
