use std::env;

use chrono_tz::Tz;

/// Deployment configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// ProviderId emitted in outbound NewsML identification.
    pub newsml_provider_id: String,
    /// Timezone used for DateId and period computations.
    pub default_timezone: Tz,
    /// Base URL attachments and media hrefs are resolved against.
    pub media_prefix: String,
    /// Deployment-specific suffix of internally uploaded media URNs.
    pub belga_urn_suffix: String,
    /// Language an outbound item falls back to when it carries none.
    pub default_language: String,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            newsml_provider_id: env::var("NEWSML_PROVIDER_ID")
                .unwrap_or_else(|_| "belga.be".to_string()),
            default_timezone: env::var("DEFAULT_TIMEZONE")
                .unwrap_or_else(|_| "Europe/Brussels".to_string())
                .parse()
                .expect("DEFAULT_TIMEZONE must be a valid tz database name"),
            media_prefix: required_env("MEDIA_PREFIX"),
            belga_urn_suffix: required_env("BELGA_URN_SUFFIX"),
            default_language: env::var("DEFAULT_LANGUAGE").unwrap_or_else(|_| "nl".to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            newsml_provider_id: "belga.be".to_string(),
            default_timezone: chrono_tz::Europe::Brussels,
            media_prefix: "http://localhost/media".to_string(),
            belga_urn_suffix: "superdesk_1".to_string(),
            default_language: "nl".to_string(),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
