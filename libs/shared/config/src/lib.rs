use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub triage_knowledge_base_path: Option<String>,
    pub triage_alert_min_urgency: String,
    pub triage_persist_analyses: bool,
    pub triage_max_active_alerts: usize,
    pub server_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            triage_knowledge_base_path: None,
            triage_alert_min_urgency: "high".to_string(),
            triage_persist_analyses: true,
            triage_max_active_alerts: 1000,
            server_port: 3000,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, analysis persistence disabled");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            triage_knowledge_base_path: env::var("TRIAGE_KNOWLEDGE_BASE_PATH")
                .ok()
                .filter(|path| !path.trim().is_empty()),
            triage_alert_min_urgency: env::var("TRIAGE_ALERT_MIN_URGENCY")
                .unwrap_or_else(|_| defaults.triage_alert_min_urgency.clone()),
            triage_persist_analyses: match env::var("TRIAGE_PERSIST_ANALYSES") {
                Ok(value) => parse_flag(&value).unwrap_or_else(|| {
                    warn!("TRIAGE_PERSIST_ANALYSES has invalid value '{}', using default", value);
                    defaults.triage_persist_analyses
                }),
                Err(_) => defaults.triage_persist_analyses,
            },
            triage_max_active_alerts: match env::var("TRIAGE_MAX_ACTIVE_ALERTS") {
                Ok(value) => parse_capacity(&value).unwrap_or_else(|| {
                    warn!("TRIAGE_MAX_ACTIVE_ALERTS has invalid value '{}', using default", value);
                    defaults.triage_max_active_alerts
                }),
                Err(_) => defaults.triage_max_active_alerts,
            },
            server_port: match env::var("PORT") {
                Ok(value) => value.parse().unwrap_or_else(|_| {
                    warn!("PORT has invalid value '{}', using default", value);
                    defaults.server_port
                }),
                Err(_) => defaults.server_port,
            },
        };

        if !config.is_configured() {
            warn!("Application not fully configured - triage analyses will not be persisted");
        }

        config
    }

    /// Whether analysis results can be written to the document store.
    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
    }

    pub fn should_persist_analyses(&self) -> bool {
        self.triage_persist_analyses && self.is_configured()
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_capacity(value: &str) -> Option<usize> {
    value.trim().parse().ok().filter(|capacity| *capacity > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_not_configured() {
        let config = AppConfig::default();
        assert!(!config.is_configured());
        assert!(!config.should_persist_analyses());
        assert_eq!(config.triage_alert_min_urgency, "high");
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.triage_max_active_alerts, 1000);
    }

    #[test]
    fn test_persistence_requires_supabase_credentials() {
        let config = AppConfig {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "anon".to_string(),
            ..AppConfig::default()
        };
        assert!(config.should_persist_analyses());

        let disabled = AppConfig {
            triage_persist_analyses: false,
            ..config
        };
        assert!(!disabled.should_persist_analyses());
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" off "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_parse_capacity() {
        assert_eq!(parse_capacity(" 250 "), Some(250));
        assert_eq!(parse_capacity("0"), None);
        assert_eq!(parse_capacity("-5"), None);
    }
}
