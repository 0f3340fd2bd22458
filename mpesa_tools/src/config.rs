use std::{fmt::Display, str::FromStr, time::Duration};

use log::*;
use slm_common::{helpers::env_or_default, Secret};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MpesaEnvironment {
    #[default]
    Sandbox,
    Production,
}

impl MpesaEnvironment {
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Sandbox => "https://sandbox.safaricom.co.ke",
            Self::Production => "https://api.safaricom.co.ke",
        }
    }
}

impl FromStr for MpesaEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sandbox" => Ok(Self::Sandbox),
            "production" | "live" => Ok(Self::Production),
            _ => Err(format!("Unknown M-PESA environment: {s}")),
        }
    }
}

impl Display for MpesaEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sandbox => write!(f, "sandbox"),
            Self::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MpesaConfig {
    pub environment: MpesaEnvironment,
    /// Overrides the environment's base URL. Only useful for pointing the client at a local stub.
    pub base_url: Option<String>,
    pub consumer_key: Secret<String>,
    pub consumer_secret: Secret<String>,
    pub shortcode: String,
    pub passkey: Secret<String>,
    pub callback_url: String,
    pub timeout: Duration,
}

impl Default for MpesaConfig {
    fn default() -> Self {
        Self {
            environment: MpesaEnvironment::Sandbox,
            base_url: None,
            consumer_key: Secret::default(),
            consumer_secret: Secret::default(),
            shortcode: "174379".to_string(),
            passkey: Secret::default(),
            callback_url: "https://example.com/api/mpesa/callback".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl MpesaConfig {
    pub fn new_from_env_or_default() -> Self {
        let defaults = Self::default();
        let environment = env_or_default("SLM_MPESA_ENVIRONMENT", MpesaEnvironment::Sandbox);
        let consumer_key = Secret::new(std::env::var("SLM_MPESA_CONSUMER_KEY").unwrap_or_else(|_| {
            warn!("🪛️ SLM_MPESA_CONSUMER_KEY not set. STK push requests will fail to authenticate.");
            String::default()
        }));
        let consumer_secret = Secret::new(std::env::var("SLM_MPESA_CONSUMER_SECRET").unwrap_or_else(|_| {
            warn!("🪛️ SLM_MPESA_CONSUMER_SECRET not set. STK push requests will fail to authenticate.");
            String::default()
        }));
        let shortcode = std::env::var("SLM_MPESA_SHORTCODE").unwrap_or_else(|_| {
            info!("🪛️ SLM_MPESA_SHORTCODE not set, using the sandbox shortcode {}", defaults.shortcode);
            defaults.shortcode.clone()
        });
        let passkey = Secret::new(std::env::var("SLM_MPESA_PASSKEY").unwrap_or_else(|_| {
            warn!("🪛️ SLM_MPESA_PASSKEY not set. STK push requests will be rejected.");
            String::default()
        }));
        let callback_url = std::env::var("SLM_MPESA_CALLBACK_URL").unwrap_or_else(|_| {
            warn!("🪛️ SLM_MPESA_CALLBACK_URL not set, using (probably useless) default {}", defaults.callback_url);
            defaults.callback_url.clone()
        });
        let timeout = Duration::from_secs(env_or_default("SLM_MPESA_TIMEOUT_SECS", 30u64));
        Self { environment, base_url: None, consumer_key, consumer_secret, shortcode, passkey, callback_url, timeout }
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or_else(|| self.environment.base_url())
    }
}
