use std::{env, net::IpAddr};

use log::*;
use mpesa_tools::MpesaConfig;
use rand::{thread_rng, RngCore};
use slm_common::{
    helpers::{env_or_default, parse_boolean_flag},
    Money,
    Secret,
};
use solar_market_engine::{db::db_url, order_objects::PricingPolicy};

use crate::errors::ServerError;

const DEFAULT_SLM_HOST: &str = "127.0.0.1";
const DEFAULT_SLM_PORT: u16 = 8360;
const DEFAULT_PRODUCTS_PER_PAGE: u32 = 12;
const DEFAULT_ORDERS_PER_PAGE: u32 = 10;
const DEFAULT_MAX_CART_ITEMS: usize = 50;
/// HS256 secrets shorter than this are accepted, but with a warning.
const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// Shipping fee and tax rate applied at checkout.
    pub pricing: PricingPolicy,
    pub products_per_page: u32,
    pub orders_per_page: u32,
    /// The maximum number of distinct products a cart may hold.
    pub max_cart_items: usize,
    pub callback: CallbackConfig,
    pub mpesa: MpesaConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SLM_HOST.to_string(),
            port: DEFAULT_SLM_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            pricing: PricingPolicy::default(),
            products_per_page: DEFAULT_PRODUCTS_PER_PAGE,
            orders_per_page: DEFAULT_ORDERS_PER_PAGE,
            max_cart_items: DEFAULT_MAX_CART_ITEMS,
            callback: CallbackConfig::default(),
            mpesa: MpesaConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SLM_HOST").ok().unwrap_or_else(|| DEFAULT_SLM_HOST.into());
        let port = env::var("SLM_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SLM_PORT. {e} Using the default, {DEFAULT_SLM_PORT}, instead."
                    );
                    DEFAULT_SLM_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SLM_PORT);
        let database_url = db_url();
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("SLM_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("SLM_USE_FORWARDED").ok(), false);
        let pricing = configure_pricing();
        let products_per_page = env_or_default("SLM_PRODUCTS_PER_PAGE", DEFAULT_PRODUCTS_PER_PAGE);
        let orders_per_page = env_or_default("SLM_ORDERS_PER_PAGE", DEFAULT_ORDERS_PER_PAGE);
        let max_cart_items = env_or_default("SLM_MAX_CART_ITEMS", DEFAULT_MAX_CART_ITEMS);
        let callback = CallbackConfig::from_env_or_defaults();
        let mpesa = MpesaConfig::new_from_env_or_default();
        Self {
            host,
            port,
            database_url,
            auth,
            use_x_forwarded_for,
            use_forwarded,
            pricing,
            products_per_page,
            orders_per_page,
            max_cart_items,
            callback,
            mpesa,
        }
    }
}

fn configure_pricing() -> PricingPolicy {
    let defaults = PricingPolicy::default();
    let shipping_fee = env::var("SLM_SHIPPING_FEE")
        .map_err(|_| info!("🪛️ SLM_SHIPPING_FEE is not set. Using the default of {}.", defaults.shipping_fee))
        .and_then(|s| {
            s.trim()
                .parse::<f64>()
                .map_err(|e| e.to_string())
                .and_then(|v| Money::try_from_units_f64(v).map_err(|e| e.to_string()))
                .map_err(|e| warn!("🪛️ Invalid configuration value for SLM_SHIPPING_FEE. {e}"))
        })
        .ok()
        .filter(|fee| {
            let ok = !fee.is_negative();
            if !ok {
                warn!("🪛️ SLM_SHIPPING_FEE cannot be negative. Using the default of {}.", defaults.shipping_fee);
            }
            ok
        })
        .unwrap_or(defaults.shipping_fee);
    let tax_rate_bps = env_or_default("SLM_TAX_RATE_BPS", defaults.tax_rate_bps);
    info!("🪛️ Checkout pricing: shipping fee {shipping_fee}, tax rate {tax_rate_bps} bps");
    PricingPolicy::new(shipping_fee, tax_rate_bps)
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HS256 secret that access tokens are signed with.
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. Every token issued \
             elsewhere will be rejected. DO NOT operate on production like this. 🚨️🚨️🚨️"
        );
        let mut key = [0u8; 32];
        thread_rng().fill_bytes(&mut key);
        Self { jwt_secret: Secret::new(base64::encode(key)) }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S) -> Self {
        Self { jwt_secret: Secret::new(secret.into()) }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret = env::var("SLM_JWT_SECRET")
            .map_err(|e| ServerError::ConfigurationError(format!("{e} [SLM_JWT_SECRET]")))?;
        if secret.trim().is_empty() {
            return Err(ServerError::ConfigurationError("SLM_JWT_SECRET is empty".to_string()));
        }
        if secret.len() < MIN_JWT_SECRET_LEN {
            warn!("🪛️ SLM_JWT_SECRET is shorter than {MIN_JWT_SECRET_LEN} characters. Consider a longer secret.");
        }
        Ok(Self::new(secret))
    }
}

//-----------------------------------------------  CallbackConfig  -----------------------------------------------------
/// How inbound M-PESA callbacks are verified.
#[derive(Clone, Debug, Default)]
pub struct CallbackConfig {
    /// Expected value of the `token` query parameter on the callback URL. `None` disables the check.
    pub secret: Option<Secret<String>>,
    /// If supplied, callbacks are only accepted from these addresses.
    /// To explicitly disable the whitelist, set this to "false", "none", or "0".
    pub whitelist: Option<Vec<IpAddr>>,
}

impl CallbackConfig {
    pub fn from_env_or_defaults() -> Self {
        let secret = env::var("SLM_CALLBACK_SECRET").ok().filter(|s| !s.trim().is_empty()).map(Secret::new);
        if secret.is_none() {
            warn!(
                "🚨️ SLM_CALLBACK_SECRET is not set. Anyone who learns a checkout request id can post a payment \
                 callback for it."
            );
        }
        let whitelist = env::var("SLM_CALLBACK_IP_WHITELIST").ok().and_then(|s| parse_whitelist(&s));
        match &whitelist {
            Some(whitelist) if whitelist.is_empty() => {
                warn!(
                    "🚨️ The callback IP whitelist was configured, but is empty. The server will run, but will ignore \
                     every M-PESA callback."
                );
            },
            None => {
                info!("🪛️ No callback IP whitelist is set. Only the callback token will be checked.");
            },
            Some(v) => {
                let addrs = v.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
                info!("🪛️ Callback IP whitelist: {addrs}");
            },
        }
        Self { secret, whitelist }
    }
}

fn parse_whitelist(s: &str) -> Option<Vec<IpAddr>> {
    if ["none", "false", "0"].contains(&s.trim().to_lowercase().as_str()) {
        info!(
            "🪛️ Callback IP whitelist is disabled. If this is not what you want, set SLM_CALLBACK_IP_WHITELIST to a \
             comma-separated list of IP addresses to enable it."
        );
        return None;
    }
    let ip_addrs = s
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| {
            s.parse::<IpAddr>()
                .map_err(|e| warn!("🪛️ Ignoring invalid IP address ({s}) in SLM_CALLBACK_IP_WHITELIST: {e}"))
                .ok()
        })
        .collect::<Vec<IpAddr>>();
    Some(ip_addrs)
}
