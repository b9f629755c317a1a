use std::path::PathBuf;

use crate::error::{HarvestError, Result};

pub const STEAM_API_URL: &str = "https://api.steampowered.com";
pub const STORE_API_URL: &str = "https://store.steampowered.com";
pub const STEAMSPY_API_URL: &str = "https://steamspy.com";
pub const PRICE_HISTORY_URL: &str = "https://steampricehistory.com";
pub const PLAYER_HISTORY_URL: &str = "https://steamplayercount.com";

/// Per-request timeout (seconds). A hung request is a fatal transport
/// failure, never a skip.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// The Steam store rate-limits to 200 requests per 5 minutes.
pub const STORE_BASKET: BasketConfig = BasketConfig { limit: 200, window_secs: 300 };

/// SteamSpy allows roughly one request per second.
pub const STEAMSPY_BASKET: BasketConfig = BasketConfig { limit: 60, window_secs: 60 };

/// The scraped history sites publish no quota; stay polite.
pub const HISTORY_BASKET: BasketConfig = BasketConfig { limit: 120, window_secs: 60 };

/// One source's request budget: at most `limit` calls per rolling window of
/// `window_secs` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasketConfig {
    pub limit: u32,
    pub window_secs: u64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub steam_api_url: String,
    pub store_api_url: String,
    pub steamspy_api_url: String,
    pub price_history_url: String,
    pub player_history_url: String,
    pub log_level: String,
    /// Directory the CSV outputs are written to (DATA_DIR)
    pub data_dir: PathBuf,
    /// Apps need at least this many reviews before player history is fetched (MIN_REVIEWS)
    pub min_reviews_for_players: u64,
    pub store_basket: BasketConfig,
    pub steamspy_basket: BasketConfig,
    pub price_basket: BasketConfig,
    pub player_basket: BasketConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let cfg = Self {
            steam_api_url: env_or("STEAM_API_URL", STEAM_API_URL),
            store_api_url: env_or("STORE_API_URL", STORE_API_URL),
            steamspy_api_url: env_or("STEAMSPY_API_URL", STEAMSPY_API_URL),
            price_history_url: env_or("PRICE_HISTORY_URL", PRICE_HISTORY_URL),
            player_history_url: env_or("PLAYER_HISTORY_URL", PLAYER_HISTORY_URL),
            log_level: env_or("LOG_LEVEL", "info"),
            data_dir: PathBuf::from(env_or("DATA_DIR", "data")),
            min_reviews_for_players: env_parsed("MIN_REVIEWS", 10)?,
            store_basket: basket_from_env("STORE", STORE_BASKET)?,
            steamspy_basket: basket_from_env("STEAMSPY", STEAMSPY_BASKET)?,
            price_basket: basket_from_env("PRICES", HISTORY_BASKET)?,
            player_basket: basket_from_env("PLAYERS", HISTORY_BASKET)?,
        };

        for (label, basket) in [
            ("STORE", cfg.store_basket),
            ("STEAMSPY", cfg.steamspy_basket),
            ("PRICES", cfg.price_basket),
            ("PLAYERS", cfg.player_basket),
        ] {
            if basket.limit == 0 || basket.window_secs == 0 {
                return Err(HarvestError::Config(format!(
                    "{label} basket must have a non-zero limit and window"
                )));
            }
        }

        Ok(cfg)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| HarvestError::Config(format!("{key} must be a number, got {raw:?}"))),
        Err(_) => Ok(default),
    }
}

/// Reads `<PREFIX>_BASKET_LIMIT` / `<PREFIX>_BASKET_WINDOW_SECS`, falling
/// back to the source's built-in budget.
fn basket_from_env(prefix: &str, default: BasketConfig) -> Result<BasketConfig> {
    Ok(BasketConfig {
        limit: env_parsed(&format!("{prefix}_BASKET_LIMIT"), default.limit)?,
        window_secs: env_parsed(&format!("{prefix}_BASKET_WINDOW_SECS"), default.window_secs)?,
    })
}
