use std::{env, fmt::Display, str::FromStr};

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::aggregates::DeliveryPolicy;
use crate::domain::value_objects::Percentage;

const DEV_JWT_SECRET: &str = "appareldesk-dev-secret-change-me";

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: Option<String>,
    pub nats_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub operational_fee: Percentage,
    pub liquidation_threshold: Decimal,
    pub delivery: DeliveryPolicy,
    pub currency_symbol: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = var("JWT_SECRET").unwrap_or_else(|| {
            warn!("JWT_SECRET not set, using the development secret");
            DEV_JWT_SECRET.to_string()
        });
        let operational_fee: Decimal = try_load("OPERATIONAL_FEE_PERCENTAGE", "2.5")?;
        Ok(Self {
            port: try_load("PORT", "8083")?,
            database_url: var("DATABASE_URL"),
            nats_url: var("NATS_URL"),
            jwt_secret,
            jwt_ttl_hours: try_load("JWT_TTL_HOURS", "24")?,
            operational_fee: Percentage::new(operational_fee)
                .map_err(|e| ConfigError::Invalid { key: "OPERATIONAL_FEE_PERCENTAGE", reason: e.to_string() })?,
            liquidation_threshold: try_load("STOCK_LIQUIDATION_THRESHOLD", "50")?,
            delivery: DeliveryPolicy {
                free_above: try_load("FREE_DELIVERY_THRESHOLD", "200")?,
                fee: try_load("DELIVERY_FEE", "20")?,
            },
            currency_symbol: var("CURRENCY_SYMBOL").unwrap_or_else(|| "₹".to_string()),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8083,
            database_url: None,
            nats_url: None,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_ttl_hours: 24,
            operational_fee: Percentage::new(Decimal::new(25, 1)).unwrap_or(Percentage::ZERO),
            liquidation_threshold: Decimal::from(50),
            delivery: DeliveryPolicy::default(),
            currency_symbol: "₹".to_string(),
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::Invalid { key, reason: e.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 8083);
        assert_eq!(config.operational_fee.value(), dec!(2.5));
        assert_eq!(config.delivery.fee, dec!(20));
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        env::set_var("STOCK_LIQUIDATION_THRESHOLD", "lots");
        let err = try_load::<Decimal>("STOCK_LIQUIDATION_THRESHOLD", "50");
        env::remove_var("STOCK_LIQUIDATION_THRESHOLD");
        assert!(matches!(err, Err(ConfigError::Invalid { key: "STOCK_LIQUIDATION_THRESHOLD", .. })));
    }
}
