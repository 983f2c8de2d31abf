//! Application configuration management.
//!
//! Holds everything operators tune without a deploy: the per-category tariff
//! tables (maintenance fee, savings yield, credit limit) and the monthly
//! batch schedule.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Per-category tariff tables.
    #[serde(default)]
    pub tariffs: TariffConfig,
    /// Monthly batch schedule.
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Tariff tables keyed by customer category.
#[derive(Debug, Clone, Deserialize)]
pub struct TariffConfig {
    /// Tariffs for the Common category.
    #[serde(default = "default_common")]
    pub common: CategoryTariff,
    /// Tariffs for the Super category.
    #[serde(default = "default_super", rename = "super")]
    pub super_category: CategoryTariff,
    /// Tariffs for the Premium category.
    #[serde(default = "default_premium")]
    pub premium: CategoryTariff,
}

/// Tariff values for a single customer category.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryTariff {
    /// Monthly maintenance fee charged to checking accounts.
    pub maintenance_fee: Decimal,
    /// Nominal annual yield rate credited to savings accounts.
    pub annual_yield: Decimal,
    /// Credit limit assigned to newly issued credit cards.
    pub credit_limit: Decimal,
}

fn default_common() -> CategoryTariff {
    CategoryTariff {
        maintenance_fee: Decimal::new(1200, 2),
        annual_yield: Decimal::new(5, 3),
        credit_limit: Decimal::new(1000, 0),
    }
}

fn default_super() -> CategoryTariff {
    CategoryTariff {
        maintenance_fee: Decimal::new(800, 2),
        annual_yield: Decimal::new(7, 3),
        credit_limit: Decimal::new(5000, 0),
    }
}

fn default_premium() -> CategoryTariff {
    CategoryTariff {
        maintenance_fee: Decimal::ZERO,
        annual_yield: Decimal::new(9, 3),
        credit_limit: Decimal::new(10_000, 0),
    }
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            common: default_common(),
            super_category: default_super(),
            premium: default_premium(),
        }
    }
}

/// Monthly batch schedule configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    /// Day of month on which the maintenance fee job runs.
    #[serde(default = "default_fee_day")]
    pub fee_day: u32,
    /// Day of month on which the savings yield job runs.
    #[serde(default = "default_yield_day")]
    pub yield_day: u32,
    /// Seconds between scheduler due-date checks.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
}

fn default_fee_day() -> u32 {
    1
}

fn default_yield_day() -> u32 {
    5
}

fn default_tick_secs() -> u64 {
    3600
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            fee_day: default_fee_day(),
            yield_day: default_yield_day(),
            tick_secs: default_tick_secs(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TUCANO").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_tariffs() {
        let tariffs = TariffConfig::default();

        assert_eq!(tariffs.common.maintenance_fee, dec!(12.00));
        assert_eq!(tariffs.common.annual_yield, dec!(0.005));
        assert_eq!(tariffs.common.credit_limit, dec!(1000));

        assert_eq!(tariffs.super_category.maintenance_fee, dec!(8.00));
        assert_eq!(tariffs.super_category.annual_yield, dec!(0.007));
        assert_eq!(tariffs.super_category.credit_limit, dec!(5000));

        assert_eq!(tariffs.premium.maintenance_fee, dec!(0));
        assert_eq!(tariffs.premium.annual_yield, dec!(0.009));
        assert_eq!(tariffs.premium.credit_limit, dec!(10000));
    }

    #[test]
    fn test_default_batch_schedule() {
        let batch = BatchConfig::default();
        assert_eq!(batch.fee_day, 1);
        assert_eq!(batch.yield_day, 5);
        assert_eq!(batch.tick_secs, 3600);
    }

    #[test]
    fn test_tariff_deserialization() {
        let toml = r#"
            [common]
            maintenance_fee = "15.00"
            annual_yield = "0.004"
            credit_limit = "2000"
        "#;
        let tariffs: TariffConfig = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(tariffs.common.maintenance_fee, dec!(15.00));
        // Unspecified sections fall back to defaults
        assert_eq!(tariffs.premium.credit_limit, dec!(10000));
    }
}
