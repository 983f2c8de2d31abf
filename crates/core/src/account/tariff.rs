//! Per-category tariff schedule.
//!
//! One canonical table maps a customer category to its maintenance fee,
//! annual yield rate, and credit limit. Values come from configuration and
//! default to the standard schedule.

use rust_decimal::Decimal;
use tucano_shared::config::TariffConfig;

use super::types::Category;

/// Tariff schedule consulted by the ledger engine and card issuing.
#[derive(Debug, Clone)]
pub struct Tariffs {
    config: TariffConfig,
}

impl Tariffs {
    /// Creates a tariff schedule from configuration.
    #[must_use]
    pub const fn new(config: TariffConfig) -> Self {
        Self { config }
    }

    /// Monthly maintenance fee charged to checking accounts of this category.
    #[must_use]
    pub fn maintenance_fee(&self, category: Category) -> Decimal {
        self.row(category).maintenance_fee
    }

    /// Nominal annual yield rate credited to savings accounts of this category.
    #[must_use]
    pub fn annual_yield(&self, category: Category) -> Decimal {
        self.row(category).annual_yield
    }

    /// Credit limit assigned to newly issued credit cards of this category.
    #[must_use]
    pub fn credit_limit(&self, category: Category) -> Decimal {
        self.row(category).credit_limit
    }

    fn row(&self, category: Category) -> &tucano_shared::config::CategoryTariff {
        match category {
            Category::Common => &self.config.common,
            Category::Super => &self.config.super_category,
            Category::Premium => &self.config.premium,
        }
    }
}

impl Default for Tariffs {
    fn default() -> Self {
        Self::new(TariffConfig::default())
    }
}
