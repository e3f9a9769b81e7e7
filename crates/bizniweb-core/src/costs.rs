//! Static product-cost and currency table.
//!
//! The table is a YAML file maintained by hand next to the `.env` file. It
//! carries everything the profitability pipeline needs that the order API
//! does not expose: unit purchase costs, per-order packaging cost, the fixed
//! daily overhead, currency conversion rates, and the order statuses that
//! never count as sales.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCost {
    pub name: String,
    #[serde(default)]
    pub ean: Option<String>,
    /// Purchase cost of one unit, in the reporting currency.
    pub cost: Decimal,
}

/// Raw YAML shape of the cost table.
#[derive(Debug, Clone, Deserialize)]
pub struct CostsFile {
    #[serde(default = "default_reporting_currency")]
    pub reporting_currency: String,
    /// Multiplier converting one unit of the keyed currency into the
    /// reporting currency.
    #[serde(default)]
    pub currency_rates: HashMap<String, Decimal>,
    #[serde(default)]
    pub packaging_cost_per_order: Decimal,
    #[serde(default)]
    pub fixed_daily_cost: Decimal,
    #[serde(default = "default_excluded_statuses")]
    pub excluded_statuses: Vec<String>,
    #[serde(default)]
    pub products: Vec<ProductCost>,
}

fn default_reporting_currency() -> String {
    "EUR".to_string()
}

fn default_excluded_statuses() -> Vec<String> {
    vec!["Storno".to_string()]
}

/// Validated cost table with lookup indexes.
#[derive(Debug, Clone)]
pub struct CostTable {
    reporting_currency: String,
    currency_rates: HashMap<String, Decimal>,
    packaging_cost_per_order: Decimal,
    fixed_daily_cost: Decimal,
    excluded_statuses: HashSet<String>,
    products: Vec<ProductCost>,
    by_ean: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

/// Load and validate the cost table from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_costs(path: &Path) -> Result<CostTable, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CostsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    CostTable::from_yaml_str(&content)
}

impl CostTable {
    /// Parse and validate a cost table from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::CostsFileParse`] for malformed YAML and
    /// [`ConfigError::Validation`] for semantic problems.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let file: CostsFile = serde_yaml::from_str(content).map_err(ConfigError::CostsFileParse)?;
        Self::new(file)
    }

    /// Validate a parsed cost file and build lookup indexes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] on empty or duplicate product
    /// names/EANs, negative costs, or non-positive currency rates.
    pub fn new(file: CostsFile) -> Result<Self, ConfigError> {
        let reporting_currency = file.reporting_currency.trim().to_uppercase();
        if reporting_currency.is_empty() {
            return Err(ConfigError::Validation(
                "reporting_currency must be non-empty".to_string(),
            ));
        }
        if file.packaging_cost_per_order.is_sign_negative() {
            return Err(ConfigError::Validation(
                "packaging_cost_per_order must not be negative".to_string(),
            ));
        }
        if file.fixed_daily_cost.is_sign_negative() {
            return Err(ConfigError::Validation(
                "fixed_daily_cost must not be negative".to_string(),
            ));
        }

        let mut currency_rates = HashMap::with_capacity(file.currency_rates.len());
        for (code, rate) in file.currency_rates {
            if rate <= Decimal::ZERO {
                return Err(ConfigError::Validation(format!(
                    "currency rate for '{code}' must be positive, got {rate}"
                )));
            }
            currency_rates.insert(code.trim().to_uppercase(), rate);
        }

        let mut by_ean = HashMap::new();
        let mut by_name = HashMap::new();
        for (idx, product) in file.products.iter().enumerate() {
            let name_key = name_key(&product.name);
            if name_key.is_empty() {
                return Err(ConfigError::Validation(
                    "product name must be non-empty".to_string(),
                ));
            }
            if product.cost.is_sign_negative() {
                return Err(ConfigError::Validation(format!(
                    "product '{}' has negative cost {}",
                    product.name, product.cost
                )));
            }
            if by_name.insert(name_key, idx).is_some() {
                return Err(ConfigError::Validation(format!(
                    "duplicate product name: '{}'",
                    product.name
                )));
            }
            if let Some(ean) = product.ean.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
                if by_ean.insert(ean.to_string(), idx).is_some() {
                    return Err(ConfigError::Validation(format!(
                        "duplicate product EAN: '{ean}' (product '{}')",
                        product.name
                    )));
                }
            }
        }

        let excluded_statuses = file
            .excluded_statuses
            .iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            reporting_currency,
            currency_rates,
            packaging_cost_per_order: file.packaging_cost_per_order,
            fixed_daily_cost: file.fixed_daily_cost,
            excluded_statuses,
            products: file.products,
            by_ean,
            by_name,
        })
    }

    #[must_use]
    pub fn reporting_currency(&self) -> &str {
        &self.reporting_currency
    }

    #[must_use]
    pub fn packaging_cost_per_order(&self) -> Decimal {
        self.packaging_cost_per_order
    }

    #[must_use]
    pub fn fixed_daily_cost(&self) -> Decimal {
        self.fixed_daily_cost
    }

    #[must_use]
    pub fn products(&self) -> &[ProductCost] {
        &self.products
    }

    /// Unit cost for an order item, matched by EAN first and then by
    /// case-insensitive label.
    #[must_use]
    pub fn product_cost(&self, label: Option<&str>, ean: Option<&str>) -> Option<Decimal> {
        let by_ean = ean
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .and_then(|e| self.by_ean.get(e));
        let idx = by_ean.or_else(|| label.and_then(|l| self.by_name.get(&name_key(l))))?;
        self.products.get(*idx).map(|p| p.cost)
    }

    /// Conversion rate from `currency` into the reporting currency.
    ///
    /// The reporting currency itself is always `1` even when the table
    /// omits it.
    #[must_use]
    pub fn rate(&self, currency: &str) -> Option<Decimal> {
        let code = currency.trim().to_uppercase();
        if code == self.reporting_currency {
            return Some(Decimal::ONE);
        }
        self.currency_rates.get(&code).copied()
    }

    #[must_use]
    pub fn is_excluded_status(&self, status: &str) -> bool {
        self.excluded_statuses.contains(&status.trim().to_lowercase())
    }
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
#[path = "costs_test.rs"]
mod tests;
