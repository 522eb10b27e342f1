use serde::{Deserialize, Serialize};
use std::fmt;

use super::draft::{check_non_negative, ValidationError};
use super::money::format_brl;

/// Something the farm buys or sells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub purchase_price: f64,
    #[serde(default)]
    pub sell_price: f64,
}

impl Product {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: None,
            purchase_price: 0.0,
            sell_price: 0.0,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_purchase_price(mut self, price: f64) -> Self {
        self.purchase_price = price;
        self
    }

    pub fn with_sell_price(mut self, price: f64) -> Self {
        self.sell_price = price;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::Missing("name"));
        }
        check_non_negative("purchase_price", self.purchase_price)?;
        check_non_negative("sell_price", self.sell_price)?;
        Ok(())
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(category) = &self.category {
            write!(f, " · {}", category)?;
        }

        // Zero prices mean "not informed" and are left out.
        match (self.purchase_price > 0.0, self.sell_price > 0.0) {
            (true, true) => write!(
                f,
                " · C {} | V {}",
                format_brl(self.purchase_price),
                format_brl(self.sell_price)
            ),
            (true, false) => write!(f, " · C {}", format_brl(self.purchase_price)),
            (false, true) => write!(f, " · V {}", format_brl(self.sell_price)),
            (false, false) => Ok(()),
        }
    }
}
