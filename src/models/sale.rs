use serde::{Deserialize, Serialize};
use std::fmt;

use super::draft::{check_non_negative, ValidationError};
use super::money::format_brl;

/// A sale of some quantity of a product.
///
/// `total` is always `quantity * unit_price`. It is serialized for readers of
/// the wire format but recomputed on every deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SaleFields")]
pub struct Sale {
    pub product_name: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub total: f64,
}

#[derive(Deserialize)]
struct SaleFields {
    product_name: String,
    quantity: f64,
    unit_price: f64,
}

impl From<SaleFields> for Sale {
    fn from(fields: SaleFields) -> Self {
        Sale::new(fields.product_name, fields.quantity, fields.unit_price)
    }
}

impl Sale {
    pub fn new(product_name: impl Into<String>, quantity: f64, unit_price: f64) -> Self {
        Self {
            product_name: product_name.into(),
            quantity,
            unit_price,
            total: quantity * unit_price,
        }
    }

    /// The sale total derived from its inputs, ignoring the stored field.
    pub fn computed_total(&self) -> f64 {
        self.quantity * self.unit_price
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        if self.product_name.trim().is_empty() {
            return Err(ValidationError::Missing("product"));
        }
        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(ValidationError::Invalid {
                field: "quantity",
                reason: "must be a positive number",
            });
        }
        check_non_negative("unit_price", self.unit_price)?;
        if !self.computed_total().is_finite() {
            return Err(ValidationError::Invalid {
                field: "total",
                reason: "is too large",
            });
        }
        Ok(())
    }
}

impl fmt::Display for Sale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} · Qty: {} · {}",
            self.product_name,
            self.quantity,
            format_brl(self.computed_total())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sale_new_computes_total() {
        let sale = Sale::new("Milho", 4.0, 2.5);
        assert_eq!(sale.total, 10.0);
        assert_eq!(sale.computed_total(), 10.0);
    }

    #[test]
    fn test_sale_display() {
        let sale = Sale::new("Milho", 10.0, 30.0);
        assert_eq!(sale.to_string(), "Milho · Qty: 10 · R$ 300,00");
    }

    #[test]
    fn test_sale_validate() {
        assert!(Sale::new("Milho", 1.0, 0.0).validate().is_ok());
        assert_eq!(
            Sale::new("", 1.0, 1.0).validate(),
            Err(ValidationError::Missing("product"))
        );
        assert!(Sale::new("Milho", 0.0, 1.0).validate().is_err());
        assert!(Sale::new("Milho", 1.0, -1.0).validate().is_err());
    }

    #[test]
    fn test_sale_validate_rejects_overflowing_total() {
        assert_eq!(
            Sale::new("Milho", 1e200, 1e200).validate(),
            Err(ValidationError::Invalid {
                field: "total",
                reason: "is too large",
            })
        );
    }

    #[test]
    fn test_sale_json_ignores_stored_total() {
        let parsed: Sale = serde_json::from_str(
            r#"{"product_name":"Ovos","quantity":12,"unit_price":0.5,"total":1000}"#,
        )
        .unwrap();
        assert_eq!(parsed.total, 6.0);

        let json = serde_json::to_value(&parsed).unwrap();
        assert_eq!(json["total"], 6.0);
    }
}
