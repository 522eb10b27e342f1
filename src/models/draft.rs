//! Unvalidated record input, as collected by a front end.

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use super::{Cost, CostType, Product, RecordData, RecordKind, Sale};

/// A required field is missing or holds an unusable value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{field} {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

pub(crate) fn check_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::Invalid {
            field,
            reason: "must be a number",
        });
    }
    if value < 0.0 {
        return Err(ValidationError::Invalid {
            field,
            reason: "cannot be negative",
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct ProductDraft {
    pub name: String,
    pub category: Option<String>,
    pub purchase_price: Option<f64>,
    pub sell_price: Option<f64>,
}

impl ProductDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CostDraft {
    pub cost_type: Option<CostType>,
    pub amount: Option<f64>,
    pub cost_date: Option<NaiveDate>,
}

impl CostDraft {
    pub fn new(amount: f64) -> Self {
        Self {
            amount: Some(amount),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SaleDraft {
    pub product_name: String,
    pub quantity: Option<f64>,
    pub unit_price: Option<f64>,
}

impl SaleDraft {
    pub fn new(product_name: impl Into<String>, quantity: f64, unit_price: f64) -> Self {
        Self {
            product_name: product_name.into(),
            quantity: Some(quantity),
            unit_price: Some(unit_price),
        }
    }
}

/// Input for [`RecordStore::create`](crate::store::RecordStore::create).
#[derive(Debug, Clone)]
pub enum RecordDraft {
    Product(ProductDraft),
    Cost(CostDraft),
    Sale(SaleDraft),
}

impl RecordDraft {
    pub fn kind(&self) -> RecordKind {
        match self {
            RecordDraft::Product(_) => RecordKind::Product,
            RecordDraft::Cost(_) => RecordKind::Cost,
            RecordDraft::Sale(_) => RecordKind::Sale,
        }
    }

    /// Applies defaults and checks required fields.
    ///
    /// `created_at` provides the default cost date.
    pub fn into_record(self, created_at: DateTime<Utc>) -> Result<RecordData, ValidationError> {
        let data = match self {
            RecordDraft::Product(draft) => RecordData::Product(Product {
                name: draft.name.trim().to_string(),
                category: draft
                    .category
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty()),
                purchase_price: draft.purchase_price.unwrap_or(0.0),
                sell_price: draft.sell_price.unwrap_or(0.0),
            }),
            RecordDraft::Cost(draft) => RecordData::Cost(Cost {
                cost_type: draft.cost_type.unwrap_or_default(),
                amount: draft.amount.ok_or(ValidationError::Missing("amount"))?,
                cost_date: draft
                    .cost_date
                    .unwrap_or_else(|| created_at.date_naive()),
            }),
            RecordDraft::Sale(draft) => {
                if draft.product_name.trim().is_empty() {
                    return Err(ValidationError::Missing("product"));
                }
                let quantity = draft.quantity.ok_or(ValidationError::Missing("quantity"))?;
                let unit_price = draft
                    .unit_price
                    .ok_or(ValidationError::Missing("unit_price"))?;
                RecordData::Sale(Sale::new(draft.product_name.trim(), quantity, unit_price))
            }
        };

        data.validate()?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 5, 10, 30, 0).unwrap()
    }

    #[test]
    fn test_product_requires_name() {
        let err = RecordDraft::Product(ProductDraft::new("  "))
            .into_record(now())
            .unwrap_err();
        assert_eq!(err, ValidationError::Missing("name"));
    }

    #[test]
    fn test_product_defaults_and_trimming() {
        let draft = ProductDraft {
            name: " Milho ".to_string(),
            category: Some("  ".to_string()),
            ..ProductDraft::default()
        };
        match RecordDraft::Product(draft).into_record(now()).unwrap() {
            RecordData::Product(p) => {
                assert_eq!(p.name, "Milho");
                assert!(p.category.is_none());
                assert_eq!(p.purchase_price, 0.0);
                assert_eq!(p.sell_price, 0.0);
            }
            other => panic!("expected product, got {:?}", other),
        }
    }

    #[test]
    fn test_cost_requires_numeric_amount() {
        let err = RecordDraft::Cost(CostDraft::default())
            .into_record(now())
            .unwrap_err();
        assert_eq!(err, ValidationError::Missing("amount"));

        let err = RecordDraft::Cost(CostDraft::new(f64::NAN))
            .into_record(now())
            .unwrap_err();
        assert!(matches!(err, ValidationError::Invalid { field: "amount", .. }));
    }

    #[test]
    fn test_sale_with_overflowing_total_is_rejected() {
        let err = RecordDraft::Sale(SaleDraft::new("Milho", 1e200, 1e200))
            .into_record(now())
            .unwrap_err();
        assert!(matches!(err, ValidationError::Invalid { field: "total", .. }));
    }

    #[test]
    fn test_cost_defaults() {
        match RecordDraft::Cost(CostDraft::new(100.0))
            .into_record(now())
            .unwrap()
        {
            RecordData::Cost(c) => {
                assert_eq!(c.cost_type, CostType::Outro);
                assert_eq!(c.amount, 100.0);
                assert_eq!(c.cost_date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
            }
            other => panic!("expected cost, got {:?}", other),
        }
    }

    #[test]
    fn test_sale_requires_all_fields() {
        let missing_qty = SaleDraft {
            product_name: "Milho".to_string(),
            quantity: None,
            unit_price: Some(1.0),
        };
        assert_eq!(
            RecordDraft::Sale(missing_qty).into_record(now()).unwrap_err(),
            ValidationError::Missing("quantity")
        );

        let missing_product = SaleDraft::new("", 1.0, 1.0);
        assert_eq!(
            RecordDraft::Sale(missing_product)
                .into_record(now())
                .unwrap_err(),
            ValidationError::Missing("product")
        );
    }

    #[test]
    fn test_sale_total_derived() {
        match RecordDraft::Sale(SaleDraft::new("Milho", 3.0, 1.5))
            .into_record(now())
            .unwrap()
        {
            RecordData::Sale(s) => assert_eq!(s.total, 4.5),
            other => panic!("expected sale, got {:?}", other),
        }
    }
}
