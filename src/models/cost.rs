use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::cost_type::CostType;
use super::draft::{check_non_negative, ValidationError};
use super::money::format_brl;

/// Money spent on the farm on a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cost {
    #[serde(default)]
    pub cost_type: CostType,
    pub amount: f64,
    pub cost_date: NaiveDate,
}

impl Cost {
    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        check_non_negative("amount", self.amount)
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} · {} · {}",
            self.cost_type.label(),
            format_brl(self.amount),
            self.cost_date
        )
    }
}
