//! Totals over costs and sales for a period.

mod export;

pub use export::{export_text, parse_totals, ExportedTotals};

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use crate::models::{Cost, Entry, Sale};

/// An inclusive date range. A missing bound is open on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportPeriod {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl ReportPeriod {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }

    /// Costs are dated by their cost date.
    pub fn includes_cost(&self, entry: &Entry<Cost>) -> bool {
        self.contains(entry.record.cost_date)
    }

    /// Sales are dated by the UTC day they were recorded.
    pub fn includes_sale(&self, entry: &Entry<Sale>) -> bool {
        self.contains(entry.created_at.date_naive())
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unbounded() {
            return write!(f, "all records");
        }
        match self.start {
            Some(start) => write!(f, "{}", start)?,
            None => write!(f, "beginning")?,
        }
        match self.end {
            Some(end) => write!(f, " to {}", end),
            None => write!(f, " to today"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    NoData,
    Profit,
    Loss,
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportStatus::NoData => write!(f, "no data yet"),
            ReportStatus::Profit => write!(f, "profit"),
            ReportStatus::Loss => write!(f, "loss"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub period: ReportPeriod,
    pub total_cost: f64,
    pub total_sales: f64,
    pub profit: f64,
    pub status: ReportStatus,
    pub cost_count: usize,
    pub sale_count: usize,
}

fn finite(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Sums the costs and sales that fall in `period`.
///
/// Sale totals are recomputed from quantity and unit price. Non-finite
/// amounts count as zero, and so does a sum that overflows.
pub fn generate(costs: &[Entry<Cost>], sales: &[Entry<Sale>], period: &ReportPeriod) -> Report {
    let costs: Vec<&Entry<Cost>> = costs.iter().filter(|c| period.includes_cost(c)).collect();
    let sales: Vec<&Entry<Sale>> = sales.iter().filter(|s| period.includes_sale(s)).collect();

    let total_cost = finite(costs.iter().map(|c| finite(c.record.amount)).sum());
    let total_sales = finite(
        sales
            .iter()
            .map(|s| finite(s.record.computed_total()))
            .sum(),
    );
    let profit = finite(total_sales - total_cost);

    let status = if total_cost == 0.0 && total_sales == 0.0 {
        ReportStatus::NoData
    } else if profit >= 0.0 {
        ReportStatus::Profit
    } else {
        ReportStatus::Loss
    };

    Report {
        period: *period,
        total_cost,
        total_sales,
        profit,
        status,
        cost_count: costs.len(),
        sale_count: sales.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CostType, LocalId};
    use chrono::{TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn cost(amount: f64, cost_date: NaiveDate) -> Entry<Cost> {
        Entry {
            local_id: LocalId(1),
            backend_id: None,
            created_at: Utc::now(),
            record: Cost {
                cost_type: CostType::Outro,
                amount,
                cost_date,
            },
        }
    }

    fn sale(quantity: f64, unit_price: f64, day: NaiveDate) -> Entry<Sale> {
        Entry {
            local_id: LocalId(2),
            backend_id: None,
            created_at: Utc.from_utc_datetime(&day.and_hms_opt(15, 30, 0).unwrap()),
            record: Sale::new("Milho", quantity, unit_price),
        }
    }

    #[test]
    fn test_january_example() {
        let costs = vec![cost(100.0, date(2024, 1, 5)), cost(50.0, date(2024, 2, 1))];
        let sales = vec![sale(10.0, 30.0, date(2024, 1, 10))];
        let period = ReportPeriod::new(Some(date(2024, 1, 1)), Some(date(2024, 1, 31)));

        let report = generate(&costs, &sales, &period);
        assert_eq!(report.total_cost, 100.0);
        assert_eq!(report.total_sales, 300.0);
        assert_eq!(report.profit, 200.0);
        assert_eq!(report.status, ReportStatus::Profit);
        assert_eq!(report.cost_count, 1);
    }

    #[test]
    fn test_no_range_sums_everything() {
        let costs = vec![cost(100.0, date(2024, 1, 5)), cost(50.0, date(2024, 2, 1))];
        let sales = vec![sale(1.0, 20.0, date(2023, 12, 31))];

        let report = generate(&costs, &sales, &ReportPeriod::all());
        assert_eq!(report.total_cost, 150.0);
        assert_eq!(report.total_sales, 20.0);
        assert_eq!(report.profit, -130.0);
        assert_eq!(report.status, ReportStatus::Loss);
    }

    #[test]
    fn test_range_excluding_everything_has_no_data() {
        let costs = vec![cost(100.0, date(2024, 1, 5))];
        let sales = vec![sale(1.0, 20.0, date(2024, 1, 5))];
        let period = ReportPeriod::new(Some(date(2025, 1, 1)), None);

        let report = generate(&costs, &sales, &period);
        assert_eq!(report.total_cost, 0.0);
        assert_eq!(report.total_sales, 0.0);
        assert_eq!(report.status, ReportStatus::NoData);
        assert_eq!(report.status.to_string(), "no data yet");
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let period = ReportPeriod::new(Some(date(2024, 1, 1)), Some(date(2024, 1, 31)));
        assert!(period.contains(date(2024, 1, 1)));
        assert!(period.contains(date(2024, 1, 31)));
        assert!(!period.contains(date(2023, 12, 31)));
        assert!(!period.contains(date(2024, 2, 1)));
    }

    #[test]
    fn test_sale_total_is_rederived() {
        let mut tampered = sale(2.0, 5.0, date(2024, 3, 3));
        tampered.record.total = 1_000.0;

        let report = generate(&[], &[tampered], &ReportPeriod::all());
        assert_eq!(report.total_sales, 10.0);
    }

    #[test]
    fn test_non_finite_amounts_count_as_zero() {
        let costs = vec![cost(f64::NAN, date(2024, 1, 5)), cost(5.0, date(2024, 1, 6))];
        let report = generate(&costs, &[], &ReportPeriod::all());
        assert_eq!(report.total_cost, 5.0);
    }

    #[test]
    fn test_overflowing_totals_never_yield_nan() {
        let costs = vec![cost(1e308, date(2024, 1, 5)), cost(1e308, date(2024, 1, 6))];
        let sales = vec![
            sale(1.0, 1e308, date(2024, 1, 5)),
            sale(1.0, 1e308, date(2024, 1, 6)),
        ];

        let report = generate(&costs, &sales, &ReportPeriod::all());
        assert!(report.total_cost.is_finite());
        assert!(report.total_sales.is_finite());
        assert!(!report.profit.is_nan());
        assert_eq!(report.profit, 0.0);
        assert_eq!(report.status, ReportStatus::NoData);
    }

    #[test]
    fn test_overflowing_profit_counts_as_zero() {
        let costs = vec![cost(1.7e308, date(2024, 1, 5))];
        let sales = vec![sale(-1.0, 1.7e308, date(2024, 1, 5))];

        let report = generate(&costs, &sales, &ReportPeriod::all());
        assert_eq!(report.profit, 0.0);
    }

    #[test]
    fn test_break_even_is_profit() {
        let costs = vec![cost(20.0, date(2024, 1, 5))];
        let sales = vec![sale(1.0, 20.0, date(2024, 1, 5))];
        let report = generate(&costs, &sales, &ReportPeriod::all());
        assert_eq!(report.status, ReportStatus::Profit);
    }

    #[test]
    fn test_period_display() {
        assert_eq!(ReportPeriod::all().to_string(), "all records");
        assert_eq!(
            ReportPeriod::new(Some(date(2024, 1, 1)), None).to_string(),
            "2024-01-01 to today"
        );
        assert_eq!(
            ReportPeriod::new(None, Some(date(2024, 1, 31))).to_string(),
            "beginning to 2024-01-31"
        );
    }
}
