//! Plain-text report export.

use std::fmt::Write;

use super::{generate, ReportPeriod};
use crate::models::money::{format_brl, parse_brl};
use crate::models::{Cost, Entry, Sale};

const HEADER: &str = "=== AGROFACIL REPORT ===";
const TOTAL_COSTS: &str = "Total costs:";
const TOTAL_SALES: &str = "Total sales:";
const PROFIT_LOSS: &str = "Profit/Loss:";

/// Renders the report for `period` with one line per included record.
pub fn export_text(costs: &[Entry<Cost>], sales: &[Entry<Sale>], period: &ReportPeriod) -> String {
    let report = generate(costs, sales, period);
    let mut out = String::new();

    // Writing to a String cannot fail.
    let _ = writeln!(out, "{}", HEADER);
    let _ = writeln!(out);
    let _ = writeln!(out, "Period: {}", period);
    let _ = writeln!(out, "{} {}", TOTAL_COSTS, format_brl(report.total_cost));
    let _ = writeln!(out, "{} {}", TOTAL_SALES, format_brl(report.total_sales));
    let _ = writeln!(out, "{} {}", PROFIT_LOSS, format_brl(report.profit));

    let _ = writeln!(out);
    let _ = writeln!(out, "--- COSTS ---");
    for entry in costs.iter().filter(|c| period.includes_cost(c)) {
        let cost = &entry.record;
        let _ = writeln!(
            out,
            "{} - {} - {}",
            cost.cost_type.label(),
            format_brl(cost.amount),
            cost.cost_date
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "--- SALES ---");
    for entry in sales.iter().filter(|s| period.includes_sale(s)) {
        let sale = &entry.record;
        let _ = writeln!(
            out,
            "{} - Qty: {} - {}",
            sale.product_name,
            sale.quantity,
            format_brl(sale.computed_total())
        );
    }

    out
}

/// The three totals read back from an export.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportedTotals {
    pub total_cost: f64,
    pub total_sales: f64,
    pub profit: f64,
}

/// Reads the total lines of an export. Returns `None` if any is missing or
/// malformed.
pub fn parse_totals(text: &str) -> Option<ExportedTotals> {
    let find = |label: &str| {
        text.lines()
            .find_map(|line| line.strip_prefix(label))
            .and_then(parse_brl)
    };

    Some(ExportedTotals {
        total_cost: find(TOTAL_COSTS)?,
        total_sales: find(TOTAL_SALES)?,
        profit: find(PROFIT_LOSS)?,
    })
}
