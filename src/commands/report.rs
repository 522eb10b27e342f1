use chrono::NaiveDate;
use clap::Args;
use std::path::PathBuf;

use agrofacil::models::money::format_brl;
use agrofacil::report::{self, ReportPeriod};
use agrofacil::session::Session;

use super::OutputFormat;

const BAR_WIDTH: usize = 30;

/// Show totals and profit for a period
#[derive(Args)]
pub struct ReportCommand {
    /// First day included (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last day included (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Also write the text export to this file
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,
}

fn bar(value: f64, max: f64) -> String {
    let filled = if max > 0.0 && value.is_finite() {
        ((value / max) * BAR_WIDTH as f64).round() as usize
    } else {
        0
    };
    format!(
        "{}{}",
        "#".repeat(filled.min(BAR_WIDTH)),
        ".".repeat(BAR_WIDTH - filled.min(BAR_WIDTH))
    )
}

impl ReportCommand {
    pub fn run(&self, session: &Session) -> Result<(), Box<dyn std::error::Error>> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(format!("--from {} is after --to {}", from, to).into());
            }
        }

        let period = ReportPeriod::new(self.from, self.to);
        let costs = session.store.costs();
        let sales = session.store.sales();
        let summary = report::generate(costs, sales, &period);
        let text = report::export_text(costs, sales, &period);

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
            OutputFormat::Text => {
                print!("{}", text);
                println!();

                let max = summary.total_cost.max(summary.total_sales).max(1.0);
                println!(
                    "Costs  {}  {}",
                    bar(summary.total_cost, max),
                    format_brl(summary.total_cost)
                );
                println!(
                    "Sales  {}  {}",
                    bar(summary.total_sales, max),
                    format_brl(summary.total_sales)
                );
                println!();
                println!("Status: {}", summary.status);
            }
        }

        if let Some(path) = &self.export {
            std::fs::write(path, &text)?;
            println!("Report exported to {}", path.display());
        }

        Ok(())
    }
}
