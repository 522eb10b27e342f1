use chrono::NaiveDate;
use clap::{Args, Subcommand};

use agrofacil::models::money::format_brl;
use agrofacil::models::{CostDraft, CostType, RecordDraft, RecordKind};
use agrofacil::session::Session;

use super::{delete_record, print_created, print_json_list, sync_mark, OutputFormat};

#[derive(Args)]
pub struct CostCommand {
    #[command(subcommand)]
    pub command: CostSubcommand,
}

#[derive(Subcommand)]
pub enum CostSubcommand {
    /// Record money spent
    Add {
        /// Amount spent
        amount: f64,

        /// Cost type: insumo, racao, manutencao, energia, mao_de_obra, outro
        #[arg(long = "type", value_name = "TYPE")]
        cost_type: Option<CostType>,

        /// Date of the cost (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// List costs
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete a cost
    Delete {
        /// Cost ID as shown by `list`
        id: u64,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl CostCommand {
    pub async fn run(&self, session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            CostSubcommand::Add {
                amount,
                cost_type,
                date,
            } => {
                let draft = CostDraft {
                    cost_type: *cost_type,
                    amount: Some(*amount),
                    cost_date: *date,
                };
                let outcome = session.store.create(RecordDraft::Cost(draft)).await?;
                print_created(session, &outcome);
                Ok(())
            }

            CostSubcommand::List { format } => {
                let costs = session.store.costs();
                if costs.is_empty() {
                    println!("No costs found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => print_json_list(costs)?,
                    OutputFormat::Text => {
                        println!(
                            "{:>4}  {:<6}  {:<10}  {:<12}  AMOUNT",
                            "ID", "SYNCED", "DATE", "TYPE"
                        );
                        println!("{}", "-".repeat(60));
                        for entry in costs {
                            let cost = &entry.record;
                            println!(
                                "{:>4}  {:<6}  {:<10}  {:<12}  {}",
                                entry.local_id.0,
                                sync_mark(entry),
                                cost.cost_date,
                                cost.cost_type.label(),
                                format_brl(cost.amount)
                            );
                        }
                        let total: f64 = costs
                            .iter()
                            .map(|e| e.record.amount)
                            .filter(|a| a.is_finite())
                            .sum();
                        println!("\nTotal: {} cost(s), {}", costs.len(), format_brl(total));
                    }
                }
                Ok(())
            }

            CostSubcommand::Delete { id, force } => {
                delete_record(session, RecordKind::Cost, *id, *force).await
            }
        }
    }
}
