use clap::{Args, Subcommand};

use agrofacil::models::money::format_brl;
use agrofacil::models::{RecordDraft, RecordKind, SaleDraft};
use agrofacil::session::Session;

use super::{delete_record, print_created, print_json_list, sync_mark, OutputFormat};

#[derive(Args)]
pub struct SaleCommand {
    #[command(subcommand)]
    pub command: SaleSubcommand,
}

#[derive(Subcommand)]
pub enum SaleSubcommand {
    /// Record a sale
    Add {
        /// Name of the product sold
        product: String,

        /// Quantity sold
        #[arg(long)]
        quantity: f64,

        /// Price per unit
        #[arg(long)]
        unit_price: f64,
    },

    /// List sales
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete a sale
    Delete {
        /// Sale ID as shown by `list`
        id: u64,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl SaleCommand {
    pub async fn run(&self, session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            SaleSubcommand::Add {
                product,
                quantity,
                unit_price,
            } => {
                if !product.trim().is_empty() && !session.store.has_product_named(product) {
                    eprintln!("Note: no product named '{}' is registered", product.trim());
                }

                let draft = SaleDraft::new(product.clone(), *quantity, *unit_price);
                let outcome = session.store.create(RecordDraft::Sale(draft)).await?;
                print_created(session, &outcome);
                Ok(())
            }

            SaleSubcommand::List { format } => {
                let sales = session.store.sales();
                if sales.is_empty() {
                    println!("No sales found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => print_json_list(sales)?,
                    OutputFormat::Text => {
                        println!(
                            "{:>4}  {:<6}  {:<10}  {:<20}  {:>8}  TOTAL",
                            "ID", "SYNCED", "DATE", "PRODUCT", "QTY"
                        );
                        println!("{}", "-".repeat(70));
                        for entry in sales {
                            let sale = &entry.record;
                            println!(
                                "{:>4}  {:<6}  {:<10}  {:<20}  {:>8}  {}",
                                entry.local_id.0,
                                sync_mark(entry),
                                entry.created_at.date_naive(),
                                sale.product_name,
                                sale.quantity,
                                format_brl(sale.computed_total())
                            );
                        }
                        println!("\nTotal: {} sale(s)", sales.len());
                    }
                }
                Ok(())
            }

            SaleSubcommand::Delete { id, force } => {
                delete_record(session, RecordKind::Sale, *id, *force).await
            }
        }
    }
}
