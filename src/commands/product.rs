use clap::{Args, Subcommand};

use agrofacil::models::{ProductDraft, RecordDraft, RecordKind};
use agrofacil::session::Session;

use super::{delete_record, print_created, print_json_list, sync_mark, OutputFormat};

#[derive(Args)]
pub struct ProductCommand {
    #[command(subcommand)]
    pub command: ProductSubcommand,
}

#[derive(Subcommand)]
pub enum ProductSubcommand {
    /// Register a product
    Add {
        /// Product name
        name: String,

        /// Category (e.g. grains, dairy)
        #[arg(long)]
        category: Option<String>,

        /// Purchase price
        #[arg(long)]
        purchase_price: Option<f64>,

        /// Sell price
        #[arg(long)]
        sell_price: Option<f64>,
    },

    /// List products
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete a product
    Delete {
        /// Product ID as shown by `list`
        id: u64,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl ProductCommand {
    pub async fn run(&self, session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ProductSubcommand::Add {
                name,
                category,
                purchase_price,
                sell_price,
            } => {
                let draft = ProductDraft {
                    name: name.clone(),
                    category: category.clone(),
                    purchase_price: *purchase_price,
                    sell_price: *sell_price,
                };
                let outcome = session.store.create(RecordDraft::Product(draft)).await?;
                print_created(session, &outcome);
                Ok(())
            }

            ProductSubcommand::List { format } => {
                let products = session.store.products();
                if products.is_empty() {
                    println!("No products found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => print_json_list(products)?,
                    OutputFormat::Text => {
                        println!("{:>4}  {:<6}  PRODUCT", "ID", "SYNCED");
                        println!("{}", "-".repeat(60));
                        for entry in products {
                            println!(
                                "{:>4}  {:<6}  {}",
                                entry.local_id.0,
                                sync_mark(entry),
                                entry.record
                            );
                        }
                        println!("\nTotal: {} product(s)", products.len());
                    }
                }
                Ok(())
            }

            ProductSubcommand::Delete { id, force } => {
                delete_record(session, RecordKind::Product, *id, *force).await
            }
        }
    }
}
