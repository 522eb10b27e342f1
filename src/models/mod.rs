mod cost;
mod cost_type;
mod draft;
pub mod money;
mod product;
mod record;
mod sale;

pub use cost::Cost;
pub use cost_type::CostType;
pub use draft::{CostDraft, ProductDraft, RecordDraft, SaleDraft, ValidationError};
pub use product::Product;
pub use record::{BackendId, Entry, LocalId, RecordData, RecordKind, RecordPayload, StoredRecord};
pub use sale::Sale;
