mod context;
mod error;
mod ops;
mod result;

pub use context::DbContext;
pub use error::DbError;
pub use ops::{Documents, Page, Selector};
pub use result::{DeleteOutcome, InsertOutcome, UpdateOutcome};
