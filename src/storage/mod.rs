//! Persistence seam for MGP rows.
//!
//! [`RecordStore`] is the backend contract; [`InMemoryRecordStore`] is the
//! bundled implementation. [`commit`] is the stage that turns a filter
//! decision into a row finalization.

mod commit;
mod memory;
mod traits;

pub use commit::commit;
pub use memory::InMemoryRecordStore;
pub use traits::{RecordStore, StorageError};
