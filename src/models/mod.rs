mod interaction;
mod likes;
mod transaction;

pub use interaction::{InteractionEvent, InteractionKind, TrackedInteraction, START_SENTINEL};
pub use likes::{Catalog, LikeRecord, LikesTable, REQUIRED_COLUMNS};
pub use transaction::TransactionRecord;
