//! Types that represent the core data model, such as `TxKind`, `Amount` and the draft that the
//! dialogue accumulates.

mod amount;
mod draft;

pub use amount::Amount;
pub use draft::{NewTransaction, TransactionDraft};
use serde::{Deserialize, Serialize};

/// The kind of a ledger transaction. The kind decides which fields a transaction requires:
/// `Income` and `Expense` carry a category, `Transfer` carries a destination account instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxKind {
    Income,
    Expense,
    Transfer,
}

serde_plain::derive_display_from_serialize!(TxKind);
serde_plain::derive_fromstr_from_deserialize!(TxKind);
