mod kind;
mod types;

pub use kind::EntityKind;
pub use types::{Brand, Category, Product, Transaction, TransactionKind, TransactionStatus};
