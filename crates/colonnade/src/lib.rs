//! Colonnade — an in-memory typed tabular data engine.
//!
//! Facade crate: re-exports the engine surface of `colonnade-core`. Build
//! tables from typed columns, keep hash/trie/interval indices consistent
//! under mutation, and compute equi-joins through the shared trie matcher.
//!
//! ```
//! use colonnade::prelude::*;
//!
//! let mut genes = Table::new("genes");
//! genes.add_column("GENE_ID", ValueKind::Text)?;
//! genes.add_column("FPKM", ValueKind::Int)?;
//! genes.append_row(vec![Value::Text("A".into()), Value::Int(5)])?;
//! genes.add_index("by_gene", &["GENE_ID"], true)?;
//!
//! assert_eq!(genes.find("by_gene", &[Value::Text("A".into())])?, Some(0));
//! # Ok::<(), colonnade::error::InternalError>(())
//! ```

pub use colonnade_core::{MAX_INDEX_COLUMNS, column, error, index, interval, join, key, obs, table, value};

pub mod prelude {
    pub use colonnade_core::prelude::*;
}
