// Instrument catalog lookup
pub mod catalog;

// Re-export commonly used types
pub use catalog::{
    CatalogEntry, CatalogSelection, InstrumentCatalog, RemoteCatalog, StaticCatalog,
    filter_by_payout, load_catalog,
    select_tracked,
};
