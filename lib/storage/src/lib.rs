pub mod catalog;
pub mod snapshot;
pub mod store;

pub use catalog::{CatalogConfig, CatalogStore};
pub use snapshot::{load_snapshot, save_snapshot, CatalogSnapshot, SNAPSHOT_VERSION};
pub use store::{CandidateOrder, ProductStore, StoreQuery, VectorField, MISSING_DISTANCE};
