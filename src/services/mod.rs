// Service exports
pub mod auth;
pub mod cache;
pub mod export;
pub mod memory;
pub mod postgres;
pub mod seed;
pub mod sizing;
pub mod store;

pub use auth::{AuthError, Claims, TokenVerifier};
pub use cache::{CacheKey, CatalogCache, GarmentSizing};
pub use export::{render_csv, ExportError};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use seed::SeedData;
pub use sizing::{SizingError, SizingService};
pub use store::{CatalogStore, RecordStore, StoreError};
