//! Singer protocol surface: messages written to stdout, the catalog used for
//! discovery and stream selection, bookmark state and the `--about` description.

mod about;
mod catalog;
mod messages;
mod state;

// Re-export public API
pub use about::{about_info, AboutFormat};
pub use catalog::{Catalog, CatalogEntry, MetadataEntry};
pub use messages::{Message, SingerWriter};
pub use state::State;
