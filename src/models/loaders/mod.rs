pub mod source_loader;

pub use source_loader::{load_category_source, SourceDocument};
