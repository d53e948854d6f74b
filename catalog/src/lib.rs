pub mod check;
pub mod discover;
mod error;
pub mod manifest;
pub mod models;
pub mod page;
pub mod validate;

pub use check::{AssetChecker, AssetKind, UnresolvedAsset};
pub use discover::AssetLayout;
pub use error::CatalogError;
pub use models::{AssetRef, Catalog, Example, Method, SampleEntry};
pub use page::{render_page, PageOptions};
pub use validate::Violation;
