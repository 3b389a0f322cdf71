//! Identity resolution and merge engine.
//!
//! Pure functions over explicit inputs: catalog snapshot, owned records and
//! view options. Nothing here performs I/O or reads shared state.

pub mod catalog_index;
pub mod grouping;
pub mod identify;
pub mod library;
pub mod model;
pub mod normalize;
pub mod stats;
pub mod trophies;

pub use catalog_index::{CatalogIndex, CatalogIndexCache};
pub use grouping::group;
pub use identify::{Identification, identify};
pub use library::{LibraryOptions, LibraryRow, aggregate};
pub use normalize::normalize;
