/// Catalog persistence backends.
pub mod catalog_store;
/// Storage errors shared by every backend.
pub mod storage;
