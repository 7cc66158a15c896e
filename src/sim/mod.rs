/// Asset specifications and their validation.
pub mod assets;
pub mod costs;
pub mod engine;
pub mod error;
/// Scalar and elementwise clamping.
pub mod limits;
pub mod profile;
pub mod summary;
pub mod types;
