pub mod export;
pub mod profile;
