pub mod hasher;
pub mod json_store;

pub use hasher::Argon2Hasher;
pub use json_store::JsonFileStore;
