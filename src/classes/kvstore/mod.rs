pub mod _kvstore;
pub mod _kvstore_memory;
pub mod _kvstore_persistent;
