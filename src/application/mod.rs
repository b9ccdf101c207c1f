// Application layer - Pipeline services and persistence ports
pub mod batcher;
pub mod reading_store;
pub mod session;
