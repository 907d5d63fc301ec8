pub mod discovery;
pub mod infra;
pub mod pipeline;
pub mod report;
pub mod sources;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
