//! cbe-client: fetches official CBE receipts and verifies claims against them

pub mod fetch;
pub mod verify;

pub use fetch::{FetchConfig, ReceiptFetcher, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
pub use verify::{verify, verify_blocking, Verifier, VerifyOptions, VerifyRequest};
