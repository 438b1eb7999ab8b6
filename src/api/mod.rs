pub mod types;
pub mod classifier;
pub mod client;
pub mod rate_limiter;


pub use types::*;
pub use client::ApiClient;
pub use rate_limiter::RateLimiter;
