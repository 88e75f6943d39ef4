pub mod client;
pub mod solution;
pub mod types;

pub use client::GeminiHttpClient;
pub use solution::GeminiSolutionClient;
