mod execution_builder;
mod executor;
mod http_client;

pub use execution_builder::RequestExecutionBuilder;
pub use http_client::{HttpClient, HttpClientBuilder};
