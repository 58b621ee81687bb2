#![cfg_attr(feature = "docs", feature(doc_cfg))]
#![deny(
    single_use_lifetimes,
    missing_debug_implementations,
    large_assignments,
    exported_private_dependencies,
    absolute_paths_not_starting_with_crate,
    anonymous_parameters,
    explicit_outlives_requirements,
    keyword_idents,
    macro_use_extern_crate,
    meta_variable_misuse,
    non_ascii_idents,
    trivial_numeric_casts,
    unreachable_pub,
    unsafe_code,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications
)]

//! # awsasync-http-client
//!
//! ## 异步请求执行流水线
//!
//! 将一个描述服务调用的 [`Request`] 经过以下步骤转换为类型化的 [`Response`] 或结构化的 [`Error`]：
//!
//! 1. 获取认证信息，执行拦截器链的请求前回调
//! 2. 写入调用 ID、User-Agent、自定义 Header 和查询参数
//! 3. 将请求体包装为可重置、只关闭一次的请求体，上报上传进度
//! 4. 选择签名器对请求签名
//! 5. 构建传输层请求，通过 [`http::HttpCaller`] 发送
//! 6. 根据状态码选择成功响应处理器或错误响应处理器，边读取响应体边计算 CRC32
//! 7. 发布进度事件，记录并收集请求指标
//!
//! 流水线本身不重试，不管理连接池，也不处理 TLS，这些都由调用方或传输层负责。
//!
//! ### 代码示例
//!
//! ```no_run
//! # async fn example() -> anyhow::Result<()> {
//! use awsasync_http_client::{
//!     http::Method, url::Url, ExecutionContext, HttpClient, NoOpResponseHandler, Request, RequestContent,
//! };
//!
//! let client = HttpClient::default();
//! let response = client
//!     .request_execution_builder()
//!     .request(
//!         Request::builder("S3", Method::PUT)
//!             .endpoint(Url::parse("https://s3.example.com")?)
//!             .resource_path("/bucket/key")
//!             .content(RequestContent::from_bytes("hello"))
//!             .build(),
//!     )
//!     .execution_context(ExecutionContext::default())
//!     .execute(NoOpResponseHandler)
//!     .await?;
//! println!("invocation id: {}", response.invocation_id());
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod content;
mod context;
mod error;
mod interceptor;
mod metrics;
mod progress;
mod request;
mod response;
mod service_client;
mod signer;
mod transport;

#[cfg(test)]
mod test_utils;

pub use awsasync_credential as credential;
pub use awsasync_http as http;
#[cfg(feature = "reqwest")]
#[cfg_attr(feature = "docs", doc(cfg(feature = "reqwest")))]
pub use awsasync_reqwest as reqwest;
pub use url;

pub use client::{HttpClient, HttpClientBuilder, RequestExecutionBuilder};
pub use config::{
    ClientConfiguration, ClientConfigurationBuilder, HttpClientSettings, DEFAULT_CONNECTION_TIMEOUT,
    DEFAULT_RESPONSE_METADATA_CACHE_SIZE, DEFAULT_SOCKET_TIMEOUT,
};
pub use content::{
    make_resettable, BufferedContent, MemoryContent, ProgressReader, ReleasableContent, RequestContent,
    ResettableContent, SeekableContent, DEFAULT_READ_LIMIT,
};
pub use context::{ExecutionContext, ExecutionContextBuilder};
pub use error::{ApiResult, ClientError, ClientErrorKind, Error, ErrorType, ServiceError};
pub use interceptor::{CredentialsAware, Interceptor};
pub use metrics::{
    clear_global_metric_collector, global_metric_collector, set_global_metric_collector, Field,
    RequestMetricCollector, RequestMetrics, TimingInfo,
};
pub use progress::{
    publish_event, publish_progress, publish_request_bytes, publish_request_content_length, publish_request_reset,
    publish_response_bytes, publish_response_content_length, ProgressEvent, ProgressEventType, ProgressListener,
};
pub use request::{
    ClientOptionMarker, OriginalRequest, Parameters, Request, RequestBuilder, RequestClientOptions, RequestConfig,
    RequestConfigBuilder,
};
pub use response::{
    is_successful, verify_crc32, ChecksumMismatchError, Crc32Checksum, Crc32Reader, ErrorResponseHandler,
    HandlerError, HttpResponse, JsonErrorResponseHandler, JsonResponseHandler, NoOpResponseHandler, Response,
    ResponseHandler, ResponseMetadata, ResponseMetadataCache,
};
pub use service_client::{Marshaller, ServiceClient, ServiceClientBuilder};
pub use signer::{DefaultSignerProvider, NoOpSigner, Signer, SignerProvider, SignerProviderContext};

/// 将所有 Trait 全部重新导出，方便统一导入
pub mod prelude {
    pub use super::{
        CredentialsAware, ErrorResponseHandler, Interceptor, Marshaller, OriginalRequest, ProgressListener,
        RequestMetricCollector, ResettableContent, ResponseHandler, Signer, SignerProvider,
    };
    pub use awsasync_credential::CredentialsProvider;
    pub use awsasync_http::HttpCaller;
}
