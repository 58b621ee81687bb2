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

//! # awsasync-http
//!
//! ## 异步请求流水线的 HTTP 传输层接口
//!
//! 定义了流水线与 HTTP 传输实现之间的 [`HttpCaller`] 接口，以及传输层原生的请求和响应结构体。
//! 任何实现了 [`HttpCaller`] 的类型都可以作为流水线的底层 HTTP 客户端。

mod error;
mod request;
mod response;

pub use error::{Error as ResponseError, ErrorBuilder as ResponseErrorBuilder, ErrorKind as ResponseErrorKind};
pub use http::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    method::Method,
    status::StatusCode,
    uri::{self, Uri},
    Extensions, Version,
};
pub use request::{Body as RequestBody, Request, RequestBuilder};
pub use response::{Body as ResponseBody, Response, ResponseBuilder, Result as ResponseResult};

use futures::future::BoxFuture;
use once_cell::sync::Lazy;
use std::{any::Any, env::consts::ARCH, env::consts::OS, fmt::Debug};

static FULL_USER_AGENT: Lazy<Box<str>> = Lazy::new(|| {
    format!(
        "awsasync-rust/{} rust/{} {}/{}",
        env!("CARGO_PKG_VERSION"),
        env!("RUSTC_VERSION"),
        OS,
        ARCH,
    )
    .into()
});

/// 获取默认的 UserAgent
///
/// 格式为 `awsasync-rust/<版本> rust/<编译器版本> <操作系统>/<架构>`
#[inline]
pub fn default_user_agent() -> &'static str {
    FULL_USER_AGENT.as_ref()
}

/// HTTP 请求处理接口
///
/// 实现该接口，即可处理请求流水线发送的所有 HTTP 请求
pub trait HttpCaller: Any + Debug + Send + Sync {
    /// 异步发送 HTTP 请求
    ///
    /// 请求体的所有权转移给传输层，传输失败时返回 [`ResponseError`]
    fn call(&self, request: Request) -> BoxFuture<'_, ResponseResult>;

    fn as_http_caller(&self) -> &dyn HttpCaller;
    fn as_any(&self) -> &dyn Any;
}

pub mod preclude {
    pub use super::HttpCaller;
    pub use futures::io::{AsyncRead, AsyncReadExt};
}
