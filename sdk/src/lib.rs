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
    missing_docs,
    non_ascii_idents,
    trivial_numeric_casts,
    unsafe_code,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications
)]

//! # awsasync-sdk
//!
//! ## 异步请求流水线 SDK
//!
//! 通过功能开关重新导出认证信息、HTTP 传输接口、reqwest 传输实现和请求执行流水线

#[cfg(feature = "credential")]
#[cfg_attr(feature = "docs", doc(cfg(feature = "credential")))]
pub use awsasync_credential as credential;

#[cfg(feature = "http")]
#[cfg_attr(feature = "docs", doc(cfg(feature = "http")))]
pub use awsasync_http as http;

#[cfg(feature = "reqwest")]
#[cfg_attr(feature = "docs", doc(cfg(feature = "reqwest")))]
pub use awsasync_reqwest as reqwest;

#[cfg(feature = "http-client")]
#[cfg_attr(feature = "docs", doc(cfg(feature = "http-client")))]
pub use awsasync_http_client as http_client;
