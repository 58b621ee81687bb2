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
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unsafe_code,
    unused_extern_crates,
    unused_import_braces,
    unused_lifetimes,
    unused_qualifications
)]

//! # awsasync-reqwest
//!
//! ## 基于 Reqwest 的 HTTP 传输层实现
//!
//! 为请求流水线提供 [`awsasync_http::HttpCaller`] 的异步实现，支持请求超时、连接超时和本地绑定地址

mod async_client;

pub use async_client::AsyncClient;
pub use awsasync_http as http;
pub use reqwest;
