#![cfg_attr(feature = "docs", feature(doc_cfg))]
#![deny(
    absolute_paths_not_starting_with_crate,
    anonymous_parameters,
    explicit_outlives_requirements,
    keyword_idents,
    macro_use_extern_crate,
    meta_variable_misuse,
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

//! # awsasync-credential
//!
//! ## 认证信息
//!
//! 定义认证信息 [`Credentials`] 以及认证信息提供者接口 [`CredentialsProvider`]，
//! 请求执行流水线通过该接口获取签名所需的认证信息。

use futures::future::BoxFuture;
use once_cell::sync::Lazy;
use std::{
    any::Any,
    collections::VecDeque,
    env,
    ffi::OsStr,
    fmt::{self, Debug},
    io::{Error, ErrorKind, Result},
    sync::{Arc, RwLock},
};

pub mod preclude {
    pub use super::CredentialsProvider;
}

/// 认证信息
///
/// 包含 AccessKeyId，SecretAccessKey 和可选的会话令牌
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl Credentials {
    /// 创建认证信息
    #[inline]
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    /// 创建带有会话令牌的临时认证信息
    #[inline]
    pub fn with_session_token(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: Some(session_token.into()),
        }
    }

    /// 获取 AccessKeyId
    #[inline]
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// 获取 SecretAccessKey
    #[inline]
    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    /// 获取会话令牌
    #[inline]
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"CENSORED")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "CENSORED"),
            )
            .finish()
    }
}

/// 认证信息提供者
///
/// 返回 `Ok(None)` 表示匿名访问，返回错误则表示获取认证信息失败。
/// 该接口可能会被多个并发请求同时调用，实现必须是线程安全的。
pub trait CredentialsProvider: Any + Debug + Sync + Send {
    /// 返回认证信息
    fn get(&self) -> Result<Option<Credentials>>;

    /// 异步返回认证信息
    #[inline]
    fn async_get(&self) -> BoxFuture<'_, Result<Option<Credentials>>> {
        Box::pin(async move { self.get() })
    }

    fn as_any(&self) -> &dyn Any;
    fn as_credentials_provider(&self) -> &dyn CredentialsProvider;
}

/// 静态认证信息提供者，一旦创建则不可修改
#[derive(Clone, Eq, PartialEq)]
pub struct StaticCredentialsProvider {
    credentials: Credentials,
}

impl StaticCredentialsProvider {
    /// 构建一个静态认证信息提供者
    #[inline]
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

impl CredentialsProvider for StaticCredentialsProvider {
    #[inline]
    fn get(&self) -> Result<Option<Credentials>> {
        Ok(Some(self.credentials.to_owned()))
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_credentials_provider(&self) -> &dyn CredentialsProvider {
        self
    }
}

impl Debug for StaticCredentialsProvider {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_fmt(format_args!(
            "StaticCredentialsProvider {{ access_key_id: {:?}, secret_access_key: CENSORED }}",
            self.credentials.access_key_id,
        ))
    }
}

/// 匿名认证信息提供者，总是返回空的认证信息
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct AnonymousCredentialsProvider;

impl CredentialsProvider for AnonymousCredentialsProvider {
    #[inline]
    fn get(&self) -> Result<Option<Credentials>> {
        Ok(None)
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_credentials_provider(&self) -> &dyn CredentialsProvider {
        self
    }
}

/// 全局认证信息提供者，可以将认证信息配置在全局变量中
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct GlobalCredentialsProvider;

static GLOBAL_CREDENTIALS: Lazy<RwLock<Option<Credentials>>> = Lazy::new(|| RwLock::new(None));

impl GlobalCredentialsProvider {
    /// 配置全局认证信息
    pub fn setup(credentials: Credentials) {
        if let Ok(mut global_credentials) = GLOBAL_CREDENTIALS.write() {
            *global_credentials = Some(credentials);
        }
    }

    /// 清空全局认证信息
    pub fn clear() {
        if let Ok(mut global_credentials) = GLOBAL_CREDENTIALS.write() {
            *global_credentials = None;
        }
    }
}

impl CredentialsProvider for GlobalCredentialsProvider {
    fn get(&self) -> Result<Option<Credentials>> {
        let global_credentials = GLOBAL_CREDENTIALS
            .read()
            .map_err(|err| Error::new(ErrorKind::Other, err.to_string()))?;
        if let Some(credentials) = global_credentials.as_ref() {
            Ok(Some(credentials.to_owned()))
        } else {
            Err(Error::new(
                ErrorKind::Other,
                "GlobalCredentialsProvider is not set up, please call GlobalCredentialsProvider::setup() to do it",
            ))
        }
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_credentials_provider(&self) -> &dyn CredentialsProvider {
        self
    }
}

impl Debug for GlobalCredentialsProvider {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match GLOBAL_CREDENTIALS.read().ok().as_ref().and_then(|c| c.as_ref()) {
            Some(credentials) => f.write_fmt(format_args!(
                "GlobalCredentialsProvider {{ access_key_id: {:?}, secret_access_key: CENSORED }}",
                credentials.access_key_id,
            )),
            None => write!(f, "GlobalCredentialsProvider {{ None }}"),
        }
    }
}

/// 环境变量认证信息提供者
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct EnvCredentialsProvider;

/// 设置 AccessKeyId 的环境变量
pub const ACCESS_KEY_ID_ENV_KEY: &str = "AWS_ACCESS_KEY_ID";
/// 设置 SecretAccessKey 的环境变量
pub const SECRET_ACCESS_KEY_ENV_KEY: &str = "AWS_SECRET_ACCESS_KEY";
/// 设置会话令牌的环境变量
pub const SESSION_TOKEN_ENV_KEY: &str = "AWS_SESSION_TOKEN";

impl EnvCredentialsProvider {
    /// 配置环境变量认证信息提供者
    #[inline]
    pub fn setup(access_key_id: impl AsRef<OsStr>, secret_access_key: impl AsRef<OsStr>) {
        env::set_var(ACCESS_KEY_ID_ENV_KEY, access_key_id);
        env::set_var(SECRET_ACCESS_KEY_ENV_KEY, secret_access_key);
    }
}

impl CredentialsProvider for EnvCredentialsProvider {
    fn get(&self) -> Result<Option<Credentials>> {
        match (
            env::var(ACCESS_KEY_ID_ENV_KEY),
            env::var(SECRET_ACCESS_KEY_ENV_KEY),
        ) {
            (Ok(access_key_id), Ok(secret_access_key))
                if !access_key_id.is_empty() && !secret_access_key.is_empty() =>
            {
                Ok(Some(match env::var(SESSION_TOKEN_ENV_KEY) {
                    Ok(session_token) if !session_token.is_empty() => {
                        Credentials::with_session_token(access_key_id, secret_access_key, session_token)
                    }
                    _ => Credentials::new(access_key_id, secret_access_key),
                }))
            }
            _ => {
                static ERROR_MESSAGE: Lazy<String> = Lazy::new(|| {
                    format!(
                        "EnvCredentialsProvider is not setuped, please set environment variable `{}` and `{}`",
                        ACCESS_KEY_ID_ENV_KEY, SECRET_ACCESS_KEY_ENV_KEY
                    )
                });
                Err(Error::new(ErrorKind::Other, ERROR_MESSAGE.as_str()))
            }
        }
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_credentials_provider(&self) -> &dyn CredentialsProvider {
        self
    }
}

impl Debug for EnvCredentialsProvider {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (
            env::var_os(ACCESS_KEY_ID_ENV_KEY),
            env::var_os(SECRET_ACCESS_KEY_ENV_KEY),
        ) {
            (Some(access_key_id), Some(_)) => f.write_fmt(format_args!(
                "EnvCredentialsProvider {{ access_key_id: {:?}, secret_access_key: CENSORED }}",
                access_key_id,
            )),
            _ => write!(f, "EnvCredentialsProvider {{ None }}"),
        }
    }
}

/// 认证信息串提供者
///
/// 将多个认证信息提供者串联，遍历并找寻第一个可用认证信息
#[derive(Clone, Debug)]
pub struct ChainCredentialsProvider {
    providers: Arc<[Box<dyn CredentialsProvider>]>,
}

impl ChainCredentialsProvider {
    /// 创建认证信息串构建器
    #[inline]
    pub fn builder() -> ChainCredentialsProviderBuilder {
        Default::default()
    }
}

impl CredentialsProvider for ChainCredentialsProvider {
    fn get(&self) -> Result<Option<Credentials>> {
        if let Some(credentials) = self.providers.iter().find_map(|p| p.get().ok()) {
            Ok(credentials)
        } else {
            Err(Error::new(ErrorKind::Other, "All credentials are failed to get"))
        }
    }

    fn async_get(&self) -> BoxFuture<'_, Result<Option<Credentials>>> {
        Box::pin(async move {
            for provider in self.providers.iter() {
                if let Ok(credentials) = provider.async_get().await {
                    return Ok(credentials);
                }
            }
            Err(Error::new(ErrorKind::Other, "All credentials are failed to get"))
        })
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_credentials_provider(&self) -> &dyn CredentialsProvider {
        self
    }
}

impl Default for ChainCredentialsProvider {
    #[inline]
    fn default() -> Self {
        ChainCredentialsProviderBuilder::default()
            .append_provider(Box::new(GlobalCredentialsProvider))
            .append_provider(Box::new(EnvCredentialsProvider))
            .build()
    }
}

/// 串联认证信息构建器
#[derive(Default)]
pub struct ChainCredentialsProviderBuilder {
    providers: VecDeque<Box<dyn CredentialsProvider>>,
}

impl ChainCredentialsProviderBuilder {
    /// 构建新的串联认证信息构建器
    #[inline]
    pub fn new() -> ChainCredentialsProviderBuilder {
        Default::default()
    }

    /// 将认证信息提供者推送到认证串末端
    #[inline]
    pub fn append_provider(mut self, provider: Box<dyn CredentialsProvider>) -> Self {
        self.providers.push_back(provider);
        self
    }

    /// 将认证信息提供者推送到认证串顶端
    #[inline]
    pub fn prepend_provider(mut self, provider: Box<dyn CredentialsProvider>) -> Self {
        self.providers.push_front(provider);
        self
    }

    /// 串联认证信息
    #[inline]
    pub fn build(self) -> ChainCredentialsProvider {
        ChainCredentialsProvider {
            providers: self.providers.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{boxed::Box, error::Error, result::Result, thread};

    #[test]
    fn test_static_credentials_across_threads() -> Result<(), Box<dyn Error>> {
        let provider: Arc<dyn CredentialsProvider> = Arc::new(StaticCredentialsProvider::new(
            Credentials::new("AKIDEXAMPLE", "secret"),
        ));
        let threads: Vec<_> = (0..4)
            .map(|_| {
                let provider = provider.to_owned();
                thread::spawn(move || {
                    let credentials = provider.get().unwrap().unwrap();
                    assert_eq!(credentials.access_key_id(), "AKIDEXAMPLE");
                    assert_eq!(credentials.secret_access_key(), "secret");
                    assert_eq!(credentials.session_token(), None);
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }
        Ok(())
    }

    #[test]
    fn test_debug_censors_secret() {
        let credentials = Credentials::with_session_token("AKIDEXAMPLE", "secret", "token");
        let debug = format!("{:?}", credentials);
        assert!(debug.contains("AKIDEXAMPLE"));
        assert!(!debug.contains("secret\""));
        assert!(!debug.contains("token\""));
        let provider = StaticCredentialsProvider::new(credentials);
        assert!(!format!("{:?}", provider).contains("\"secret\""));
    }

    #[test]
    fn test_anonymous_credentials() -> Result<(), Box<dyn Error>> {
        assert!(AnonymousCredentialsProvider.get()?.is_none());
        Ok(())
    }

    #[test]
    fn test_chain_credentials() -> Result<(), Box<dyn Error>> {
        GlobalCredentialsProvider::clear();
        let chain = ChainCredentialsProvider::default();
        env::set_var(ACCESS_KEY_ID_ENV_KEY, "TEST2");
        env::set_var(SECRET_ACCESS_KEY_ENV_KEY, "test2");
        env::remove_var(SESSION_TOKEN_ENV_KEY);
        {
            let credentials = chain.get()?.unwrap();
            assert_eq!(credentials.access_key_id(), "TEST2");
        }
        GlobalCredentialsProvider::setup(Credentials::new("TEST1", "test1"));
        {
            let credentials = chain.get()?.unwrap();
            assert_eq!(credentials.access_key_id(), "TEST1");
        }
        GlobalCredentialsProvider::clear();
        Ok(())
    }

    #[test]
    fn test_chain_credentials_all_failed() {
        let chain = ChainCredentialsProvider::builder()
            .append_provider(Box::new(FailedProvider))
            .build();
        assert!(chain.get().is_err());
    }

    #[async_std::test]
    async fn test_async_chain_credentials() -> Result<(), Box<dyn Error>> {
        let chain = ChainCredentialsProvider::builder()
            .append_provider(Box::new(FailedProvider))
            .append_provider(Box::new(AnonymousCredentialsProvider))
            .prepend_provider(Box::new(FailedProvider))
            .build();
        assert!(chain.async_get().await?.is_none());
        Ok(())
    }

    #[derive(Debug)]
    struct FailedProvider;

    impl CredentialsProvider for FailedProvider {
        fn get(&self) -> std::io::Result<Option<Credentials>> {
            Err(std::io::Error::new(ErrorKind::Other, "failed"))
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_credentials_provider(&self) -> &dyn CredentialsProvider {
            self
        }
    }
}
