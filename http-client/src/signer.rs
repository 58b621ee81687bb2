use super::request::{Request, RequestConfig};
use anyhow::Result as AnyResult;
use awsasync_credential::Credentials;
use futures::future::BoxFuture;
use std::{collections::HashMap, fmt::Debug, sync::Arc};
use url::Url;

/// 签名器
///
/// 根据可选的认证信息为请求计算签名，并将签名写入请求的 Header 或查询参数中。
/// 签名器会被多个并发请求同时调用，实现必须是线程安全的。
pub trait Signer: Debug + Send + Sync {
    /// 对请求签名
    ///
    /// 请求体在调用前已经被重置到标记位置，签名器可以完整读取请求体
    fn sign<'a>(
        &'a self,
        request: &'a mut Request,
        credentials: Option<&'a Credentials>,
    ) -> BoxFuture<'a, AnyResult<()>>;

    /// 是否支持在没有认证信息的情况下签名
    #[inline]
    fn supports_null_credentials(&self) -> bool {
        false
    }
}

/// 签名器选择上下文
#[derive(Debug, Clone, Copy)]
pub struct SignerProviderContext<'a> {
    uri: &'a Url,
    request: &'a Request,
    request_config: &'a RequestConfig,
}

impl<'a> SignerProviderContext<'a> {
    /// 创建签名器选择上下文
    #[inline]
    pub fn new(uri: &'a Url, request: &'a Request, request_config: &'a RequestConfig) -> Self {
        Self {
            uri,
            request,
            request_config,
        }
    }

    /// 获取请求的目标地址
    #[inline]
    pub fn uri(&self) -> &'a Url {
        self.uri
    }

    /// 获取请求
    #[inline]
    pub fn request(&self) -> &'a Request {
        self.request
    }

    /// 获取请求配置
    #[inline]
    pub fn request_config(&self) -> &'a RequestConfig {
        self.request_config
    }
}

/// 签名器选择器
///
/// 返回 [`None`] 表示不需要签名
pub trait SignerProvider: Debug + Send + Sync {
    /// 为请求选择签名器
    fn signer(&self, context: &SignerProviderContext<'_>) -> Option<Arc<dyn Signer>>;
}

/// 默认的签名器选择器
///
/// 优先使用为目标主机单独设置的签名器，否则使用默认签名器
#[derive(Debug, Clone, Default)]
pub struct DefaultSignerProvider {
    default_signer: Option<Arc<dyn Signer>>,
    host_signers: HashMap<String, Arc<dyn Signer>>,
}

impl DefaultSignerProvider {
    /// 创建默认的签名器选择器
    #[inline]
    pub fn new(default_signer: Arc<dyn Signer>) -> Self {
        Self {
            default_signer: Some(default_signer),
            host_signers: Default::default(),
        }
    }

    /// 为指定主机设置签名器
    #[inline]
    #[must_use]
    pub fn with_host_signer(mut self, host: impl Into<String>, signer: Arc<dyn Signer>) -> Self {
        self.host_signers.insert(host.into(), signer);
        self
    }
}

impl SignerProvider for DefaultSignerProvider {
    fn signer(&self, context: &SignerProviderContext<'_>) -> Option<Arc<dyn Signer>> {
        context
            .uri()
            .host_str()
            .and_then(|host| self.host_signers.get(host))
            .or(self.default_signer.as_ref())
            .cloned()
    }
}

/// 不做任何事情的签名器
///
/// 支持在没有认证信息的情况下调用
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSigner;

impl Signer for NoOpSigner {
    #[inline]
    fn sign<'a>(
        &'a self,
        _request: &'a mut Request,
        _credentials: Option<&'a Credentials>,
    ) -> BoxFuture<'a, AnyResult<()>> {
        Box::pin(async { Ok(()) })
    }

    #[inline]
    fn supports_null_credentials(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use awsasync_http::Method;

    #[derive(Debug)]
    struct NamedSigner(&'static str);

    impl Signer for NamedSigner {
        fn sign<'a>(
            &'a self,
            _request: &'a mut Request,
            _credentials: Option<&'a Credentials>,
        ) -> BoxFuture<'a, AnyResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    #[test]
    fn test_default_signer_provider_prefers_host_signer() -> anyhow::Result<()> {
        let provider = DefaultSignerProvider::new(Arc::new(NamedSigner("default")))
            .with_host_signer("s3.example.com", Arc::new(NamedSigner("s3")));
        let request = Request::builder("s3", Method::GET).build();
        let config = RequestConfig::default();

        let uri = Url::parse("https://s3.example.com/bucket")?;
        let signer = provider.signer(&SignerProviderContext::new(&uri, &request, &config));
        assert_eq!(format!("{:?}", signer.unwrap()), "NamedSigner(\"s3\")");

        let uri = Url::parse("https://dynamodb.example.com")?;
        let signer = provider.signer(&SignerProviderContext::new(&uri, &request, &config));
        assert_eq!(format!("{:?}", signer.unwrap()), "NamedSigner(\"default\")");

        let uri = Url::parse("https://dynamodb.example.com")?;
        let signer = DefaultSignerProvider::default().signer(&SignerProviderContext::new(&uri, &request, &config));
        assert!(signer.is_none());
        Ok(())
    }
}
