use super::{
    interceptor::Interceptor,
    metrics::RequestMetrics,
    request::{Request, RequestConfig},
    signer::{Signer, SignerProvider, SignerProviderContext},
};
use awsasync_credential::CredentialsProvider;
use std::sync::Arc;
use url::Url;

/// 请求执行上下文
///
/// 包含认证信息提供者、签名器选择器、拦截器链和指标记录，只属于一次调用
#[derive(Debug, Default)]
pub struct ExecutionContext {
    credentials_provider: Option<Arc<dyn CredentialsProvider>>,
    signer_provider: Option<Arc<dyn SignerProvider>>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    metrics: Arc<RequestMetrics>,
}

impl ExecutionContext {
    /// 创建请求执行上下文构建器
    #[inline]
    pub fn builder() -> ExecutionContextBuilder {
        Default::default()
    }

    /// 获取认证信息提供者
    #[inline]
    pub fn credentials_provider(&self) -> Option<&Arc<dyn CredentialsProvider>> {
        self.credentials_provider.as_ref()
    }

    /// 获取签名器选择器
    #[inline]
    pub fn signer_provider(&self) -> Option<&Arc<dyn SignerProvider>> {
        self.signer_provider.as_ref()
    }

    /// 获取拦截器链
    #[inline]
    pub fn interceptors(&self) -> &[Arc<dyn Interceptor>] {
        &self.interceptors
    }

    /// 获取指标记录
    #[inline]
    pub fn metrics(&self) -> &Arc<RequestMetrics> {
        &self.metrics
    }

    /// 为目标地址选择签名器
    pub fn signer_by_uri(&self, uri: &Url, request: &Request, request_config: &RequestConfig) -> Option<Arc<dyn Signer>> {
        self.signer_provider
            .as_ref()
            .and_then(|provider| provider.signer(&SignerProviderContext::new(uri, request, request_config)))
    }
}

/// 请求执行上下文构建器
#[derive(Debug, Default)]
pub struct ExecutionContextBuilder {
    inner: ExecutionContext,
}

impl ExecutionContextBuilder {
    /// 设置认证信息提供者
    #[inline]
    pub fn credentials_provider(&mut self, provider: Arc<dyn CredentialsProvider>) -> &mut Self {
        self.inner.credentials_provider = Some(provider);
        self
    }

    /// 设置签名器选择器
    #[inline]
    pub fn signer_provider(&mut self, provider: Arc<dyn SignerProvider>) -> &mut Self {
        self.inner.signer_provider = Some(provider);
        self
    }

    /// 追加拦截器
    #[inline]
    pub fn append_interceptor(&mut self, interceptor: Arc<dyn Interceptor>) -> &mut Self {
        self.inner.interceptors.push(interceptor);
        self
    }

    /// 设置拦截器链
    #[inline]
    pub fn interceptors(&mut self, interceptors: Vec<Arc<dyn Interceptor>>) -> &mut Self {
        self.inner.interceptors = interceptors;
        self
    }

    /// 启用或禁用指标记录
    #[inline]
    pub fn metrics_enabled(&mut self, enabled: bool) -> &mut Self {
        self.inner.metrics = Arc::new(if enabled {
            RequestMetrics::new()
        } else {
            RequestMetrics::disabled()
        });
        self
    }

    /// 使用指定的指标记录
    #[inline]
    pub fn metrics(&mut self, metrics: Arc<RequestMetrics>) -> &mut Self {
        self.inner.metrics = metrics;
        self
    }

    /// 构建请求执行上下文
    #[inline]
    pub fn build(&mut self) -> ExecutionContext {
        std::mem::take(&mut self.inner)
    }
}
