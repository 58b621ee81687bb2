use super::{
    super::{
        config::{ClientConfiguration, HttpClientSettings},
        context::ExecutionContext,
        error::ApiResult,
        metrics::{global_metric_collector, RequestMetricCollector},
        request::Request,
        response::{ErrorResponseHandler, Response, ResponseHandler, ResponseMetadata, ResponseMetadataCache},
    },
    RequestExecutionBuilder,
};
use assert_impl::assert_impl;
use awsasync_http::HttpCaller;
use std::sync::Arc;

/// HTTP 客户端
///
/// 持有传输层实现、客户端配置、指标收集器和响应元数据缓存，可以被廉价地克隆，
/// 并在多个并发的请求执行之间共享
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Arc<HttpClientInner>,
}

#[derive(Debug)]
struct HttpClientInner {
    http_caller: Box<dyn HttpCaller>,
    config: ClientConfiguration,
    settings: HttpClientSettings,
    metric_collector: Option<Arc<dyn RequestMetricCollector>>,
    metadata_cache: ResponseMetadataCache,
}

#[cfg(feature = "reqwest")]
impl Default for HttpClient {
    #[inline]
    fn default() -> Self {
        HttpClientBuilder::new().build()
    }
}

impl HttpClient {
    /// 使用默认的传输层创建 HTTP 客户端构建器
    #[inline]
    #[cfg(feature = "reqwest")]
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    /// 使用默认的传输层和指定的客户端配置创建 HTTP 客户端
    #[inline]
    #[cfg(feature = "reqwest")]
    pub fn new(config: ClientConfiguration) -> Self {
        HttpClientBuilder::new().config(config).build()
    }

    /// 使用指定的传输层创建 HTTP 客户端构建器
    #[inline]
    pub fn builder_with_caller(http_caller: Box<dyn HttpCaller>) -> HttpClientBuilder {
        HttpClientBuilder::_new(http_caller)
    }

    /// 创建请求执行构建器
    #[inline]
    pub fn request_execution_builder(&self) -> RequestExecutionBuilder {
        RequestExecutionBuilder::new(self.to_owned())
    }

    /// 执行请求
    ///
    /// 等价于使用 [`RequestExecutionBuilder`] 设置所有参数后执行
    pub async fn execute<T: Send + 'static>(
        &self,
        request: Request,
        response_handler: impl ResponseHandler<T> + 'static,
        error_response_handler: Arc<dyn ErrorResponseHandler>,
        execution_context: ExecutionContext,
    ) -> ApiResult<Response<T>> {
        self.request_execution_builder()
            .request(request)
            .error_response_handler(error_response_handler)
            .execution_context(execution_context)
            .execute(response_handler)
            .await
    }

    /// 根据调用 ID 获取缓存的响应元数据
    ///
    /// 调用 ID 与 [`Response::invocation_id`] 一致，缓存容量有限，较早的记录会被淘汰
    #[inline]
    pub fn response_metadata(&self, invocation_id: &str) -> Option<ResponseMetadata> {
        self.inner.metadata_cache.get(invocation_id)
    }

    /// 获取客户端配置
    #[inline]
    pub fn config(&self) -> &ClientConfiguration {
        &self.inner.config
    }

    #[inline]
    pub(super) fn settings(&self) -> &HttpClientSettings {
        &self.inner.settings
    }

    #[inline]
    pub(crate) fn http_caller(&self) -> &dyn HttpCaller {
        self.inner.http_caller.as_ref()
    }

    #[inline]
    pub(super) fn metadata_cache(&self) -> &ResponseMetadataCache {
        &self.inner.metadata_cache
    }

    /// 客户端的指标收集器，没有设置时使用全局收集器
    #[inline]
    pub(super) fn metric_collector(&self) -> Option<Arc<dyn RequestMetricCollector>> {
        self.inner.metric_collector.to_owned().or_else(global_metric_collector)
    }

    #[allow(dead_code)]
    fn assert() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}

/// HTTP 客户端构建器
#[derive(Debug)]
pub struct HttpClientBuilder {
    http_caller: Box<dyn HttpCaller>,
    config: ClientConfiguration,
    metric_collector: Option<Arc<dyn RequestMetricCollector>>,
}

#[cfg(feature = "reqwest")]
impl Default for HttpClientBuilder {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClientBuilder {
    /// 使用默认的传输层创建 HTTP 客户端构建器
    #[inline]
    #[cfg(feature = "reqwest")]
    pub fn new() -> Self {
        Self::_new(Box::<awsasync_reqwest::AsyncClient>::default())
    }

    #[inline]
    fn _new(http_caller: Box<dyn HttpCaller>) -> Self {
        Self {
            http_caller,
            config: Default::default(),
            metric_collector: None,
        }
    }

    /// 设置传输层实现
    #[inline]
    #[must_use]
    pub fn http_caller(mut self, http_caller: Box<dyn HttpCaller>) -> Self {
        self.http_caller = http_caller;
        self
    }

    /// 设置客户端配置
    #[inline]
    #[must_use]
    pub fn config(mut self, config: ClientConfiguration) -> Self {
        self.config = config;
        self
    }

    /// 设置指标收集器
    #[inline]
    #[must_use]
    pub fn metric_collector(mut self, metric_collector: Arc<dyn RequestMetricCollector>) -> Self {
        self.metric_collector = Some(metric_collector);
        self
    }

    /// 构建 HTTP 客户端
    #[inline]
    pub fn build(self) -> HttpClient {
        let settings = HttpClientSettings::adapt(&self.config);
        let metadata_cache = ResponseMetadataCache::new(if self.config.cache_response_metadata() {
            self.config.response_metadata_cache_size()
        } else {
            0
        });
        HttpClient {
            inner: Arc::new(HttpClientInner {
                http_caller: self.http_caller,
                config: self.config,
                settings,
                metric_collector: self.metric_collector,
                metadata_cache,
            }),
        }
    }
}
