use super::{
    client::HttpClient,
    context::ExecutionContext,
    error::{ApiResult, ClientError, ClientErrorKind},
    interceptor::Interceptor,
    metrics::Field,
    request::Request,
    response::{ErrorResponseHandler, JsonErrorResponseHandler, Response, ResponseHandler},
    signer::SignerProvider,
};
use anyhow::Result as AnyResult;
use assert_impl::assert_impl;
use awsasync_credential::CredentialsProvider;
use std::{fmt::Debug, sync::Arc};
use url::Url;

/// 请求编组器
///
/// 将调用方的领域请求转换为流水线的 [`Request`]
pub trait Marshaller<I>: Debug + Send + Sync {
    /// 编组请求
    fn marshall(&self, input: &I) -> AnyResult<Request>;
}

/// 服务客户端
///
/// 绑定一个服务的名称、地址、认证信息提供者、签名器选择器和拦截器链，
/// 每次调用 [`ServiceClient::invoke`] 都会创建新的请求执行上下文
#[derive(Debug, Clone)]
pub struct ServiceClient {
    http_client: HttpClient,
    service_name: String,
    endpoint: Url,
    credentials_provider: Option<Arc<dyn CredentialsProvider>>,
    signer_provider: Option<Arc<dyn SignerProvider>>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    error_response_handler: Arc<dyn ErrorResponseHandler>,
    metrics_enabled: bool,
}

impl ServiceClient {
    /// 创建服务客户端构建器
    #[inline]
    pub fn builder(http_client: HttpClient, service_name: impl Into<String>, endpoint: Url) -> ServiceClientBuilder {
        ServiceClientBuilder {
            inner: Self {
                http_client,
                service_name: service_name.into(),
                endpoint,
                credentials_provider: None,
                signer_provider: None,
                interceptors: Default::default(),
                error_response_handler: Arc::new(JsonErrorResponseHandler),
                metrics_enabled: false,
            },
        }
    }

    /// 获取 HTTP 客户端
    #[inline]
    pub fn http_client(&self) -> &HttpClient {
        &self.http_client
    }

    /// 获取服务名称
    #[inline]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// 获取服务地址
    #[inline]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// 修改服务地址
    #[inline]
    pub fn set_endpoint(&mut self, endpoint: Url) {
        self.endpoint = endpoint;
    }

    /// 编组并执行请求
    ///
    /// 编组失败时返回 [`ClientErrorKind::InvalidRequest`] 错误，不会发出 HTTP 请求。
    /// 整个调用记录为 [`Field::ClientExecuteTime`]，在指标交给收集器之前结束
    pub async fn invoke<I: Sync, T: Send + 'static>(
        &self,
        input: &I,
        marshaller: &dyn Marshaller<I>,
        response_handler: impl ResponseHandler<T> + 'static,
    ) -> ApiResult<Response<T>> {
        let context = self.create_execution_context();
        let metrics = context.metrics().to_owned();
        metrics.start_event(Field::ClientExecuteTime);
        let result = self.marshall_and_execute(input, marshaller, response_handler, context).await;
        metrics.end_event(Field::ClientExecuteTime);
        result
    }

    async fn marshall_and_execute<I: Sync, T: Send + 'static>(
        &self,
        input: &I,
        marshaller: &dyn Marshaller<I>,
        response_handler: impl ResponseHandler<T> + 'static,
        context: ExecutionContext,
    ) -> ApiResult<Response<T>> {
        context.metrics().start_event(Field::RequestMarshallTime);
        let marshalled = marshaller.marshall(input);
        context.metrics().end_event(Field::RequestMarshallTime);
        let mut request = marshalled.map_err(|err| {
            ClientError::new(ClientErrorKind::InvalidRequest, "Unable to marshall request").with_source(err)
        })?;
        request.set_endpoint(self.endpoint.to_owned());
        self.http_client
            .request_execution_builder()
            .request(request)
            .execution_context(context)
            .error_response_handler(self.error_response_handler.to_owned())
            .execute(response_handler)
            .await
    }

    fn create_execution_context(&self) -> ExecutionContext {
        let mut builder = ExecutionContext::builder();
        builder
            .interceptors(self.interceptors.to_owned())
            .metrics_enabled(self.metrics_enabled);
        if let Some(provider) = &self.credentials_provider {
            builder.credentials_provider(provider.to_owned());
        }
        if let Some(provider) = &self.signer_provider {
            builder.signer_provider(provider.to_owned());
        }
        builder.build()
    }

    #[allow(dead_code)]
    fn assert() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}

/// 服务客户端构建器
#[derive(Debug)]
pub struct ServiceClientBuilder {
    inner: ServiceClient,
}

impl ServiceClientBuilder {
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

    /// 设置错误响应处理器
    #[inline]
    pub fn error_response_handler(&mut self, handler: Arc<dyn ErrorResponseHandler>) -> &mut Self {
        self.inner.error_response_handler = handler;
        self
    }

    /// 启用或禁用指标记录
    #[inline]
    pub fn metrics_enabled(&mut self, enabled: bool) -> &mut Self {
        self.inner.metrics_enabled = enabled;
        self
    }

    /// 构建服务客户端
    #[inline]
    pub fn build(&self) -> ServiceClient {
        self.inner.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        super::{
            content::RequestContent,
            metrics::{RequestMetricCollector, RequestMetrics},
            response::{HttpResponse, JsonResponseHandler},
            test_utils::{FixedResponseCaller, RecordedRequest},
        },
        *,
    };
    use anyhow::anyhow;
    use awsasync_http::{header::CONTENT_TYPE, HeaderValue, Method};
    use serde::{Deserialize, Serialize};
    use std::sync::{Mutex, PoisonError};

    #[derive(Debug, Serialize)]
    struct GetItem {
        table: String,
        key: String,
    }

    #[derive(Debug, Deserialize)]
    struct Item {
        value: String,
    }

    #[derive(Debug)]
    struct GetItemMarshaller;

    impl Marshaller<GetItem> for GetItemMarshaller {
        fn marshall(&self, input: &GetItem) -> AnyResult<Request> {
            if input.table.is_empty() {
                return Err(anyhow!("Table name is required"));
            }
            Ok(Request::builder("DynamoDB", Method::POST)
                .header(CONTENT_TYPE, HeaderValue::from_static("application/x-amz-json-1.0"))
                .header("x-amz-target", HeaderValue::from_static("DynamoDB_20120810.GetItem"))
                .content(RequestContent::from_bytes(serde_json::to_vec(input)?))
                .build())
        }
    }

    #[derive(Debug, Default)]
    struct TimingCollector {
        timings: Mutex<Vec<(usize, usize)>>,
    }

    impl RequestMetricCollector for TimingCollector {
        fn collect_metrics(&self, _request: &Request, _response: Option<&HttpResponse>, metrics: &RequestMetrics) {
            self.timings.lock().unwrap_or_else(PoisonError::into_inner).push((
                metrics
                    .events(Field::RequestMarshallTime)
                    .iter()
                    .filter(|timing| timing.is_ended())
                    .count(),
                metrics
                    .events(Field::ClientExecuteTime)
                    .iter()
                    .filter(|timing| timing.is_ended())
                    .count(),
            ));
        }
    }

    fn service_client(body: &str, collector: Arc<TimingCollector>) -> ServiceClient {
        let http_client = HttpClient::builder_with_caller(Box::new(FixedResponseCaller::ok(body)))
            .metric_collector(collector)
            .build();
        ServiceClient::builder(
            http_client,
            "DynamoDB",
            Url::parse("https://dynamodb.us-east-1.example.com").unwrap(),
        )
        .metrics_enabled(true)
        .build()
    }

    fn recorded_requests(client: &ServiceClient) -> Vec<RecordedRequest> {
        client
            .http_client()
            .http_caller()
            .as_any()
            .downcast_ref::<FixedResponseCaller>()
            .map(FixedResponseCaller::requests)
            .unwrap_or_default()
    }

    #[async_std::test]
    async fn test_invoke() -> AnyResult<()> {
        env_logger::builder().is_test(true).try_init().ok();

        let collector = Arc::new(TimingCollector::default());
        let client = service_client(r#"{"value":"v1"}"#, collector.to_owned());
        let response = client
            .invoke(
                &GetItem {
                    table: "users".to_owned(),
                    key: "k1".to_owned(),
                },
                &GetItemMarshaller,
                JsonResponseHandler::<Item>::new(),
            )
            .await?;
        assert_eq!(response.result().value, "v1");
        assert_eq!(
            collector.timings.lock().unwrap_or_else(PoisonError::into_inner).to_owned(),
            vec![(1, 1)]
        );
        let requests = recorded_requests(&client);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "https://dynamodb.us-east-1.example.com/");
        assert_eq!(
            requests[0].headers.get("x-amz-target"),
            Some(&HeaderValue::from_static("DynamoDB_20120810.GetItem"))
        );
        assert_eq!(
            requests[0].body.as_deref(),
            Some(br#"{"table":"users","key":"k1"}"#.as_slice())
        );
        Ok(())
    }

    #[async_std::test]
    async fn test_invoke_with_marshalling_failure() -> AnyResult<()> {
        let collector = Arc::new(TimingCollector::default());
        let client = service_client("{}", collector.to_owned());
        let err = client
            .invoke(
                &GetItem {
                    table: String::new(),
                    key: "k1".to_owned(),
                },
                &GetItemMarshaller,
                JsonResponseHandler::<Item>::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.as_client_error().map(|err| err.kind()), Some(ClientErrorKind::InvalidRequest));
        assert!(collector.timings.lock().unwrap_or_else(PoisonError::into_inner).is_empty());
        assert!(recorded_requests(&client).is_empty());
        Ok(())
    }
}
