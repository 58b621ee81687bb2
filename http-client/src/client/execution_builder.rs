use super::{
    super::{
        context::ExecutionContext,
        error::{ApiResult, ClientError, ClientErrorKind},
        request::{Request, RequestConfig},
        response::{ErrorResponseHandler, JsonErrorResponseHandler, NoOpResponseHandler, Response, ResponseHandler},
    },
    executor::Executor,
    HttpClient,
};
use assert_impl::assert_impl;
use futures::future::{ready, BoxFuture, FutureExt};
use std::sync::Arc;

/// 请求执行构建器
///
/// 每个设置方法多次调用时只有最后一次生效。
/// 执行前必须设置请求和请求执行上下文，请求必须带有服务地址，否则立即返回配置错误。
#[derive(Debug)]
#[must_use]
pub struct RequestExecutionBuilder {
    client: HttpClient,
    request: Option<Request>,
    request_config: Option<RequestConfig>,
    execution_context: Option<ExecutionContext>,
    error_response_handler: Option<Arc<dyn ErrorResponseHandler>>,
}

impl RequestExecutionBuilder {
    #[inline]
    pub(super) fn new(client: HttpClient) -> Self {
        Self {
            client,
            request: None,
            request_config: None,
            execution_context: None,
            error_response_handler: None,
        }
    }

    /// 设置请求
    #[inline]
    pub fn request(mut self, request: Request) -> Self {
        self.request = Some(request);
        self
    }

    /// 设置请求配置
    ///
    /// 没有设置时使用请求的原始领域请求提供的配置
    #[inline]
    pub fn request_config(mut self, request_config: RequestConfig) -> Self {
        self.request_config = Some(request_config);
        self
    }

    /// 设置请求执行上下文
    #[inline]
    pub fn execution_context(mut self, execution_context: ExecutionContext) -> Self {
        self.execution_context = Some(execution_context);
        self
    }

    /// 设置错误响应处理器
    ///
    /// 没有设置时使用 [`JsonErrorResponseHandler`]
    #[inline]
    pub fn error_response_handler(mut self, error_response_handler: Arc<dyn ErrorResponseHandler>) -> Self {
        self.error_response_handler = Some(error_response_handler);
        self
    }

    /// 执行请求，使用 `response_handler` 解析成功的响应
    pub fn execute<T: Send + 'static>(
        self,
        response_handler: impl ResponseHandler<T> + 'static,
    ) -> BoxFuture<'static, ApiResult<Response<T>>> {
        let Some(request) = self.request else {
            return configuration_error("No request specified");
        };
        let Some(execution_context) = self.execution_context else {
            return configuration_error("No execution context specified");
        };
        if request.endpoint().is_none() {
            return configuration_error("No endpoint specified");
        }
        let request_config = self
            .request_config
            .or_else(|| request.original_request().map(|original| original.request_config()))
            .unwrap_or_default();
        let error_response_handler = self
            .error_response_handler
            .unwrap_or_else(|| Arc::new(JsonErrorResponseHandler));
        Executor::new(
            self.client,
            request,
            request_config,
            execution_context,
            Box::new(response_handler),
            error_response_handler,
        )
        .execute()
        .boxed()
    }

    /// 执行请求，忽略成功响应的响应体
    #[inline]
    pub fn execute_without_result(self) -> BoxFuture<'static, ApiResult<Response<()>>> {
        self.execute(NoOpResponseHandler)
    }

    #[allow(dead_code)]
    fn assert() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}

fn configuration_error<T: Send + 'static>(message: &str) -> BoxFuture<'static, ApiResult<T>> {
    ready(Err(ClientError::new(ClientErrorKind::Configuration, message).into())).boxed()
}
