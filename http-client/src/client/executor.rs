use super::{
    super::{
        content::{make_resettable, ProgressReader, ReleasableContent, RequestContent, ResettableContent},
        context::ExecutionContext,
        error::{ApiResult, ClientError, ClientErrorKind, Error},
        metrics::{Field, RequestMetrics},
        progress::{publish_progress, publish_request_content_length, ProgressEventType, ProgressListener},
        request::{ClientOptionMarker, Request, RequestConfig},
        response::{
            is_successful, service_error_handler::ServiceErrorResponseHandler, ErrorResponseHandler, HandlerError,
            HttpResponse, Response, ResponseHandler, ResponseMetadata,
        },
        transport::{build_http_request, declared_content_length},
    },
    HttpClient,
};
use anyhow::Error as AnyError;
use awsasync_credential::Credentials;
use awsasync_http::{
    default_user_agent,
    header::{CONTENT_LENGTH, USER_AGENT},
    HeaderName, HeaderValue,
};
use log::{debug, error, warn};
use rand::{thread_rng, Rng};
use std::{mem::take, sync::Arc};

const INVOCATION_ID_HEADER: &str = "amz-sdk-invocation-id";

/// 持有请求体的所有者句柄，保证请求体在执行结束时只被关闭一次
///
/// 执行被取消时，析构所有者句柄也会关闭请求体
#[derive(Debug, Default)]
struct ContentGuard {
    owners: Vec<ReleasableContent>,
}

impl ContentGuard {
    fn push(&mut self, owner: ReleasableContent) {
        self.owners.push(owner);
    }

    fn release(&mut self) {
        for owner in take(&mut self.owners) {
            if let Err(err) = owner.release() {
                warn!("Failed to release the request content: {}", err);
            }
        }
    }
}

pub(super) struct Executor<T> {
    client: HttpClient,
    request: Request,
    request_config: RequestConfig,
    context: ExecutionContext,
    response_handler: Box<dyn ResponseHandler<T>>,
    error_response_handler: Arc<dyn ErrorResponseHandler>,
    listener: Option<Arc<dyn ProgressListener>>,
    metrics: Arc<RequestMetrics>,
}

impl<T: Send + 'static> Executor<T> {
    pub(super) fn new(
        client: HttpClient,
        request: Request,
        request_config: RequestConfig,
        context: ExecutionContext,
        response_handler: Box<dyn ResponseHandler<T>>,
        error_response_handler: Arc<dyn ErrorResponseHandler>,
    ) -> Self {
        let listener = request_config.progress_listener().cloned();
        let metrics = context.metrics().to_owned();
        Self {
            client,
            request,
            request_config,
            context,
            response_handler,
            error_response_handler,
            listener,
            metrics,
        }
    }

    pub(super) async fn execute(mut self) -> ApiResult<Response<T>> {
        let mut guard = ContentGuard::default();
        let mut http_response = None;
        let result = self.execute_with_guard(&mut guard, &mut http_response).await;
        self.metrics.end_event(Field::ClientExecuteTime);
        self.collect_metrics(match &result {
            Ok(response) => Some(response.http_response()),
            Err(_) => http_response.as_ref(),
        });
        guard.release();
        result
    }

    async fn execute_with_guard(
        &mut self,
        guard: &mut ContentGuard,
        http_response: &mut Option<HttpResponse>,
    ) -> ApiResult<Response<T>> {
        self.metrics
            .add_property(Field::ServiceName, self.request.service_name());
        if let Some(endpoint) = self.request.endpoint() {
            self.metrics.add_property(Field::ServiceEndpoint, endpoint);
        }
        self.wrap_content(guard);
        let credentials = self.resolve_credentials().await?;
        self.run_before_request(credentials.as_ref())?;
        let invocation_id = self.set_invocation_id()?;
        self.set_user_agent()?;
        self.request.overwrite_headers(self.client.config().headers());
        self.request.overwrite_headers(self.request_config.custom_headers());
        self.request
            .merge_parameters(self.request_config.custom_query_parameters());
        self.wrap_content(guard);
        self.report_content_length();

        publish_progress(self.listener(), ProgressEventType::ClientRequestStarted);
        let result = self
            .send(credentials.as_ref(), http_response)
            .await
            .and_then(|result| {
                self.metrics.end_timing();
                self.run_after_response(http_response.as_ref(), &result)?;
                publish_progress(self.listener(), ProgressEventType::ClientRequestSuccess);
                Ok(result)
            });
        match result {
            Ok(result) => {
                let http_response = http_response.take().ok_or_else(|| {
                    ClientError::new(ClientErrorKind::Configuration, "Response is consumed unexpectedly")
                })?;
                if self.client.config().cache_response_metadata() {
                    self.client
                        .metadata_cache()
                        .add(invocation_id.to_owned(), ResponseMetadata::from_http_response(&http_response));
                }
                Ok(Response::new(result, http_response, invocation_id))
            }
            Err(err) => {
                publish_progress(self.listener(), ProgressEventType::ClientRequestFailed);
                self.run_after_error(http_response.as_ref(), &err);
                Err(err)
            }
        }
    }

    async fn send(
        &mut self,
        credentials: Option<&Credentials>,
        http_response: &mut Option<HttpResponse>,
    ) -> ApiResult<T> {
        self.sign_request(credentials).await?;

        let http_request = build_http_request(&mut self.request, self.client.settings())?;
        publish_progress(self.listener(), ProgressEventType::HttpRequestStarted);
        self.metrics.start_event(Field::HttpRequestTime);
        let transport_result = self.client.http_caller().call(http_request).await;
        self.metrics.end_event(Field::HttpRequestTime);
        publish_progress(self.listener(), ProgressEventType::HttpRequestCompleted);
        let response = HttpResponse::from_transport(self.request.service_name(), transport_result?, self.listener.as_ref());

        if is_successful(response.status_code()) {
            self.handle_response(response, http_response).await
        } else {
            let response = http_response.insert(response);
            Err(ServiceErrorResponseHandler::new(&self.error_response_handler, &self.metrics)
                .handle(response)
                .await)
        }
    }

    async fn handle_response(&self, response: HttpResponse, http_response: &mut Option<HttpResponse>) -> ApiResult<T> {
        self.metrics.start_event(Field::ResponseProcessingTime);
        publish_progress(self.listener(), ProgressEventType::HttpResponseStarted);
        let result = self.unmarshall(response, http_response).await;
        self.metrics.end_event(Field::ResponseProcessingTime);
        let result = result?;
        publish_progress(self.listener(), ProgressEventType::HttpResponseCompleted);

        if let Some(response) = http_response.as_ref() {
            if let Some(request_id) = response.request_id() {
                self.metrics.add_property(Field::RequestId, request_id);
            }
            self.metrics
                .add_property(Field::ResponseCrc32, response.crc32_checksum());
        }
        Ok(result)
    }

    async fn unmarshall(&self, mut response: HttpResponse, http_response: &mut Option<HttpResponse>) -> ApiResult<T> {
        for interceptor in self.context.interceptors() {
            response = interceptor
                .before_unmarshalling(&self.request, response)
                .map_err(interceptor_error)?;
        }
        let response = http_response.insert(response);
        let handled = self.response_handler.handle(response).await;
        handled.map_err(|err| {
            if let HandlerError::Other(cause) = &err {
                debug!("Unable to unmarshall response: {}", cause);
            }
            err.into_error(response.status_code(), response.status_text())
        })
    }

    fn wrap_content(&mut self, guard: &mut ContentGuard) {
        let Some(content) = self.request.take_content() else {
            return;
        };
        if content.is_releasable() {
            self.request.set_content(content);
            return;
        }
        let mut resettable = make_resettable(content, self.request_config.client_options().read_limit());
        if let Some(listener) = self.listener.as_ref() {
            resettable = Box::new(ProgressReader::for_request(resettable, listener.to_owned()));
        }
        resettable.mark();
        let owner = ReleasableContent::new(resettable);
        self.request
            .set_content(RequestContent::from_releasable(owner.disable_close()));
        guard.push(owner);
    }

    async fn resolve_credentials(&self) -> ApiResult<Option<Credentials>> {
        let Some(provider) = self.context.credentials_provider() else {
            return Ok(None);
        };
        self.metrics.start_event(Field::CredentialsRequestTime);
        let result = provider.async_get().await;
        self.metrics.end_event(Field::CredentialsRequestTime);
        result.map_err(|err| {
            debug!("Failed to resolve credentials: {}", err);
            ClientError::new(ClientErrorKind::Credentials, "Unable to load credentials")
                .with_source(err)
                .into()
        })
    }

    fn run_before_request(&mut self, credentials: Option<&Credentials>) -> ApiResult<()> {
        if let Some(credentials) = credentials {
            self.request
                .handler_context_mut()
                .insert(credentials.to_owned());
        }
        for interceptor in self.context.interceptors() {
            if let Some(aware) = interceptor.as_credentials_aware() {
                aware.set_credentials(credentials);
            }
            interceptor
                .before_request(&mut self.request)
                .map_err(interceptor_error)?;
        }
        Ok(())
    }

    fn set_invocation_id(&mut self) -> ApiResult<String> {
        let invocation_id = new_invocation_id();
        self.request.add_header(
            HeaderName::from_static(INVOCATION_ID_HEADER),
            HeaderValue::from_str(&invocation_id).map_err(invalid_header_error)?,
        );
        Ok(invocation_id)
    }

    fn set_user_agent(&mut self) -> ApiResult<()> {
        let config = self.client.config();
        let mut user_agent = match config.user_agent_prefix() {
            Some(prefix) => format!("{} {}", prefix, default_user_agent()),
            None => default_user_agent().to_owned(),
        };
        if let Some(suffix) = config.user_agent_suffix() {
            user_agent.push(' ');
            user_agent.push_str(suffix);
        }
        if let Some(marker) = self
            .request_config
            .client_options()
            .client_marker(ClientOptionMarker::UserAgent)
        {
            user_agent.push(' ');
            user_agent.push_str(marker);
        }
        self.request.add_header(
            USER_AGENT,
            HeaderValue::from_str(user_agent.trim()).map_err(invalid_header_error)?,
        );
        Ok(())
    }

    fn report_content_length(&self) {
        if self.request.content().is_none() || !self.request.headers().contains_key(CONTENT_LENGTH) {
            return;
        }
        match declared_content_length(self.request.headers()) {
            Some(content_length) => publish_request_content_length(self.listener(), content_length),
            None => warn!("Cannot parse the Content-Length header of the request."),
        }
    }

    async fn sign_request(&mut self, credentials: Option<&Credentials>) -> ApiResult<()> {
        let Some(signer) = self.request.endpoint().and_then(|endpoint| {
            self.context
                .signer_by_uri(endpoint, &self.request, &self.request_config)
        }) else {
            return Ok(());
        };
        if credentials.is_none() && !signer.supports_null_credentials() {
            return Ok(());
        }
        self.reset_content().await?;
        self.metrics.start_event(Field::RequestSigningTime);
        let signed = signer.sign(&mut self.request, credentials).await;
        self.metrics.end_event(Field::RequestSigningTime);
        signed.map_err(|err| ClientError::new(ClientErrorKind::Signing, "Unable to sign request").with_source(err))?;
        self.reset_content().await
    }

    async fn reset_content(&mut self) -> ApiResult<()> {
        if let Some(content) = self.request.content_mut() {
            if let Err(err) = content.reset().await {
                error!("Failed to reset the request input stream: {}", err);
                return Err(err.into());
            }
        }
        Ok(())
    }

    fn run_after_response(&self, http_response: Option<&HttpResponse>, result: &T) -> ApiResult<()> {
        if let Some(http_response) = http_response {
            for interceptor in self.context.interceptors() {
                interceptor
                    .after_response(&self.request, http_response, result)
                    .map_err(interceptor_error)?;
            }
        }
        Ok(())
    }

    fn run_after_error(&self, http_response: Option<&HttpResponse>, err: &Error) {
        for interceptor in self.context.interceptors() {
            if let Err(hook_err) = interceptor.after_error(&self.request, http_response, err) {
                warn!("Interceptor {:?} failed after error: {}", interceptor, hook_err);
            }
        }
    }

    fn collect_metrics(&self, http_response: Option<&HttpResponse>) {
        if let Some(collector) = self.client.metric_collector() {
            collector.collect_metrics(&self.request, http_response, &self.metrics);
        }
    }

    #[inline]
    fn listener(&self) -> Option<&dyn ProgressListener> {
        self.listener.as_deref()
    }
}

fn interceptor_error(err: AnyError) -> Error {
    ClientError::new(ClientErrorKind::Interceptor, "Interceptor failed")
        .with_source(err)
        .into()
}

fn invalid_header_error(err: awsasync_http::header::InvalidHeaderValue) -> Error {
    ClientError::new(ClientErrorKind::InvalidRequest, "Invalid header value")
        .with_source(AnyError::new(err))
        .into()
}

/// 生成形如 UUID 的调用 ID，不要求密码学安全
fn new_invocation_id() -> String {
    uuid::Builder::from_random_bytes(thread_rng().gen())
        .into_uuid()
        .to_string()
}
