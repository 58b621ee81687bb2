use super::{
    super::{
        error::{Error, ErrorType, ServiceError},
        metrics::{Field, RequestMetrics},
    },
    ErrorResponseHandler, HandlerError, HttpResponse,
};
use awsasync_http::StatusCode;
use log::debug;
use std::sync::Arc;

const REQUEST_ENTITY_TOO_LARGE: &str = "Request entity too large";

/// 将错误响应转换为 [`Error`]
///
/// 调用方提供的错误响应处理器解析失败时，对 413 和 5xx 响应根据状态码合成服务端错误，
/// 其他情况下原样返回解析失败的原因。
/// 合成或解析得到的服务端错误都会附加服务名称、状态码和请求 ID，并记录到指标中。
#[derive(Debug)]
pub(crate) struct ServiceErrorResponseHandler<'a> {
    delegate: &'a Arc<dyn ErrorResponseHandler>,
    metrics: &'a RequestMetrics,
}

impl<'a> ServiceErrorResponseHandler<'a> {
    #[inline]
    pub(crate) fn new(delegate: &'a Arc<dyn ErrorResponseHandler>, metrics: &'a RequestMetrics) -> Self {
        Self { delegate, metrics }
    }

    pub(crate) async fn handle(&self, response: &mut HttpResponse) -> Error {
        let status_code = response.status_code();
        let handled = self.delegate.handle(response).await;
        let mut err = match handled {
            Ok(err) => err,
            Err(HandlerError::Interrupted) => return Error::Interrupted,
            Err(handler_err) => match synthesize_service_error(status_code, response.status_text()) {
                Some(err) => {
                    debug!(
                        "Unable to unmarshall error response ({}), synthesize service error from status code {}",
                        handler_err, status_code
                    );
                    err
                }
                None => return handler_err.into_error(status_code, response.status_text()),
            },
        };
        err.set_status_code(status_code);
        err.set_service_name(response.service_name());
        err.set_request_id_if_absent(response.request_id());

        if let Some(request_id) = err.get_request_id() {
            self.metrics.add_property(Field::RequestId, request_id);
        }
        if let Some(error_code) = err.get_error_code() {
            self.metrics.add_property(Field::ErrorCode, error_code);
        }
        self.metrics.add_property(Field::StatusCode, status_code.as_u16());
        Error::Service(err)
    }
}

fn synthesize_service_error(status_code: StatusCode, status_text: &str) -> Option<ServiceError> {
    if status_code == StatusCode::PAYLOAD_TOO_LARGE {
        Some(
            ServiceError::new(REQUEST_ENTITY_TOO_LARGE)
                .error_code(REQUEST_ENTITY_TOO_LARGE)
                .error_type(ErrorType::Client),
        )
    } else if status_code.is_server_error() {
        Some(
            ServiceError::new(status_text)
                .error_code(status_text)
                .error_type(ErrorType::Service),
        )
    } else {
        None
    }
}
