use super::response::ChecksumMismatchError;
use anyhow::Error as AnyError;
use awsasync_http::{ResponseError, StatusCode};
use std::{
    error::Error as StdError,
    fmt::{self, Display},
    io::Error as IoError,
};
use thiserror::Error;

/// 客户端错误类型
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ClientErrorKind {
    /// 请求执行的必要参数缺失
    Configuration,

    /// 获取认证信息失败
    Credentials,

    /// 签名失败
    Signing,

    /// 不支持的 HTTP 方法
    UnsupportedMethod,

    /// 非法的请求
    InvalidRequest,

    /// 解析响应失败
    Unmarshalling,

    /// 拦截器调用失败
    Interceptor,
}

/// 客户端错误
///
/// 表示错误发生在客户端一侧，而非服务端返回的错误
#[derive(Debug)]
pub struct ClientError {
    kind: ClientErrorKind,
    message: String,
    status_code: Option<StatusCode>,
    status_text: Option<String>,
    source: Option<AnyError>,
}

impl ClientError {
    /// 创建客户端错误
    #[inline]
    pub fn new(kind: ClientErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
            status_text: None,
            source: None,
        }
    }

    /// 设置错误原因
    #[inline]
    #[must_use]
    pub fn with_source(mut self, source: impl Into<AnyError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// 设置发生错误时的 HTTP 状态码和状态描述
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status_code: StatusCode, status_text: impl Into<String>) -> Self {
        self.status_code = Some(status_code);
        self.status_text = Some(status_text.into());
        self
    }

    /// 获取客户端错误类型
    #[inline]
    pub fn kind(&self) -> ClientErrorKind {
        self.kind
    }

    /// 获取错误信息
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 获取 HTTP 状态码
    #[inline]
    pub fn status_code(&self) -> Option<StatusCode> {
        self.status_code
    }

    /// 获取 HTTP 状态描述
    #[inline]
    pub fn status_text(&self) -> Option<&str> {
        self.status_text.as_deref()
    }

    /// 获取错误原因
    #[inline]
    pub fn cause(&self) -> Option<&AnyError> {
        self.source.as_ref()
    }
}

impl Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)?;
        if let Some(source) = &self.source {
            write!(f, ": {}", source)?;
        }
        Ok(())
    }
}

impl StdError for ClientError {
    #[inline]
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|err| AsRef::<dyn StdError>::as_ref(err))
    }
}

/// 服务端错误的归属
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ErrorType {
    /// 由客户端请求导致的错误
    Client,

    /// 由服务端导致的错误
    Service,

    /// 未知
    #[default]
    Unknown,
}

/// 服务端错误
///
/// 由错误响应解析得到，或在错误响应无法解析时根据状态码合成
#[derive(Debug, Clone, Default)]
pub struct ServiceError {
    message: String,
    error_code: Option<String>,
    error_type: ErrorType,
    status_code: Option<StatusCode>,
    service_name: Option<String>,
    request_id: Option<String>,
}

impl ServiceError {
    /// 创建服务端错误
    #[inline]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    /// 设置错误代码
    #[inline]
    #[must_use]
    pub fn error_code(mut self, error_code: impl Into<String>) -> Self {
        self.error_code = Some(error_code.into());
        self
    }

    /// 设置错误归属
    #[inline]
    #[must_use]
    pub fn error_type(mut self, error_type: ErrorType) -> Self {
        self.error_type = error_type;
        self
    }

    /// 设置请求 ID
    #[inline]
    #[must_use]
    pub fn request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    #[inline]
    pub(crate) fn set_status_code(&mut self, status_code: StatusCode) {
        self.status_code = Some(status_code);
    }

    #[inline]
    pub(crate) fn set_service_name(&mut self, service_name: &str) {
        self.service_name = Some(service_name.to_owned());
    }

    #[inline]
    pub(crate) fn set_request_id_if_absent(&mut self, request_id: Option<&str>) {
        if self.request_id.is_none() {
            self.request_id = request_id.map(ToOwned::to_owned);
        }
    }

    /// 获取错误信息
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 获取错误代码
    #[inline]
    pub fn get_error_code(&self) -> Option<&str> {
        self.error_code.as_deref()
    }

    /// 获取错误归属
    #[inline]
    pub fn get_error_type(&self) -> ErrorType {
        self.error_type
    }

    /// 获取 HTTP 状态码
    #[inline]
    pub fn status_code(&self) -> Option<StatusCode> {
        self.status_code
    }

    /// 获取服务名称
    #[inline]
    pub fn service_name(&self) -> Option<&str> {
        self.service_name.as_deref()
    }

    /// 获取请求 ID
    #[inline]
    pub fn get_request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Service: {}; Status Code: {}; Error Code: {}; Error Type: {:?}; Request ID: {})",
            self.message,
            self.service_name.as_deref().unwrap_or("null"),
            self.status_code.map(|code| code.as_u16()).unwrap_or_default(),
            self.error_code.as_deref().unwrap_or("null"),
            self.error_type,
            self.request_id.as_deref().unwrap_or("null"),
        )
    }
}

impl StdError for ServiceError {}

/// 请求执行错误
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// 客户端错误
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    /// 服务端错误
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    /// 传输层错误
    #[error("Transport error: {0}")]
    Transport(#[from] ResponseError),

    /// 校验和不匹配
    #[error("{0}")]
    ChecksumMismatch(#[from] ChecksumMismatchError),

    /// 本地 IO 错误
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// 请求执行被中断
    #[error("Request execution was interrupted")]
    Interrupted,
}

impl Error {
    /// 获取 HTTP 状态码
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Client(err) => err.status_code(),
            Self::Service(err) => err.status_code(),
            _ => None,
        }
    }

    /// 获取服务端错误代码
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Service(err) => err.get_error_code(),
            _ => None,
        }
    }

    /// 获取请求 ID
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Service(err) => err.get_request_id(),
            _ => None,
        }
    }

    /// 获取服务端错误
    #[inline]
    pub fn as_service_error(&self) -> Option<&ServiceError> {
        match self {
            Self::Service(err) => Some(err),
            _ => None,
        }
    }

    /// 获取客户端错误
    #[inline]
    pub fn as_client_error(&self) -> Option<&ClientError> {
        match self {
            Self::Client(err) => Some(err),
            _ => None,
        }
    }
}

/// 请求执行结果
pub type ApiResult<T> = Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_client_error_keeps_cause_and_status() {
        let err = ClientError::new(ClientErrorKind::Unmarshalling, "Unable to unmarshall response")
            .with_source(anyhow!("unexpected token"))
            .with_status(StatusCode::OK, "OK");
        assert_eq!(err.kind(), ClientErrorKind::Unmarshalling);
        assert_eq!(err.status_code(), Some(StatusCode::OK));
        assert_eq!(err.status_text(), Some("OK"));
        assert_eq!(err.source().map(|e| e.to_string()).as_deref(), Some("unexpected token"));

        let err = Error::from(err);
        assert_eq!(err.status_code(), Some(StatusCode::OK));
        assert!(err.error_code().is_none());
    }

    #[test]
    fn test_service_error_accessors() {
        let mut err = ServiceError::new("Slow Down")
            .error_code("SlowDown")
            .error_type(ErrorType::Service);
        err.set_status_code(StatusCode::SERVICE_UNAVAILABLE);
        err.set_service_name("DynamoDB");
        err.set_request_id_if_absent(Some("req-1"));
        err.set_request_id_if_absent(Some("req-2"));

        let err = Error::from(err);
        assert_eq!(err.status_code(), Some(StatusCode::SERVICE_UNAVAILABLE));
        assert_eq!(err.error_code(), Some("SlowDown"));
        assert_eq!(err.request_id(), Some("req-1"));
        assert_eq!(
            err.as_service_error().map(|err| err.to_string()).as_deref(),
            Some("Slow Down (Service: DynamoDB; Status Code: 503; Error Code: SlowDown; Error Type: Service; Request ID: req-1)")
        );
    }
}
