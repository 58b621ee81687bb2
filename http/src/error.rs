use http::uri::Uri;
use std::{error, fmt};

/// HTTP 响应错误类型
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// 协议错误，该协议不能支持
    ProtocolError,

    /// 非法的请求 / 响应错误
    InvalidRequestResponse,

    /// 非法的 URL
    InvalidUrl,

    /// 非法的 HTTP 头
    InvalidHeader,

    /// 网络连接失败
    ConnectError,

    /// 代理连接失败
    ProxyError,

    /// 域名解析失败
    UnknownHostError,

    /// 发送失败
    SendError,

    /// 接受失败
    ReceiveError,

    /// 本地 IO 失败
    LocalIoError,

    /// 超时失败
    TimeoutError,

    /// SSL 错误
    SslError,

    /// 重定向次数过多
    TooManyRedirect,

    /// 未知错误
    UnknownError,

    /// 用户取消
    UserCanceled,
}

/// HTTP 响应错误
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    error: Box<dyn error::Error + Send + Sync>,
    uri: Option<Uri>,
}

impl Error {
    /// 创建 HTTP 响应错误构建器
    #[inline]
    pub fn builder(kind: ErrorKind, err: impl Into<Box<dyn error::Error + Send + Sync>>) -> ErrorBuilder {
        ErrorBuilder {
            inner: Self {
                kind,
                error: err.into(),
                uri: None,
            },
        }
    }

    /// 创建 HTTP 响应错误
    #[inline]
    pub fn new(kind: ErrorKind, err: impl Into<Box<dyn error::Error + Send + Sync>>) -> Self {
        Self::builder(kind, err).build()
    }

    /// 获取 HTTP 响应错误类型
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// 获取发生错误的请求 URL
    #[inline]
    pub fn uri(&self) -> Option<&Uri> {
        self.uri.as_ref()
    }

    #[inline]
    pub fn into_inner(self) -> Box<dyn error::Error + Send + Sync> {
        self.error
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(uri) = &self.uri {
            write!(f, "[{:?}] {} ({})", self.kind, self.error, uri)
        } else {
            write!(f, "[{:?}] {}", self.kind, self.error)
        }
    }
}

impl error::Error for Error {
    #[inline]
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(self.error.as_ref())
    }
}

/// HTTP 响应错误构建器
#[derive(Debug)]
pub struct ErrorBuilder {
    inner: Error,
}

impl ErrorBuilder {
    /// 设置发生错误的请求 URL
    #[inline]
    #[must_use]
    pub fn uri(mut self, uri: &Uri) -> Self {
        self.inner.uri = Some(uri.to_owned());
        self
    }

    /// 构建 HTTP 响应错误
    #[inline]
    pub fn build(self) -> Error {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display_with_uri() {
        let uri: Uri = "http://127.0.0.1:8080/path".parse().unwrap();
        let err = Error::builder(ErrorKind::ConnectError, "connection refused")
            .uri(&uri)
            .build();
        assert_eq!(err.kind(), ErrorKind::ConnectError);
        assert_eq!(err.uri(), Some(&uri));
        assert_eq!(
            err.to_string(),
            "[ConnectError] connection refused (http://127.0.0.1:8080/path)"
        );
        assert!(err.source().is_some());
    }
}
