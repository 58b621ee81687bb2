use super::ResponseError;
use assert_impl::assert_impl;
use futures::io::{AsyncRead, Cursor};
use http::{
    header::{HeaderMap, HeaderName, HeaderValue},
    status::StatusCode,
    Version,
};
use std::{
    fmt::{self, Debug},
    io::Result as IoResult,
    net::IpAddr,
    num::NonZeroU16,
    pin::Pin,
    result,
    task::{Context, Poll},
};

trait AsyncReadDebug: AsyncRead + Unpin + Debug + Send {}
impl<T: AsyncRead + Unpin + Debug + Send> AsyncReadDebug for T {}

/// HTTP 响应体
pub struct Body(Box<dyn AsyncReadDebug>);

impl Body {
    /// 通过异步输入流创建响应体
    #[inline]
    pub fn from_reader(reader: impl AsyncRead + Unpin + Debug + Send + 'static) -> Self {
        Self(Box::new(reader))
    }

    /// 通过二进制数据创建响应体
    #[inline]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Box::new(Cursor::new(bytes.into())))
    }
}

impl AsyncRead for Body {
    #[inline]
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut [u8]) -> Poll<IoResult<usize>> {
        Pin::new(&mut self.0).poll_read(cx, buf)
    }
}

impl Debug for Body {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Body").field(&self.0).finish()
    }
}

/// HTTP 响应
///
/// 响应体可能不存在，例如 HEAD 请求或 204 响应
#[derive(Debug, Default)]
pub struct Response {
    status_code: StatusCode,
    status_text: Option<String>,
    version: Version,
    headers: HeaderMap,
    body: Option<Body>,
    server_ip: Option<IpAddr>,
    server_port: Option<NonZeroU16>,
}

impl Response {
    /// 创建 HTTP 响应构建器
    #[inline]
    pub fn builder() -> ResponseBuilder {
        Default::default()
    }

    /// 获取 HTTP 状态码
    #[inline]
    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    /// 获取 HTTP 状态描述
    ///
    /// 如果传输层没有提供，则使用状态码的标准描述
    #[inline]
    pub fn status_text(&self) -> &str {
        self.status_text
            .as_deref()
            .or_else(|| self.status_code.canonical_reason())
            .unwrap_or_default()
    }

    /// 获取 HTTP 版本
    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }

    /// 获取 HTTP Headers
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// 获取 HTTP Headers 的可变引用
    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// 获取 HTTP Header
    #[inline]
    pub fn header(&self, header_name: &HeaderName) -> Option<&HeaderValue> {
        self.headers.get(header_name)
    }

    /// 获取响应体
    #[inline]
    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// 取出响应体
    #[inline]
    pub fn take_body(&mut self) -> Option<Body> {
        self.body.take()
    }

    /// 获取服务器 IP 地址
    #[inline]
    pub fn server_ip(&self) -> Option<IpAddr> {
        self.server_ip
    }

    /// 获取服务器端口号
    #[inline]
    pub fn server_port(&self) -> Option<NonZeroU16> {
        self.server_port
    }

    #[allow(dead_code)]
    fn ignore() {
        assert_impl!(Send: Self);
    }
}

/// HTTP 响应构建器
#[derive(Debug, Default)]
pub struct ResponseBuilder {
    inner: Response,
}

impl ResponseBuilder {
    /// 设置 HTTP 状态码
    #[inline]
    #[must_use]
    pub fn status_code(mut self, status_code: StatusCode) -> Self {
        self.inner.status_code = status_code;
        self
    }

    /// 设置 HTTP 状态描述
    #[inline]
    #[must_use]
    pub fn status_text(mut self, status_text: impl Into<String>) -> Self {
        self.inner.status_text = Some(status_text.into());
        self
    }

    /// 设置 HTTP 版本
    #[inline]
    #[must_use]
    pub fn version(mut self, version: Version) -> Self {
        self.inner.version = version;
        self
    }

    /// 设置 HTTP Headers
    #[inline]
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.inner.headers = headers;
        self
    }

    /// 添加 HTTP Header
    #[inline]
    #[must_use]
    pub fn header(mut self, header_name: HeaderName, header_value: HeaderValue) -> Self {
        self.inner.headers.insert(header_name, header_value);
        self
    }

    /// 设置响应体
    #[inline]
    #[must_use]
    pub fn body(mut self, body: Body) -> Self {
        self.inner.body = Some(body);
        self
    }

    /// 使用输入流作为响应体
    #[inline]
    #[must_use]
    pub fn stream_as_body(self, body: impl AsyncRead + Unpin + Debug + Send + 'static) -> Self {
        self.body(Body::from_reader(body))
    }

    /// 使用二进制数据作为响应体
    #[inline]
    #[must_use]
    pub fn bytes_as_body(self, body: impl Into<Vec<u8>>) -> Self {
        self.body(Body::from_bytes(body))
    }

    /// 设置服务器 IP 地址
    #[inline]
    #[must_use]
    pub fn server_ip(mut self, server_ip: IpAddr) -> Self {
        self.inner.server_ip = Some(server_ip);
        self
    }

    /// 设置服务器端口号
    #[inline]
    #[must_use]
    pub fn server_port(mut self, server_port: NonZeroU16) -> Self {
        self.inner.server_port = Some(server_port);
        self
    }

    /// 构建 HTTP 响应
    #[inline]
    pub fn build(self) -> Response {
        self.inner
    }
}

/// HTTP 响应结果
pub type Result = result::Result<Response, ResponseError>;

#[cfg(test)]
mod tests {
    use super::*;
    use futures::io::AsyncReadExt;

    #[async_std::test]
    async fn test_build_response() -> result::Result<(), Box<dyn std::error::Error>> {
        let mut response = Response::builder()
            .status_code(StatusCode::CREATED)
            .header(HeaderName::from_static("x-amzn-requestid"), HeaderValue::from_static("req-1"))
            .bytes_as_body("done")
            .build();
        assert_eq!(response.status_code(), StatusCode::CREATED);
        assert_eq!(response.status_text(), "Created");
        assert_eq!(
            response.header(&HeaderName::from_static("x-amzn-requestid")),
            Some(&HeaderValue::from_static("req-1"))
        );

        let mut body = response.take_body().unwrap();
        let mut buf = String::new();
        body.read_to_string(&mut buf).await?;
        assert_eq!(buf, "done");
        assert!(response.body().is_none());
        Ok(())
    }

    #[test]
    fn test_custom_status_text() {
        let response = Response::builder()
            .status_code(StatusCode::SERVICE_UNAVAILABLE)
            .status_text("Slow Down")
            .build();
        assert_eq!(response.status_text(), "Slow Down");
    }
}
