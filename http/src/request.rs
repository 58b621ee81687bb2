use super::FULL_USER_AGENT;
use futures::io::{AsyncRead, Cursor};
use http::{
    header::{HeaderMap, IntoHeaderName},
    method::Method,
    uri::Uri,
    HeaderValue,
};
use std::{
    fmt::{self, Debug},
    io::Result as IoResult,
    net::IpAddr,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};

trait AsyncReadDebug: AsyncRead + Unpin + Debug + Send {}
impl<T: AsyncRead + Unpin + Debug + Send> AsyncReadDebug for T {}

/// HTTP 请求体
///
/// 请求体只会被传输层读取一次，可以携带请求体长度，以便传输层设置 Content-Length
pub struct Body {
    reader: Box<dyn AsyncReadDebug>,
    size: Option<u64>,
}

impl Body {
    /// 通过异步输入流创建请求体
    #[inline]
    pub fn from_reader(reader: impl AsyncRead + Unpin + Debug + Send + 'static, size: Option<u64>) -> Self {
        Self {
            reader: Box::new(reader),
            size,
        }
    }

    /// 通过二进制数据创建请求体
    #[inline]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let size = bytes.len() as u64;
        Self {
            reader: Box::new(Cursor::new(bytes)),
            size: Some(size),
        }
    }

    /// 获取请求体长度
    #[inline]
    pub fn size(&self) -> Option<u64> {
        self.size
    }
}

impl Default for Body {
    #[inline]
    fn default() -> Self {
        Self::from_bytes(Default::default())
    }
}

impl AsyncRead for Body {
    #[inline]
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut [u8]) -> Poll<IoResult<usize>> {
        Pin::new(&mut self.reader).poll_read(cx, buf)
    }
}

impl Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("reader", &self.reader)
            .field("size", &self.size)
            .finish()
    }
}

/// HTTP 请求
///
/// 传输层原生的出站请求，由请求执行流水线构建，交由 [`super::HttpCaller`] 发送
#[derive(Debug, Default)]
pub struct Request {
    url: Uri,
    method: Method,
    headers: HeaderMap,
    body: Option<Body>,
    connect_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
    local_address: Option<IpAddr>,
}

impl Request {
    /// 创建 HTTP 请求构建器
    #[inline]
    pub fn builder() -> RequestBuilder {
        Default::default()
    }

    /// 获取请求 URL
    #[inline]
    pub fn url(&self) -> &Uri {
        &self.url
    }

    /// 获取请求 HTTP 方法
    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// 获取请求 HTTP Headers
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// 获取请求 HTTP Headers 的可变引用
    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// 获取请求体
    #[inline]
    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// 获取请求体的可变引用
    #[inline]
    pub fn body_mut(&mut self) -> Option<&mut Body> {
        self.body.as_mut()
    }

    /// 取出请求体
    #[inline]
    pub fn take_body(&mut self) -> Option<Body> {
        self.body.take()
    }

    /// 获取连接超时时长
    #[inline]
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    /// 获取请求超时时长
    #[inline]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    /// 获取本地绑定地址
    #[inline]
    pub fn local_address(&self) -> Option<IpAddr> {
        self.local_address
    }

    /// 获取默认的 UserAgent
    #[inline]
    pub fn user_agent(&self) -> &'static str {
        FULL_USER_AGENT.as_ref()
    }
}

/// HTTP 请求构建器
#[derive(Debug, Default)]
pub struct RequestBuilder(Request);

impl RequestBuilder {
    /// 设置请求 URL
    #[inline]
    pub fn url(&mut self, url: Uri) -> &mut Self {
        self.0.url = url;
        self
    }

    /// 设置请求 HTTP 方法
    #[inline]
    pub fn method(&mut self, method: Method) -> &mut Self {
        self.0.method = method;
        self
    }

    /// 设置请求 HTTP Headers
    #[inline]
    pub fn headers(&mut self, headers: HeaderMap) -> &mut Self {
        self.0.headers = headers;
        self
    }

    /// 追加请求 HTTP Header，不会覆盖已有的同名 Header
    #[inline]
    pub fn append_header(&mut self, header_name: impl IntoHeaderName, header_value: HeaderValue) -> &mut Self {
        self.0.headers.append(header_name, header_value);
        self
    }

    /// 设置请求体
    #[inline]
    pub fn body(&mut self, body: Body) -> &mut Self {
        self.0.body = Some(body);
        self
    }

    /// 设置连接超时时长
    #[inline]
    pub fn connect_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.0.connect_timeout = Some(timeout);
        self
    }

    /// 设置请求超时时长
    #[inline]
    pub fn request_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.0.request_timeout = Some(timeout);
        self
    }

    /// 设置本地绑定地址
    #[inline]
    pub fn local_address(&mut self, local_address: IpAddr) -> &mut Self {
        self.0.local_address = Some(local_address);
        self
    }

    /// 构建 HTTP 请求
    #[inline]
    pub fn build(&mut self) -> Request {
        std::mem::take(&mut self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::io::AsyncReadExt;
    use http::header::CONTENT_TYPE;

    #[async_std::test]
    async fn test_build_request() -> Result<(), Box<dyn std::error::Error>> {
        let mut request = Request::builder()
            .url("http://localhost/a".parse()?)
            .method(Method::PUT)
            .append_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .append_header("x-multi", HeaderValue::from_static("1"))
            .append_header("x-multi", HeaderValue::from_static("2"))
            .body(Body::from_bytes(b"hello".to_vec()))
            .request_timeout(Duration::from_secs(3))
            .build();
        assert_eq!(request.method(), Method::PUT);
        assert_eq!(request.headers().get_all("x-multi").iter().count(), 2);
        assert_eq!(request.request_timeout(), Some(Duration::from_secs(3)));
        assert_eq!(request.connect_timeout(), None);
        assert!(request.user_agent().starts_with("awsasync-rust/"));

        let mut body = request.take_body().unwrap();
        assert_eq!(body.size(), Some(5));
        let mut buf = Vec::new();
        body.read_to_end(&mut buf).await?;
        assert_eq!(buf, b"hello");
        assert!(request.body().is_none());
        Ok(())
    }
}
