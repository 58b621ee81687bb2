use awsasync_http::{
    default_user_agent, HttpCaller, Request, RequestBody, Response, ResponseBody, ResponseError, ResponseErrorKind,
    ResponseResult, Uri,
};
use bytes::Bytes;
use futures::{future::BoxFuture, ready, AsyncRead, Stream};
use log::{debug, warn};
use reqwest::{
    header::{HeaderValue, CONTENT_LENGTH, USER_AGENT},
    Body as ReqwestBody, Client as ReqwestClient, Error as ReqwestError, Request as ReqwestRequest,
    Response as ReqwestResponse, Result as ReqwestResult, Url,
};
use std::{
    any::Any,
    collections::HashMap,
    fmt,
    io::{Error as IoError, ErrorKind as IoErrorKind, Result as IoResult},
    mem::take,
    net::IpAddr,
    num::NonZeroU16,
    pin::Pin,
    sync::{Mutex, PoisonError},
    task::{Context, Poll},
    time::Duration,
};

type ClientKey = (Option<Duration>, Option<IpAddr>);

/// Reqwest 异步客户端
///
/// 请求级别的超时时长直接设置在 Reqwest 请求上，
/// 连接超时时长和本地绑定地址属于客户端级别的设置，因此会按需创建并缓存对应的 Reqwest 客户端
#[derive(Debug, Default)]
pub struct AsyncClient {
    default_client: ReqwestClient,
    configured_clients: Mutex<HashMap<ClientKey, ReqwestClient>>,
}

impl AsyncClient {
    /// 创建 Reqwest 异步客户端
    #[inline]
    pub fn new(client: ReqwestClient) -> Self {
        Self {
            default_client: client,
            configured_clients: Default::default(),
        }
    }

    fn client_for(&self, request: &Request) -> Result<ReqwestClient, ResponseError> {
        let key = (request.connect_timeout(), request.local_address());
        if key == (None, None) {
            return Ok(self.default_client.to_owned());
        }
        let mut clients = self.configured_clients.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = clients.get(&key) {
            return Ok(client.to_owned());
        }
        let mut builder = ReqwestClient::builder().local_address(key.1);
        if let Some(connect_timeout) = key.0 {
            builder = builder.connect_timeout(connect_timeout);
        }
        let client = builder.build().map_err(|err| {
            ResponseError::builder(ResponseErrorKind::InvalidRequestResponse, err)
                .uri(request.url())
                .build()
        })?;
        debug!(
            "Created reqwest client: connect_timeout={:?}, local_address={:?}",
            key.0, key.1
        );
        clients.insert(key, client.to_owned());
        Ok(client)
    }
}

impl From<ReqwestClient> for AsyncClient {
    #[inline]
    fn from(client: ReqwestClient) -> Self {
        Self::new(client)
    }
}

impl HttpCaller for AsyncClient {
    fn call(&self, request: Request) -> BoxFuture<'_, ResponseResult> {
        Box::pin(async move {
            let client = self.client_for(&request)?;
            let uri = request.url().to_owned();
            let reqwest_request = make_reqwest_request(request)?;
            match client.execute(reqwest_request).await {
                Ok(reqwest_response) => Ok(from_reqwest_response(reqwest_response)),
                Err(err) => Err(from_reqwest_error(err, &uri)),
            }
        })
    }

    #[inline]
    fn as_http_caller(&self) -> &dyn HttpCaller {
        self
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn make_reqwest_request(mut request: Request) -> Result<ReqwestRequest, ResponseError> {
    let url = Url::parse(&request.url().to_string()).map_err(|err| {
        ResponseError::builder(ResponseErrorKind::InvalidUrl, err)
            .uri(request.url())
            .build()
    })?;
    let mut reqwest_request = ReqwestRequest::new(request.method().to_owned(), url);
    *reqwest_request.headers_mut() = take(request.headers_mut());
    if !reqwest_request.headers().contains_key(USER_AGENT) {
        reqwest_request
            .headers_mut()
            .insert(USER_AGENT, HeaderValue::from_static(default_user_agent()));
    }
    if let Some(body) = request.take_body() {
        if let Some(size) = body.size() {
            reqwest_request.headers_mut().insert(CONTENT_LENGTH, size.into());
        }
        *reqwest_request.body_mut() = Some(ReqwestBody::wrap_stream(RequestBodyStream::new(body)));
    }
    *reqwest_request.timeout_mut() = request.request_timeout();
    return Ok(reqwest_request);

    struct RequestBodyStream {
        body: Mutex<RequestBody>,
    }

    impl RequestBodyStream {
        fn new(body: RequestBody) -> Self {
            Self {
                body: Mutex::new(body),
            }
        }
    }

    impl Stream for RequestBodyStream {
        type Item = IoResult<Vec<u8>>;

        fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
            const BUF_LEN: usize = 32 * 1024;
            let mut buf = [0u8; BUF_LEN];
            let body = self.body.get_mut().unwrap_or_else(PoisonError::into_inner);
            match ready!(Pin::new(body).poll_read(cx, &mut buf)) {
                Err(err) => {
                    warn!("Failed to read request body: {}", err);
                    Poll::Ready(Some(Err(err)))
                }
                Ok(0) => Poll::Ready(None),
                Ok(n) => Poll::Ready(Some(Ok(buf[..n].to_vec()))),
            }
        }
    }
}

fn from_reqwest_response(mut response: ReqwestResponse) -> Response {
    let mut builder = Response::builder()
        .status_code(response.status())
        .version(response.version())
        .headers(take(response.headers_mut()));
    if let Some(port) = response.url().port_or_known_default().and_then(NonZeroU16::new) {
        builder = builder.server_port(port);
    }
    if let Some(remote_addr) = response.remote_addr() {
        builder = builder.server_ip(remote_addr.ip());
        if let Some(port) = NonZeroU16::new(remote_addr.port()) {
            builder = builder.server_port(port);
        }
    }
    builder
        .body(ResponseBody::from_reader(ResponseBodyReader::new(response.bytes_stream())))
        .build()
}

struct ResponseBodyReader {
    stream: Pin<Box<dyn Stream<Item = ReqwestResult<Bytes>> + Send>>,
    buffer: Bytes,
}

impl ResponseBodyReader {
    #[inline]
    fn new(stream: impl Stream<Item = ReqwestResult<Bytes>> + Send + 'static) -> Self {
        Self {
            stream: Box::pin(stream),
            buffer: Bytes::new(),
        }
    }
}

impl fmt::Debug for ResponseBodyReader {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ResponseBodyReader")
            .field("buffer_len", &self.buffer.len())
            .finish()
    }
}

impl AsyncRead for ResponseBodyReader {
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut [u8]) -> Poll<IoResult<usize>> {
        while self.buffer.is_empty() {
            match ready!(self.stream.as_mut().poll_next(cx)) {
                None => return Poll::Ready(Ok(0)),
                Some(Err(err)) => return Poll::Ready(Err(IoError::new(IoErrorKind::Other, err))),
                Some(Ok(data)) => self.buffer = data,
            }
        }
        let n = buf.len().min(self.buffer.len());
        buf[..n].copy_from_slice(&self.buffer.split_to(n));
        Poll::Ready(Ok(n))
    }
}

fn from_reqwest_error(err: ReqwestError, uri: &Uri) -> ResponseError {
    let kind = if err.is_builder() {
        ResponseErrorKind::InvalidUrl
    } else if err.is_redirect() {
        ResponseErrorKind::TooManyRedirect
    } else if err.is_timeout() {
        ResponseErrorKind::TimeoutError
    } else if err.is_connect() {
        ResponseErrorKind::ConnectError
    } else if err.is_body() {
        ResponseErrorKind::SendError
    } else if err.is_request() {
        ResponseErrorKind::InvalidRequestResponse
    } else {
        ResponseErrorKind::UnknownError
    };
    ResponseError::builder(kind, err).uri(uri).build()
}
