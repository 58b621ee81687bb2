use super::{
    content::{MemoryContent, ResettableContent},
    progress::{ProgressEvent, ProgressEventType, ProgressListener},
};
use awsasync_http::{
    HeaderMap, HttpCaller, Request as HttpRequest, Response as HttpResponse, ResponseError, ResponseErrorKind,
    ResponseResult, StatusCode,
};
use futures::{future::BoxFuture, io::AsyncRead, io::AsyncReadExt};
use std::{
    any::Any,
    fmt::{self, Debug},
    io::Result as IoResult,
    pin::Pin,
    sync::{
        atomic::{AtomicUsize, Ordering::Relaxed},
        Arc, Mutex, PoisonError,
    },
    task::{Context, Poll},
};

#[derive(Debug, Clone, Default)]
pub(crate) struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub(crate) fn get(&self) -> usize {
        self.0.load(Relaxed)
    }

    pub(crate) fn incr(&self) {
        self.0.fetch_add(1, Relaxed);
    }
}

/// 记录关闭次数的可重置请求体
pub(crate) struct CountingContent {
    inner: MemoryContent,
    closes: Counter,
    marks: Counter,
}

impl CountingContent {
    pub(crate) fn new(data: Vec<u8>) -> Self {
        Self {
            inner: MemoryContent::new(data),
            closes: Default::default(),
            marks: Default::default(),
        }
    }

    pub(crate) fn closes(&self) -> Counter {
        self.closes.to_owned()
    }

    pub(crate) fn marks(&self) -> Counter {
        self.marks.to_owned()
    }
}

impl Debug for CountingContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountingContent")
            .field("closes", &self.closes.get())
            .field("marks", &self.marks.get())
            .finish()
    }
}

impl AsyncRead for CountingContent {
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut [u8]) -> Poll<IoResult<usize>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl ResettableContent for CountingContent {
    fn mark(&mut self) {
        self.marks.incr();
        self.inner.mark();
    }

    fn poll_reset(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<IoResult<()>> {
        Pin::new(&mut self.inner).poll_reset(cx)
    }

    fn close(&mut self) -> IoResult<()> {
        self.closes.incr();
        self.inner.close()
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingProgressListener {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgressListener {
    pub(crate) fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).to_owned()
    }

    pub(crate) fn events_of(&self, event_type: ProgressEventType) -> Vec<ProgressEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.event_type() == event_type)
            .collect()
    }

    pub(crate) fn event_types(&self) -> Vec<ProgressEventType> {
        self.events()
            .into_iter()
            .map(|event| event.event_type())
            .filter(|event_type| !event_type.is_byte_count_event())
            .collect()
    }
}

impl ProgressListener for RecordingProgressListener {
    fn progress_changed(&self, event: &ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.to_owned());
    }
}

/// 传输层收到的请求
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub(crate) method: String,
    pub(crate) url: String,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Option<Vec<u8>>,
    pub(crate) body_size: Option<u64>,
}

#[derive(Debug, Default)]
struct Recorder(Mutex<Vec<RecordedRequest>>);

impl Recorder {
    async fn record(&self, mut request: HttpRequest) -> IoResult<()> {
        let mut body_size = None;
        let body = match request.take_body() {
            Some(mut body) => {
                body_size = body.size();
                let mut buf = Vec::new();
                body.read_to_end(&mut buf).await?;
                Some(buf)
            }
            None => None,
        };
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRequest {
                method: request.method().to_string(),
                url: request.url().to_string(),
                headers: request.headers().to_owned(),
                body,
                body_size,
            });
        Ok(())
    }

    fn requests(&self) -> Vec<RecordedRequest> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).to_owned()
    }
}

/// 总是返回固定响应的传输层
#[derive(Debug)]
pub(crate) struct FixedResponseCaller {
    status_code: StatusCode,
    status_text: Option<String>,
    headers: HeaderMap,
    body: Vec<u8>,
    recorder: Recorder,
}

impl FixedResponseCaller {
    pub(crate) fn new(status_code: StatusCode, headers: HeaderMap, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status_code,
            status_text: None,
            headers,
            body: body.into(),
            recorder: Default::default(),
        }
    }

    pub(crate) fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(StatusCode::OK, Default::default(), body)
    }

    #[must_use]
    pub(crate) fn status_text(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = Some(status_text.into());
        self
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.recorder.requests()
    }
}

impl HttpCaller for FixedResponseCaller {
    fn call(&self, request: HttpRequest) -> BoxFuture<'_, ResponseResult> {
        Box::pin(async move {
            self.recorder
                .record(request)
                .await
                .map_err(|err| ResponseError::new(ResponseErrorKind::SendError, err))?;
            let mut builder = HttpResponse::builder()
                .status_code(self.status_code)
                .headers(self.headers.to_owned())
                .bytes_as_body(self.body.to_owned());
            if let Some(status_text) = &self.status_text {
                builder = builder.status_text(status_text.to_owned());
            }
            Ok(builder.build())
        })
    }

    fn as_http_caller(&self) -> &dyn HttpCaller {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// 总是返回传输层错误的传输层
#[derive(Debug)]
pub(crate) struct ErrorResponseCaller {
    kind: ResponseErrorKind,
}

impl ErrorResponseCaller {
    pub(crate) fn new(kind: ResponseErrorKind) -> Self {
        Self { kind }
    }
}

impl HttpCaller for ErrorResponseCaller {
    fn call(&self, request: HttpRequest) -> BoxFuture<'_, ResponseResult> {
        Box::pin(async move {
            Err(ResponseError::builder(self.kind, "Test Error")
                .uri(request.url())
                .build())
        })
    }

    fn as_http_caller(&self) -> &dyn HttpCaller {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// 永远不会返回的传输层
#[derive(Debug, Default)]
pub(crate) struct PendingCaller {
    calls: Counter,
}

impl PendingCaller {
    pub(crate) fn calls(&self) -> Counter {
        self.calls.to_owned()
    }
}

impl HttpCaller for PendingCaller {
    fn call(&self, _request: HttpRequest) -> BoxFuture<'_, ResponseResult> {
        self.calls.incr();
        Box::pin(futures::future::pending())
    }

    fn as_http_caller(&self) -> &dyn HttpCaller {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
