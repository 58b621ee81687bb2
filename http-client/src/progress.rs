use log::warn;
use std::{
    fmt::Debug,
    panic::{catch_unwind, AssertUnwindSafe},
};

/// 进度事件类型
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ProgressEventType {
    /// 已知请求体长度
    RequestContentLength,

    /// 已知响应体长度
    ResponseContentLength,

    /// 请求体发送了若干字节
    RequestByteTransfer,

    /// 响应体接收了若干字节
    ResponseByteTransfer,

    /// 请求体被重置，携带被丢弃的字节数
    RequestContentReset,

    /// 请求开始执行
    ClientRequestStarted,

    /// 请求执行成功
    ClientRequestSuccess,

    /// 请求执行失败
    ClientRequestFailed,

    /// HTTP 请求开始发送
    HttpRequestStarted,

    /// HTTP 请求发送完毕
    HttpRequestCompleted,

    /// 开始处理 HTTP 响应
    HttpResponseStarted,

    /// HTTP 响应处理完毕
    HttpResponseCompleted,
}

impl ProgressEventType {
    /// 是否为字节传输类事件
    #[inline]
    pub fn is_byte_count_event(self) -> bool {
        matches!(
            self,
            Self::RequestContentLength
                | Self::ResponseContentLength
                | Self::RequestByteTransfer
                | Self::ResponseByteTransfer
                | Self::RequestContentReset
        )
    }
}

/// 进度事件
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    event_type: ProgressEventType,
    bytes: u64,
}

impl ProgressEvent {
    /// 创建进度事件
    #[inline]
    pub fn new(event_type: ProgressEventType, bytes: u64) -> Self {
        Self { event_type, bytes }
    }

    /// 获取事件类型
    #[inline]
    pub fn event_type(&self) -> ProgressEventType {
        self.event_type
    }

    /// 获取事件携带的字节数
    #[inline]
    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

/// 进度监听器
///
/// 监听器在请求执行的线程上被同步调用，不应该执行耗时操作
pub trait ProgressListener: Debug + Send + Sync {
    /// 进度变化回调
    fn progress_changed(&self, event: &ProgressEvent);
}

/// 发布进度事件
///
/// 监听器发生的 panic 会被捕获并记录日志，不会影响请求执行
pub fn publish_event(listener: Option<&dyn ProgressListener>, event: ProgressEvent) {
    if let Some(listener) = listener {
        if catch_unwind(AssertUnwindSafe(|| listener.progress_changed(&event))).is_err() {
            warn!("Progress listener panicked when handling event {:?}", event.event_type());
        }
    }
}

/// 发布不携带字节数的进度事件
#[inline]
pub fn publish_progress(listener: Option<&dyn ProgressListener>, event_type: ProgressEventType) {
    publish_event(listener, ProgressEvent::new(event_type, 0))
}

/// 发布请求体长度事件
#[inline]
pub fn publish_request_content_length(listener: Option<&dyn ProgressListener>, content_length: u64) {
    publish_event(
        listener,
        ProgressEvent::new(ProgressEventType::RequestContentLength, content_length),
    )
}

/// 发布响应体长度事件
#[inline]
pub fn publish_response_content_length(listener: Option<&dyn ProgressListener>, content_length: u64) {
    publish_event(
        listener,
        ProgressEvent::new(ProgressEventType::ResponseContentLength, content_length),
    )
}

/// 发布请求体字节传输事件
#[inline]
pub fn publish_request_bytes(listener: Option<&dyn ProgressListener>, bytes: u64) {
    if bytes > 0 {
        publish_event(listener, ProgressEvent::new(ProgressEventType::RequestByteTransfer, bytes))
    }
}

/// 发布响应体字节传输事件
#[inline]
pub fn publish_response_bytes(listener: Option<&dyn ProgressListener>, bytes: u64) {
    if bytes > 0 {
        publish_event(listener, ProgressEvent::new(ProgressEventType::ResponseByteTransfer, bytes))
    }
}

/// 发布请求体重置事件
#[inline]
pub fn publish_request_reset(listener: Option<&dyn ProgressListener>, bytes_reset: u64) {
    publish_event(listener, ProgressEvent::new(ProgressEventType::RequestContentReset, bytes_reset))
}
