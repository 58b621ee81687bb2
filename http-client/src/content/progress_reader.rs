use super::{
    super::progress::{publish_request_bytes, publish_request_reset, publish_response_bytes, ProgressListener},
    ResettableContent,
};
use futures::{io::AsyncRead, ready};
use std::{
    fmt::{self, Debug},
    io::Result as IoResult,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Direction {
    Request,
    Response,
}

/// 发布字节传输进度的输入流
///
/// 每次读取都会向监听器发布读取的字节数，重置时发布被丢弃的字节数
pub struct ProgressReader<R> {
    inner: R,
    listener: Arc<dyn ProgressListener>,
    direction: Direction,
    read_since_mark: u64,
}

impl<R> ProgressReader<R> {
    /// 包装请求体
    #[inline]
    pub fn for_request(inner: R, listener: Arc<dyn ProgressListener>) -> Self {
        Self::new(inner, listener, Direction::Request)
    }

    /// 包装响应体
    #[inline]
    pub fn for_response(inner: R, listener: Arc<dyn ProgressListener>) -> Self {
        Self::new(inner, listener, Direction::Response)
    }

    #[inline]
    fn new(inner: R, listener: Arc<dyn ProgressListener>, direction: Direction) -> Self {
        Self {
            inner,
            listener,
            direction,
            read_since_mark: 0,
        }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for ProgressReader<R> {
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut [u8]) -> Poll<IoResult<usize>> {
        let n = ready!(Pin::new(&mut self.inner).poll_read(cx, buf))?;
        self.read_since_mark += n as u64;
        match self.direction {
            Direction::Request => publish_request_bytes(Some(self.listener.as_ref()), n as u64),
            Direction::Response => publish_response_bytes(Some(self.listener.as_ref()), n as u64),
        }
        Poll::Ready(Ok(n))
    }
}

impl<R: ResettableContent> ResettableContent for ProgressReader<R> {
    #[inline]
    fn mark_supported(&self) -> bool {
        self.inner.mark_supported()
    }

    #[inline]
    fn mark(&mut self) {
        self.inner.mark();
        self.read_since_mark = 0;
    }

    fn poll_reset(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<IoResult<()>> {
        ready!(Pin::new(&mut self.inner).poll_reset(cx))?;
        let bytes_reset = self.read_since_mark;
        self.read_since_mark = 0;
        publish_request_reset(Some(self.listener.as_ref()), bytes_reset);
        Poll::Ready(Ok(()))
    }

    #[inline]
    fn close(&mut self) -> IoResult<()> {
        self.inner.close()
    }
}

impl<R: Debug> Debug for ProgressReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressReader")
            .field("inner", &self.inner)
            .field("direction", &self.direction)
            .field("read_since_mark", &self.read_since_mark)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        super::{super::progress::ProgressEventType, reset, MemoryContent},
        *,
    };
    use crate::test_utils::RecordingProgressListener;
    use futures::io::AsyncReadExt;

    #[async_std::test]
    async fn test_request_progress_and_reset() -> IoResult<()> {
        let listener = Arc::new(RecordingProgressListener::default());
        let mut reader = ProgressReader::for_request(MemoryContent::new(vec![1u8; 10]), listener.to_owned());
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        reset(&mut reader).await?;

        let transferred: u64 = listener
            .events_of(ProgressEventType::RequestByteTransfer)
            .iter()
            .map(|event| event.bytes())
            .sum();
        assert_eq!(transferred, 10);
        let resets = listener.events_of(ProgressEventType::RequestContentReset);
        assert_eq!(resets.len(), 1);
        assert_eq!(resets[0].bytes(), 10);
        Ok(())
    }
}
