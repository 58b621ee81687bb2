use super::ResettableContent;
use futures::{
    io::{AsyncRead, AsyncSeek},
    ready,
};
use std::{
    fmt::{self, Debug},
    io::{Error as IoError, ErrorKind as IoErrorKind, Result as IoResult, SeekFrom},
    pin::Pin,
    task::{Context, Poll},
};

/// 默认的缓冲上限
pub const DEFAULT_READ_LIMIT: usize = 128 * 1024;

fn closed_error() -> IoError {
    IoError::new(IoErrorKind::Other, "Request content is already closed")
}

/// 内存中的请求体
#[derive(Debug)]
pub struct MemoryContent {
    data: Vec<u8>,
    position: usize,
    mark: usize,
    closed: bool,
}

impl MemoryContent {
    /// 创建内存中的请求体
    #[inline]
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            position: 0,
            mark: 0,
            closed: false,
        }
    }

    /// 获取数据长度
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// 数据是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl AsyncRead for MemoryContent {
    fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut [u8]) -> Poll<IoResult<usize>> {
        if self.closed {
            return Poll::Ready(Err(closed_error()));
        }
        let rest = &self.data[self.position..];
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.position += n;
        Poll::Ready(Ok(n))
    }
}

impl ResettableContent for MemoryContent {
    #[inline]
    fn mark(&mut self) {
        self.mark = self.position;
    }

    #[inline]
    fn poll_reset(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<IoResult<()>> {
        self.position = self.mark;
        Poll::Ready(Ok(()))
    }

    #[inline]
    fn close(&mut self) -> IoResult<()> {
        self.closed = true;
        Ok(())
    }
}

/// 通过寻址实现重置的请求体
///
/// 记录自标记以来读取的字节数，重置时向回寻址相应的偏移量，不需要在内存中缓冲数据
pub struct SeekableContent<R> {
    inner: Option<R>,
    read_since_mark: u64,
}

impl<R: AsyncRead + AsyncSeek + Unpin> SeekableContent<R> {
    /// 创建可寻址的请求体，当前位置即为初始标记
    #[inline]
    pub fn new(inner: R) -> Self {
        Self {
            inner: Some(inner),
            read_since_mark: 0,
        }
    }
}

impl<R: AsyncRead + AsyncSeek + Unpin> AsyncRead for SeekableContent<R> {
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut [u8]) -> Poll<IoResult<usize>> {
        let inner = self.inner.as_mut().ok_or_else(closed_error)?;
        let n = ready!(Pin::new(inner).poll_read(cx, buf))?;
        self.read_since_mark += n as u64;
        Poll::Ready(Ok(n))
    }
}

impl<R: AsyncRead + AsyncSeek + Unpin + Debug + Send + Sync> ResettableContent for SeekableContent<R> {
    #[inline]
    fn mark(&mut self) {
        self.read_since_mark = 0;
    }

    fn poll_reset(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<IoResult<()>> {
        if self.read_since_mark == 0 {
            return Poll::Ready(Ok(()));
        }
        let offset = i64::try_from(self.read_since_mark)
            .map_err(|err| IoError::new(IoErrorKind::InvalidInput, err))?;
        let inner = self.inner.as_mut().ok_or_else(closed_error)?;
        ready!(Pin::new(inner).poll_seek(cx, SeekFrom::Current(-offset)))?;
        self.read_since_mark = 0;
        Poll::Ready(Ok(()))
    }

    #[inline]
    fn close(&mut self) -> IoResult<()> {
        self.inner = None;
        Ok(())
    }
}

impl<R: Debug> Debug for SeekableContent<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeekableContent")
            .field("inner", &self.inner)
            .field("read_since_mark", &self.read_since_mark)
            .finish()
    }
}

/// 在内存中缓冲的请求体
///
/// 自标记以来读取的数据都会被缓冲，以便重置后重新读取。
/// 缓冲超过上限后标记失效，此时重置会返回错误。
pub struct BufferedContent<R> {
    inner: Option<R>,
    buffer: Vec<u8>,
    position: usize,
    read_limit: usize,
    mark_valid: bool,
}

impl<R: AsyncRead + Unpin> BufferedContent<R> {
    /// 创建缓冲的请求体，当前位置即为初始标记
    #[inline]
    pub fn new(inner: R, read_limit: usize) -> Self {
        Self {
            inner: Some(inner),
            buffer: Default::default(),
            position: 0,
            read_limit,
            mark_valid: true,
        }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for BufferedContent<R> {
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut [u8]) -> Poll<IoResult<usize>> {
        let this = &mut *self;
        if this.position < this.buffer.len() {
            let rest = &this.buffer[this.position..];
            let n = rest.len().min(buf.len());
            buf[..n].copy_from_slice(&rest[..n]);
            this.position += n;
            return Poll::Ready(Ok(n));
        }
        let inner = this.inner.as_mut().ok_or_else(closed_error)?;
        let n = ready!(Pin::new(inner).poll_read(cx, buf))?;
        if this.mark_valid {
            if this.buffer.len() + n > this.read_limit {
                this.mark_valid = false;
                this.buffer = Default::default();
                this.position = 0;
            } else {
                this.buffer.extend_from_slice(&buf[..n]);
                this.position = this.buffer.len();
            }
        }
        Poll::Ready(Ok(n))
    }
}

impl<R: AsyncRead + Unpin + Debug + Send + Sync> ResettableContent for BufferedContent<R> {
    fn mark(&mut self) {
        self.buffer.drain(..self.position);
        self.position = 0;
        self.mark_valid = true;
    }

    fn poll_reset(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<IoResult<()>> {
        if !self.mark_valid {
            return Poll::Ready(Err(IoError::new(
                IoErrorKind::Other,
                format!(
                    "Resetting to invalid mark, more than {} bytes were read since the mark",
                    self.read_limit
                ),
            )));
        }
        self.position = 0;
        Poll::Ready(Ok(()))
    }

    #[inline]
    fn close(&mut self) -> IoResult<()> {
        self.inner = None;
        self.buffer = Default::default();
        Ok(())
    }
}

impl<R: Debug> Debug for BufferedContent<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferedContent")
            .field("inner", &self.inner)
            .field("buffered", &self.buffer.len())
            .field("position", &self.position)
            .field("read_limit", &self.read_limit)
            .field("mark_valid", &self.mark_valid)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{super::reset, *};
    use futures::io::{AsyncReadExt, Cursor};

    #[async_std::test]
    async fn test_buffered_content_mark_in_the_middle() -> IoResult<()> {
        let mut content = BufferedContent::new(Cursor::new(b"abcdefgh".to_vec()), 16);
        let mut buf = [0u8; 3];
        content.read_exact(&mut buf).await?;
        content.mark();
        content.read_exact(&mut buf).await?;
        assert_eq!(&buf, b"def");
        reset(&mut content).await?;
        let mut rest = Vec::new();
        content.read_to_end(&mut rest).await?;
        assert_eq!(rest, b"defgh");
        Ok(())
    }

    #[async_std::test]
    async fn test_buffered_content_reset_beyond_limit() -> IoResult<()> {
        let mut content = BufferedContent::new(Cursor::new(vec![7u8; 64]), 16);
        let mut all = Vec::new();
        content.read_to_end(&mut all).await?;
        assert_eq!(all.len(), 64);
        assert!(reset(&mut content).await.is_err());
        Ok(())
    }

    #[async_std::test]
    async fn test_seekable_content_mark_in_the_middle() -> IoResult<()> {
        let mut content = SeekableContent::new(Cursor::new(b"0123456789".to_vec()));
        let mut buf = [0u8; 4];
        content.read_exact(&mut buf).await?;
        content.mark();
        content.read_exact(&mut buf).await?;
        assert_eq!(&buf, b"4567");
        reset(&mut content).await?;
        let mut rest = String::new();
        content.read_to_string(&mut rest).await?;
        assert_eq!(rest, "456789");
        Ok(())
    }

    #[async_std::test]
    async fn test_closed_content_cannot_be_read() -> IoResult<()> {
        let mut content = MemoryContent::new(b"abc".to_vec());
        content.close()?;
        let mut buf = Vec::new();
        assert!(content.read_to_end(&mut buf).await.is_err());
        Ok(())
    }
}
