mod progress_reader;
mod releasable;
mod resettable;

pub use progress_reader::ProgressReader;
pub use releasable::ReleasableContent;
pub use resettable::{BufferedContent, MemoryContent, SeekableContent, DEFAULT_READ_LIMIT};

use futures::{
    future::poll_fn,
    io::{AsyncRead, AsyncSeek},
};
use log::debug;
use std::{
    fmt::{self, Debug},
    io::{Error as IoError, ErrorKind as IoErrorKind, Result as IoResult},
    path::Path,
    pin::Pin,
    task::{Context, Poll},
};

/// 可重置的请求体
///
/// 支持在某个位置设置标记，之后可以重置回该位置重新读取。
/// 签名和发送都需要读取完整的请求体，因此请求体必须能够被重置。
pub trait ResettableContent: AsyncRead + Unpin + Debug + Send + Sync {
    /// 是否支持标记和重置
    #[inline]
    fn mark_supported(&self) -> bool {
        true
    }

    /// 在当前位置设置标记
    fn mark(&mut self);

    /// 重置到最近一次标记的位置
    fn poll_reset(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<IoResult<()>>;

    /// 关闭请求体，释放底层资源
    fn close(&mut self) -> IoResult<()>;
}

/// 将请求体重置到最近一次标记的位置
#[inline]
pub(crate) async fn reset<C: ResettableContent + ?Sized>(content: &mut C) -> IoResult<()> {
    poll_fn(|cx| Pin::new(&mut *content).poll_reset(cx)).await
}

impl<C: ResettableContent + ?Sized> ResettableContent for Box<C> {
    #[inline]
    fn mark_supported(&self) -> bool {
        (**self).mark_supported()
    }

    #[inline]
    fn mark(&mut self) {
        (**self).mark()
    }

    #[inline]
    fn poll_reset(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<IoResult<()>> {
        Pin::new(&mut **self).poll_reset(cx)
    }

    #[inline]
    fn close(&mut self) -> IoResult<()> {
        (**self).close()
    }
}

trait ReadDebug: AsyncRead + Unpin + Debug + Send + Sync {}
impl<T: AsyncRead + Unpin + Debug + Send + Sync> ReadDebug for T {}

trait ReadSeekDebug: AsyncRead + AsyncSeek + Unpin + Debug + Send + Sync {}
impl<T: AsyncRead + AsyncSeek + Unpin + Debug + Send + Sync> ReadSeekDebug for T {}

enum ContentInner {
    Bytes(MemoryContent),
    Reader(Box<dyn ReadDebug>),
    Seekable(Box<dyn ReadSeekDebug>),
    Resettable(Box<dyn ResettableContent>),
    Releasable(ReleasableContent),
}

/// 请求体
///
/// 可以是内存数据、任意输入流、可寻址的输入流（例如文件）或调用方提供的可重置输入流
pub struct RequestContent(ContentInner);

impl RequestContent {
    /// 使用二进制数据作为请求体
    #[inline]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(ContentInner::Bytes(MemoryContent::new(bytes.into())))
    }

    /// 使用输入流作为请求体
    ///
    /// 输入流不支持重置，签名前需要在内存中缓冲
    #[inline]
    pub fn from_reader(reader: impl AsyncRead + Unpin + Debug + Send + Sync + 'static) -> Self {
        Self(ContentInner::Reader(Box::new(reader)))
    }

    /// 使用可寻址的输入流作为请求体
    ///
    /// 重置时通过寻址实现，不需要在内存中缓冲
    #[inline]
    pub fn from_seekable(reader: impl AsyncRead + AsyncSeek + Unpin + Debug + Send + Sync + 'static) -> Self {
        Self(ContentInner::Seekable(Box::new(reader)))
    }

    /// 使用可重置的输入流作为请求体
    #[inline]
    pub fn from_resettable(content: impl ResettableContent + 'static) -> Self {
        Self(ContentInner::Resettable(Box::new(content)))
    }

    /// 使用文件作为请求体
    pub async fn file(path: impl AsRef<Path>) -> IoResult<Self> {
        let file = async_std::fs::File::open(path.as_ref()).await?;
        Ok(Self::from_seekable(file))
    }

    #[inline]
    pub(crate) fn from_releasable(content: ReleasableContent) -> Self {
        Self(ContentInner::Releasable(content))
    }

    /// 获取请求体长度，仅当请求体为内存数据时可知
    #[inline]
    pub fn size(&self) -> Option<u64> {
        match &self.0 {
            ContentInner::Bytes(content) => Some(content.len() as u64),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn is_releasable(&self) -> bool {
        matches!(self.0, ContentInner::Releasable(_))
    }

    /// 将请求体重置到最近一次标记的位置
    ///
    /// 只有可重置的请求体才能重置，否则返回 [`IoErrorKind::Unsupported`] 错误
    pub async fn reset(&mut self) -> IoResult<()> {
        match &mut self.0 {
            ContentInner::Bytes(content) => reset(content).await,
            ContentInner::Resettable(content) => reset(content).await,
            ContentInner::Releasable(content) => reset(content).await,
            ContentInner::Reader(_) | ContentInner::Seekable(_) => Err(IoError::new(
                IoErrorKind::Unsupported,
                "Request content must be made resettable before reset",
            )),
        }
    }

    /// 关闭请求体
    pub fn close(&mut self) -> IoResult<()> {
        match &mut self.0 {
            ContentInner::Bytes(content) => content.close(),
            ContentInner::Resettable(content) => content.close(),
            ContentInner::Releasable(content) => content.close(),
            ContentInner::Reader(_) | ContentInner::Seekable(_) => Ok(()),
        }
    }
}

impl AsyncRead for RequestContent {
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut [u8]) -> Poll<IoResult<usize>> {
        match &mut self.0 {
            ContentInner::Bytes(content) => Pin::new(content).poll_read(cx, buf),
            ContentInner::Reader(content) => Pin::new(content).poll_read(cx, buf),
            ContentInner::Seekable(content) => Pin::new(content).poll_read(cx, buf),
            ContentInner::Resettable(content) => Pin::new(content).poll_read(cx, buf),
            ContentInner::Releasable(content) => Pin::new(content).poll_read(cx, buf),
        }
    }
}

impl Debug for RequestContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            ContentInner::Bytes(content) => f.debug_tuple("Bytes").field(content).finish(),
            ContentInner::Reader(content) => f.debug_tuple("Reader").field(content).finish(),
            ContentInner::Seekable(content) => f.debug_tuple("Seekable").field(content).finish(),
            ContentInner::Resettable(content) => f.debug_tuple("Resettable").field(content).finish(),
            ContentInner::Releasable(content) => f.debug_tuple("Releasable").field(content).finish(),
        }
    }
}

/// 将请求体转换为可重置的输入流
///
/// 已经支持重置的输入流原样返回，可寻址的输入流通过寻址重置，
/// 内存数据直接重置，其他输入流则在内存中缓冲至多 `read_limit` 字节
pub fn make_resettable(content: RequestContent, read_limit: usize) -> Box<dyn ResettableContent> {
    match content.0 {
        ContentInner::Bytes(content) => Box::new(content),
        ContentInner::Seekable(reader) => {
            debug!("Request content is seekable, reset it by seeking instead of buffering");
            Box::new(SeekableContent::new(reader))
        }
        ContentInner::Reader(reader) => Box::new(BufferedContent::new(reader, read_limit)),
        ContentInner::Resettable(content) if content.mark_supported() => content,
        ContentInner::Resettable(content) => Box::new(BufferedContent::new(content, read_limit)),
        ContentInner::Releasable(content) => Box::new(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::CountingContent;
    use futures::io::{AsyncReadExt, Cursor};
    use std::io::Write;

    #[async_std::test]
    async fn test_bytes_content_is_resettable() -> anyhow::Result<()> {
        let mut content = make_resettable(RequestContent::from_bytes("hello world"), DEFAULT_READ_LIMIT);
        let mut buf = [0u8; 5];
        content.read_exact(&mut buf).await?;
        assert_eq!(&buf, b"hello");
        reset(&mut content).await?;
        let mut all = String::new();
        content.read_to_string(&mut all).await?;
        assert_eq!(all, "hello world");
        Ok(())
    }

    #[async_std::test]
    async fn test_reader_content_is_buffered() -> anyhow::Result<()> {
        let content = RequestContent::from_reader(Cursor::new(b"0123456789".to_vec()));
        assert_eq!(content.size(), None);
        let mut content = make_resettable(content, DEFAULT_READ_LIMIT);
        let mut first = Vec::new();
        content.read_to_end(&mut first).await?;
        reset(&mut content).await?;
        let mut second = Vec::new();
        content.read_to_end(&mut second).await?;
        assert_eq!(first, second);
        assert_eq!(second, b"0123456789");
        Ok(())
    }

    #[async_std::test]
    async fn test_file_content_is_reset_by_seeking() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(b"file-backed content")?;
        file.flush()?;

        let content = RequestContent::file(file.path()).await?;
        assert!(format!("{:?}", content).starts_with("Seekable"));
        let mut content = make_resettable(content, 4);
        let mut first = String::new();
        content.read_to_string(&mut first).await?;
        reset(&mut content).await?;
        let mut second = String::new();
        content.read_to_string(&mut second).await?;
        assert_eq!(first, "file-backed content");
        assert_eq!(first, second);
        Ok(())
    }

    #[async_std::test]
    async fn test_mark_capable_content_is_kept() -> anyhow::Result<()> {
        let counting = CountingContent::new(b"abc".to_vec());
        let closes = counting.closes();
        let mut content = make_resettable(RequestContent::from_resettable(counting), DEFAULT_READ_LIMIT);
        assert!(format!("{:?}", content).starts_with("CountingContent"));
        content.close()?;
        assert_eq!(closes.get(), 1);
        Ok(())
    }

    #[async_std::test]
    async fn test_reader_content_cannot_reset_before_wrapping() {
        let mut content = RequestContent::from_reader(Cursor::new(b"abc".to_vec()));
        let err = content.reset().await.unwrap_err();
        assert_eq!(err.kind(), IoErrorKind::Unsupported);
        content.close().unwrap();
    }
}
