use super::ResettableContent;
use futures::io::AsyncRead;
use log::warn;
use std::{
    fmt::{self, Debug},
    io::{Error as IoError, ErrorKind as IoErrorKind, Result as IoResult},
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    task::{Context, Poll},
};

#[derive(Debug)]
struct Shared {
    content: Box<dyn ResettableContent>,
    closed: bool,
}

/// 可释放的请求体
///
/// 持有者句柄负责关闭底层输入流，并保证只关闭一次。
/// 通过 [`ReleasableContent::disable_close`] 得到的句柄可以读取和重置请求体，
/// 但是调用它的 `close()` 或析构它都不会关闭底层输入流。
pub struct ReleasableContent {
    shared: Arc<Mutex<Shared>>,
    owner: bool,
}

impl ReleasableContent {
    /// 创建可释放的请求体，返回持有者句柄
    #[inline]
    pub fn new(content: Box<dyn ResettableContent>) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared { content, closed: false })),
            owner: true,
        }
    }

    /// 获取不能关闭底层输入流的句柄
    #[inline]
    pub fn disable_close(&self) -> Self {
        Self {
            shared: self.shared.to_owned(),
            owner: false,
        }
    }

    /// 是否为持有者句柄
    #[inline]
    pub fn is_owner(&self) -> bool {
        self.owner
    }

    /// 底层输入流是否已经关闭
    #[inline]
    pub fn is_released(&self) -> bool {
        self.lock().closed
    }

    /// 关闭底层输入流
    ///
    /// 无论调用多少次，底层输入流只会被关闭一次
    pub fn release(&self) -> IoResult<()> {
        let mut shared = self.lock();
        if shared.closed {
            return Ok(());
        }
        shared.closed = true;
        shared.content.close()
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn released_error() -> IoError {
    IoError::new(IoErrorKind::Other, "Request content is already released")
}

impl AsyncRead for ReleasableContent {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut [u8]) -> Poll<IoResult<usize>> {
        let mut shared = self.lock();
        if shared.closed {
            return Poll::Ready(Err(released_error()));
        }
        Pin::new(&mut shared.content).poll_read(cx, buf)
    }
}

impl ResettableContent for ReleasableContent {
    #[inline]
    fn mark_supported(&self) -> bool {
        self.lock().content.mark_supported()
    }

    #[inline]
    fn mark(&mut self) {
        self.lock().content.mark()
    }

    fn poll_reset(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<IoResult<()>> {
        let mut shared = self.lock();
        if shared.closed {
            return Poll::Ready(Err(released_error()));
        }
        Pin::new(&mut shared.content).poll_reset(cx)
    }

    #[inline]
    fn close(&mut self) -> IoResult<()> {
        if self.owner {
            self.release()
        } else {
            Ok(())
        }
    }
}

impl Drop for ReleasableContent {
    fn drop(&mut self) {
        if self.owner {
            if let Err(err) = self.release() {
                warn!("Failed to release request content: {}", err);
            }
        }
    }
}

impl Debug for ReleasableContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleasableContent")
            .field("shared", &self.shared)
            .field("owner", &self.owner)
            .finish()
    }
}
