use super::HttpResponse;
use crc::{Crc, Digest, CRC_32_ISO_HDLC};
use futures::{io::AsyncRead, ready};
use std::{
    fmt::{self, Debug},
    io::Result as IoResult,
    pin::Pin,
    sync::{Arc, Mutex, PoisonError},
    task::{Context, Poll},
};
use thiserror::Error;

static CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// 响应体的 CRC32 校验和
///
/// 与计算校验和的输入流共享状态，随着响应体被读取而更新
#[derive(Clone)]
pub struct Crc32Checksum {
    digest: Arc<Mutex<Digest<'static, u32>>>,
}

impl Crc32Checksum {
    #[inline]
    fn new() -> Self {
        Self {
            digest: Arc::new(Mutex::new(CRC32.digest())),
        }
    }

    #[inline]
    fn update(&self, bytes: &[u8]) {
        self.digest.lock().unwrap_or_else(PoisonError::into_inner).update(bytes)
    }

    /// 获取目前为止读取的数据的校验和
    #[inline]
    pub fn value(&self) -> u32 {
        self.digest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .finalize()
    }
}

impl Debug for Crc32Checksum {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Crc32Checksum").field(&self.value()).finish()
    }
}

/// 边读取边计算 CRC32 校验和的输入流
pub struct Crc32Reader<R> {
    inner: R,
    checksum: Crc32Checksum,
}

impl<R> Crc32Reader<R> {
    /// 包装输入流
    #[inline]
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            checksum: Crc32Checksum::new(),
        }
    }

    /// 获取校验和句柄
    #[inline]
    pub fn checksum(&self) -> Crc32Checksum {
        self.checksum.to_owned()
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for Crc32Reader<R> {
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut [u8]) -> Poll<IoResult<usize>> {
        let n = ready!(Pin::new(&mut self.inner).poll_read(cx, buf))?;
        self.checksum.update(&buf[..n]);
        Poll::Ready(Ok(n))
    }
}

impl<R: Debug> Debug for Crc32Reader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crc32Reader")
            .field("inner", &self.inner)
            .field("checksum", &self.checksum)
            .finish()
    }
}

/// 校验和不匹配错误
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Client calculated crc32 checksum didn't match that calculated by server side: expected {expected}, actual {actual}")]
pub struct ChecksumMismatchError {
    expected: u32,
    actual: u32,
}

impl ChecksumMismatchError {
    /// 创建校验和不匹配错误
    #[inline]
    pub fn new(expected: u32, actual: u32) -> Self {
        Self { expected, actual }
    }

    /// 服务端声明的校验和
    #[inline]
    pub fn expected(&self) -> u32 {
        self.expected
    }

    /// 客户端计算的校验和
    #[inline]
    pub fn actual(&self) -> u32 {
        self.actual
    }
}

/// 比较客户端计算的校验和与服务端在 `header_name` 中声明的校验和
///
/// 服务端没有声明或声明的值无法解析时不做比较
pub fn verify_crc32(response: &HttpResponse, header_name: &str) -> Result<(), ChecksumMismatchError> {
    let expected = response
        .headers()
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u32>().ok());
    match expected {
        Some(expected) if expected != response.crc32_checksum() => {
            Err(ChecksumMismatchError::new(expected, response.crc32_checksum()))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::io::{AsyncReadExt, Cursor};

    #[async_std::test]
    async fn test_crc32_computed_while_reading() -> IoResult<()> {
        let mut reader = Crc32Reader::new(Cursor::new(b"123456789".to_vec()));
        let checksum = reader.checksum();
        assert_eq!(checksum.value(), 0);

        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf).await?;
        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).await?;
        assert_eq!(checksum.value(), 0xCBF4_3926);
        Ok(())
    }
}
