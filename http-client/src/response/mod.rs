mod checksum;
mod handler;
mod metadata;
pub(crate) mod service_error_handler;

pub use checksum::{verify_crc32, ChecksumMismatchError, Crc32Checksum, Crc32Reader};
pub use handler::{
    ErrorResponseHandler, HandlerError, JsonErrorResponseHandler, JsonResponseHandler, NoOpResponseHandler,
    ResponseHandler,
};
pub use metadata::{ResponseMetadata, ResponseMetadataCache};

use super::{
    content::ProgressReader,
    progress::{publish_response_content_length, ProgressListener},
};
use awsasync_http::{header::CONTENT_LENGTH, HeaderMap, HeaderValue, Response as TransportResponse, ResponseBody, StatusCode};
use futures::io::AsyncReadExt;
use std::{io::Result as IoResult, sync::Arc};

pub(crate) const REQUEST_ID_HEADERS: [&str; 2] = ["x-amzn-requestid", "x-amz-request-id"];
pub(crate) const EXTENDED_REQUEST_ID_HEADER: &str = "x-amz-id-2";

/// 判断状态码是否表示请求成功
///
/// 只有 200 到 299 之间的状态码被视为成功
#[inline]
pub fn is_successful(status_code: StatusCode) -> bool {
    status_code.is_success()
}

/// 流水线使用的 HTTP 响应
///
/// 响应体在读取的同时计算 CRC32 校验和
#[derive(Debug)]
pub struct HttpResponse {
    service_name: String,
    status_code: StatusCode,
    status_text: String,
    headers: HeaderMap,
    content: Option<Crc32Reader<ResponseBody>>,
    checksum: Option<Crc32Checksum>,
}

impl HttpResponse {
    /// 创建 HTTP 响应
    pub fn new(
        service_name: impl Into<String>,
        status_code: StatusCode,
        status_text: impl Into<String>,
        headers: HeaderMap,
        body: Option<ResponseBody>,
    ) -> Self {
        let content = body.map(Crc32Reader::new);
        let checksum = content.as_ref().map(Crc32Reader::checksum);
        Self {
            service_name: service_name.into(),
            status_code,
            status_text: status_text.into(),
            headers,
            content,
            checksum,
        }
    }

    pub(crate) fn from_transport(
        service_name: &str,
        mut response: TransportResponse,
        listener: Option<&Arc<dyn ProgressListener>>,
    ) -> Self {
        let mut body = response.take_body();
        if let Some(listener) = listener {
            if let Some(content_length) = response
                .headers()
                .get(CONTENT_LENGTH)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse::<u64>().ok())
            {
                publish_response_content_length(Some(listener.as_ref()), content_length);
            }
            body = body.map(|body| ResponseBody::from_reader(ProgressReader::for_response(body, listener.to_owned())));
        }
        let status_text = response.status_text().to_owned();
        Self::new(
            service_name,
            response.status_code(),
            status_text,
            response.headers().to_owned(),
            body,
        )
    }

    /// 获取服务名称
    #[inline]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// 获取 HTTP 状态码
    #[inline]
    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    /// 获取 HTTP 状态描述
    #[inline]
    pub fn status_text(&self) -> &str {
        &self.status_text
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
    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    /// 获取响应体的可变引用
    #[inline]
    pub fn content_mut(&mut self) -> Option<&mut Crc32Reader<ResponseBody>> {
        self.content.as_mut()
    }

    /// 取出响应体
    ///
    /// 取出后的响应体继续更新 [`Self::crc32_checksum`]
    #[inline]
    pub fn take_content(&mut self) -> Option<Crc32Reader<ResponseBody>> {
        self.content.take()
    }

    /// 读取剩余的全部响应体
    pub async fn read_content_to_end(&mut self) -> IoResult<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(content) = self.content.as_mut() {
            content.read_to_end(&mut buf).await?;
        }
        Ok(buf)
    }

    /// 获取目前为止读取的响应体的 CRC32 校验和
    ///
    /// 没有响应体时返回 0
    #[inline]
    pub fn crc32_checksum(&self) -> u32 {
        self.checksum.as_ref().map(Crc32Checksum::value).unwrap_or_default()
    }

    /// 获取服务端返回的请求 ID
    pub fn request_id(&self) -> Option<&str> {
        REQUEST_ID_HEADERS
            .iter()
            .find_map(|name| self.headers.get(*name))
            .and_then(|value| value.to_str().ok())
    }
}

/// 请求执行成功后得到的响应
#[derive(Debug)]
pub struct Response<T> {
    result: T,
    http_response: HttpResponse,
    invocation_id: String,
}

impl<T> Response<T> {
    #[inline]
    pub(crate) fn new(result: T, http_response: HttpResponse, invocation_id: String) -> Self {
        Self {
            result,
            http_response,
            invocation_id,
        }
    }

    /// 获取解析后的结果
    #[inline]
    pub fn result(&self) -> &T {
        &self.result
    }

    /// 转换为解析后的结果
    #[inline]
    pub fn into_result(self) -> T {
        self.result
    }

    /// 获取 HTTP 响应
    #[inline]
    pub fn http_response(&self) -> &HttpResponse {
        &self.http_response
    }

    /// 获取本次调用的 ID，与请求 Header `amz-sdk-invocation-id` 一致
    #[inline]
    pub fn invocation_id(&self) -> &str {
        &self.invocation_id
    }

    /// 拆分为结果与 HTTP 响应
    #[inline]
    pub fn into_parts(self) -> (T, HttpResponse) {
        (self.result, self.http_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{progress::ProgressEventType, test_utils::RecordingProgressListener};

    #[test]
    fn test_is_successful() {
        assert!(is_successful(StatusCode::OK));
        assert!(is_successful(StatusCode::NO_CONTENT));
        assert!(is_successful(StatusCode::from_u16(299).unwrap()));
        assert!(!is_successful(StatusCode::from_u16(199).unwrap()));
        assert!(!is_successful(StatusCode::MULTIPLE_CHOICES));
        assert!(!is_successful(StatusCode::NOT_FOUND));
    }

    #[async_std::test]
    async fn test_response_from_transport() -> anyhow::Result<()> {
        let listener = Arc::new(RecordingProgressListener::default());
        let transport = TransportResponse::builder()
            .status_code(StatusCode::OK)
            .header(CONTENT_LENGTH, HeaderValue::from_static("9"))
            .header("x-amz-request-id".parse()?, HeaderValue::from_static("req-7"))
            .bytes_as_body(b"123456789".to_vec())
            .build();
        let listener_ref: Arc<dyn ProgressListener> = listener.to_owned();
        let mut response = HttpResponse::from_transport("S3", transport, Some(&listener_ref));
        assert_eq!(response.status_text(), "OK");
        assert_eq!(response.request_id(), Some("req-7"));
        assert_eq!(response.crc32_checksum(), 0);
        assert_eq!(response.read_content_to_end().await?, b"123456789");
        assert_eq!(response.crc32_checksum(), 0xCBF4_3926);

        assert_eq!(
            listener
                .events_of(ProgressEventType::ResponseContentLength)
                .iter()
                .map(|event| event.bytes())
                .collect::<Vec<_>>(),
            vec![9]
        );
        assert_eq!(
            listener
                .events_of(ProgressEventType::ResponseByteTransfer)
                .iter()
                .map(|event| event.bytes())
                .sum::<u64>(),
            9
        );
        Ok(())
    }
}
