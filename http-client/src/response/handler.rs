use super::{
    super::error::{ClientError, ClientErrorKind, Error, ErrorType, ServiceError},
    ChecksumMismatchError, HttpResponse,
};
use anyhow::Error as AnyError;
use awsasync_http::StatusCode;
use futures::future::BoxFuture;
use serde::{de::DeserializeOwned, Deserialize};
use std::{fmt::Debug, io::Error as IoError, marker::PhantomData};
use thiserror::Error;

/// 响应处理错误
///
/// 声明的错误类型会原样传递给调用者，其他错误会被包装为 [`ClientErrorKind::Unmarshalling`]
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HandlerError {
    /// 校验和不匹配
    #[error(transparent)]
    ChecksumMismatch(#[from] ChecksumMismatchError),

    /// 读取响应体时发生的 IO 错误
    #[error(transparent)]
    Io(#[from] IoError),

    /// 处理被中断
    #[error("Response handling was interrupted")]
    Interrupted,

    /// 客户端错误
    #[error(transparent)]
    Client(#[from] ClientError),

    /// 其他错误
    #[error(transparent)]
    Other(#[from] AnyError),
}

impl HandlerError {
    /// 转换为请求执行错误
    ///
    /// 声明的错误类型原样转换，其他错误被包装为携带状态码和状态描述的客户端错误
    pub fn into_error(self, status_code: StatusCode, status_text: &str) -> Error {
        match self {
            Self::ChecksumMismatch(err) => Error::ChecksumMismatch(err),
            Self::Io(err) => Error::Io(err),
            Self::Interrupted => Error::Interrupted,
            Self::Client(err) => Error::Client(err),
            Self::Other(err) => Error::Client(
                ClientError::new(
                    ClientErrorKind::Unmarshalling,
                    format!(
                        "Unable to unmarshall response ({}). Response Code: {}, Response Text: {}",
                        err,
                        status_code.as_u16(),
                        status_text
                    ),
                )
                .with_status(status_code, status_text)
                .with_source(err),
            ),
        }
    }
}

/// 成功响应处理器
///
/// 将状态码在 200 到 299 之间的响应解析为结果
pub trait ResponseHandler<T>: Debug + Send + Sync {
    /// 解析响应
    fn handle<'a>(&'a self, response: &'a mut HttpResponse) -> BoxFuture<'a, Result<T, HandlerError>>;
}

/// 错误响应处理器
///
/// 将状态码不在 200 到 299 之间的响应解析为服务端错误
pub trait ErrorResponseHandler: Debug + Send + Sync {
    /// 解析错误响应
    fn handle<'a>(&'a self, response: &'a mut HttpResponse) -> BoxFuture<'a, Result<ServiceError, HandlerError>>;
}

/// 忽略响应体的处理器
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpResponseHandler;

impl ResponseHandler<()> for NoOpResponseHandler {
    #[inline]
    fn handle<'a>(&'a self, _response: &'a mut HttpResponse) -> BoxFuture<'a, Result<(), HandlerError>> {
        Box::pin(async { Ok(()) })
    }
}

/// 将响应体解析为 JSON 的处理器
pub struct JsonResponseHandler<T> {
    verify_crc32_header: Option<&'static str>,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> JsonResponseHandler<T> {
    /// 创建 JSON 响应处理器
    #[inline]
    pub fn new() -> Self {
        Self {
            verify_crc32_header: None,
            _phantom: PhantomData,
        }
    }

    /// 读取响应体后与服务端在指定 Header 中声明的 CRC32 校验和比较
    #[inline]
    #[must_use]
    pub fn verify_crc32(mut self, header_name: &'static str) -> Self {
        self.verify_crc32_header = Some(header_name);
        self
    }
}

impl<T> Default for JsonResponseHandler<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Debug for JsonResponseHandler<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonResponseHandler")
            .field("verify_crc32_header", &self.verify_crc32_header)
            .finish()
    }
}

impl<T: DeserializeOwned + Send> ResponseHandler<T> for JsonResponseHandler<T> {
    fn handle<'a>(&'a self, response: &'a mut HttpResponse) -> BoxFuture<'a, Result<T, HandlerError>> {
        Box::pin(async move {
            let body = response.read_content_to_end().await?;
            if let Some(header_name) = self.verify_crc32_header {
                super::verify_crc32(response, header_name)?;
            }
            let body = if body.is_empty() { b"{}".to_vec() } else { body };
            serde_json::from_slice(&body).map_err(|err| HandlerError::Other(err.into()))
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct JsonErrorBody {
    #[serde(rename = "__type", default)]
    error_type: Option<String>,
    #[serde(alias = "Message", default)]
    message: Option<String>,
}

/// JSON 错误响应处理器
///
/// 解析形如 `{"__type": "com.amazonaws#ResourceNotFoundException", "message": "..."}` 的错误响应体，
/// 请求 ID 从 `x-amzn-RequestId` 或 `x-amz-request-id` 中获取
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonErrorResponseHandler;

impl ErrorResponseHandler for JsonErrorResponseHandler {
    fn handle<'a>(&'a self, response: &'a mut HttpResponse) -> BoxFuture<'a, Result<ServiceError, HandlerError>> {
        Box::pin(async move {
            let body = response.read_content_to_end().await?;
            let parsed: JsonErrorBody = serde_json::from_slice(&body).map_err(|err| HandlerError::Other(err.into()))?;
            let error_code = parsed
                .error_type
                .as_deref()
                .map(|error_type| error_type.rsplit('#').next().unwrap_or(error_type).to_owned())
                .ok_or_else(|| HandlerError::Other(AnyError::msg("Error response has no error type")))?;
            let error_type = if response.status_code().is_server_error() {
                ErrorType::Service
            } else {
                ErrorType::Client
            };
            let mut err = ServiceError::new(parsed.message.unwrap_or_default())
                .error_code(error_code)
                .error_type(error_type);
            if let Some(request_id) = response.request_id() {
                err = err.request_id(request_id);
            }
            Ok(err)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use awsasync_http::{HeaderMap, HeaderValue, ResponseBody};
    use serde::Deserialize;

    fn json_response(status_code: StatusCode, body: &str) -> HttpResponse {
        let mut headers = HeaderMap::new();
        headers.insert("x-amzn-requestid", HeaderValue::from_static("req-42"));
        headers.insert("x-amz-crc32", HeaderValue::from_static("1"));
        HttpResponse::new(
            "DynamoDB",
            status_code,
            status_code.canonical_reason().unwrap_or_default(),
            headers,
            Some(ResponseBody::from_bytes(body.as_bytes().to_vec())),
        )
    }

    #[derive(Debug, Deserialize, PartialEq, Eq)]
    struct Item {
        name: String,
    }

    #[async_std::test]
    async fn test_json_response_handler() -> anyhow::Result<()> {
        let mut response = json_response(StatusCode::OK, r#"{"name":"apple"}"#);
        let item: Item = JsonResponseHandler::new().handle(&mut response).await?;
        assert_eq!(item.name, "apple");

        let mut response = json_response(StatusCode::OK, "not json");
        let err = JsonResponseHandler::<Item>::new().handle(&mut response).await.unwrap_err();
        assert!(matches!(err, HandlerError::Other(_)));
        let err = err.into_error(StatusCode::OK, "OK");
        assert_eq!(err.as_client_error().map(|err| err.kind()), Some(ClientErrorKind::Unmarshalling));
        assert_eq!(err.status_code(), Some(StatusCode::OK));
        Ok(())
    }

    #[async_std::test]
    async fn test_json_response_handler_detects_checksum_mismatch() {
        let mut response = json_response(StatusCode::OK, r#"{"name":"apple"}"#);
        let err = JsonResponseHandler::<Item>::new()
            .verify_crc32("x-amz-crc32")
            .handle(&mut response)
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::ChecksumMismatch(_)));
        assert!(matches!(err.into_error(StatusCode::OK, "OK"), Error::ChecksumMismatch(_)));
    }

    #[async_std::test]
    async fn test_json_error_response_handler() -> anyhow::Result<()> {
        let mut response = json_response(
            StatusCode::BAD_REQUEST,
            r#"{"__type":"com.amazonaws.dynamodb.v20120810#ResourceNotFoundException","message":"Table not found"}"#,
        );
        let err = JsonErrorResponseHandler.handle(&mut response).await?;
        assert_eq!(err.get_error_code(), Some("ResourceNotFoundException"));
        assert_eq!(err.message(), "Table not found");
        assert_eq!(err.get_error_type(), ErrorType::Client);
        assert_eq!(err.get_request_id(), Some("req-42"));

        let mut response = json_response(StatusCode::BAD_REQUEST, "<html></html>");
        assert!(JsonErrorResponseHandler.handle(&mut response).await.is_err());
        Ok(())
    }
}
