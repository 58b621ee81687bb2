mod config;

pub use config::{ClientOptionMarker, RequestClientOptions, RequestConfig, RequestConfigBuilder};

use super::content::RequestContent;
use awsasync_credential::Credentials;
use awsasync_http::{header::IntoHeaderName, Extensions, HeaderMap, HeaderValue, Method};
use indexmap::IndexMap;
use std::{any::Any, fmt::Debug, sync::Arc};
use url::Url;

/// 有序的多值查询参数
pub type Parameters = IndexMap<String, Vec<String>>;

/// 原始的领域请求
///
/// 由序列化器生成 [`Request`] 时附加，可以为请求提供默认的 [`RequestConfig`]
pub trait OriginalRequest: Any + Debug + Send + Sync {
    /// 获取该请求的默认配置
    #[inline]
    fn request_config(&self) -> RequestConfig {
        Default::default()
    }

    fn as_any(&self) -> &dyn Any;
}

/// 待执行的请求
///
/// 在请求执行的各个阶段被原地修改：拦截器、Header 设置以及签名器都会修改它。
/// 每个请求只属于一次调用，不会在并发的调用之间共享。
#[derive(Debug, Default)]
pub struct Request {
    service_name: String,
    method: Method,
    endpoint: Option<Url>,
    resource_path: String,
    parameters: Parameters,
    headers: HeaderMap,
    content: Option<RequestContent>,
    original_request: Option<Arc<dyn OriginalRequest>>,
    handler_context: Extensions,
}

impl Request {
    /// 创建请求构建器
    #[inline]
    pub fn builder(service_name: impl Into<String>, method: Method) -> RequestBuilder {
        RequestBuilder {
            inner: Self {
                service_name: service_name.into(),
                method,
                ..Default::default()
            },
        }
    }

    /// 获取服务名称
    #[inline]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// 获取 HTTP 方法
    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// 获取服务地址
    #[inline]
    pub fn endpoint(&self) -> Option<&Url> {
        self.endpoint.as_ref()
    }

    /// 设置服务地址
    #[inline]
    pub fn set_endpoint(&mut self, endpoint: Url) {
        self.endpoint = Some(endpoint);
    }

    /// 获取资源路径
    #[inline]
    pub fn resource_path(&self) -> &str {
        &self.resource_path
    }

    /// 设置资源路径
    #[inline]
    pub fn set_resource_path(&mut self, resource_path: impl Into<String>) {
        self.resource_path = resource_path.into();
    }

    /// 获取查询参数
    #[inline]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// 追加查询参数，不会覆盖已有的同名参数
    #[inline]
    pub fn add_parameter(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.parameters.entry(name.into()).or_default().push(value.into());
    }

    /// 合并查询参数
    ///
    /// 已有的参数值保留，新的参数值追加在后面
    pub fn merge_parameters(&mut self, parameters: &Parameters) {
        for (name, values) in parameters {
            self.parameters
                .entry(name.to_owned())
                .or_default()
                .extend(values.iter().cloned());
        }
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

    /// 设置 HTTP Header，覆盖已有的同名 Header
    #[inline]
    pub fn add_header(&mut self, name: impl IntoHeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// 使用另一组 HTTP Headers 覆盖同名的 Header
    ///
    /// 对于每个出现在 `headers` 中的名字，原有的所有值被替换为 `headers` 中的所有值
    pub fn overwrite_headers(&mut self, headers: &HeaderMap) {
        for name in headers.keys() {
            self.headers.remove(name);
        }
        for (name, value) in headers {
            self.headers.append(name, value.to_owned());
        }
    }

    /// 获取请求体
    #[inline]
    pub fn content(&self) -> Option<&RequestContent> {
        self.content.as_ref()
    }

    /// 获取请求体的可变引用
    #[inline]
    pub fn content_mut(&mut self) -> Option<&mut RequestContent> {
        self.content.as_mut()
    }

    /// 设置请求体
    #[inline]
    pub fn set_content(&mut self, content: RequestContent) {
        self.content = Some(content);
    }

    /// 取出请求体
    #[inline]
    pub fn take_content(&mut self) -> Option<RequestContent> {
        self.content.take()
    }

    /// 获取原始的领域请求
    #[inline]
    pub fn original_request(&self) -> Option<&Arc<dyn OriginalRequest>> {
        self.original_request.as_ref()
    }

    /// 获取处理上下文，签名器和拦截器可以在其中共享数据
    #[inline]
    pub fn handler_context(&self) -> &Extensions {
        &self.handler_context
    }

    /// 获取处理上下文的可变引用
    #[inline]
    pub fn handler_context_mut(&mut self) -> &mut Extensions {
        &mut self.handler_context
    }

    /// 获取本次请求解析得到的认证信息
    #[inline]
    pub fn credentials(&self) -> Option<&Credentials> {
        self.handler_context.get::<Credentials>()
    }
}

/// 请求构建器
#[derive(Debug)]
pub struct RequestBuilder {
    inner: Request,
}

impl RequestBuilder {
    /// 设置服务地址
    #[inline]
    #[must_use]
    pub fn endpoint(mut self, endpoint: Url) -> Self {
        self.inner.endpoint = Some(endpoint);
        self
    }

    /// 设置资源路径
    #[inline]
    #[must_use]
    pub fn resource_path(mut self, resource_path: impl Into<String>) -> Self {
        self.inner.resource_path = resource_path.into();
        self
    }

    /// 追加查询参数
    #[inline]
    #[must_use]
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner.add_parameter(name, value);
        self
    }

    /// 追加 HTTP Header
    #[inline]
    #[must_use]
    pub fn header(mut self, name: impl IntoHeaderName, value: HeaderValue) -> Self {
        self.inner.headers.append(name, value);
        self
    }

    /// 设置请求体
    #[inline]
    #[must_use]
    pub fn content(mut self, content: RequestContent) -> Self {
        self.inner.content = Some(content);
        self
    }

    /// 设置原始的领域请求
    #[inline]
    #[must_use]
    pub fn original_request(mut self, original_request: Arc<dyn OriginalRequest>) -> Self {
        self.inner.original_request = Some(original_request);
        self
    }

    /// 构建请求
    #[inline]
    pub fn build(self) -> Request {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use awsasync_http::HeaderName;

    #[test]
    fn test_merge_parameters_appends() {
        let mut request = Request::builder("s3", Method::GET).parameter("k", "a").build();
        let mut custom = Parameters::new();
        custom.insert("k".to_owned(), vec!["b".to_owned()]);
        custom.insert("n".to_owned(), vec!["1".to_owned()]);
        request.merge_parameters(&custom);
        assert_eq!(request.parameters().get("k"), Some(&vec!["a".to_owned(), "b".to_owned()]));
        assert_eq!(request.parameters().get("n"), Some(&vec!["1".to_owned()]));
        assert_eq!(
            request.parameters().keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["k", "n"]
        );
    }

    #[test]
    fn test_overwrite_headers_later_write_wins() {
        let x_multi = HeaderName::from_static("x-multi");
        let mut request = Request::builder("s3", Method::GET)
            .header(x_multi.to_owned(), HeaderValue::from_static("1"))
            .header(x_multi.to_owned(), HeaderValue::from_static("2"))
            .header("x-kept", HeaderValue::from_static("kept"))
            .build();
        let mut headers = HeaderMap::new();
        headers.insert(x_multi.to_owned(), HeaderValue::from_static("3"));
        request.overwrite_headers(&headers);
        assert_eq!(
            request.headers().get_all(&x_multi).iter().collect::<Vec<_>>(),
            vec![&HeaderValue::from_static("3")]
        );
        assert_eq!(request.headers().get("x-kept"), Some(&HeaderValue::from_static("kept")));
    }

    #[test]
    fn test_credentials_in_handler_context() {
        let mut request = Request::builder("s3", Method::GET).build();
        assert!(request.credentials().is_none());
        request
            .handler_context_mut()
            .insert(Credentials::new("ak", "sk"));
        assert_eq!(request.credentials().map(|c| c.access_key_id()), Some("ak"));
    }
}
