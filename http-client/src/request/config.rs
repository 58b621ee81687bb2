use super::{super::content::DEFAULT_READ_LIMIT, super::progress::ProgressListener, Parameters};
use awsasync_http::{HeaderMap, HeaderName, HeaderValue};
use std::sync::Arc;

/// 客户端选项标记
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ClientOptionMarker {
    /// 追加到 UserAgent 末尾的标记
    UserAgent,
}

/// 客户端选项
///
/// 由上层调用者为单个请求附加的标记，以及请求体缓冲上限
#[derive(Debug, Clone)]
pub struct RequestClientOptions {
    markers: Vec<(ClientOptionMarker, String)>,
    read_limit: usize,
}

impl Default for RequestClientOptions {
    #[inline]
    fn default() -> Self {
        Self {
            markers: Default::default(),
            read_limit: DEFAULT_READ_LIMIT,
        }
    }
}

impl RequestClientOptions {
    /// 追加标记
    ///
    /// 同一个标记多次追加时，值之间使用空格分隔，重复的值会被忽略
    pub fn append_user_agent(&mut self, user_agent: impl Into<String>) -> &mut Self {
        let user_agent = user_agent.into();
        match self.markers.iter_mut().find(|(marker, _)| *marker == ClientOptionMarker::UserAgent) {
            Some((_, value)) => {
                if !value.split(' ').any(|existed| existed == user_agent) {
                    value.push(' ');
                    value.push_str(&user_agent);
                }
            }
            None => self.markers.push((ClientOptionMarker::UserAgent, user_agent)),
        }
        self
    }

    /// 获取标记
    #[inline]
    pub fn client_marker(&self, marker: ClientOptionMarker) -> Option<&str> {
        self.markers
            .iter()
            .find(|(m, _)| *m == marker)
            .map(|(_, value)| value.as_str())
    }

    /// 设置请求体缓冲上限
    #[inline]
    pub fn set_read_limit(&mut self, read_limit: usize) -> &mut Self {
        self.read_limit = read_limit;
        self
    }

    /// 获取请求体缓冲上限
    #[inline]
    pub fn read_limit(&self) -> usize {
        self.read_limit
    }
}

/// 单次请求的配置
///
/// 在交给请求执行器之后不再改变，未设置时使用默认值
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    progress_listener: Option<Arc<dyn ProgressListener>>,
    custom_headers: HeaderMap,
    custom_query_parameters: Parameters,
    client_options: RequestClientOptions,
}

impl RequestConfig {
    /// 创建请求配置构建器
    #[inline]
    pub fn builder() -> RequestConfigBuilder {
        Default::default()
    }

    /// 获取进度监听器
    #[inline]
    pub fn progress_listener(&self) -> Option<&Arc<dyn ProgressListener>> {
        self.progress_listener.as_ref()
    }

    /// 获取自定义 HTTP Headers
    #[inline]
    pub fn custom_headers(&self) -> &HeaderMap {
        &self.custom_headers
    }

    /// 获取自定义查询参数
    #[inline]
    pub fn custom_query_parameters(&self) -> &Parameters {
        &self.custom_query_parameters
    }

    /// 获取客户端选项
    #[inline]
    pub fn client_options(&self) -> &RequestClientOptions {
        &self.client_options
    }
}

/// 请求配置构建器
#[derive(Debug, Default)]
pub struct RequestConfigBuilder {
    inner: RequestConfig,
}

impl RequestConfigBuilder {
    /// 设置进度监听器
    #[inline]
    pub fn progress_listener(&mut self, listener: Arc<dyn ProgressListener>) -> &mut Self {
        self.inner.progress_listener = Some(listener);
        self
    }

    /// 设置自定义 HTTP Header
    #[inline]
    pub fn custom_header(&mut self, name: HeaderName, value: HeaderValue) -> &mut Self {
        self.inner.custom_headers.insert(name, value);
        self
    }

    /// 追加自定义查询参数
    #[inline]
    pub fn custom_query_parameter(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.inner
            .custom_query_parameters
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// 设置客户端选项
    #[inline]
    pub fn client_options(&mut self, client_options: RequestClientOptions) -> &mut Self {
        self.inner.client_options = client_options;
        self
    }

    /// 构建请求配置
    #[inline]
    pub fn build(&mut self) -> RequestConfig {
        std::mem::take(&mut self.inner)
    }
}
