use awsasync_http::{HeaderMap, HeaderName, HeaderValue};
use std::{net::IpAddr, time::Duration};

/// 默认连接超时时长
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// 默认读写超时时长
pub const DEFAULT_SOCKET_TIMEOUT: Duration = Duration::from_secs(50);

/// 默认的响应元数据缓存大小
pub const DEFAULT_RESPONSE_METADATA_CACHE_SIZE: usize = 50;

/// 客户端配置
///
/// 对同一个 [`crate::HttpClient`] 发出的所有请求生效
#[derive(Debug, Clone)]
pub struct ClientConfiguration {
    user_agent_prefix: Option<String>,
    user_agent_suffix: Option<String>,
    headers: HeaderMap,
    connection_timeout: Option<Duration>,
    socket_timeout: Option<Duration>,
    local_address: Option<IpAddr>,
    use_expect_continue: bool,
    cache_response_metadata: bool,
    response_metadata_cache_size: usize,
}

impl Default for ClientConfiguration {
    #[inline]
    fn default() -> Self {
        Self {
            user_agent_prefix: None,
            user_agent_suffix: None,
            headers: Default::default(),
            connection_timeout: Some(DEFAULT_CONNECTION_TIMEOUT),
            socket_timeout: Some(DEFAULT_SOCKET_TIMEOUT),
            local_address: None,
            use_expect_continue: true,
            cache_response_metadata: true,
            response_metadata_cache_size: DEFAULT_RESPONSE_METADATA_CACHE_SIZE,
        }
    }
}

impl ClientConfiguration {
    /// 创建客户端配置构建器
    #[inline]
    pub fn builder() -> ClientConfigurationBuilder {
        Default::default()
    }

    /// 获取 UserAgent 前缀，为空时使用默认 UserAgent
    #[inline]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }

    /// 获取 UserAgent 后缀
    #[inline]
    pub fn user_agent_suffix(&self) -> Option<&str> {
        self.user_agent_suffix.as_deref()
    }

    /// 获取每个请求都会携带的 HTTP Headers
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// 获取连接超时时长
    #[inline]
    pub fn connection_timeout(&self) -> Option<Duration> {
        self.connection_timeout
    }

    /// 获取读写超时时长
    #[inline]
    pub fn socket_timeout(&self) -> Option<Duration> {
        self.socket_timeout
    }

    /// 获取本地绑定地址
    #[inline]
    pub fn local_address(&self) -> Option<IpAddr> {
        self.local_address
    }

    /// 是否为 PUT 请求启用 `Expect: 100-continue`
    #[inline]
    pub fn use_expect_continue(&self) -> bool {
        self.use_expect_continue
    }

    /// 是否缓存响应元数据
    #[inline]
    pub fn cache_response_metadata(&self) -> bool {
        self.cache_response_metadata
    }

    /// 获取响应元数据缓存大小
    #[inline]
    pub fn response_metadata_cache_size(&self) -> usize {
        self.response_metadata_cache_size
    }
}

/// 客户端配置构建器
#[derive(Debug, Default)]
pub struct ClientConfigurationBuilder {
    inner: ClientConfiguration,
}

impl ClientConfigurationBuilder {
    /// 设置 UserAgent 前缀
    #[inline]
    pub fn user_agent_prefix(&mut self, prefix: impl Into<String>) -> &mut Self {
        self.inner.user_agent_prefix = Some(prefix.into());
        self
    }

    /// 设置 UserAgent 后缀
    #[inline]
    pub fn user_agent_suffix(&mut self, suffix: impl Into<String>) -> &mut Self {
        self.inner.user_agent_suffix = Some(suffix.into());
        self
    }

    /// 添加每个请求都会携带的 HTTP Header
    #[inline]
    pub fn header(&mut self, name: HeaderName, value: HeaderValue) -> &mut Self {
        self.inner.headers.insert(name, value);
        self
    }

    /// 设置连接超时时长
    #[inline]
    pub fn connection_timeout(&mut self, timeout: Option<Duration>) -> &mut Self {
        self.inner.connection_timeout = timeout;
        self
    }

    /// 设置读写超时时长
    #[inline]
    pub fn socket_timeout(&mut self, timeout: Option<Duration>) -> &mut Self {
        self.inner.socket_timeout = timeout;
        self
    }

    /// 设置本地绑定地址
    #[inline]
    pub fn local_address(&mut self, local_address: IpAddr) -> &mut Self {
        self.inner.local_address = Some(local_address);
        self
    }

    /// 是否为 PUT 请求启用 `Expect: 100-continue`
    #[inline]
    pub fn use_expect_continue(&mut self, enabled: bool) -> &mut Self {
        self.inner.use_expect_continue = enabled;
        self
    }

    /// 是否缓存响应元数据
    #[inline]
    pub fn cache_response_metadata(&mut self, enabled: bool) -> &mut Self {
        self.inner.cache_response_metadata = enabled;
        self
    }

    /// 设置响应元数据缓存大小
    #[inline]
    pub fn response_metadata_cache_size(&mut self, size: usize) -> &mut Self {
        self.inner.response_metadata_cache_size = size;
        self
    }

    /// 构建客户端配置
    #[inline]
    pub fn build(&mut self) -> ClientConfiguration {
        std::mem::take(&mut self.inner)
    }
}

/// 传输层设置
///
/// 从 [`ClientConfiguration`] 中提取的，交由传输层使用的部分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpClientSettings {
    connection_timeout: Option<Duration>,
    socket_timeout: Option<Duration>,
    local_address: Option<IpAddr>,
    use_expect_continue: bool,
}

impl HttpClientSettings {
    /// 从客户端配置中提取传输层设置
    #[inline]
    pub fn adapt(config: &ClientConfiguration) -> Self {
        Self {
            connection_timeout: config.connection_timeout(),
            socket_timeout: config.socket_timeout(),
            local_address: config.local_address(),
            use_expect_continue: config.use_expect_continue(),
        }
    }

    #[inline]
    pub fn connection_timeout(&self) -> Option<Duration> {
        self.connection_timeout
    }

    #[inline]
    pub fn socket_timeout(&self) -> Option<Duration> {
        self.socket_timeout
    }

    #[inline]
    pub fn local_address(&self) -> Option<IpAddr> {
        self.local_address
    }

    #[inline]
    pub fn use_expect_continue(&self) -> bool {
        self.use_expect_continue
    }
}

impl Default for HttpClientSettings {
    #[inline]
    fn default() -> Self {
        Self::adapt(&Default::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_client_configuration_defaults() {
        let config = ClientConfiguration::default();
        assert!(config.use_expect_continue());
        assert!(config.cache_response_metadata());
        assert_eq!(config.response_metadata_cache_size(), 50);
        assert_eq!(config.connection_timeout(), Some(DEFAULT_CONNECTION_TIMEOUT));
        assert!(config.user_agent_prefix().is_none());
    }

    #[test]
    fn test_settings_adapted_from_configuration() {
        let config = ClientConfiguration::builder()
            .use_expect_continue(false)
            .socket_timeout(None)
            .local_address(Ipv4Addr::LOCALHOST.into())
            .build();
        let settings = HttpClientSettings::adapt(&config);
        assert!(!settings.use_expect_continue());
        assert_eq!(settings.socket_timeout(), None);
        assert_eq!(settings.local_address(), Some(Ipv4Addr::LOCALHOST.into()));
        assert_eq!(settings.connection_timeout(), Some(DEFAULT_CONNECTION_TIMEOUT));
    }
}
