use super::{request::Request, response::HttpResponse};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use std::{
    fmt::{self, Debug},
    sync::{Arc, Mutex, PoisonError, RwLock},
    time::{Duration, Instant},
};

/// 指标字段
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Field {
    /// 客户端执行总耗时
    ClientExecuteTime,
    /// 获取认证信息耗时
    CredentialsRequestTime,
    /// 序列化请求耗时
    RequestMarshallTime,
    /// 签名耗时
    RequestSigningTime,
    /// HTTP 请求耗时
    HttpRequestTime,
    /// 响应处理耗时
    ResponseProcessingTime,
    /// 服务名称
    ServiceName,
    /// 服务地址
    ServiceEndpoint,
    /// HTTP 状态码
    StatusCode,
    /// 请求 ID
    RequestId,
    /// 服务端错误代码
    ErrorCode,
    /// 响应体 CRC32
    ResponseCrc32,
}

impl Field {
    /// 获取字段名称
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ClientExecuteTime => "ClientExecuteTime",
            Self::CredentialsRequestTime => "CredentialsRequestTime",
            Self::RequestMarshallTime => "RequestMarshallTime",
            Self::RequestSigningTime => "RequestSigningTime",
            Self::HttpRequestTime => "HttpRequestTime",
            Self::ResponseProcessingTime => "ResponseProcessingTime",
            Self::ServiceName => "ServiceName",
            Self::ServiceEndpoint => "ServiceEndpoint",
            Self::StatusCode => "StatusCode",
            Self::RequestId => "AWSRequestID",
            Self::ErrorCode => "AWSErrorCode",
            Self::ResponseCrc32 => "ResponseCRC32",
        }
    }
}

impl fmt::Display for Field {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一次计时
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TimingInfo {
    start: Instant,
    end: Option<Instant>,
}

impl TimingInfo {
    #[inline]
    fn start_now() -> Self {
        Self {
            start: Instant::now(),
            end: None,
        }
    }

    /// 计时是否已经结束
    #[inline]
    pub fn is_ended(&self) -> bool {
        self.end.is_some()
    }

    /// 获取计时时长，未结束时返回 [`None`]
    #[inline]
    pub fn duration(&self) -> Option<Duration> {
        self.end.map(|end| end.duration_since(self.start))
    }
}

#[derive(Debug)]
struct MetricsData {
    timing: TimingInfo,
    events: IndexMap<Field, Vec<TimingInfo>>,
    properties: IndexMap<Field, Vec<String>>,
}

/// 单次请求的指标记录
///
/// 只能追加，在请求执行完毕后被 [`RequestMetricCollector`] 读取一次。
/// 禁用的指标记录会忽略所有写入。
pub struct RequestMetrics {
    data: Option<Mutex<MetricsData>>,
}

impl RequestMetrics {
    /// 创建启用的指标记录，同时开始总计时
    #[inline]
    pub fn new() -> Self {
        Self {
            data: Some(Mutex::new(MetricsData {
                timing: TimingInfo::start_now(),
                events: Default::default(),
                properties: Default::default(),
            })),
        }
    }

    /// 创建禁用的指标记录
    #[inline]
    pub fn disabled() -> Self {
        Self { data: None }
    }

    /// 是否启用
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.data.is_some()
    }

    fn with_data<T>(&self, f: impl FnOnce(&mut MetricsData) -> T) -> Option<T> {
        self.data
            .as_ref()
            .map(|data| f(&mut data.lock().unwrap_or_else(PoisonError::into_inner)))
    }

    /// 开始一个计时事件
    pub fn start_event(&self, field: Field) {
        self.with_data(|data| data.events.entry(field).or_default().push(TimingInfo::start_now()));
    }

    /// 结束最近一个未结束的计时事件
    pub fn end_event(&self, field: Field) {
        self.with_data(|data| {
            if let Some(timing) = data
                .events
                .get_mut(&field)
                .and_then(|timings| timings.iter_mut().rev().find(|timing| !timing.is_ended()))
            {
                timing.end = Some(Instant::now());
            }
        });
    }

    /// 添加属性
    pub fn add_property(&self, field: Field, value: impl ToString) {
        self.with_data(|data| data.properties.entry(field).or_default().push(value.to_string()));
    }

    /// 结束总计时
    pub fn end_timing(&self) {
        self.with_data(|data| {
            if !data.timing.is_ended() {
                data.timing.end = Some(Instant::now());
            }
        });
    }

    /// 获取总计时
    #[inline]
    pub fn timing(&self) -> Option<TimingInfo> {
        self.with_data(|data| data.timing)
    }

    /// 获取计时事件的所有记录
    pub fn events(&self, field: Field) -> Vec<TimingInfo> {
        self.with_data(|data| data.events.get(&field).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// 获取属性的所有值
    pub fn properties(&self, field: Field) -> Vec<String> {
        self.with_data(|data| data.properties.get(&field).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// 获取属性的最后一个值
    pub fn property(&self, field: Field) -> Option<String> {
        self.with_data(|data| data.properties.get(&field).and_then(|values| values.last().cloned()))
            .flatten()
    }
}

impl Default for RequestMetrics {
    #[inline]
    fn default() -> Self {
        Self::disabled()
    }
}

impl Debug for RequestMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            Some(data) => f
                .debug_struct("RequestMetrics")
                .field("data", &*data.lock().unwrap_or_else(PoisonError::into_inner))
                .finish(),
            None => f.write_str("RequestMetrics(disabled)"),
        }
    }
}

/// 请求指标收集器
///
/// 在每次请求执行完毕后被调用一次，无论成功还是失败
pub trait RequestMetricCollector: Debug + Send + Sync {
    /// 收集请求指标
    fn collect_metrics(&self, request: &Request, response: Option<&HttpResponse>, metrics: &RequestMetrics);
}

static GLOBAL_COLLECTOR: Lazy<RwLock<Option<Arc<dyn RequestMetricCollector>>>> = Lazy::new(Default::default);

/// 设置全局请求指标收集器
///
/// 当客户端没有配置指标收集器时使用
pub fn set_global_metric_collector(collector: Arc<dyn RequestMetricCollector>) {
    *GLOBAL_COLLECTOR.write().unwrap_or_else(PoisonError::into_inner) = Some(collector);
}

/// 清除全局请求指标收集器
pub fn clear_global_metric_collector() {
    *GLOBAL_COLLECTOR.write().unwrap_or_else(PoisonError::into_inner) = None;
}

/// 获取全局请求指标收集器
pub fn global_metric_collector() -> Option<Arc<dyn RequestMetricCollector>> {
    GLOBAL_COLLECTOR
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enabled_metrics() {
        let metrics = RequestMetrics::new();
        metrics.start_event(Field::HttpRequestTime);
        metrics.end_event(Field::HttpRequestTime);
        metrics.start_event(Field::HttpRequestTime);
        metrics.add_property(Field::StatusCode, 503);
        metrics.add_property(Field::ErrorCode, "SlowDown");
        metrics.end_timing();

        let events = metrics.events(Field::HttpRequestTime);
        assert_eq!(events.len(), 2);
        assert!(events[0].duration().is_some());
        assert!(events[1].duration().is_none());
        assert_eq!(metrics.property(Field::StatusCode).as_deref(), Some("503"));
        assert_eq!(metrics.properties(Field::ErrorCode), vec!["SlowDown".to_owned()]);
        assert!(metrics.timing().map(|timing| timing.is_ended()).unwrap_or_default());
    }

    #[test]
    fn test_disabled_metrics_ignore_writes() {
        let metrics = RequestMetrics::disabled();
        metrics.start_event(Field::RequestSigningTime);
        metrics.add_property(Field::RequestId, "req-1");
        assert!(!metrics.is_enabled());
        assert!(metrics.events(Field::RequestSigningTime).is_empty());
        assert!(metrics.property(Field::RequestId).is_none());
        assert!(metrics.timing().is_none());
        assert_eq!(Field::RequestId.to_string(), "AWSRequestID");
    }
}
