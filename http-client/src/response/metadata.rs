use super::{HttpResponse, EXTENDED_REQUEST_ID_HEADER};
use indexmap::IndexMap;
use std::sync::{Mutex, PoisonError};

/// 响应元数据
///
/// 记录服务端返回的请求 ID，用于排查问题
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
    request_id: Option<String>,
    extended_request_id: Option<String>,
}

impl ResponseMetadata {
    /// 从 HTTP 响应中提取元数据
    pub fn from_http_response(response: &HttpResponse) -> Self {
        Self {
            request_id: response.request_id().map(ToOwned::to_owned),
            extended_request_id: response
                .header(EXTENDED_REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(ToOwned::to_owned),
        }
    }

    /// 获取请求 ID
    #[inline]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// 获取扩展请求 ID
    #[inline]
    pub fn extended_request_id(&self) -> Option<&str> {
        self.extended_request_id.as_deref()
    }
}

/// 有容量上限的响应元数据缓存
///
/// 超过容量时淘汰最早加入的记录
#[derive(Debug)]
pub struct ResponseMetadataCache {
    entries: Mutex<IndexMap<String, ResponseMetadata>>,
    capacity: usize,
}

impl ResponseMetadataCache {
    /// 创建响应元数据缓存
    #[inline]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(IndexMap::with_capacity(capacity)),
            capacity,
        }
    }

    /// 加入一条记录
    pub fn add(&self, key: impl Into<String>, metadata: ResponseMetadata) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.into(), metadata);
        while entries.len() > self.capacity {
            entries.shift_remove_index(0);
        }
    }

    /// 获取一条记录
    #[inline]
    pub fn get(&self, key: &str) -> Option<ResponseMetadata> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// 获取记录数量
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// 是否没有任何记录
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use awsasync_http::{HeaderMap, HeaderValue, StatusCode};

    fn metadata(request_id: &str) -> ResponseMetadata {
        let mut headers = HeaderMap::new();
        headers.insert("x-amz-request-id", HeaderValue::from_str(request_id).unwrap());
        headers.insert("x-amz-id-2", HeaderValue::from_static("ext"));
        ResponseMetadata::from_http_response(&HttpResponse::new("S3", StatusCode::OK, "OK", headers, None))
    }

    #[test]
    fn test_cache_evicts_oldest() {
        let cache = ResponseMetadataCache::new(2);
        cache.add("a", metadata("1"));
        cache.add("b", metadata("2"));
        cache.add("c", metadata("3"));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_none());
        assert_eq!(cache.get("b").and_then(|m| m.request_id().map(ToOwned::to_owned)).as_deref(), Some("2"));
        assert_eq!(cache.get("c").and_then(|m| m.extended_request_id().map(ToOwned::to_owned)).as_deref(), Some("ext"));

        let cache = ResponseMetadataCache::new(0);
        cache.add("a", metadata("1"));
        assert!(cache.is_empty());
    }
}
