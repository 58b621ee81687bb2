use super::{error::Error, request::Request, response::HttpResponse};
use anyhow::Result as AnyResult;
use awsasync_credential::Credentials;
use std::{any::Any, fmt::Debug};

/// 请求拦截器
///
/// 在请求执行的固定阶段被调用，可以观察或修改请求和响应。
/// 所有阶段都按照注册顺序依次调用，任何一个拦截器返回错误都会导致请求执行失败。
///
/// 拦截器不能在签名之后修改请求的 HTTP 方法和服务地址。
pub trait Interceptor: Debug + Send + Sync {
    /// 在签名之前调用，可以修改请求
    #[inline]
    fn before_request(&self, _request: &mut Request) -> AnyResult<()> {
        Ok(())
    }

    /// 在解析成功响应之前调用，可以替换响应
    #[inline]
    fn before_unmarshalling(&self, _request: &Request, response: HttpResponse) -> AnyResult<HttpResponse> {
        Ok(response)
    }

    /// 在请求执行成功之后调用，`result` 为解析后的响应结果
    #[inline]
    fn after_response(&self, _request: &Request, _response: &HttpResponse, _result: &dyn Any) -> AnyResult<()> {
        Ok(())
    }

    /// 在请求执行失败之后调用
    #[inline]
    fn after_error(&self, _request: &Request, _response: Option<&HttpResponse>, _error: &Error) -> AnyResult<()> {
        Ok(())
    }

    /// 如果该拦截器需要获取认证信息，则返回 [`CredentialsAware`]
    #[inline]
    fn as_credentials_aware(&self) -> Option<&dyn CredentialsAware> {
        None
    }
}

/// 需要认证信息的拦截器
///
/// 认证信息在调用 [`Interceptor::before_request`] 之前注入
pub trait CredentialsAware: Send + Sync {
    /// 设置本次请求解析得到的认证信息
    fn set_credentials(&self, credentials: Option<&Credentials>);
}
