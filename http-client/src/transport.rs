use super::{
    config::HttpClientSettings,
    error::{ClientError, ClientErrorKind},
    request::{Parameters, Request},
};
use awsasync_http::{
    header::{CONTENT_LENGTH, CONTENT_TYPE, EXPECT, HOST},
    HeaderMap, HeaderValue, Method, Request as TransportRequest, RequestBody, Uri,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::{Position, Url};

const PATH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');
const DEFAULT_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

/// 将流水线请求转换为传输层请求
///
/// 请求体的所有权转移给传输层请求，GET、HEAD、OPTIONS 和 DELETE 请求不携带请求体
pub(crate) fn build_http_request(
    request: &mut Request,
    settings: &HttpClientSettings,
) -> Result<TransportRequest, ClientError> {
    let endpoint = request
        .endpoint()
        .cloned()
        .ok_or_else(|| ClientError::new(ClientErrorKind::Configuration, "No endpoint specified"))?;
    let method = request.method().to_owned();
    let with_body = match method {
        Method::GET | Method::HEAD | Method::OPTIONS | Method::DELETE => false,
        Method::POST | Method::PUT | Method::PATCH => true,
        _ => {
            return Err(ClientError::new(
                ClientErrorKind::UnsupportedMethod,
                format!("Unknown HTTP method name: {}", method),
            ))
        }
    };
    let put_params_in_uri = method != Method::POST || request.content().is_some();

    let mut uri = append_uri(&endpoint, request.resource_path());
    if put_params_in_uri {
        let query = encode_parameters(request.parameters());
        if !query.is_empty() {
            uri.push('?');
            uri.push_str(&query);
        }
    }
    let uri: Uri = uri.parse().map_err(|err| {
        ClientError::new(ClientErrorKind::InvalidRequest, "Invalid request uri").with_source(anyhow::Error::new(err))
    })?;

    let mut headers = HeaderMap::with_capacity(request.headers().len() + 2);
    for (name, value) in request.headers() {
        if name != CONTENT_LENGTH && name != HOST {
            headers.append(name, value.to_owned());
        }
    }
    headers.insert(HOST, host_header(&endpoint)?);
    if !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    }
    if method == Method::PUT && settings.use_expect_continue() {
        headers.insert(EXPECT, HeaderValue::from_static("100-continue"));
    }

    let mut builder = TransportRequest::builder();
    builder.url(uri).method(method);
    if with_body {
        if put_params_in_uri {
            if let Some(content) = request.take_content() {
                let size = declared_content_length(request.headers()).or_else(|| content.size());
                builder.body(RequestBody::from_reader(content, size));
            }
        } else {
            let form = encode_form(request.parameters());
            builder.body(RequestBody::from_bytes(form.into_bytes()));
        }
    }
    builder.headers(headers);
    if let Some(timeout) = settings.connection_timeout() {
        builder.connect_timeout(timeout);
    }
    if let Some(timeout) = settings.socket_timeout() {
        builder.request_timeout(timeout);
    }
    if let Some(local_address) = settings.local_address() {
        builder.local_address(local_address);
    }
    Ok(builder.build())
}

fn append_uri(endpoint: &Url, resource_path: &str) -> String {
    let mut uri = endpoint[..Position::AfterPath].to_owned();
    if resource_path.is_empty() {
        if !uri.ends_with('/') {
            uri.push('/');
        }
        return uri;
    }
    if resource_path.starts_with('/') {
        if uri.ends_with('/') {
            uri.pop();
        }
    } else if !uri.ends_with('/') {
        uri.push('/');
    }
    let encoded_path = utf8_percent_encode(resource_path, PATH_ENCODE_SET)
        .to_string()
        .replace("//", "/%2F");
    uri.push_str(&encoded_path);
    uri
}

fn encode_parameters(parameters: &Parameters) -> String {
    let mut query = String::new();
    for (name, values) in parameters {
        let name = utf8_percent_encode(name, QUERY_ENCODE_SET).to_string();
        if values.is_empty() {
            push_query_pair(&mut query, &name, None);
        }
        for value in values {
            push_query_pair(&mut query, &name, Some(value));
        }
    }
    query
}

fn push_query_pair(query: &mut String, name: &str, value: Option<&str>) {
    if !query.is_empty() {
        query.push('&');
    }
    query.push_str(name);
    if let Some(value) = value {
        query.push('=');
        query.extend(utf8_percent_encode(value, QUERY_ENCODE_SET));
    }
}

fn encode_form(parameters: &Parameters) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (name, values) in parameters {
        if values.is_empty() {
            serializer.append_key_only(name);
        }
        for value in values {
            serializer.append_pair(name, value);
        }
    }
    serializer.finish()
}

fn host_header(endpoint: &Url) -> Result<HeaderValue, ClientError> {
    let host = endpoint
        .host_str()
        .ok_or_else(|| ClientError::new(ClientErrorKind::Configuration, "Endpoint has no host"))?;
    let host = match endpoint.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_owned(),
    };
    HeaderValue::from_str(&host).map_err(|err| {
        ClientError::new(ClientErrorKind::InvalidRequest, "Invalid host header").with_source(anyhow::Error::new(err))
    })
}

pub(crate) fn declared_content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}
