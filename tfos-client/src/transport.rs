//! Transport abstraction and the OpenSearch-backed implementation.

use crate::config::{ClientConfig, TlsConfig};
use crate::error::TransportError;
use crate::request::ApiRequest;
use crate::response::{ApiResponse, ResponseBody};
use async_trait::async_trait;
use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::{Method, StatusCode};
use opensearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tfos_log::{debug, info, warn};

/// Something that can perform one HTTP exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform `request` and return the response with its body unread.
    async fn perform(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn perform(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        (**self).perform(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn perform(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        (**self).perform(request).await
    }
}

/// [`Transport`] backed by the `opensearch` crate's connection pool.
#[derive(Clone)]
pub struct OpenSearchTransport {
    inner: Arc<opensearch::http::transport::Transport>,
    request_timeout: Option<Duration>,
}

impl OpenSearchTransport {
    /// Build a transport for the first configured address.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        info!("Initializing OpenSearch transport for: {:?}", config.urls);

        let url = config
            .urls
            .first()
            .ok_or_else(|| TransportError::Build("No URLs provided".to_string()))?;
        if config.urls.len() > 1 {
            warn!(
                "Multiple addresses configured; only {} will be used",
                url
            );
        }

        let url = opensearch::http::Url::parse(url)
            .map_err(|e| TransportError::Build(format!("Invalid URL: {}", e)))?;

        let conn_pool = SingleNodeConnectionPool::new(url);
        let mut builder = TransportBuilder::new(conn_pool).disable_proxy();

        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.auth(opensearch::auth::Credentials::Basic(
                user.clone(),
                pass.clone(),
            ));
        }

        if let Some(tls) = &config.tls {
            builder = apply_tls(builder, tls)?;
        }

        let transport = builder
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))?;

        debug!("OpenSearch transport initialized");

        Ok(Self {
            inner: Arc::new(transport),
            request_timeout: config.request_timeout,
        })
    }

    fn map_error(&self, err: opensearch::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.request_timeout.unwrap_or_default())
        } else {
            TransportError::Connection(err.to_string())
        }
    }
}

#[async_trait]
impl Transport for OpenSearchTransport {
    async fn perform(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let method = to_opensearch_method(&request.method)?;
        let headers = to_opensearch_headers(&request.headers)?;
        let body = request.body.map(|b| b.to_vec());

        let response = self
            .inner
            .send(method, &request.path, headers, None::<&()>, body, None)
            .await
            .map_err(|e| self.map_error(e))?;

        let status = StatusCode::from_u16(response.status_code().as_u16())
            .map_err(|e| TransportError::Connection(format!("Invalid status code: {}", e)))?;
        let headers = from_opensearch_headers(response.headers());

        Ok(ApiResponse::new(
            status,
            headers,
            Box::new(OpenSearchBody {
                inner: Some(response),
            }),
        ))
    }
}

/// Body of an `opensearch` response, read lazily.
struct OpenSearchBody {
    inner: Option<opensearch::http::response::Response>,
}

#[async_trait]
impl ResponseBody for OpenSearchBody {
    async fn read_all(&mut self) -> Result<Bytes, TransportError> {
        match self.inner.take() {
            Some(response) => response
                .bytes()
                .await
                .map(|b| Bytes::from(b.to_vec()))
                .map_err(|e| TransportError::Body(e.to_string())),
            None => Ok(Bytes::new()),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        // Dropping the response releases the connection.
        self.inner = None;
        Ok(())
    }
}

#[cfg(any(feature = "rustls", feature = "native-tls"))]
fn apply_tls(builder: TransportBuilder, tls: &TlsConfig) -> Result<TransportBuilder, TransportError> {
    use opensearch::cert::{Certificate, CertificateValidation};

    let validation = if tls.insecure_skip_verify {
        CertificateValidation::None
    } else if let Some(pem) = &tls.ca_cert_pem {
        let cert = Certificate::from_pem(pem.as_bytes())
            .map_err(|e| TransportError::Build(format!("Invalid CA certificate: {}", e)))?;
        CertificateValidation::Full(cert)
    } else {
        CertificateValidation::Default
    };
    Ok(builder.cert_validation(validation))
}

#[cfg(not(any(feature = "rustls", feature = "native-tls")))]
fn apply_tls(builder: TransportBuilder, _tls: &TlsConfig) -> Result<TransportBuilder, TransportError> {
    warn!("Built without TLS support; TLS settings ignored");
    Ok(builder)
}

fn to_opensearch_method(method: &Method) -> Result<opensearch::http::Method, TransportError> {
    use opensearch::http::Method as M;

    match *method {
        Method::GET => Ok(M::Get),
        Method::PUT => Ok(M::Put),
        Method::POST => Ok(M::Post),
        Method::DELETE => Ok(M::Delete),
        Method::HEAD => Ok(M::Head),
        ref other => Err(TransportError::Build(format!("Unsupported method: {}", other))),
    }
}

fn to_opensearch_headers(
    headers: &HeaderMap,
) -> Result<opensearch::http::headers::HeaderMap, TransportError> {
    use opensearch::http::headers as os;

    let mut out = os::HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = os::HeaderName::from_bytes(name.as_str().as_bytes())
            .map_err(|e| TransportError::Build(format!("Invalid header name: {}", e)))?;
        let value = os::HeaderValue::from_bytes(value.as_bytes())
            .map_err(|e| TransportError::Build(format!("Invalid header value: {}", e)))?;
        out.append(name, value);
    }
    Ok(out)
}

fn from_opensearch_headers(headers: &opensearch::http::headers::HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_str().as_bytes()),
            HeaderValue::from_bytes(value.as_bytes()),
        ) {
            out.append(name, value);
        }
    }
    out
}
