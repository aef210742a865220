//! Blocking REST client: URL building, header assembly and verb methods.
//!
//! # Design
//! Every operation is split into a `build_*` method producing an
//! `HttpRequest` and the shared `execute`/`send` path that performs the
//! round trip. `RestClient` only holds its immutable `ClientConfig` and a
//! transport client configured from it, so one instance can serve many
//! threads at once.
//!
//! Verb methods return the response whatever its status. Use
//! `HttpResponse::error_for_status` to turn 3xx and above into an error.

use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};

use crate::config::ClientConfig;
use crate::error::{RestError, Result};
use crate::http::{HttpBody, HttpMethod, HttpRequest, HttpResponse};
use crate::params::Params;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Synchronous client bound to one base URL.
#[derive(Debug, Clone)]
pub struct RestClient {
    config: ClientConfig,
    http: Client,
}

impl RestClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!config.verify_tls())
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Join base URL, container and resource with `/`, then append the
    /// encoded query when one is given.
    ///
    /// An empty `resource` still contributes an empty trailing segment, so
    /// the result ends with `/`.
    pub fn make_url(&self, container: &str, resource: &str, query: Option<&Params>) -> String {
        let mut parts = vec![self.config.base_url()];
        let container = container.trim_matches('/');
        if !container.is_empty() {
            parts.push(container);
        }
        parts.push(resource);

        let mut url = parts.join("/");
        if let Some(query) = query {
            url.push('?');
            url.push_str(&query.encode());
        }
        url
    }

    /// Request headers: `content_type` and a non-empty `accept` are set
    /// first, then every default header value is appended.
    pub(crate) fn headers(&self, accept: &str, content_type: Option<&str>) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(content_type) = content_type {
            headers.insert(CONTENT_TYPE, header_value(content_type)?);
        }
        if !accept.is_empty() {
            headers.insert(ACCEPT, header_value(accept)?);
        }
        for (name, value) in self.config.default_headers() {
            headers.append(name.clone(), value.clone());
        }
        Ok(headers)
    }

    pub fn build_head(&self, container: &str, resource: &str) -> Result<HttpRequest> {
        Ok(HttpRequest {
            method: HttpMethod::Head,
            url: self.make_url(container, resource, None),
            headers: self.headers("", None)?,
            body: HttpBody::Empty,
        })
    }

    pub fn build_get(
        &self,
        container: &str,
        resource: &str,
        query: Option<&Params>,
        accept: &str,
    ) -> Result<HttpRequest> {
        Ok(HttpRequest {
            method: HttpMethod::Get,
            url: self.make_url(container, resource, query),
            headers: self.headers(accept, None)?,
            body: HttpBody::Empty,
        })
    }

    pub fn build_post(
        &self,
        container: &str,
        resource: &str,
        params: Option<&Params>,
        accept: &str,
    ) -> Result<HttpRequest> {
        self.build_form(HttpMethod::Post, container, resource, params, accept)
    }

    pub fn build_put(
        &self,
        container: &str,
        resource: &str,
        params: Option<&Params>,
        accept: &str,
    ) -> Result<HttpRequest> {
        self.build_form(HttpMethod::Put, container, resource, params, accept)
    }

    pub fn build_delete(
        &self,
        container: &str,
        resource: &str,
        query: Option<&Params>,
        accept: &str,
    ) -> Result<HttpRequest> {
        Ok(HttpRequest {
            method: HttpMethod::Delete,
            url: self.make_url(container, resource, query),
            headers: self.headers(accept, None)?,
            body: HttpBody::Empty,
        })
    }

    fn build_form(
        &self,
        method: HttpMethod,
        container: &str,
        resource: &str,
        params: Option<&Params>,
        accept: &str,
    ) -> Result<HttpRequest> {
        Ok(HttpRequest {
            method,
            url: self.make_url(container, resource, None),
            headers: self.headers(accept, Some(FORM_CONTENT_TYPE))?,
            body: HttpBody::Form(params.map(Params::encode).unwrap_or_default()),
        })
    }

    /// Send `request` and read the whole body into memory.
    pub fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self.send(request)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().map_err(RestError::from_transport)?;
        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body: body.to_vec(),
        })
    }

    /// Send `request` and hand back the unread response.
    pub(crate) fn send(&self, request: HttpRequest) -> Result<Response> {
        self.log_request(&request);
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self.http.request(method.into(), &url).headers(headers);
        builder = match body {
            HttpBody::Empty => builder,
            HttpBody::Form(encoded) => builder.body(encoded),
            HttpBody::Bytes(bytes) => builder.body(bytes),
            HttpBody::Multipart(multipart) => builder.multipart(multipart.into_form()?),
        };

        match builder.send() {
            Ok(response) => {
                tracing::debug!(target: "rest_core::http", method = %method, url = %url, status = response.status().as_u16(), "response received");
                Ok(response)
            }
            Err(err) => {
                tracing::debug!(target: "rest_core::http", method = %method, url = %url, err = %err, "request error");
                Err(RestError::from_transport(err))
            }
        }
    }

    fn log_request(&self, request: &HttpRequest) {
        if self.config.debug() {
            tracing::info!(
                target: "rest_core::http",
                method = %request.method,
                url = %request.url,
                headers = %format_headers(&request.headers),
                body = %describe_body(&request.body),
                "request"
            );
        } else {
            tracing::debug!(target: "rest_core::http", method = %request.method, url = %request.url, "sending request");
        }
    }

    /// Issue a HEAD request and return only the status code.
    pub fn head(&self, container: &str, resource: &str) -> Result<u16> {
        let response = self.send(self.build_head(container, resource)?)?;
        Ok(response.status().as_u16())
    }

    pub fn get(
        &self,
        container: &str,
        resource: &str,
        query: Option<&Params>,
        accept: &str,
    ) -> Result<HttpResponse> {
        self.execute(self.build_get(container, resource, query, accept)?)
    }

    /// POST `params` as a form body.
    pub fn post(
        &self,
        container: &str,
        resource: &str,
        params: Option<&Params>,
        accept: &str,
    ) -> Result<HttpResponse> {
        self.execute(self.build_post(container, resource, params, accept)?)
    }

    /// PUT `params` as a form body.
    pub fn put(
        &self,
        container: &str,
        resource: &str,
        params: Option<&Params>,
        accept: &str,
    ) -> Result<HttpResponse> {
        self.execute(self.build_put(container, resource, params, accept)?)
    }

    pub fn delete(
        &self,
        container: &str,
        resource: &str,
        query: Option<&Params>,
        accept: &str,
    ) -> Result<HttpResponse> {
        self.execute(self.build_delete(container, resource, query, accept)?)
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| RestError::InvalidHeader(value.to_string()))
}

fn format_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| {
            if value.is_sensitive() {
                format!("{name}: <redacted>")
            } else {
                format!("{name}: {}", value.to_str().unwrap_or("<binary>"))
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn describe_body(body: &HttpBody) -> String {
    match body {
        HttpBody::Empty => String::new(),
        HttpBody::Form(encoded) => encoded.clone(),
        HttpBody::Bytes(bytes) => format!("<{} bytes>", bytes.len()),
        HttpBody::Multipart(multipart) => format!(
            "<multipart: {} fields, {} files>",
            multipart.fields.len(),
            multipart.files.len()
        ),
    }
}
