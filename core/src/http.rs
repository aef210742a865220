//! HTTP request and response values.
//!
//! # Design
//! `HttpRequest` describes a request as data: `RestClient::build_*` methods
//! produce one, `RestClient::execute` sends it. This keeps URL and header
//! assembly testable without a server. Headers use `HeaderMap` so repeated
//! names keep every value in order.

use std::fmt;

use reqwest::header::HeaderMap;

use crate::error::{RestError, Result};

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Head,
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Head => "HEAD",
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file inside a multipart body, read in full before the request is
/// sent.
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

impl fmt::Debug for FilePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePart")
            .field("field", &self.field)
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.content.len())
            .finish()
    }
}

/// A `multipart/form-data` body: text fields followed by file parts.
#[derive(Debug, Default)]
pub struct MultipartBody {
    pub fields: Vec<(String, String)>,
    pub files: Vec<FilePart>,
}

impl MultipartBody {
    pub(crate) fn into_form(self) -> Result<reqwest::blocking::multipart::Form> {
        let mut form = reqwest::blocking::multipart::Form::new();
        for file in self.files {
            let part = reqwest::blocking::multipart::Part::bytes(file.content)
                .file_name(file.file_name)
                .mime_str(&file.content_type)
                .map_err(|_| RestError::InvalidHeader(file.content_type.clone()))?;
            form = form.part(file.field, part);
        }
        for (name, value) in self.fields {
            form = form.text(name, value);
        }
        Ok(form)
    }
}

/// Body of an `HttpRequest`.
#[derive(Debug, Default)]
pub enum HttpBody {
    #[default]
    Empty,
    /// Pre-encoded `application/x-www-form-urlencoded` text.
    Form(String),
    Bytes(Vec<u8>),
    Multipart(MultipartBody),
}

/// An HTTP request described as data.
#[derive(Debug)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HeaderMap,
    pub body: HttpBody,
}

/// A fully read HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// Return `RestError::HttpStatus` when the status is 300 or above.
    pub fn error_for_status(self) -> Result<Self> {
        if self.status >= 300 {
            let message = (!self.body.is_empty()).then(|| self.text());
            return Err(RestError::http_status(self.status, self.reason, message, None));
        }
        Ok(self)
    }
}
