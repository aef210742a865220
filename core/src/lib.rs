//! Blocking convenience client for REST services.
//!
//! # Overview
//! `RestClient` builds URLs from a base address plus container and resource
//! segments, attaches the configured default headers (accept type, basic
//! authentication) and offers helpers for HEAD/GET/POST/PUT/DELETE, file
//! download and multipart upload.
//!
//! # Design
//! - `ClientConfig` is immutable once built; a `RestClient` can be shared
//!   between threads without locking.
//! - Each operation has a `build_*` method that returns an `HttpRequest`, so
//!   URL and header assembly can be checked without a server.
//! - Verb methods return the response as-is; only `download` rejects
//!   statuses of 300 and above. `HttpResponse::error_for_status` applies the
//!   same rule on demand.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod params;
pub mod transfer;

pub use client::RestClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{RestError, Result};
pub use http::{FilePart, HttpBody, HttpMethod, HttpRequest, HttpResponse, MultipartBody};
pub use params::Params;
