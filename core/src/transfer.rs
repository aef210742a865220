//! File download and multipart upload.
//!
//! Downloads stream straight into the destination file. Uploads read every
//! file into memory while the request is built, so a source that fails to
//! read fails the call before anything is sent.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::client::RestClient;
use crate::error::{RestError, Result};
use crate::http::{FilePart, HttpBody, HttpMethod, HttpRequest, HttpResponse, MultipartBody};
use crate::params::Params;

pub const DEFAULT_UPLOAD_CONTENT_TYPE: &str = "application/octet-stream";

/// Multipart field used by single-file uploads.
pub const FILE_FIELD: &str = "file";
/// Multipart field shared by every part of a multi-file upload.
pub const FILES_FIELD: &str = "files";

impl RestClient {
    /// Build the GET for `download`. `resource` must already use `/`.
    pub fn build_download(
        &self,
        container: &str,
        resource: &str,
        accept: &str,
        query: Option<&Params>,
    ) -> Result<HttpRequest> {
        let query = query.filter(|q| !q.is_empty());
        Ok(HttpRequest {
            method: HttpMethod::Get,
            url: self.make_url(container, resource, query),
            headers: self.headers(accept, None)?,
            body: HttpBody::Empty,
        })
    }

    /// Download `resource` into `save_path` and return the number of bytes
    /// written.
    ///
    /// Backslashes in `resource` are treated as `/`. Without `save_path` the
    /// last segment of `resource` is used, relative to the working
    /// directory; an empty destination fails before the request is sent. A
    /// status of 300 or above fails before the file is created.
    pub fn download(
        &self,
        container: &str,
        resource: &str,
        save_path: Option<&Path>,
        accept: &str,
        query: Option<&Params>,
    ) -> Result<u64> {
        let resource = resource.replace('\\', "/");
        let destination = match save_path {
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(default_file_name(&resource)),
        };
        if destination.as_os_str().is_empty() {
            return Err(RestError::CreateFile {
                path: destination,
                source: io::Error::new(io::ErrorKind::InvalidInput, "empty destination path"),
            });
        }

        let request = self.build_download(container, &resource, accept, query)?;
        let mut response = self.send(request)?;

        let status = response.status();
        if status.as_u16() >= 300 {
            return Err(RestError::http_status(
                status.as_u16(),
                status.canonical_reason().unwrap_or_default(),
                None,
                None,
            ));
        }

        let mut file = File::create(&destination).map_err(|source| RestError::CreateFile {
            path: destination.clone(),
            source,
        })?;
        let written = io::copy(&mut response, &mut file)?;

        if self.config().debug() {
            tracing::info!(target: "rest_core::transfer", bytes = written, path = %destination.display(), "download finished");
        } else {
            tracing::debug!(target: "rest_core::transfer", bytes = written, path = %destination.display(), "download finished");
        }
        Ok(written)
    }

    /// Build a multipart POST carrying one file read from `reader` plus
    /// every entry of `params` as a text field.
    pub fn build_upload_reader<R: Read>(
        &self,
        container: &str,
        resource: &str,
        params: Option<&Params>,
        content_type: &str,
        mut reader: R,
        file_name: &str,
    ) -> Result<HttpRequest> {
        let fields = params
            .map(|p| p.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
            .unwrap_or_default();
        let mut content = Vec::new();
        reader.read_to_end(&mut content)?;
        let part = FilePart {
            field: FILE_FIELD.to_string(),
            file_name: file_name.to_string(),
            content_type: content_type_or_default(content_type),
            content,
        };
        self.build_multipart(
            self.make_url(container, resource, None),
            MultipartBody {
                fields,
                files: vec![part],
            },
        )
    }

    /// Upload an already-open file together with extra form fields.
    pub fn upload_reader<R: Read>(
        &self,
        container: &str,
        resource: &str,
        params: Option<&Params>,
        content_type: &str,
        reader: R,
        file_name: &str,
    ) -> Result<HttpResponse> {
        let request =
            self.build_upload_reader(container, resource, params, content_type, reader, file_name)?;
        self.execute(request)
    }

    /// Read `src` and build its upload to `container`. An empty `dst_name`
    /// falls back to the base name of `src`.
    pub fn build_upload_file(
        &self,
        container: &str,
        src: &Path,
        dst_name: &str,
        content_type: &str,
    ) -> Result<HttpRequest> {
        if !src.exists() {
            return Err(RestError::FileNotFound(src.to_path_buf()));
        }
        let part = FilePart {
            field: FILE_FIELD.to_string(),
            file_name: name_or_base_name(dst_name, src),
            content_type: content_type_or_default(content_type),
            content: read_source(src)?,
        };
        self.build_multipart(
            self.make_url(container, "", None),
            MultipartBody {
                fields: Vec::new(),
                files: vec![part],
            },
        )
    }

    /// Upload the file at `src`. Fails with `FileNotFound` without touching
    /// the network when `src` does not exist.
    pub fn upload_file(
        &self,
        container: &str,
        src: impl AsRef<Path>,
        dst_name: &str,
        content_type: &str,
    ) -> Result<HttpResponse> {
        let request = self.build_upload_file(container, src.as_ref(), dst_name, content_type)?;
        self.execute(request)
    }

    /// Read every `(source, destination name)` pair and build one multipart
    /// POST with a part per file.
    ///
    /// The first source that cannot be opened or read stops the build with
    /// `OpenFile`.
    pub fn build_upload_files<I, P, S>(
        &self,
        container: &str,
        files: I,
        content_type: &str,
    ) -> Result<HttpRequest>
    where
        I: IntoIterator<Item = (P, S)>,
        P: AsRef<Path>,
        S: AsRef<str>,
    {
        let content_type = content_type_or_default(content_type);
        let mut parts = Vec::new();
        for (src, dst_name) in files {
            let src = src.as_ref();
            parts.push(FilePart {
                field: FILES_FIELD.to_string(),
                file_name: name_or_base_name(dst_name.as_ref(), src),
                content_type: content_type.clone(),
                content: read_source(src)?,
            });
        }
        self.build_multipart(
            self.make_url(container, "", None),
            MultipartBody {
                fields: Vec::new(),
                files: parts,
            },
        )
    }

    /// Upload several files in a single request. Either every file is sent
    /// or the call fails before anything goes out.
    pub fn upload_files<I, P, S>(
        &self,
        container: &str,
        files: I,
        content_type: &str,
    ) -> Result<HttpResponse>
    where
        I: IntoIterator<Item = (P, S)>,
        P: AsRef<Path>,
        S: AsRef<str>,
    {
        let request = self.build_upload_files(container, files, content_type)?;
        self.execute(request)
    }

    fn build_multipart(&self, url: String, body: MultipartBody) -> Result<HttpRequest> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url,
            // the transport sets the multipart content type with its boundary
            headers: self.headers("", None)?,
            body: HttpBody::Multipart(body),
        })
    }
}

/// Whole contents of the file at `path`. Directories fail on read.
fn read_source(path: &Path) -> Result<Vec<u8>> {
    let open_error = |source: io::Error| RestError::OpenFile {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(open_error)?;
    let mut content = Vec::new();
    file.read_to_end(&mut content).map_err(open_error)?;
    Ok(content)
}

/// Last `/`-separated segment of `resource`.
fn default_file_name(resource: &str) -> &str {
    resource.rsplit('/').next().unwrap_or(resource)
}

fn name_or_base_name(name: &str, src: &Path) -> String {
    if !name.is_empty() {
        return name.to_string();
    }
    src.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn content_type_or_default(content_type: &str) -> String {
    if content_type.is_empty() {
        DEFAULT_UPLOAD_CONTENT_TYPE.to_string()
    } else {
        content_type.to_string()
    }
}
