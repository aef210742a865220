//! End-to-end tests against the live mock server.
//!
//! # Design
//! Each test starts its own mock server on a random port with a fresh
//! `Recorder`, so request counts are per test. The client calls are real
//! blocking HTTP round trips made through `RestClient`.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use mock_server::{file_contents, Echo, Recorder, UploadReport};
use rest_core::{ClientConfig, HttpBody, HttpMethod, HttpRequest, Params, RestClient, RestError};

struct Server {
    base_url: String,
    recorder: Arc<Recorder>,
}

fn start_server() -> Server {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();
    let recorder = Arc::new(Recorder::default());
    let server_recorder = recorder.clone();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with_recorder(listener, server_recorder).await
        })
        .unwrap();
    });

    Server {
        base_url: format!("http://{addr}"),
        recorder,
    }
}

fn client_for(server: &Server) -> RestClient {
    let config = ClientConfig::builder(format!("{}/", server.base_url))
        .credentials("u", "p")
        .debug(true)
        .build()
        .unwrap();
    RestClient::new(config).unwrap()
}

fn echo(body: &[u8]) -> Echo {
    serde_json::from_slice(body).expect("echo response")
}

fn report(body: &[u8]) -> UploadReport {
    serde_json::from_slice(body).expect("upload report")
}

// --- verb methods ---

#[test]
fn get_sends_query_and_default_headers() {
    let server = start_server();
    let client = client_for(&server);

    let query: Params = [("b", "2"), ("a", "x y")].into_iter().collect();
    let resp = client.get("echo", "items", Some(&query), "").unwrap();
    assert_eq!(resp.status, 200);

    let seen = echo(&resp.body);
    assert_eq!(seen.method, "GET");
    assert_eq!(seen.path, "/echo/items");
    assert_eq!(seen.query.as_deref(), Some("a=x+y&b=2"));
    assert_eq!(seen.header_values("accept"), vec!["application/json"]);
    assert_eq!(seen.header_values("authorization"), vec!["Basic dTpw"]);
}

#[test]
fn explicit_accept_comes_first_and_defaults_still_merge() {
    let server = start_server();
    let client = client_for(&server);

    let resp = client.get("echo", "items", None, "text/csv").unwrap();
    let seen = echo(&resp.body);
    assert_eq!(seen.header_values("accept"), vec!["text/csv", "application/json"]);
    assert_eq!(seen.header_values("authorization"), vec!["Basic dTpw"]);
}

#[test]
fn empty_resource_requests_trailing_slash() {
    let server = start_server();
    let client = client_for(&server);

    let seen = echo(&client.get("/echo/", "", None, "").unwrap().body);
    assert_eq!(seen.path, "/echo/");
}

#[test]
fn post_and_put_send_form_bodies() {
    let server = start_server();
    let client = client_for(&server);

    let mut params = Params::new();
    params.set("title", "My Title").set("userId", "1");

    let seen = echo(&client.post("echo", "", Some(&params), "").unwrap().body);
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.path, "/echo/");
    assert!(seen.query.is_none());
    assert_eq!(seen.body, "title=My+Title&userId=1");
    assert_eq!(
        seen.header_values("content-type"),
        vec!["application/x-www-form-urlencoded"]
    );

    let seen = echo(&client.put("echo", "1", None, "").unwrap().body);
    assert_eq!(seen.method, "PUT");
    assert_eq!(seen.path, "/echo/1");
    assert_eq!(seen.body, "");
}

#[test]
fn delete_sends_query() {
    let server = start_server();
    let client = client_for(&server);

    let query: Params = [("force", "true")].into_iter().collect();
    let seen = echo(&client.delete("echo", "1", Some(&query), "").unwrap().body);
    assert_eq!(seen.method, "DELETE");
    assert_eq!(seen.query.as_deref(), Some("force=true"));
}

#[test]
fn execute_sends_raw_byte_body() {
    let server = start_server();
    let client = client_for(&server);

    let mut headers = client.config().default_headers().clone();
    headers.insert("content-type", "application/json".parse().unwrap());
    let request = HttpRequest {
        method: HttpMethod::Put,
        url: client.make_url("echo", "raw", None),
        headers,
        body: HttpBody::Bytes(br#"{"id":7}"#.to_vec()),
    };

    let seen = echo(&client.execute(request).unwrap().body);
    assert_eq!(seen.method, "PUT");
    assert_eq!(seen.path, "/echo/raw");
    assert_eq!(seen.body, r#"{"id":7}"#);
    assert_eq!(seen.header_values("content-type"), vec!["application/json"]);
    assert_eq!(seen.header_values("authorization"), vec!["Basic dTpw"]);
}

#[test]
fn head_returns_status_only() {
    let server = start_server();
    let client = client_for(&server);

    assert_eq!(client.head("echo", "anything").unwrap(), 200);
    assert_eq!(client.head("status", "404").unwrap(), 404);
}

#[test]
fn verb_methods_return_error_statuses_as_responses() {
    let server = start_server();
    let client = client_for(&server);

    let resp = client.get("status", "500", None, "").unwrap();
    assert_eq!(resp.status, 500);
    assert_eq!(resp.reason, "Internal Server Error");
    assert_eq!(resp.text(), "status 500");

    let err = resp.error_for_status().unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.to_string(), "500 Internal Server Error: status 500");
}

#[test]
fn client_is_shared_across_threads() {
    let server = start_server();
    let client = client_for(&server);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let client = client.clone();
            std::thread::spawn(move || {
                let seen = echo(&client.get("echo", &i.to_string(), None, "").unwrap().body);
                seen.path
            })
        })
        .collect();

    let mut paths: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    paths.sort();
    assert_eq!(paths, vec!["/echo/0", "/echo/1", "/echo/2", "/echo/3"]);
    assert_eq!(server.recorder.hits(), 4);
}

// --- transport failures ---

#[test]
fn unreachable_server_is_a_connection_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let config = ClientConfig::builder(format!("http://{addr}")).build().unwrap();
    let client = RestClient::new(config).unwrap();

    let err = client.get("echo", "x", None, "").unwrap_err();
    assert!(matches!(err, RestError::Connection { .. }), "unexpected error: {err:?}");
    assert_eq!(err.connection_code(), Some(RestError::CONNECT_FAILED));
}

#[test]
fn slow_response_times_out() {
    let server = start_server();
    let config = ClientConfig::builder(&server.base_url)
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let client = RestClient::new(config).unwrap();

    let err = client.get("slow", "2000", None, "").unwrap_err();
    assert_eq!(err.connection_code(), Some(RestError::TIMED_OUT), "unexpected error: {err:?}");
}

// --- download ---

#[test]
fn download_streams_body_into_file() {
    let server = start_server();
    let client = client_for(&server);
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("report.bin");

    let written = client
        .download("files", "reports\\2024\\report.bin", Some(target.as_path()), "", None)
        .unwrap();

    let expected = file_contents("reports/2024/report.bin");
    assert_eq!(written, expected.len() as u64);
    assert_eq!(std::fs::read(&target).unwrap(), expected);
}

#[test]
fn download_error_status_creates_no_file() {
    let server = start_server();
    let client = client_for(&server);
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("missing.bin");

    let err = client.download("status", "404", Some(target.as_path()), "", None).unwrap_err();
    match err {
        RestError::HttpStatus { status, reason, .. } => {
            assert_eq!(status, 404);
            assert_eq!(reason, "Not Found");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!target.exists());
}

#[test]
fn download_without_file_name_sends_nothing() {
    let server = start_server();
    let client = client_for(&server);

    let err = client.download("files", "reports/", None, "", None).unwrap_err();
    assert!(
        matches!(err, RestError::CreateFile { ref path, .. } if path.as_os_str().is_empty()),
        "unexpected error: {err:?}"
    );
    assert_eq!(server.recorder.hits(), 0);
}

#[test]
fn download_into_missing_directory_fails_to_create() {
    let server = start_server();
    let client = client_for(&server);
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("no-such-dir").join("out.bin");

    let err = client.download("files", "out.bin", Some(target.as_path()), "", None).unwrap_err();
    assert!(matches!(err, RestError::CreateFile { ref path, .. } if *path == target));
}

// --- upload ---

#[test]
fn upload_reader_sends_file_and_fields() {
    let server = start_server();
    let client = client_for(&server);

    let params: Params = [("owner", "ops")].into_iter().collect();
    let resp = client
        .upload_reader(
            "upload",
            "inbox",
            Some(&params),
            "text/plain",
            Cursor::new(b"hello world".to_vec()),
            "hello.txt",
        )
        .unwrap();
    assert_eq!(resp.status, 200);

    let got = report(&resp.body);
    assert_eq!(got.path, "/upload/inbox");
    assert_eq!(got.fields, vec![("owner".to_string(), "ops".to_string())]);
    assert_eq!(got.files.len(), 1);
    assert_eq!(got.files[0].field, "file");
    assert_eq!(got.files[0].file_name, "hello.txt");
    assert_eq!(got.files[0].content_type, "text/plain");
    assert_eq!(got.files[0].content, b"hello world");
}

#[test]
fn upload_file_defaults_name_and_content_type() {
    let server = start_server();
    let client = client_for(&server);
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("data.csv");
    std::fs::write(&src, "a,b\n1,2\n").unwrap();

    let got = report(&client.upload_file("upload", &src, "", "").unwrap().body);
    assert_eq!(got.path, "/upload/");
    assert_eq!(got.files[0].file_name, "data.csv");
    assert_eq!(got.files[0].content_type, "application/octet-stream");
    assert_eq!(got.files[0].content, b"a,b\n1,2\n");

    let got = report(&client.upload_file("upload", &src, "renamed.csv", "text/csv").unwrap().body);
    assert_eq!(got.files[0].file_name, "renamed.csv");
    assert_eq!(got.files[0].content_type, "text/csv");
}

#[test]
fn upload_file_missing_source_sends_nothing() {
    let server = start_server();
    let client = client_for(&server);
    let dir = tempfile::tempdir().unwrap();

    let err = client
        .upload_file("upload", dir.path().join("absent.bin"), "", "")
        .unwrap_err();
    assert!(matches!(err, RestError::FileNotFound(_)));
    assert_eq!(server.recorder.hits(), 0);
}

#[test]
fn upload_files_sends_every_file_in_one_request() {
    let server = start_server();
    let client = client_for(&server);
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    std::fs::write(&a, "first").unwrap();
    std::fs::write(&b, "second").unwrap();

    let resp = client
        .upload_files("upload", [(&a, ""), (&b, "bee.txt")], "text/plain")
        .unwrap();
    let got = report(&resp.body);
    assert_eq!(server.recorder.hits(), 1);
    assert_eq!(got.files.len(), 2);
    assert!(got.files.iter().all(|f| f.field == "files"));

    let mut names: Vec<_> = got.files.iter().map(|f| f.file_name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["a.txt", "bee.txt"]);
}

#[test]
fn upload_files_open_failure_sends_nothing() {
    let server = start_server();
    let client = client_for(&server);
    let dir = tempfile::tempdir().unwrap();

    let sources: Vec<_> = (0..6)
        .map(|i| {
            let path = dir.path().join(format!("part{i}.bin"));
            if i != 3 {
                std::fs::write(&path, vec![i as u8; 128]).unwrap();
            }
            (path, String::new())
        })
        .collect();

    let err = client.upload_files("upload", sources, "").unwrap_err();
    assert!(matches!(err, RestError::OpenFile { .. }), "unexpected error: {err:?}");
    assert_eq!(server.recorder.hits(), 0);
}

#[test]
fn upload_files_unreadable_source_sends_nothing() {
    let server = start_server();
    let client = client_for(&server);
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.txt");
    std::fs::write(&a, "first").unwrap();
    let subdir = dir.path().join("subdir");
    std::fs::create_dir(&subdir).unwrap();

    let err = client
        .upload_files("upload", [(a.as_path(), ""), (subdir.as_path(), "")], "")
        .unwrap_err();
    assert!(
        matches!(err, RestError::OpenFile { ref path, .. } if *path == subdir),
        "unexpected error: {err:?}"
    );
    assert_eq!(server.recorder.hits(), 0);
}
