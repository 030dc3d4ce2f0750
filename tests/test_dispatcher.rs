mod common;

use bytes::BytesMut;
use common::DocRoot;
use staticd::http::dispatcher::{Dispatcher, Outcome};
use staticd::http::parser::RequestParser;
use staticd::http::response::StatusCode;

async fn dispatch_one(root: &DocRoot, raw: &[u8]) -> (Outcome, Vec<u8>) {
    let config = root.config();
    let parser = RequestParser::new(config.file_root());
    let mut input = BytesMut::from(raw);
    let requests = parser.parse(&mut input);
    assert_eq!(requests.len(), 1);

    let dispatcher = Dispatcher::new(config);
    let mut out = Vec::new();
    let outcome = dispatcher.dispatch(&requests[0], &mut out).await.unwrap();
    (outcome, out)
}

fn text(out: &[u8]) -> String {
    String::from_utf8_lossy(out).into_owned()
}

#[tokio::test]
async fn test_root_serves_first_existing_index_page() {
    let root = DocRoot::new();
    root.file("index.html", b"<h1>home</h1>");

    let (outcome, out) =
        dispatch_one(&root, b"GET / HTTP/1.1\r\nConnection: keep-alive\r\n\r\n").await;

    assert_eq!(
        outcome,
        Outcome {
            status: StatusCode::Ok,
            keep_alive: true,
        }
    );
    let out = text(&out);
    assert!(out.starts_with("HTTP/1.1 200 OK\nConnection: keep-alive\nDate: "));
    assert!(out.contains("\nContent-Type: text/html\nContent-Length: 13\n\n"));
    assert!(out.ends_with("\n\n<h1>home</h1>\n"));
}

#[tokio::test]
async fn test_root_falls_back_to_later_index_candidate() {
    let root = DocRoot::new();
    root.file("index.htm", b"fallback");

    let (outcome, out) = dispatch_one(&root, b"GET / HTTP/1.0\r\n\r\n").await;

    assert_eq!(outcome.status, StatusCode::Ok);
    assert!(!outcome.keep_alive);
    let out = text(&out);
    assert!(out.contains("Connection: close\n"));
    assert!(out.ends_with("Content-Length: 8\n\nfallback\n"));
}

#[tokio::test]
async fn test_root_without_index_is_not_found() {
    let root = DocRoot::new();

    let (outcome, out) =
        dispatch_one(&root, b"GET / HTTP/1.1\r\nConnection: keep-alive\r\n\r\n").await;

    assert_eq!(outcome.status, StatusCode::NotFound);
    assert!(outcome.keep_alive);
    assert_eq!(text(&out), "HTTP/1.1 404 Not Found: /\n\n");
}

#[tokio::test]
async fn test_missing_file_is_not_found() {
    let root = DocRoot::new();

    let (outcome, out) = dispatch_one(&root, b"GET /missing.txt HTTP/1.1\r\n\r\n").await;

    assert_eq!(outcome.status, StatusCode::NotFound);
    assert_eq!(text(&out), "HTTP/1.1 404 Not Found: /missing.txt\n\n");
}

#[tokio::test]
async fn test_directory_is_not_found() {
    let root = DocRoot::new();
    root.dir("assets.txt");

    let (outcome, _) = dispatch_one(&root, b"GET /assets.txt HTTP/1.1\r\n\r\n").await;

    assert_eq!(outcome.status, StatusCode::NotFound);
}

#[tokio::test]
async fn test_disallowed_extension_is_not_implemented() {
    let root = DocRoot::new();
    root.file("data.exe", b"MZ");

    let (outcome, out) = dispatch_one(&root, b"GET /data.exe HTTP/1.1\r\n\r\n").await;

    assert_eq!(outcome.status, StatusCode::NotImplemented);
    assert_eq!(text(&out), "HTTP/1.1 501 Not Implemented: /data.exe\n\n");
}

#[tokio::test]
async fn test_file_without_extension_is_not_implemented() {
    let root = DocRoot::new();
    root.file("README", b"plain");

    let (outcome, _) = dispatch_one(&root, b"GET /README HTTP/1.1\r\n\r\n").await;

    assert_eq!(outcome.status, StatusCode::NotImplemented);
}

#[tokio::test]
async fn test_unsupported_method_is_bad_request() {
    let root = DocRoot::new();
    root.file("index.html", b"x");

    let (outcome, out) = dispatch_one(&root, b"FOO / HTTP/1.1\r\n\r\n").await;

    assert_eq!(outcome.status, StatusCode::BadRequest);
    assert_eq!(text(&out), "HTTP/1.1 400 Bad Request: Invalid Method: FOO\n\n");
}

#[tokio::test]
async fn test_known_but_unimplemented_method_is_bad_request() {
    let root = DocRoot::new();

    let (outcome, out) = dispatch_one(&root, b"POST /form HTTP/1.1\r\n\r\n").await;

    assert_eq!(outcome.status, StatusCode::BadRequest);
    assert_eq!(text(&out), "HTTP/1.1 400 Bad Request: Invalid Method: POST\n\n");
}

#[tokio::test]
async fn test_bad_version_is_checked_before_method() {
    let root = DocRoot::new();

    let (outcome, out) =
        dispatch_one(&root, b"FOO / HTTP/2.0\r\nConnection: keep-alive\r\n\r\n").await;

    assert_eq!(outcome.status, StatusCode::BadRequest);
    assert!(outcome.keep_alive);
    assert_eq!(
        text(&out),
        "HTTP/1.1 400 Bad Request: Invalid HTTP-Version: HTTP/2.0\n\n"
    );
}

#[tokio::test]
async fn test_unparseable_request_line_is_bad_request_and_closes() {
    let root = DocRoot::new();

    let (outcome, out) = dispatch_one(&root, b"GET /\r\nConnection: keep-alive\r\n\r\n").await;

    assert_eq!(
        outcome,
        Outcome {
            status: StatusCode::BadRequest,
            keep_alive: false,
        }
    );
    assert_eq!(
        text(&out),
        "HTTP/1.1 400 Bad Request: Unable to parse HTTP Version. GET /\n\n"
    );
}

#[tokio::test]
async fn test_parent_segments_are_rejected() {
    let root = DocRoot::new();

    let (outcome, out) = dispatch_one(&root, b"GET /../secret.txt HTTP/1.1\r\n\r\n").await;

    assert_eq!(outcome.status, StatusCode::BadRequest);
    assert_eq!(
        text(&out),
        "HTTP/1.1 400 Bad Request: Invalid URI: /../secret.txt\n\n"
    );
}

#[tokio::test]
async fn test_content_length_matches_file_size() {
    let root = DocRoot::new();
    let body: Vec<u8> = (0..=255u8).cycle().take(70_000).collect();
    root.file("big.txt", &body);

    let (outcome, out) = dispatch_one(&root, b"GET /big.txt HTTP/1.1\r\n\r\n").await;

    assert_eq!(outcome.status, StatusCode::Ok);
    let header_end = out.windows(2).position(|w| w == b"\n\n").unwrap() + 2;
    let header = String::from_utf8_lossy(&out[..header_end]);
    assert!(header.contains("Content-Length: 70000\n"));
    assert!(header.contains("Content-Type: text/plain\n"));
    assert_eq!(&out[header_end..out.len() - 1], &body[..]);
    assert_eq!(out.last(), Some(&b'\n'));
}

#[cfg(unix)]
#[tokio::test]
async fn test_unopenable_file_is_internal_error() {
    use std::os::unix::fs::PermissionsExt;

    let root = DocRoot::new();
    root.file("locked.txt", b"secret");
    let path = root.path().join("locked.txt");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o000)).unwrap();
    if std::fs::File::open(&path).is_ok() {
        // permission bits do not apply to this user
        return;
    }

    let (outcome, out) = dispatch_one(
        &root,
        b"GET /locked.txt HTTP/1.1\r\nConnection: keep-alive\r\n\r\n",
    )
    .await;
    assert_eq!(
        outcome,
        Outcome {
            status: StatusCode::InternalServerError,
            keep_alive: true,
        }
    );
    assert_eq!(
        text(&out),
        "HTTP/1.1 500 Internal Server Error: cannot allocate memory\n"
    );

    let (outcome, _) = dispatch_one(&root, b"GET /locked.txt HTTP/1.1\r\n\r\n").await;
    assert_eq!(outcome.status, StatusCode::InternalServerError);
    assert!(!outcome.keep_alive);
}
