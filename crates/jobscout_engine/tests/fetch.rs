mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use jobscout_core::{AddressRange, Guard, SecurityPolicy};
use jobscout_engine::{FetchFailure, FetchSettings, Fetcher, ReqwestFetcher};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{init_logging, local_test_policy};

fn fetcher(policy: SecurityPolicy) -> (ReqwestFetcher, Guard) {
    let policy = Arc::new(policy);
    (
        ReqwestFetcher::new(policy.clone(), FetchSettings::default()),
        Guard::new(policy),
    )
}

#[tokio::test]
async fn fetcher_returns_body_headers_and_status() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job"))
        .and(header_exists("user-agent"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<html>ok</html>", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let (fetcher, guard) = fetcher(local_test_policy());
    let target = guard.validate(&format!("{}/job", server.uri())).unwrap();

    let result = fetcher.fetch(&target).await.expect("fetch ok");
    assert_eq!(result.status, 200);
    assert_eq!(result.body, b"<html>ok</html>");
    assert!(result.content_type().unwrap().starts_with("text/html"));
    assert!(result.final_url.ends_with("/job"));
}

#[tokio::test]
async fn error_statuses_are_returned_not_raised() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (fetcher, guard) = fetcher(local_test_policy());
    let target = guard.validate(&format!("{}/gone", server.uri())).unwrap();

    let result = fetcher.fetch(&target).await.expect("status is data");
    assert_eq!(result.status, 404);
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(800))
                .set_body_string("slow"),
        )
        .mount(&server)
        .await;

    let (fetcher, guard) = fetcher(SecurityPolicy {
        fetch_timeout: Duration::from_millis(100),
        ..local_test_policy()
    });
    let target = guard.validate(&format!("{}/slow", server.uri())).unwrap();

    let err = fetcher.fetch(&target).await.unwrap_err();
    assert_eq!(err.kind, FetchFailure::Timeout);
}

#[tokio::test]
async fn oversized_response_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/large"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/html")
                .set_body_string("x".repeat(4096)),
        )
        .mount(&server)
        .await;

    let (fetcher, guard) = fetcher(SecurityPolicy {
        max_response_bytes: 1024,
        ..local_test_policy()
    });
    let target = guard.validate(&format!("{}/large", server.uri())).unwrap();

    let err = fetcher.fetch(&target).await.unwrap_err();
    assert!(matches!(
        err.kind,
        FetchFailure::TooLarge { max_bytes: 1024, .. }
    ));
}

/// One-shot HTTP/1.1 server that answers with a chunked body and no
/// `Content-Length`, so only the streaming cap can stop it.
async fn serve_chunked_once(chunks: Vec<usize>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|window| window == b"\r\n\r\n") {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }

        let head = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nTransfer-Encoding: chunked\r\n\r\n";
        if socket.write_all(head.as_bytes()).await.is_err() {
            return;
        }
        for size in chunks {
            let mut frame = format!("{size:x}\r\n").into_bytes();
            frame.extend(std::iter::repeat(b'z').take(size));
            frame.extend_from_slice(b"\r\n");
            if socket.write_all(&frame).await.is_err() || socket.flush().await.is_err() {
                return;
            }
        }
        let _ = socket.write_all(b"0\r\n\r\n").await;
    });
    addr
}

#[tokio::test]
async fn chunked_body_without_length_is_capped_while_streaming() {
    init_logging();
    let addr = serve_chunked_once(vec![800, 800, 800]).await;

    let (fetcher, guard) = fetcher(SecurityPolicy {
        max_response_bytes: 1024,
        ..local_test_policy()
    });
    let target = guard.validate(&format!("http://{addr}/stream")).unwrap();

    let err = fetcher.fetch(&target).await.unwrap_err();
    match err.kind {
        FetchFailure::TooLarge {
            max_bytes: 1024,
            actual: Some(actual),
        } => assert!(actual > 1024 && actual <= 2400, "read {actual} bytes"),
        other => panic!("expected TooLarge, got {other:?}"),
    }
}

#[tokio::test]
async fn chunked_body_at_limit_is_accepted() {
    let addr = serve_chunked_once(vec![512, 512]).await;

    let (fetcher, guard) = fetcher(SecurityPolicy {
        max_response_bytes: 1024,
        ..local_test_policy()
    });
    let target = guard.validate(&format!("http://{addr}/stream")).unwrap();

    let result = fetcher.fetch(&target).await.unwrap();
    assert_eq!(result.body.len(), 1024);
    assert!(result.header("content-length").is_none());
}

#[tokio::test]
async fn body_at_limit_is_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fits"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("y".repeat(1024), "text/html"))
        .mount(&server)
        .await;

    let (fetcher, guard) = fetcher(SecurityPolicy {
        max_response_bytes: 1024,
        ..local_test_policy()
    });
    let target = guard.validate(&format!("{}/fits", server.uri())).unwrap();

    let result = fetcher.fetch(&target).await.unwrap();
    assert_eq!(result.body.len(), 1024);
}

#[tokio::test]
async fn redirect_into_blocked_host_is_refused() {
    let server = MockServer::start().await;
    let port = server.address().port();
    Mock::given(method("GET"))
        .and(path("/hop"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("http://localhost:{port}/internal").as_str()),
        )
        .mount(&server)
        .await;

    let (fetcher, guard) = fetcher(local_test_policy());
    let target = guard.validate(&format!("{}/hop", server.uri())).unwrap();

    let err = fetcher.fetch(&target).await.unwrap_err();
    assert_eq!(err.kind, FetchFailure::RedirectBlocked);
}

#[tokio::test]
async fn allowed_redirect_is_followed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("Location", format!("{}/new", server.uri()).as_str()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("moved", "text/html"))
        .mount(&server)
        .await;

    let (fetcher, guard) = fetcher(local_test_policy());
    let target = guard.validate(&format!("{}/old", server.uri())).unwrap();

    let result = fetcher.fetch(&target).await.unwrap();
    assert_eq!(result.body, b"moved");
    assert!(result.final_url.ends_with("/new"));
}

/// Loopback is reachable by literal but not through any name that resolves
/// onto 127.0.0.1, so resolver checks can be exercised against local servers.
fn resolver_test_policy() -> SecurityPolicy {
    SecurityPolicy {
        blocked_hosts: Vec::new(),
        blocked_ranges: vec![
            AddressRange::v4(127, 0, 0, 1, 32),
            AddressRange::v6([0, 0, 0, 0, 0, 0, 0, 1], 128),
        ],
        block_loopback_literals: false,
        ..local_test_policy()
    }
}

#[tokio::test]
async fn hostname_resolving_to_blocked_address_is_refused() {
    init_logging();
    let internal = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("INTERNAL"))
        .expect(0)
        .mount(&internal)
        .await;

    let (fetcher, guard) = fetcher(resolver_test_policy());
    let port = internal.address().port();
    let target = guard
        .validate(&format!("http://localhost:{port}/admin"))
        .unwrap();

    let err = fetcher.fetch(&target).await.unwrap_err();
    assert_eq!(err.kind, FetchFailure::ResolvedToBlockedAddress);
}

#[tokio::test]
async fn redirect_to_hostname_resolving_to_blocked_address_is_refused() {
    init_logging();
    let internal = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("INTERNAL"))
        .expect(0)
        .mount(&internal)
        .await;

    let public = MockServer::builder()
        .listener(std::net::TcpListener::bind("127.0.0.2:0").unwrap())
        .start()
        .await;
    let internal_port = internal.address().port();
    Mock::given(method("GET"))
        .and(path("/hop"))
        .respond_with(ResponseTemplate::new(302).insert_header(
            "Location",
            format!("http://localhost:{internal_port}/admin").as_str(),
        ))
        .mount(&public)
        .await;

    let (fetcher, guard) = fetcher(resolver_test_policy());
    let target = guard.validate(&format!("{}/hop", public.uri())).unwrap();

    let err = fetcher.fetch(&target).await.unwrap_err();
    assert_eq!(err.kind, FetchFailure::RedirectBlocked);
}
