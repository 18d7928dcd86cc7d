//! Integration tests for the HTTP history loader.
//!
//! Each test serves one canned response from a local socket and checks what
//! the loader requested and how it mapped the reply.

use dover_app::{HistoryError, HistoryLoader};
use dover_client::HttpHistoryLoader;
use dover_proto::{RawTimestamp, Room};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    task::JoinHandle,
};

/// Serve one response; the join handle yields the request line.
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.unwrap();

        String::from_utf8_lossy(&request).lines().next().unwrap_or_default().to_string()
    });

    (base, handle)
}

#[tokio::test]
async fn lists_rooms_from_pairs() {
    let (base, server) = serve_once("200 OK", r#"[["r1","General"],["r2","Random"]]"#).await;
    let loader = HttpHistoryLoader::new(&base).unwrap();

    let rooms = loader.list_rooms().await.unwrap();

    assert_eq!(rooms, vec![Room::new("r1", "General"), Room::new("r2", "Random")]);
    assert_eq!(server.await.unwrap(), "GET /userrooms HTTP/1.1");
}

#[tokio::test]
async fn lists_rooms_from_bare_names() {
    let (base, _server) = serve_once("200 OK", r#"["lobby","ops"]"#).await;
    let loader = HttpHistoryLoader::new(&base).unwrap();

    let rooms = loader.list_rooms().await.unwrap();

    assert_eq!(rooms, vec![Room::new("lobby", "lobby"), Room::new("ops", "ops")]);
}

#[tokio::test]
async fn fetches_history_with_limit() {
    let body = r#"[{"user_screen_name":"ana","created_at":1600000000000,"message_text":"hi"}]"#;
    let (base, server) = serve_once("200 OK", body).await;
    let loader = HttpHistoryLoader::new(&base).unwrap();

    let messages = loader.last_messages(&"r1".into(), 20).await.unwrap();

    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].author.as_deref(), Some("ana"));
    assert_eq!(messages[0].timestamp, Some(RawTimestamp::Integer(1_600_000_000_000)));
    assert_eq!(messages[0].text, "hi");
    assert_eq!(server.await.unwrap(), "GET /last-msgs?room_code=r1&n=20 HTTP/1.1");
}

#[tokio::test]
async fn error_status_is_reported_with_endpoint() {
    let (base, _server) = serve_once("503 Service Unavailable", "").await;
    let loader = HttpHistoryLoader::new(&base).unwrap();

    assert_eq!(
        loader.list_rooms().await,
        Err(HistoryError::Status { endpoint: "/userrooms".into(), status: 503 })
    );
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let (base, _server) = serve_once("200 OK", r#"{"rooms":[]}"#).await;
    let loader = HttpHistoryLoader::new(&base).unwrap();

    let result = loader.last_messages(&"r1".into(), 20).await;

    assert!(matches!(result, Err(HistoryError::Decode(_))), "{result:?}");
}

#[tokio::test]
async fn refused_connection_is_a_request_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let loader = HttpHistoryLoader::new(&base).unwrap();
    let result = loader.list_rooms().await;

    assert!(matches!(result, Err(HistoryError::Request(_))), "{result:?}");
}
