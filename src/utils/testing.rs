//! Throwaway HTTP/1.1 server for client tests.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// One canned response.
pub struct Canned {
    status: u16,
    content_type: &'static str,
    body: &'static str,
}

impl Canned {
    pub fn json(status: u16, body: &'static str) -> Self {
        Self {
            status,
            content_type: "application/json",
            body,
        }
    }

    pub fn xml(status: u16, body: &'static str) -> Self {
        Self {
            status,
            content_type: "application/xml",
            body,
        }
    }

    pub fn text(status: u16, content_type: &'static str, body: &'static str) -> Self {
        Self {
            status,
            content_type,
            body,
        }
    }

    pub fn empty(status: u16) -> Self {
        Self::text(status, "text/plain", "")
    }
}

/// A request as received.
#[derive(Debug, Clone)]
pub struct Seen {
    /// e.g. `GET /events?type=3 HTTP/1.1`
    pub line: String,
    pub body: Vec<u8>,
}

impl Seen {
    pub fn body_contains(&self, needle: &[u8]) -> bool {
        self.body.windows(needle.len()).any(|w| w == needle)
    }
}

fn header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|i| i + 4)
}

fn header_value(head: &str, name: &str) -> Option<String> {
    head.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim().to_ascii_lowercase())
    })
}

/// Serve one canned response per connection, in order.
///
/// Returns the base URL and a handle resolving to the requests seen.
pub async fn serve(responses: Vec<Canned>) -> (String, JoinHandle<Vec<Seen>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let mut seen = Vec::new();
        for canned in responses {
            let (mut socket, _) = listener.accept().await.unwrap();

            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            let end = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break buf.len();
                }
                buf.extend_from_slice(&chunk[..n]);
                if let Some(end) = header_end(&buf) {
                    break end;
                }
            };
            let head = String::from_utf8_lossy(&buf[..end]).to_string();

            if header_value(&head, "expect").as_deref() == Some("100-continue") {
                socket.write_all(b"HTTP/1.1 100 Continue\r\n\r\n").await.unwrap();
            }

            // drain the body so closing the socket does not reset the client
            let length = header_value(&head, "content-length").and_then(|v| v.parse::<usize>().ok());
            let chunked = header_value(&head, "transfer-encoding").as_deref() == Some("chunked");
            loop {
                let body = &buf[end..];
                let done = match length {
                    Some(length) => body.len() >= length,
                    None if chunked => body.ends_with(b"\r\n\r\n"),
                    None => true,
                };
                if done {
                    break;
                }
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }

            seen.push(Seen {
                line: head.lines().next().unwrap_or_default().to_string(),
                body: buf[end..].to_vec(),
            });

            let head_only = head.starts_with("HEAD ");
            let response = format!(
                "HTTP/1.1 {} Canned\r\ncontent-type: {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                canned.status,
                canned.content_type,
                canned.body.len(),
                if head_only { "" } else { canned.body }
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        }
        seen
    });

    (format!("http://{addr}"), handle)
}
