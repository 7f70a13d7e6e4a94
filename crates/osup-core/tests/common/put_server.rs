//! Minimal HTTP/1.1 server that accepts PUT and HEAD for integration tests.
//!
//! Stores every PUT body by request path. In `Reject` mode every request is
//! answered with the configured status and XML error document instead.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub type Objects = Arc<Mutex<HashMap<String, Vec<u8>>>>;

#[derive(Debug, Clone, Copy)]
pub enum ServerMode {
    Accept,
    /// Answer with `status` and an S3-style error document carrying `code`.
    Reject { status: u16, code: &'static str },
}

/// Starts a server in a background thread. Returns the endpoint URL
/// (e.g. "http://127.0.0.1:12345/bucket") and the stored objects.
pub fn start(mode: ServerMode) -> (String, Objects) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let objects: Objects = Arc::new(Mutex::new(HashMap::new()));
    let store = Arc::clone(&objects);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let store = Arc::clone(&store);
            thread::spawn(move || handle(stream, mode, &store));
        }
    });
    (format!("http://127.0.0.1:{}/bucket", port), objects)
}

fn handle(mut stream: TcpStream, mode: ServerMode, objects: &Objects) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));

    let mut data = Vec::new();
    let mut buf = [0u8; 8192];
    let header_end = loop {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => data.extend_from_slice(&buf[..n]),
        }
        if let Some(pos) = find(&data, b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&data[..header_end]).to_string();
    let (method, path, content_length) = parse_head(&head);

    let mut body = data[header_end..].to_vec();
    while body.len() < content_length {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => body.extend_from_slice(&buf[..n]),
        }
    }

    if let ServerMode::Reject { status, code } = mode {
        let doc = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Error><Code>{}</Code><Message>rejected</Message></Error>",
            code
        );
        let response = format!(
            "HTTP/1.1 {} Error\r\nContent-Type: application/xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            doc.len(),
            if method == "HEAD" { "" } else { doc.as_str() }
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }

    if method == "PUT" {
        objects.lock().unwrap().insert(path, body);
    }
    let _ = stream.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Returns (method, path, content length).
fn parse_head(head: &str) -> (String, String, usize) {
    let mut lines = head.lines();
    let mut first = lines.next().unwrap_or("").split_whitespace();
    let method = first.next().unwrap_or("").to_string();
    let path = first.next().unwrap_or("").to_string();
    let mut content_length = 0;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }
    (method, path, content_length)
}
