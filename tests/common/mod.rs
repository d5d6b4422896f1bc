//! One-shot local HTTP server for exercising the blocking API clients.

#![allow(dead_code)]

use std::{
    io::{Read, Write},
    net::{TcpListener, TcpStream},
    thread::{self, JoinHandle},
};

/// Raw request received by [`serve_once`].
pub struct Recorded {
    pub head: String,
    pub body: String,
}

impl Recorded {
    /// Value of header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim())
        })
    }

    /// Request line, e.g. `POST /v2/upload HTTP/1.1`.
    pub fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or_default()
    }
}

/// Accept a single connection, answer it with `status` and a JSON `body`,
/// and hand back what the client sent.
///
/// Returns the base URL to point a client at.
pub fn serve_once(status: &str, body: &str) -> (String, JoinHandle<Recorded>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind test server");
    let address = listener.local_addr().expect("Listener has an address");
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("Client should connect");
        let recorded = read_request(&mut stream);
        stream
            .write_all(response.as_bytes())
            .expect("Failed to write response");
        recorded
    });
    (format!("http://{address}"), handle)
}

fn read_request(stream: &mut TcpStream) -> Recorded {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let read = stream.read(&mut chunk).expect("Failed to read request");
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);

        let Some(end) = buffer.windows(4).position(|window| window == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buffer[..end]).into_owned();
        let partial = Recorded {
            head,
            body: String::new(),
        };
        let length: usize = partial
            .header("content-length")
            .and_then(|value| value.parse().ok())
            .unwrap_or(0);
        if buffer.len() >= end + 4 + length {
            return Recorded {
                head: partial.head,
                body: String::from_utf8_lossy(&buffer[end + 4..end + 4 + length]).into_owned(),
            };
        }
    }
    Recorded {
        head: String::from_utf8_lossy(&buffer).into_owned(),
        body: String::new(),
    }
}
