use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("could not connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },
    #[error("connection closed by server")]
    Closed,
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
}

/// One persistent connection delivering newline-terminated text lines.
///
/// Exactly one line is in flight at a time; callers alternate
/// `send_line`/`receive_line` and never pipeline.
#[async_trait]
pub trait LineTransport {
    async fn send_line(&mut self, line: &str) -> Result<(), TransportError>;
    async fn receive_line(&mut self) -> Result<String, TransportError>;
    async fn close(&mut self);
}

/// TCP transport for the game server. The connection is established on
/// first use, not at construction.
pub struct TcpLineTransport {
    addr: String,
    stream: Option<TcpStream>,
    buf: BytesMut,
}

impl TcpLineTransport {
    pub fn new(host: &str, port: u16) -> Self {
        TcpLineTransport {
            addr: format!("{}:{}", host, port),
            stream: None,
            buf: BytesMut::with_capacity(2048),
        }
    }

    async fn connect_if_needed(&mut self) -> Result<(), TransportError> {
        if self.stream.is_none() {
            let stream =
                TcpStream::connect(&self.addr)
                    .await
                    .map_err(|source| TransportError::Connect {
                        addr: self.addr.clone(),
                        source,
                    })?;
            info!(addr = %self.addr, "connected to game server");
            self.stream = Some(stream);
        }
        Ok(())
    }
}

#[async_trait]
impl LineTransport for TcpLineTransport {
    async fn send_line(&mut self, line: &str) -> Result<(), TransportError> {
        self.connect_if_needed().await?;
        let Some(stream) = self.stream.as_mut() else {
            return Err(TransportError::Closed);
        };
        let mut payload = Vec::with_capacity(line.len() + 1);
        payload.extend_from_slice(line.as_bytes());
        payload.push(b'\n');
        stream.write_all(&payload).await?;
        debug!("--> {}", line);
        Ok(())
    }

    async fn receive_line(&mut self) -> Result<String, TransportError> {
        self.connect_if_needed().await?;
        loop {
            if let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
                let raw = self.buf.split_to(pos + 1);
                let line = decode_line(&raw[..raw.len() - 1]);
                debug!("<-- {}", line);
                return Ok(line);
            }
            let Some(stream) = self.stream.as_mut() else {
                return Err(TransportError::Closed);
            };
            let read = stream.read_buf(&mut self.buf).await?;
            if read == 0 {
                return Err(TransportError::Closed);
            }
        }
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                warn!("error while closing connection: {}", e);
            } else {
                info!("connection closed");
            }
        }
    }
}

/// Lines are UTF-8; a server occasionally emits accented bytes in a
/// single-byte encoding, so decoding falls back to Latin-1, which maps
/// every byte to the code point of the same value.
fn decode_line(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_owned(),
        Err(_) => {
            warn!("line is not valid UTF-8, decoding as Latin-1");
            bytes.iter().map(|&b| b as char).collect()
        }
    }
}

#[cfg(test)]
pub mod testing {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::{LineTransport, TransportError};

    /// Transport fed from a fixed reply script, recording every sent
    /// line. Clones share the script and the log, so a test can keep a
    /// handle while the session owns another.
    #[derive(Clone, Default)]
    pub struct ScriptedTransport {
        replies: Arc<Mutex<VecDeque<String>>>,
        sent: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedTransport {
        pub fn new(replies: &[&str]) -> Self {
            let transport = ScriptedTransport::default();
            for reply in replies {
                transport.push_reply(reply);
            }
            transport
        }

        pub fn push_reply(&self, line: &str) {
            self.replies.lock().unwrap().push_back(line.to_owned());
        }

        pub fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LineTransport for ScriptedTransport {
        async fn send_line(&mut self, line: &str) -> Result<(), TransportError> {
            self.sent.lock().unwrap().push(line.to_owned());
            Ok(())
        }

        /// An exhausted script behaves like a server that closed the
        /// connection.
        async fn receive_line(&mut self) -> Result<String, TransportError> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or(TransportError::Closed)
        }

        async fn close(&mut self) {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn decode_line_utf8() {
        assert_eq!(decode_line("DEBUT_TOUR|X|2".as_bytes()), "DEBUT_TOUR|X|2");
    }

    #[test]
    fn decode_line_falls_back_to_latin1() {
        // "équipe" in Latin-1; 0xE9 is not valid UTF-8 on its own.
        let bytes = [0xE9u8, b'q', b'u', b'i', b'p', b'e'];
        assert_eq!(decode_line(&bytes), "équipe");
    }

    #[tokio::test]
    async fn receive_line_handles_split_and_coalesced_lines() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            // Two lines in one write, then one line split across writes.
            socket.write_all(b"OK|1\nDEBUT_TOUR|X|0\n").await.unwrap();
            socket.write_all(b"FI").await.unwrap();
            socket.write_all(b"N\n").await.unwrap();
        });

        let mut transport = TcpLineTransport::new(&addr.ip().to_string(), addr.port());
        assert_eq!(transport.receive_line().await.unwrap(), "OK|1");
        assert_eq!(transport.receive_line().await.unwrap(), "DEBUT_TOUR|X|0");
        assert_eq!(transport.receive_line().await.unwrap(), "FIN");
        assert!(matches!(
            transport.receive_line().await,
            Err(TransportError::Closed)
        ));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn send_line_appends_newline() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            while !buf.ends_with(b"\n") {
                let mut chunk = [0u8; 32];
                let n = socket.read(&mut chunk).await.unwrap();
                assert_ne!(n, 0, "peer closed before sending a full line");
                buf.extend_from_slice(&chunk[..n]);
            }
            buf
        });

        let mut transport = TcpLineTransport::new(&addr.ip().to_string(), addr.port());
        transport.send_line("PIOCHER|3").await.unwrap();
        transport.close().await;

        assert_eq!(server.await.unwrap(), b"PIOCHER|3\n");
    }
}
