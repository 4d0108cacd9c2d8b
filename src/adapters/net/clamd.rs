//! ClamAV daemon client speaking the `zINSTREAM` command over TCP.
//!
//! ```text
//! -> "zINSTREAM\0"
//! -> <u32 big-endian length><chunk> ... <0u32>
//! <- "stream: OK\0" | "stream: <signature> FOUND\0" | "... ERROR\0"
//! ```

use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::ports::{ScanError, ScanVerdict, VirusScanner};

const CHUNK_SIZE: usize = 8 * 1024;

pub struct ClamdScanner {
    address: String,
    timeout: Duration,
}

impl ClamdScanner {
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            timeout,
        }
    }

    async fn exchange(&self, content: &[u8]) -> Result<String, ScanError> {
        let mut stream = TcpStream::connect(&self.address)
            .await
            .map_err(|e| ScanError::Unreachable(e.to_string()))?;

        stream.write_all(b"zINSTREAM\0").await.map_err(protocol)?;
        for chunk in content.chunks(CHUNK_SIZE) {
            stream
                .write_all(&(chunk.len() as u32).to_be_bytes())
                .await
                .map_err(protocol)?;
            stream.write_all(chunk).await.map_err(protocol)?;
        }
        stream.write_all(&0u32.to_be_bytes()).await.map_err(protocol)?;
        stream.flush().await.map_err(protocol)?;

        let mut reply = Vec::new();
        stream.read_to_end(&mut reply).await.map_err(protocol)?;
        Ok(String::from_utf8_lossy(&reply)
            .trim_end_matches(['\0', '\n'])
            .to_string())
    }
}

fn protocol(err: std::io::Error) -> ScanError {
    ScanError::Protocol(err.to_string())
}

/// Interprets a clamd reply line.
pub(crate) fn parse_reply(reply: &str) -> Result<ScanVerdict, ScanError> {
    let body = reply.strip_prefix("stream:").unwrap_or(reply).trim();

    if let Some(signature) = body.strip_suffix("FOUND") {
        return Ok(ScanVerdict::Infected {
            signature: signature.trim().to_string(),
        });
    }
    if body == "OK" {
        return Ok(ScanVerdict::Clean);
    }
    Err(ScanError::Protocol(format!("unexpected reply: {}", reply)))
}

#[async_trait]
impl VirusScanner for ClamdScanner {
    async fn scan(&self, content: &[u8]) -> Result<ScanVerdict, ScanError> {
        let reply = timeout(self.timeout, self.exchange(content))
            .await
            .map_err(|_| ScanError::Unreachable("scan timed out".to_string()))??;

        tracing::debug!(address = %self.address, reply = %reply, "clamd replied");
        parse_reply(&reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// Minimal clamd stand-in: reads the stream, answers with `reply`.
    async fn fake_clamd(reply: &'static [u8]) -> (String, tokio::task::JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut command = [0u8; 10];
            socket.read_exact(&mut command).await.unwrap();
            assert_eq!(&command, b"zINSTREAM\0");

            let mut received = Vec::new();
            loop {
                let len = socket.read_u32().await.unwrap() as usize;
                if len == 0 {
                    break;
                }
                let mut chunk = vec![0u8; len];
                socket.read_exact(&mut chunk).await.unwrap();
                received.extend_from_slice(&chunk);
            }
            socket.write_all(reply).await.unwrap();
            received
        });
        (addr, handle)
    }

    #[tokio::test]
    async fn detection_is_reported_as_infected() {
        let (addr, server) = fake_clamd(b"stream: Eicar-Test-Signature FOUND\0").await;
        let scanner = ClamdScanner::new(addr, Duration::from_secs(2));

        let verdict = scanner.scan(b"payload").await.unwrap();

        assert_eq!(
            verdict,
            ScanVerdict::Infected {
                signature: "Eicar-Test-Signature".to_string()
            }
        );
        assert_eq!(server.await.unwrap(), b"payload");
    }

    #[tokio::test]
    async fn large_content_is_chunked() {
        let (addr, server) = fake_clamd(b"stream: OK\0").await;
        let scanner = ClamdScanner::new(addr, Duration::from_secs(2));
        let content = vec![7u8; CHUNK_SIZE * 2 + 5];

        assert_eq!(scanner.scan(&content).await.unwrap(), ScanVerdict::Clean);
        assert_eq!(server.await.unwrap(), content);
    }

    #[tokio::test]
    async fn closed_port_is_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let err = ClamdScanner::new(addr, Duration::from_secs(2))
            .scan(b"x")
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::Unreachable(_)));
    }

    #[test]
    fn error_reply_is_protocol_error() {
        assert!(matches!(
            parse_reply("INSTREAM size limit exceeded. ERROR"),
            Err(ScanError::Protocol(_))
        ));
    }
}
