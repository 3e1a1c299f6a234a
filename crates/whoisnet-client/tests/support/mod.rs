#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use whoisnet_client::{BoxedStream, CancellationToken, TcpConnector};

/// One request seen by a scripted server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub host: String,
    pub port: u16,
    pub line: String,
}

/// In-memory WHOIS servers keyed by host
///
/// Each host answers from its script in order; the last entry repeats.
/// Unknown hosts refuse the connection.
#[derive(Default)]
pub struct ScriptedConnector {
    scripts: Mutex<HashMap<String, Vec<String>>>,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(self, host: &str, response: &str) -> Self {
        self.serve_sequence(host, &[response])
    }

    pub fn serve_sequence(self, host: &str, responses: &[&str]) -> Self {
        self.scripts.lock().unwrap().insert(
            host.to_string(),
            responses.iter().map(|r| r.to_string()).collect(),
        );
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, host: &str) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|r| r.host == host)
            .map(|r| r.line)
            .collect()
    }

    fn next_response(&self, host: &str) -> Option<String> {
        let mut scripts = self.scripts.lock().unwrap();
        let script = scripts.get_mut(host)?;
        if script.len() > 1 {
            Some(script.remove(0))
        } else {
            script.first().cloned()
        }
    }
}

#[async_trait]
impl TcpConnector for ScriptedConnector {
    async fn connect(
        &self,
        host: &str,
        port: u16,
        _cancel: &CancellationToken,
    ) -> io::Result<BoxedStream> {
        let response = self.next_response(host).ok_or_else(|| {
            io::Error::new(io::ErrorKind::ConnectionRefused, format!("no server at {host}"))
        })?;

        let (client, server) = tokio::io::duplex(4096);
        let requests = Arc::clone(&self.requests);
        let host = host.to_string();

        tokio::spawn(async move {
            let mut server = BufReader::new(server);
            let mut line = String::new();
            if server.read_line(&mut line).await.is_err() {
                return;
            }
            requests.lock().unwrap().push(Request {
                host,
                port,
                line: line.trim_end_matches("\r\n").to_string(),
            });
            let _ = server.get_mut().write_all(response.as_bytes()).await;
            let _ = server.get_mut().shutdown().await;
        });

        Ok(Box::new(client))
    }
}

/// How a loopback mock server treats each connection
#[derive(Clone)]
pub enum Behavior {
    /// Read the request, write the chunks with a pause between, close
    Respond(Vec<Vec<u8>>),
    /// Read the request, then stay silent until the client leaves
    Silent,
    /// Drop the connection right after accepting it
    Hangup,
}

/// Loopback TCP WHOIS server
pub struct MockServer {
    pub port: u16,
    accepted: Arc<AtomicUsize>,
}

impl MockServer {
    pub async fn start(behavior: Behavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&accepted);

        tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    return;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                let behavior = behavior.clone();
                tokio::spawn(async move { handle(socket, behavior).await });
            }
        });

        Self { port, accepted }
    }

    pub async fn respond(text: &str) -> Self {
        Self::start(Behavior::Respond(vec![text.as_bytes().to_vec()])).await
    }

    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}

async fn handle(socket: tokio::net::TcpStream, behavior: Behavior) {
    if matches!(behavior, Behavior::Hangup) {
        drop(socket);
        return;
    }

    let mut socket = BufReader::new(socket);
    let mut line = String::new();
    if socket.read_line(&mut line).await.is_err() {
        return;
    }

    match behavior {
        Behavior::Respond(chunks) => {
            for chunk in chunks {
                if socket.get_mut().write_all(&chunk).await.is_err() {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            let _ = socket.get_mut().shutdown().await;
        }
        Behavior::Silent => {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        Behavior::Hangup => {}
    }
}
