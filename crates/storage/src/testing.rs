//! A minimal in-process RESP server for pool and store tests.
//!
//! Every accepted connection gets an id in accept order, which `CONNID`
//! returns so tests can tell pooled connections apart.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

pub(crate) struct Responder {
    addr: String,
    fail_ping: Arc<AtomicBool>,
}

impl Responder {
    pub(crate) async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let fail_ping = Arc::new(AtomicBool::new(false));

        let flag = fail_ping.clone();
        tokio::spawn(async move {
            let next_id = AtomicI64::new(0);
            while let Ok((stream, _)) = listener.accept().await {
                let id = next_id.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(serve(stream, id, flag.clone()));
            }
        });

        Self { addr, fail_ping }
    }

    pub(crate) fn addr(&self) -> &str {
        &self.addr
    }

    /// Answer `PING` with an error from now on.
    pub(crate) fn fail_ping(&self) {
        self.fail_ping.store(true, Ordering::SeqCst);
    }
}

async fn serve(stream: TcpStream, id: i64, fail_ping: Arc<AtomicBool>) {
    let mut stream = BufReader::new(stream);
    while let Some(args) = read_command(&mut stream).await {
        let name = args.first().map(|a| a.to_ascii_uppercase()).unwrap_or_default();
        let reply = match name.as_str() {
            "PING" if fail_ping.load(Ordering::SeqCst) => "-ERR ping refused\r\n".to_string(),
            "PING" => "+PONG\r\n".to_string(),
            "GEOADD" => ":1\r\n".to_string(),
            "GEORADIUS" => "*2\r\n$1\r\na\r\n$1\r\nb\r\n".to_string(),
            "CONNID" => format!(":{}\r\n", id),
            "WRONGTYPE" => {
                "-WRONGTYPE Operation against a key holding the wrong kind of value\r\n".to_string()
            }
            _ => "+OK\r\n".to_string(),
        };
        if stream.get_mut().write_all(reply.as_bytes()).await.is_err() {
            break;
        }
    }
}

/// Read one command sent as an array of bulk strings.
async fn read_command(stream: &mut BufReader<TcpStream>) -> Option<Vec<String>> {
    let mut line = String::new();
    if stream.read_line(&mut line).await.ok()? == 0 {
        return None;
    }
    let argc: usize = line.trim_end().strip_prefix('*')?.parse().ok()?;

    let mut args = Vec::with_capacity(argc);
    for _ in 0..argc {
        line.clear();
        stream.read_line(&mut line).await.ok()?;
        let len: usize = line.trim_end().strip_prefix('$')?.parse().ok()?;
        let mut buf = vec![0u8; len + 2];
        stream.read_exact(&mut buf).await.ok()?;
        buf.truncate(len);
        args.push(String::from_utf8_lossy(&buf).into_owned());
    }
    Some(args)
}
