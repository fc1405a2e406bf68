//! End-to-end run over real TCP against a small RESP server
//!
//! The server parses pipelined commands off the socket and executes them on
//! the in-memory keyspace, so the whole path from the TCP transport through
//! the reply codec is exercised.

use kvpace_config::{KvpaceConfig, TargetConfig, WorkloadConfig};
use kvpace_core::{Engine, LoadError};
use kvpace_wire::testing::MemoryServer;
use kvpace_wire::{Command, TcpConnector, Value, WireError};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

const COMMANDS: &[&str] = &[
    "SET", "GET", "EXISTS", "DEL", "HSET", "HGET", "HDEL", "HLEN", "HGETALL", "SADD", "SCARD",
    "SMEMBERS", "ZADD", "ZCARD", "ZCOUNT", "ZRANGEBYSCORE",
];

async fn read_line<R: AsyncBufReadExt + Unpin>(reader: &mut R) -> Option<Vec<u8>> {
    let mut line = Vec::new();
    let n = reader.read_until(b'\n', &mut line).await.ok()?;
    if n == 0 {
        return None;
    }
    line.truncate(line.len().saturating_sub(2));
    Some(line)
}

fn parse_len(header: &[u8], kind: u8) -> Option<usize> {
    let (first, rest) = header.split_first()?;
    if *first != kind {
        return None;
    }
    std::str::from_utf8(rest).ok()?.parse().ok()
}

/// Read one `*N` array of bulk strings and turn it into a command
async fn read_command<R: AsyncBufReadExt + Unpin>(reader: &mut R) -> Option<Command> {
    let count = parse_len(&read_line(reader).await?, b'*')?;
    let mut parts = Vec::with_capacity(count);
    for _ in 0..count {
        let len = parse_len(&read_line(reader).await?, b'$')?;
        let mut buf = vec![0u8; len + 2];
        reader.read_exact(&mut buf).await.ok()?;
        buf.truncate(len);
        parts.push(buf);
    }

    let (name, args) = parts.split_first()?;
    let name = COMMANDS.iter().find(|c| c.as_bytes() == name.as_slice())?;
    Some(
        args.iter()
            .fold(Command::new(*name), |cmd, arg| cmd.arg(arg.as_slice())),
    )
}

fn encode(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Nil => out.extend_from_slice(b"$-1\r\n"),
        Value::Int(n) => out.extend_from_slice(format!(":{}\r\n", n).as_bytes()),
        Value::Okay => out.extend_from_slice(b"+OK\r\n"),
        Value::Status(s) => out.extend_from_slice(format!("+{}\r\n", s).as_bytes()),
        Value::Data(bytes) => {
            out.extend_from_slice(format!("${}\r\n", bytes.len()).as_bytes());
            out.extend_from_slice(bytes);
            out.extend_from_slice(b"\r\n");
        }
        Value::Bulk(items) => {
            out.extend_from_slice(format!("*{}\r\n", items.len()).as_bytes());
            for item in items {
                encode(item, out);
            }
        }
    }
}

async fn serve_connection(socket: TcpStream, server: MemoryServer) {
    let (read_half, mut write_half) = socket.into_split();
    let mut reader = BufReader::new(read_half);
    while let Some(command) = read_command(&mut reader).await {
        let mut out = Vec::new();
        match server.execute(&command) {
            Ok(value) => encode(&value, &mut out),
            Err(WireError::ServerError(message)) => {
                out.extend_from_slice(format!("-{}\r\n", message).as_bytes())
            }
            Err(_) => return,
        }
        if write_half.write_all(&out).await.is_err() {
            return;
        }
    }
}

async fn spawn_server(server: MemoryServer) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(serve_connection(socket, server.clone()));
        }
    });
    address
}

fn config(address: String) -> KvpaceConfig {
    KvpaceConfig {
        target: TargetConfig {
            address,
            workers: 2,
            rate: 1000,
            reconnect_after: 200,
            ..TargetConfig::default()
        },
        workload: WorkloadConfig {
            key_num: 500,
            hash_num: 50,
            set_num: 50,
            sorted_set_num: 50,
            value_len: 24,
            ..WorkloadConfig::default()
        },
        ..KvpaceConfig::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_load_over_tcp() {
    let server = MemoryServer::new();
    let address = spawn_server(server.clone()).await;

    let mut run = Engine::new(config(address), Arc::new(TcpConnector::new()))
        .unwrap()
        .start()
        .unwrap();

    let mut total = 0;
    for _ in 0..2 {
        let snapshot = tokio::time::timeout(Duration::from_secs(5), run.next_snapshot())
            .await
            .expect("snapshot within 5s")
            .unwrap();
        assert_eq!(snapshot.expected, 1000);
        assert_eq!(snapshot.errors, 0, "{:?}", snapshot);
        total += snapshot.ops;
    }

    // Loose bound, wall-clock ticks can be skipped on a busy machine
    assert!(total > 500, "total ops {}", total);
    assert!(server.executed() as u64 >= total);
}

#[tokio::test]
async fn test_refused_connections_are_fatal() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    drop(listener);

    let mut run = Engine::new(config(address.clone()), Arc::new(TcpConnector::new()))
        .unwrap()
        .start()
        .unwrap();

    let err = tokio::time::timeout(Duration::from_secs(5), run.next_snapshot())
        .await
        .expect("fatal error within 5s")
        .unwrap_err();
    match err {
        LoadError::Unreachable {
            address: reported,
            workers,
            source,
        } => {
            assert_eq!(reported, address);
            assert_eq!(workers, 2);
            assert!(source.is_connect());
        }
        other => panic!("expected unreachable, got {:?}", other),
    }
}
