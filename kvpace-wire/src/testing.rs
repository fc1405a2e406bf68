//! In-memory server for tests
//!
//! [`MemoryConnector`] hands out connections to a shared [`MemoryServer`]
//! that executes the commands kvpace issues with real semantics. Commands are
//! executed when flushed, and each reply becomes available `latency` after
//! its flush.

use async_trait::async_trait;
use parking_lot::Mutex;
use redis::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::command::Command;
use crate::error::WireError;
use crate::transport::{Connection, Connector, SharedConnection};

enum Entry {
    Str(Vec<u8>),
    Hash(HashMap<Vec<u8>, Vec<u8>>),
    Set(HashSet<Vec<u8>>),
    SortedSet(HashMap<Vec<u8>, f64>),
}

const WRONG_TYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";

/// Shared keyspace executing a subset of commands
#[derive(Clone, Default)]
pub struct MemoryServer {
    data: Arc<Mutex<HashMap<Vec<u8>, Entry>>>,
    executed: Arc<AtomicUsize>,
}

impl MemoryServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of commands executed so far
    pub fn executed(&self) -> usize {
        self.executed.load(Ordering::Relaxed)
    }

    /// Number of keys currently stored
    pub fn key_count(&self) -> usize {
        self.data.lock().len()
    }

    /// Execute one command and produce its reply
    pub fn execute(&self, command: &Command) -> Result<Value, WireError> {
        self.executed.fetch_add(1, Ordering::Relaxed);
        let args = command.args();
        let mut data = self.data.lock();

        match (command.name(), args) {
            ("SET", [key, value]) => {
                data.insert(key.clone(), Entry::Str(value.clone()));
                Ok(Value::Okay)
            }
            ("GET", [key]) => match data.get(key) {
                None => Ok(Value::Nil),
                Some(Entry::Str(value)) => Ok(Value::Data(value.clone())),
                Some(_) => Err(wrong_type()),
            },
            ("EXISTS", keys) if !keys.is_empty() => Ok(Value::Int(
                keys.iter().filter(|k| data.contains_key(*k)).count() as i64,
            )),
            ("DEL", keys) if !keys.is_empty() => Ok(Value::Int(
                keys.iter().filter(|k| data.remove(*k).is_some()).count() as i64,
            )),
            ("HSET", [key, field, value]) => {
                let entry = data
                    .entry(key.clone())
                    .or_insert_with(|| Entry::Hash(HashMap::new()));
                match entry {
                    Entry::Hash(hash) => Ok(Value::Int(
                        hash.insert(field.clone(), value.clone()).is_none() as i64,
                    )),
                    _ => Err(wrong_type()),
                }
            }
            ("HGET", [key, field]) => match data.get(key) {
                None => Ok(Value::Nil),
                Some(Entry::Hash(hash)) => {
                    Ok(hash.get(field).cloned().map(Value::Data).unwrap_or(Value::Nil))
                }
                Some(_) => Err(wrong_type()),
            },
            ("HDEL", [key, fields @ ..]) if !fields.is_empty() => {
                let (removed, now_empty) = match data.get_mut(key) {
                    None => (0, false),
                    Some(Entry::Hash(hash)) => {
                        let removed = fields.iter().filter(|f| hash.remove(*f).is_some()).count();
                        (removed, hash.is_empty())
                    }
                    Some(_) => return Err(wrong_type()),
                };
                if now_empty {
                    data.remove(key);
                }
                Ok(Value::Int(removed as i64))
            }
            ("HLEN", [key]) => match data.get(key) {
                None => Ok(Value::Int(0)),
                Some(Entry::Hash(hash)) => Ok(Value::Int(hash.len() as i64)),
                Some(_) => Err(wrong_type()),
            },
            ("HGETALL", [key]) => match data.get(key) {
                None => Ok(Value::Bulk(Vec::new())),
                Some(Entry::Hash(hash)) => Ok(Value::Bulk(
                    hash.iter()
                        .flat_map(|(f, v)| [Value::Data(f.clone()), Value::Data(v.clone())])
                        .collect(),
                )),
                Some(_) => Err(wrong_type()),
            },
            ("SADD", [key, members @ ..]) if !members.is_empty() => {
                let entry = data
                    .entry(key.clone())
                    .or_insert_with(|| Entry::Set(HashSet::new()));
                match entry {
                    Entry::Set(set) => Ok(Value::Int(
                        members.iter().filter(|m| set.insert((*m).clone())).count() as i64,
                    )),
                    _ => Err(wrong_type()),
                }
            }
            ("SCARD", [key]) => match data.get(key) {
                None => Ok(Value::Int(0)),
                Some(Entry::Set(set)) => Ok(Value::Int(set.len() as i64)),
                Some(_) => Err(wrong_type()),
            },
            ("SMEMBERS", [key]) => match data.get(key) {
                None => Ok(Value::Bulk(Vec::new())),
                Some(Entry::Set(set)) => Ok(Value::Bulk(
                    set.iter().map(|m| Value::Data(m.clone())).collect(),
                )),
                Some(_) => Err(wrong_type()),
            },
            ("ZADD", [key, score, member]) => {
                let score = parse_score(score)?;
                let entry = data
                    .entry(key.clone())
                    .or_insert_with(|| Entry::SortedSet(HashMap::new()));
                match entry {
                    Entry::SortedSet(zset) => Ok(Value::Int(
                        zset.insert(member.clone(), score).is_none() as i64,
                    )),
                    _ => Err(wrong_type()),
                }
            }
            ("ZCARD", [key]) => match data.get(key) {
                None => Ok(Value::Int(0)),
                Some(Entry::SortedSet(zset)) => Ok(Value::Int(zset.len() as i64)),
                Some(_) => Err(wrong_type()),
            },
            ("ZCOUNT", [key, min, max]) => {
                let (min, max) = (parse_score(min)?, parse_score(max)?);
                match data.get(key) {
                    None => Ok(Value::Int(0)),
                    Some(Entry::SortedSet(zset)) => Ok(Value::Int(
                        zset.values().filter(|s| **s >= min && **s <= max).count() as i64,
                    )),
                    Some(_) => Err(wrong_type()),
                }
            }
            ("ZRANGEBYSCORE", [key, min, max]) => {
                let (min, max) = (parse_score(min)?, parse_score(max)?);
                match data.get(key) {
                    None => Ok(Value::Bulk(Vec::new())),
                    Some(Entry::SortedSet(zset)) => {
                        let mut members: Vec<(&Vec<u8>, f64)> = zset
                            .iter()
                            .filter(|(_, s)| **s >= min && **s <= max)
                            .map(|(m, s)| (m, *s))
                            .collect();
                        members.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));
                        Ok(Value::Bulk(
                            members.into_iter().map(|(m, _)| Value::Data(m.clone())).collect(),
                        ))
                    }
                    Some(_) => Err(wrong_type()),
                }
            }
            (name, _) => Err(WireError::ServerError(format!(
                "ERR unknown command or wrong number of arguments for '{}'",
                name
            ))),
        }
    }
}

fn wrong_type() -> WireError {
    WireError::ServerError(WRONG_TYPE.to_string())
}

fn parse_score(raw: &[u8]) -> Result<f64, WireError> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| WireError::ServerError("ERR value is not a valid float".to_string()))
}

type Reply = (Instant, Result<Value, WireError>);

/// Connection to a [`MemoryServer`]
pub struct MemoryConnection {
    server: MemoryServer,
    latency: Duration,
    pending: Mutex<Vec<Command>>,
    replies_tx: mpsc::UnboundedSender<Reply>,
    replies_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Reply>>,
    closed: AtomicBool,
}

impl MemoryConnection {
    pub fn new(server: MemoryServer, latency: Duration) -> Self {
        let (replies_tx, replies_rx) = mpsc::unbounded_channel();
        Self {
            server,
            latency,
            pending: Mutex::new(Vec::new()),
            replies_tx,
            replies_rx: tokio::sync::Mutex::new(replies_rx),
            closed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn send(&self, command: &Command) -> Result<(), WireError> {
        if self.is_broken() {
            return Err(WireError::ConnectionClosed);
        }
        self.pending.lock().push(command.clone());
        Ok(())
    }

    async fn flush(&self) -> Result<(), WireError> {
        if self.is_broken() {
            return Err(WireError::ConnectionClosed);
        }
        let commands = std::mem::take(&mut *self.pending.lock());
        let ready_at = Instant::now() + self.latency;
        for command in &commands {
            let reply = self.server.execute(command);
            self.replies_tx
                .send((ready_at, reply))
                .map_err(|_| WireError::ConnectionClosed)?;
        }
        Ok(())
    }

    async fn receive(&self) -> Result<Value, WireError> {
        if self.is_broken() {
            return Err(WireError::ConnectionClosed);
        }
        let mut replies = self.replies_rx.lock().await;
        let (ready_at, reply) = replies.recv().await.ok_or(WireError::ConnectionClosed)?;
        tokio::time::sleep_until(ready_at).await;
        reply
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    fn is_broken(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Connector for a [`MemoryServer`], optionally refusing every dial
#[derive(Clone)]
pub struct MemoryConnector {
    server: MemoryServer,
    latency: Duration,
    refuse: bool,
    dials: Arc<AtomicUsize>,
}

impl MemoryConnector {
    pub fn new(server: MemoryServer) -> Self {
        Self {
            server,
            latency: Duration::ZERO,
            refuse: false,
            dials: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Delay every reply by `latency` after its flush
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// A connector whose every dial fails
    pub fn unreachable() -> Self {
        Self {
            refuse: true,
            ..Self::new(MemoryServer::new())
        }
    }

    /// Number of dial attempts so far, failed ones included
    pub fn dial_count(&self) -> usize {
        self.dials.load(Ordering::Relaxed)
    }

    pub fn server(&self) -> &MemoryServer {
        &self.server
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn dial(
        &self,
        address: &str,
        _connect_timeout: Duration,
    ) -> Result<SharedConnection, WireError> {
        self.dials.fetch_add(1, Ordering::Relaxed);
        if self.refuse {
            return Err(WireError::ConnectError(format!(
                "{}: connection refused",
                address
            )));
        }
        Ok(Arc::new(MemoryConnection::new(
            self.server.clone(),
            self.latency,
        )))
    }
}
