//! Operation templates: short command sequences checked as one transaction

use kvpace_wire::Command;

use super::keys::KeyGenerator;
use crate::request::{Check, CountSlot, OperationRequest};

/// Data structure a template exercises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Key,
    Hash,
    Set,
    SortedSet,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Key,
        Category::Hash,
        Category::Set,
        Category::SortedSet,
    ];

    /// Relative share of batches drawn from this category
    pub fn weight(self) -> u32 {
        match self {
            Category::Key => 5,
            Category::Hash => 2,
            Category::Set => 1,
            Category::SortedSet => 1,
        }
    }

    /// Templates of this category with their weights
    pub fn templates(self) -> &'static [(Template, u32)] {
        match self {
            Category::Key => &[(Template::SetGet, 10), (Template::SetExistsDel, 3)],
            Category::Hash => &[
                (Template::HsetHget, 10),
                (Template::HsetHdel, 3),
                (Template::HlenHgetall, 1),
            ],
            Category::Set => &[(Template::SaddScard, 10), (Template::ScardSmembers, 1)],
            Category::SortedSet => &[
                (Template::ZaddZcard, 10),
                (Template::ZcountZrangebyscore, 1),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    /// SET, then GET returns the written value
    SetGet,
    /// SET, EXISTS is 1, DEL is 1
    SetExistsDel,
    /// HSET, then HGET returns the written value
    HsetHget,
    /// HSET, then HDEL removes exactly one field
    HsetHdel,
    /// HLEN, then HGETALL returns that many pairs
    HlenHgetall,
    /// SADD, then SCARD is positive
    SaddScard,
    /// SCARD, then SMEMBERS returns that many members
    ScardSmembers,
    /// ZADD, then ZCARD is positive
    ZaddZcard,
    /// ZCOUNT over a score range, then ZRANGEBYSCORE returns that many members
    ZcountZrangebyscore,
}

impl Template {
    /// Generate this template's requests, in the order they must be sent
    pub fn build(self, keys: &mut KeyGenerator) -> Vec<OperationRequest> {
        match self {
            Template::SetGet => {
                let key = keys.key();
                let value = keys.value();
                vec![
                    OperationRequest::new(
                        Command::new("SET").arg(&key).arg(value.as_slice()),
                        Check::Ok,
                    ),
                    OperationRequest::new(Command::new("GET").arg(&key), Check::Bytes(value)),
                ]
            }
            Template::SetExistsDel => {
                let key = keys.key();
                let value = keys.value();
                vec![
                    OperationRequest::new(Command::new("SET").arg(&key).arg(value), Check::Ok),
                    OperationRequest::new(Command::new("EXISTS").arg(&key), Check::Int(1)),
                    OperationRequest::new(Command::new("DEL").arg(&key), Check::Int(1)),
                ]
            }
            Template::HsetHget => {
                let key = keys.hash();
                let field = keys.hash_field();
                let value = keys.value();
                vec![
                    OperationRequest::new(
                        Command::new("HSET").arg(&key).arg(&field).arg(value.as_slice()),
                        Check::ZeroOrOne,
                    ),
                    OperationRequest::new(
                        Command::new("HGET").arg(&key).arg(&field),
                        Check::Bytes(value),
                    ),
                ]
            }
            Template::HsetHdel => {
                let key = keys.hash();
                let field = keys.hash_field();
                let value = keys.value();
                vec![
                    OperationRequest::new(
                        Command::new("HSET").arg(&key).arg(&field).arg(value),
                        Check::ZeroOrOne,
                    ),
                    OperationRequest::new(
                        Command::new("HDEL").arg(&key).arg(&field),
                        Check::Int(1),
                    ),
                ]
            }
            Template::HlenHgetall => {
                let key = keys.hash();
                let length = CountSlot::new();
                vec![
                    OperationRequest::new(
                        Command::new("HLEN").arg(&key),
                        Check::Record(length.clone()),
                    ),
                    OperationRequest::new(Command::new("HGETALL").arg(&key), Check::Pairs(length)),
                ]
            }
            Template::SaddScard => {
                let key = keys.set();
                let member = keys.set_member();
                vec![
                    OperationRequest::new(
                        Command::new("SADD").arg(&key).arg(&member),
                        Check::ZeroOrOne,
                    ),
                    OperationRequest::new(Command::new("SCARD").arg(&key), Check::Positive),
                ]
            }
            Template::ScardSmembers => {
                let key = keys.set();
                let length = CountSlot::new();
                vec![
                    OperationRequest::new(
                        Command::new("SCARD").arg(&key),
                        Check::Record(length.clone()),
                    ),
                    OperationRequest::new(
                        Command::new("SMEMBERS").arg(&key),
                        Check::Members(length),
                    ),
                ]
            }
            Template::ZaddZcard => {
                let key = keys.sorted_set();
                let score = keys.score();
                let member = keys.sorted_set_member();
                vec![
                    OperationRequest::new(
                        Command::new("ZADD").arg(&key).arg(score).arg(&member),
                        Check::ZeroOrOne,
                    ),
                    OperationRequest::new(Command::new("ZCARD").arg(&key), Check::Positive),
                ]
            }
            Template::ZcountZrangebyscore => {
                let key = keys.sorted_set();
                let (a, b) = (keys.score(), keys.score());
                let (min, max) = (a.min(b), a.max(b));
                let length = CountSlot::new();
                vec![
                    OperationRequest::new(
                        Command::new("ZCOUNT").arg(&key).arg(min).arg(max),
                        Check::Record(length.clone()),
                    ),
                    OperationRequest::new(
                        Command::new("ZRANGEBYSCORE").arg(&key).arg(min).arg(max),
                        Check::Members(length),
                    ),
                ]
            }
        }
    }
}
