//! Commands as they go out on the wire

use redis::ToRedisArgs;
use std::fmt;

/// A single command with its already-encoded arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: &'static str,
    args: Vec<Vec<u8>>,
}

impl Command {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            args: Vec::new(),
        }
    }

    /// Append an argument. Anything the redis crate can encode is accepted.
    pub fn arg<T: ToRedisArgs>(mut self, arg: T) -> Self {
        self.args.extend(arg.to_redis_args());
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn args(&self) -> &[Vec<u8>] {
        &self.args
    }

    /// Append the RESP encoding of this command to `out`
    pub fn pack_into(&self, out: &mut Vec<u8>) {
        let mut cmd = redis::cmd(self.name);
        for arg in &self.args {
            cmd.arg(arg.as_slice());
        }
        out.extend_from_slice(&cmd.get_packed_command());
    }

    pub fn pack(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.pack_into(&mut out);
        out
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for arg in &self.args {
            write!(f, " {}", String::from_utf8_lossy(arg))?;
        }
        Ok(())
    }
}
