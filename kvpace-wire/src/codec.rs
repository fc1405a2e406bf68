//! RESP2 reply decoding
//!
//! Replies are parsed by the redis crate into [`redis::Value`] so callers can
//! use its `FromRedisValue` conversions when validating them.

use combine::parser::combinator::AnySendSyncPartialState;
use combine::stream::{Decoder, PointerOffset};
use redis::Value;
use tokio::io::AsyncRead;

use crate::error::WireError;

/// Reads replies off a byte stream, one per call.
///
/// The decoder keeps bytes read past the end of a reply, so pipelined
/// replies arriving in a single segment are handed out in order.
pub struct ReplyReader<R> {
    inner: R,
    decoder: Decoder<AnySendSyncPartialState, PointerOffset<[u8]>>,
}

impl<R> ReplyReader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            decoder: Decoder::new(),
        }
    }

    /// Read exactly one reply.
    ///
    /// Error replies are returned as [`WireError::ServerError`]. An error
    /// nested inside an array is reported the same way, after the whole
    /// array has been consumed, so the stream stays in sync.
    pub async fn read_value(&mut self) -> Result<Value, WireError> {
        redis::parse_redis_value_async(&mut self.decoder, &mut self.inner)
            .await
            .map_err(WireError::from)
    }
}
