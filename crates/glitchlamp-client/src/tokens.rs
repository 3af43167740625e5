//! Request generation tokens.
//!
//! Responses to overlapping requests can arrive out of order. Each request
//! takes a token from its channel when issued; when the response arrives,
//! it is applied only if no newer request was issued on the same channel
//! since. The last request issued wins, not the last to resolve.

use std::collections::HashMap;
use std::hash::Hash;

/// Proof of issue for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken<K> {
    channel: K,
    generation: u64,
}

impl<K: Copy> RequestToken<K> {
    /// Channel this token was issued on.
    pub fn channel(&self) -> K {
        self.channel
    }

    /// Generation number within the channel.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Per-channel monotonically increasing request generations.
#[derive(Debug, Clone)]
pub struct RequestTokens<K> {
    latest: HashMap<K, u64>,
}

impl<K> Default for RequestTokens<K> {
    fn default() -> Self {
        Self {
            latest: HashMap::new(),
        }
    }
}

impl<K: Copy + Eq + Hash> RequestTokens<K> {
    /// Creates an empty token table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a token for a new request on `channel`, superseding older ones.
    pub fn issue(&mut self, channel: K) -> RequestToken<K> {
        let generation = self.latest.entry(channel).or_insert(0);
        *generation += 1;
        RequestToken {
            channel,
            generation: *generation,
        }
    }

    /// Whether `token` is still the newest on its channel.
    pub fn is_current(&self, token: &RequestToken<K>) -> bool {
        self.latest.get(&token.channel) == Some(&token.generation)
    }

    /// Marks every in-flight request on `channel` as stale.
    pub fn invalidate(&mut self, channel: K) {
        if let Some(generation) = self.latest.get_mut(&channel) {
            *generation += 1;
        }
    }
}
