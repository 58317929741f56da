//! Time-ordered push keys
//!
//! Layout (20 chars, realtime-database compatible):
//!   - 8 chars: milliseconds since epoch, base-64 in a sort-preserving alphabet
//!   - 12 chars: random; incremented instead of re-rolled within the same ms
//!
//! Keys generated by one generator sort lexicographically in creation order.

use rand::Rng;
use std::sync::Mutex;

/// Sort-preserving base-64 alphabet
const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Default)]
struct State {
    last_ms: i64,
    last_rand: [u8; 12],
}

/// Push key generator
#[derive(Debug, Default)]
pub struct PushKeyGenerator {
    state: Mutex<State>,
}

impl PushKeyGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next key for the current time
    pub fn next_key(&self) -> String {
        self.key_at(chrono::Utc::now().timestamp_millis())
    }

    /// Next key for a given timestamp (milliseconds)
    pub fn key_at(&self, now_ms: i64) -> String {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        if now_ms == state.last_ms {
            // Same millisecond: bump the random suffix by one
            for digit in state.last_rand.iter_mut().rev() {
                if *digit == 63 {
                    *digit = 0;
                } else {
                    *digit += 1;
                    break;
                }
            }
        } else {
            let mut rng = rand::thread_rng();
            for digit in state.last_rand.iter_mut() {
                *digit = rng.gen_range(0..64);
            }
            state.last_ms = now_ms;
        }

        let mut key = [0u8; 20];
        let mut ts = now_ms.max(0);
        for slot in key[..8].iter_mut().rev() {
            *slot = PUSH_CHARS[(ts % 64) as usize];
            ts /= 64;
        }
        for (slot, digit) in key[8..].iter_mut().zip(state.last_rand.iter()) {
            *slot = PUSH_CHARS[*digit as usize];
        }

        key.iter().map(|&b| b as char).collect()
    }
}
