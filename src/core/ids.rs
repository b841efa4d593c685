use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Booking ids start far above resource ids so the two never look alike.
pub const DEFAULT_BOOKING_ID_BASE: u64 = 1_000_000;

const RANDOM_ID_BYTES: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookingIdPolicy {
    #[default]
    Sequential,
    /// base64url-encoded random bytes, not guessable from neighbouring slots.
    Random,
}

/// Per-run identifier state. Counters start fresh for every allocator.
#[derive(Debug)]
pub struct IdAllocator {
    next_resource: u64,
    next_booking: u64,
    booking_policy: BookingIdPolicy,
    rng: StdRng,
    issued_random: HashSet<String>,
}

impl IdAllocator {
    pub fn new(booking_policy: BookingIdPolicy, booking_base: u64) -> Self {
        Self::with_rng(booking_policy, booking_base, StdRng::from_entropy())
    }

    pub fn with_rng(booking_policy: BookingIdPolicy, booking_base: u64, rng: StdRng) -> Self {
        Self {
            next_resource: 0,
            next_booking: booking_base,
            booking_policy,
            rng,
            issued_random: HashSet::new(),
        }
    }

    pub fn resource_id(&mut self) -> String {
        let id = self.next_resource;
        self.next_resource += 1;
        id.to_string()
    }

    pub fn booking_id(&mut self) -> String {
        match self.booking_policy {
            BookingIdPolicy::Sequential => {
                let id = self.next_booking;
                self.next_booking += 1;
                id.to_string()
            }
            BookingIdPolicy::Random => loop {
                let mut bytes = [0u8; RANDOM_ID_BYTES];
                self.rng.fill(&mut bytes);
                let id = URL_SAFE_NO_PAD.encode(bytes);
                if self.issued_random.insert(id.clone()) {
                    break id;
                }
            },
        }
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new(BookingIdPolicy::Sequential, DEFAULT_BOOKING_ID_BASE)
    }
}
