//! Time-to-live handling for uploads

use std::time::Duration;

const MILLIS_PER_HOUR: i64 = 60 * 60 * 1000;

/// Current wall-clock time in epoch milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Caller-supplied lifetime of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TtlSpec {
    /// Use the store's default TTL
    #[default]
    Default,
    /// Never expires
    Permanent,
    /// Expires this many hours after the write
    Hours(u64),
}

impl TtlSpec {
    /// Interpret a raw `expired` parameter.
    ///
    /// Only the leading integer counts, so `"1.5"` is one hour and `"5abc"`
    /// five. `0` means permanent and a positive count is hours. Input with
    /// no leading digits, or a negative count, falls back to the default TTL
    /// rather than being rejected.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.and_then(leading_integer) {
            Some(0) => TtlSpec::Permanent,
            Some(hours) if hours > 0 => TtlSpec::Hours(u64::try_from(hours).unwrap_or(u64::MAX)),
            _ => TtlSpec::Default,
        }
    }

    /// Resolve against `now` (epoch ms)
    pub fn resolve(self, now: i64, default_ttl: Duration) -> Expiry {
        let ttl_ms = match self {
            TtlSpec::Permanent => return Expiry::permanent(),
            TtlSpec::Default => i64::try_from(default_ttl.as_millis()).unwrap_or(i64::MAX),
            TtlSpec::Hours(hours) => i64::try_from(hours)
                .ok()
                .and_then(|h| h.checked_mul(MILLIS_PER_HOUR))
                .unwrap_or(i64::MAX),
        };
        Expiry {
            is_permanent: false,
            expires_at: Some(now.saturating_add(ttl_ms)),
        }
    }
}

/// Leading signed integer of `raw`, ignoring whatever trails it. A `0x`
/// prefix switches to hex. Saturates instead of overflowing.
fn leading_integer(raw: &str) -> Option<i128> {
    let s = raw.trim_start();
    let (negative, s) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let (radix, s) = match s.get(..2) {
        Some("0x") | Some("0X") => (16, &s[2..]),
        _ => (10, s),
    };

    let mut value: Option<i128> = None;
    for digit in s.chars().map_while(|c| c.to_digit(radix)) {
        let acc = value.unwrap_or(0);
        value = Some(acc.saturating_mul(i128::from(radix)).saturating_add(i128::from(digit)));
    }
    value.map(|v| if negative { -v } else { v })
}

/// Resolved lifecycle fields of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry {
    pub is_permanent: bool,
    pub expires_at: Option<i64>,
}

impl Expiry {
    pub fn permanent() -> Self {
        Self {
            is_permanent: true,
            expires_at: None,
        }
    }
}
