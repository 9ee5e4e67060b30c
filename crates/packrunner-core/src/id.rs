//! String-formatted entity identifiers.
//!
//! Unlike a multi-entity simulation keyed by sequential integer ids, this
//! core exposes human-readable ids that embed their derivation: an order id
//! carries its creation timestamp, an item id carries its grid location, and
//! an event id carries its type and emission time. All three are immutable
//! once minted.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::rng::SimRng;

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(s)
            }
        }
    };
}

string_id!(OrderId);
string_id!(ItemId);
string_id!(EventId);

impl ItemId {
    /// Build the canonical item id for a grid cell: `ITEM_A{aisle:02}R{rack:02}`.
    pub fn for_location(aisle: u32, rack: u32) -> Self {
        ItemId(format!("ITEM_A{:02}R{:02}", aisle, rack))
    }
}

/// Seconds since the Unix epoch, split into a civil calendar date/time (UTC).
///
/// Hand-rolled rather than pulling in a datetime crate, since the only use
/// is formatting one id prefix; uses the days-from-civil algorithm.
fn unix_to_utc_parts(secs: i64) -> (i64, u32, u32, u32, u32, u32) {
    let days = secs.div_euclid(86_400);
    let time_of_day = secs.rem_euclid(86_400);
    let hour = (time_of_day / 3600) as u32;
    let minute = ((time_of_day % 3600) / 60) as u32;
    let second = (time_of_day % 60) as u32;

    // civil_from_days (Howard Hinnant), days since 1970-01-01 -> (y, m, d)
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64; // [0, 146096]
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365; // [0, 399]
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // [0, 365]
    let mp = (5 * doy + 2) / 153; // [0, 11]
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32; // [1, 31]
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32; // [1, 12]
    let year = if m <= 2 { y + 1 } else { y };

    (year, m, d, hour, minute, second)
}

fn now_timestamp_compact() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    let (y, m, d, hh, mm, ss) = unix_to_utc_parts(secs);
    format!("{:04}{:02}{:02}_{:02}{:02}{:02}", y, m, d, hh, mm, ss)
}

/// Mints globally-unique [`OrderId`]s and [`EventId`]s.
///
/// The unique suffix is drawn from the simulation's own seeded RNG rather
/// than a system UUID source, so two runs with the same seed mint the same
/// ids in the same order.
pub struct IdMinter;

impl IdMinter {
    /// `ORD_{YYYYMMDD_HHMMSS}_{8-char unique}`
    pub fn order_id(rng: &mut SimRng) -> OrderId {
        OrderId(format!(
            "ORD_{}_{}",
            now_timestamp_compact(),
            Self::hex_suffix(rng, 8)
        ))
    }

    /// Event ids are derived from the event's wire type name plus the
    /// emission timestamp at microsecond resolution.
    pub fn event_id(type_name: &str, ts: crate::time::SimTime) -> EventId {
        let micros = (ts.as_seconds() * 1_000_000.0).round() as i64;
        EventId(format!("EVT_{}_{}", type_name, micros))
    }

    fn hex_suffix(rng: &mut SimRng, len: usize) -> String {
        const HEX: &[u8] = b"0123456789abcdef";
        (0..len)
            .map(|_| HEX[rng.gen_range(0..HEX.len())] as char)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_id_format() {
        assert_eq!(ItemId::for_location(1, 2).as_str(), "ITEM_A01R02");
        assert_eq!(ItemId::for_location(25, 20).as_str(), "ITEM_A25R20");
    }

    #[test]
    fn test_order_id_unique_suffix_len() {
        let mut rng = SimRng::new(1);
        let id = IdMinter::order_id(&mut rng);
        let suffix = id.as_str().rsplit('_').next().unwrap();
        assert_eq!(suffix.len(), 8);
    }

    #[test]
    fn test_event_id_embeds_type() {
        let id = IdMinter::event_id("order_created", crate::time::SimTime::from_seconds(1.5));
        assert!(id.as_str().starts_with("EVT_order_created_"));
    }

    #[test]
    fn test_civil_date_roundtrip_epoch() {
        // 1970-01-01T00:00:00Z
        let (y, m, d, hh, mm, ss) = unix_to_utc_parts(0);
        assert_eq!((y, m, d, hh, mm, ss), (1970, 1, 1, 0, 0, 0));
    }
}
