//! Static timezone → fixed UTC offset table.
//!
//! Offsets are standard time only; DST transitions are not modelled.

const SECONDS_PER_HOUR: i32 = 3600;

/// Known timezone identifiers and their UTC offset in hours.
pub const TIMEZONE_OFFSETS: &[(&str, i32)] = &[
    // Brazil
    ("America/Sao_Paulo", -3),
    ("America/Recife", -3),
    ("America/Bahia", -3),
    ("America/Fortaleza", -3),
    ("America/Belem", -3),
    ("America/Cuiaba", -4),
    ("America/Porto_Velho", -4),
    ("America/Boa_Vista", -4),
    ("America/Manaus", -4),
    ("America/Rio_Branco", -5),
    ("America/Eirunepe", -5),
    // International
    ("UTC", 0),
    ("Europe/London", 0),
    ("Europe/Paris", 1),
    ("America/New_York", -5),
    ("America/Chicago", -6),
    ("America/Denver", -7),
    ("America/Los_Angeles", -8),
    ("Asia/Tokyo", 9),
    ("Australia/Sydney", 10),
];

/// UTC offset in hours for `timezone_id`, if known.
pub fn offset_hours(timezone_id: &str) -> Option<i32> {
    TIMEZONE_OFFSETS
        .iter()
        .find(|(id, _)| *id == timezone_id)
        .map(|(_, hours)| *hours)
}

/// UTC offset in seconds for `timezone_id`; unknown zones map to 0.
pub fn offset_seconds(timezone_id: &str) -> i32 {
    offset_hours(timezone_id).unwrap_or(0) * SECONDS_PER_HOUR
}

pub fn is_known(timezone_id: &str) -> bool {
    offset_hours(timezone_id).is_some()
}
