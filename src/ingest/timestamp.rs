use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Naive layouts seen in broker exports, tried in order.
const NAIVE_FORMATS: &[&str] = &[
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Parses a journal timestamp. Strings carrying an offset are taken as-is;
/// naive ones are read as wall-clock time in `broker_tz`.
pub fn parse_timestamp(raw: &str, broker_tz: Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())?;

    localize(naive, broker_tz)
}

fn localize(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    // Ambiguous (DST fall-back) picks the earlier instant; a spring-forward
    // gap shifts one hour later.
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}
