//! Timezone helpers on top of the IANA database shipped with `chrono-tz`.

use chrono::{DateTime, Local, NaiveDateTime, Offset, Utc};
use chrono_tz::{Tz, TZ_VARIANTS};
use serde::Serialize;

pub const DATE_TIME_FORMAT: &str = "%d.%m.%Y %H:%M";
const SYSTEM_DEFAULT_LABEL: &str = "System default";

/// A selectable zone: its id and a label carrying the current UTC offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimezoneOption {
    pub id: String,
    pub display_name: String,
}

impl TimezoneOption {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name(id),
        }
    }
}

fn parse(id: &str) -> Option<Tz> {
    if id.is_empty() {
        return None;
    }
    id.parse::<Tz>().ok()
}

pub fn is_valid_timezone(id: &str) -> bool {
    parse(id).is_some()
}

/// `dd.MM.yyyy HH:mm` in the given zone. Unknown or missing zones format the
/// UTC wall clock; a missing date gives an empty string.
pub fn format_date_time(date_time: Option<&DateTime<Utc>>, zone: Option<&str>) -> String {
    let Some(date_time) = date_time else {
        return String::new();
    };
    match zone.and_then(parse) {
        Some(tz) => date_time.with_timezone(&tz).format(DATE_TIME_FORMAT).to_string(),
        None => date_time.format(DATE_TIME_FORMAT).to_string(),
    }
}

/// Wall-clock time in `zone`, or in the system zone when it is unknown.
pub fn current_date_time_in(zone: Option<&str>) -> NaiveDateTime {
    match zone.and_then(parse) {
        Some(tz) => Utc::now().with_timezone(&tz).naive_local(),
        None => Local::now().naive_local(),
    }
}

/// Every known zone, sorted by id.
pub fn all_timezones() -> Vec<TimezoneOption> {
    let mut ids: Vec<&'static str> = TZ_VARIANTS.iter().map(|tz| tz.name()).collect();
    ids.sort_unstable();
    ids.into_iter().map(TimezoneOption::new).collect()
}

/// `"<id> (UTC+hh:mm)"` using the offset in effect right now.
pub fn display_name(id: &str) -> String {
    let Some(tz) = parse(id) else {
        return if id.is_empty() {
            SYSTEM_DEFAULT_LABEL.to_string()
        } else {
            id.to_string()
        };
    };
    let seconds = Utc::now().with_timezone(&tz).offset().fix().local_minus_utc();
    format!("{id} (UTC{})", format_offset(seconds))
}

fn format_offset(seconds: i32) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let minutes = seconds.abs() / 60;
    format!("{sign}{:02}:{:02}", minutes / 60, minutes % 60)
}
