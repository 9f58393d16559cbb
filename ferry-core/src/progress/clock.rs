use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Local};

/// Wall-clock time in seconds since the Unix epoch
pub type Seconds = f64;

const ONE_MINUTE: f64 = 60.0;
const ONE_HOUR: f64 = 60.0 * ONE_MINUTE;
const ONE_DAY: f64 = 24.0 * ONE_HOUR;

pub fn now() -> Seconds {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Format a duration with the two most significant units:
/// `1d02h`, `3h04m`, `5m06s` or `7.00s`
pub fn format_duration(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    if seconds > ONE_DAY {
        format!(
            "{}d{:02}h",
            (seconds / ONE_DAY) as u64,
            (seconds % ONE_DAY / ONE_HOUR) as u64
        )
    } else if seconds > ONE_HOUR {
        format!(
            "{}h{:02}m",
            (seconds / ONE_HOUR) as u64,
            (seconds % ONE_HOUR / ONE_MINUTE) as u64
        )
    } else if seconds > ONE_MINUTE {
        format!(
            "{}m{:02}s",
            (seconds / ONE_MINUTE) as u64,
            (seconds % ONE_MINUTE) as u64
        )
    } else {
        format!("{:.2}s", seconds)
    }
}

/// Format a moment relative to the current local time
pub fn format_time(moment: Seconds) -> String {
    format_time_at(moment, now())
}

/// Format `moment` with less precision the further it is from `now`:
/// `HH:MM:SS` today, `Wed HH:MM` within three days, `MM-DD HHh` within
/// fifteen days, a plain date otherwise.
pub fn format_time_at(moment: Seconds, now: Seconds) -> String {
    let (Some(local), Some(today)) = (to_local(moment), to_local(now)) else {
        return String::from("?");
    };

    let distance = (moment - now).abs();
    let pattern = if local.date_naive() == today.date_naive() {
        "%H:%M:%S"
    } else if distance < 3.0 * ONE_DAY {
        "%a %H:%M"
    } else if distance < 15.0 * ONE_DAY {
        "%m-%d %Hh"
    } else {
        "%Y-%m-%d"
    };
    local.format(pattern).to_string()
}

fn to_local(seconds: Seconds) -> Option<DateTime<Local>> {
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9) as u32;
    DateTime::from_timestamp(whole as i64, nanos).map(|utc| utc.with_timezone(&Local))
}
