use std::fmt::Display;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;

pub static RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build Tokio runtime")
});

pub fn spawn_async<F>(fut: F)
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    RUNTIME.spawn(fut);
}

/// Run `fut` on the tokio runtime and hand its output to `on_done` on the
/// GTK main loop.
pub fn run_async_to_main<T, Fut, F>(fut: Fut, on_done: F)
where
    T: Send + 'static,
    Fut: std::future::Future<Output = T> + Send + 'static,
    F: FnOnce(T) + 'static,
{
    let handle = RUNTIME.spawn(fut);
    glib::MainContext::default().spawn_local(async move {
        match handle.await {
            Ok(res) => on_done(res),
            Err(err) => log::error!("background task failed: {err}"),
        }
    });
}

pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// `HH:MM` in local time, or an empty string when there is no usable timestamp.
pub fn format_time(timestamp: Option<&str>) -> String {
    format_time_in(timestamp, &Local)
}

pub fn format_time_in<Tz>(timestamp: Option<&str>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let Some(raw) = timestamp.map(str::trim).filter(|s| !s.is_empty()) else {
        return String::new();
    };
    match parse_timestamp(raw) {
        Some(utc) => utc.with_timezone(tz).format("%H:%M").to_string(),
        None => {
            log::debug!("unrecognised timestamp {raw:?}");
            String::new()
        }
    }
}

// SQLite's CURRENT_TIMESTAMP has no offset and is always UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

pub fn avatar_initial(name: &str) -> String {
    name.chars()
        .next()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "?".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn normalizes_scheme() {
        assert_eq!(normalize_url(" chat.local:5000 "), "https://chat.local:5000");
        assert_eq!(normalize_url("http://localhost:5000"), "http://localhost:5000");
        assert_eq!(normalize_url("   "), "");
    }

    #[test]
    fn formats_sqlite_timestamps_as_utc() {
        let plus_one = FixedOffset::east_opt(3600).unwrap();
        assert_eq!(format_time_in(Some("2024-03-01 09:15:42"), &plus_one), "10:15");
        assert_eq!(format_time_in(Some("2024-03-01 23:05:00.123"), &Utc), "23:05");
    }

    #[test]
    fn formats_rfc3339_with_offset() {
        assert_eq!(format_time_in(Some("2024-03-01T09:15:00+02:00"), &Utc), "07:15");
    }

    #[test]
    fn missing_or_bad_timestamps_render_empty() {
        assert_eq!(format_time_in(None, &Utc), "");
        assert_eq!(format_time_in(Some(""), &Utc), "");
        assert_eq!(format_time_in(Some("yesterday"), &Utc), "");
    }

    #[test]
    fn avatar_uses_first_character() {
        assert_eq!(avatar_initial("Émile"), "É");
        assert_eq!(avatar_initial(""), "?");
    }
}
