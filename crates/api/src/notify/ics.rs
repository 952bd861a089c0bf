//! Minimal iCalendar (RFC 5545) invite generation for booking confirmations.

use chrono::{DateTime, Utc};
use uuid::Uuid;

const ICS_TIME_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Build a single-event VCALENDAR document for a confirmed booking.
pub fn create_booking_ics(
    uid: Uuid,
    title: &str,
    description: &str,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
) -> String {
    let lines = [
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        "PRODID:-//slotwise//booking//EN".to_string(),
        "METHOD:REQUEST".to_string(),
        "BEGIN:VEVENT".to_string(),
        format!("UID:{uid}@slotwise"),
        format!("DTSTAMP:{}", Utc::now().format(ICS_TIME_FORMAT)),
        format!("DTSTART:{}", starts_at.format(ICS_TIME_FORMAT)),
        format!("DTEND:{}", ends_at.format(ICS_TIME_FORMAT)),
        format!("SUMMARY:{}", escape_text(title)),
        format!("DESCRIPTION:{}", escape_text(description)),
        "END:VEVENT".to_string(),
        "END:VCALENDAR".to_string(),
    ];

    // RFC 5545 requires CRLF line endings
    let mut out = lines.join("\r\n");
    out.push_str("\r\n");
    out
}

/// Escape TEXT property values per RFC 5545 section 3.3.11.
fn escape_text(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}
