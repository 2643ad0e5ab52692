//! Dutch date formatting and iCalendar export of activities
//!
//! Calendar days are taken in the site timezone: CMS dates are entered as
//! local times, and an all-day event at local midnight is still the previous
//! day in UTC.

use chrono::{DateTime, Datelike, Days, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;

use crate::cms::{Activity, ContentEntry};

const WEEKDAYS_SHORT: [&str; 7] = ["ma", "di", "wo", "do", "vr", "za", "zo"];
const WEEKDAYS_LONG: [&str; 7] = [
    "maandag", "dinsdag", "woensdag", "donderdag", "vrijdag", "zaterdag", "zondag",
];
const MONTHS_SHORT: [&str; 12] = [
    "jan", "feb", "mrt", "apr", "mei", "jun", "jul", "aug", "sep", "okt", "nov", "dec",
];
const MONTHS_LONG: [&str; 12] = [
    "januari", "februari", "maart", "april", "mei", "juni", "juli", "augustus", "september",
    "oktober", "november", "december",
];

const ICS_LINE_LIMIT: usize = 75;
const UID_DOMAIN: &str = "talentenraad";

pub fn month_name(month: u32) -> &'static str {
    MONTHS_LONG[(month.clamp(1, 12) - 1) as usize]
}

/// `"za 12 okt"`
pub fn format_day(date: NaiveDate) -> String {
    format!(
        "{} {} {}",
        WEEKDAYS_SHORT[date.weekday().num_days_from_monday() as usize],
        date.day(),
        MONTHS_SHORT[date.month0() as usize]
    )
}

/// `"zaterdag 12 oktober 2024"`
pub fn format_long(date: NaiveDate) -> String {
    format!(
        "{} {} {} {}",
        WEEKDAYS_LONG[date.weekday().num_days_from_monday() as usize],
        date.day(),
        MONTHS_LONG[date.month0() as usize],
        date.year()
    )
}

/// `"14:00 – 16:00"`, `"14:00"` without end, `"hele dag"` for all-day events
pub fn format_time_range<T: Timelike>(start: &T, end: Option<&T>, all_day: bool) -> String {
    if all_day {
        return "hele dag".to_string();
    }
    let hm = |t: &T| format!("{:02}:{:02}", t.hour(), t.minute());
    match end {
        Some(end) => format!("{} – {}", hm(start), hm(end)),
        None => hm(start),
    }
}

/// `"za 12 okt"` or `"za 12 okt – zo 13 okt"` for multi-day ranges
pub fn format_date_range(start: NaiveDate, end: Option<NaiveDate>) -> String {
    match end {
        Some(end) if end != start => format!("{} – {}", format_day(start), format_day(end)),
        _ => format_day(start),
    }
}

/// Activities grouped per calendar month (in `tz`), in chronological order
pub fn group_by_month(
    activities: &[ContentEntry<Activity>],
    tz: Tz,
) -> Vec<(i32, u32, Vec<&ContentEntry<Activity>>)> {
    let mut sorted: Vec<&ContentEntry<Activity>> = activities.iter().collect();
    sorted.sort_by(|a, b| a.data.start.cmp(&b.data.start).then(a.id.cmp(&b.id)));

    let mut groups: Vec<(i32, u32, Vec<&ContentEntry<Activity>>)> = Vec::new();
    for entry in sorted {
        let start = entry.data.start.with_timezone(&tz);
        let (year, month) = (start.year(), start.month());
        match groups.last_mut() {
            Some((y, m, items)) if *y == year && *m == month => items.push(entry),
            _ => groups.push((year, month, vec![entry])),
        }
    }
    groups
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            c => out.push(c),
        }
    }
    out
}

/// Append one content line, folded at 75 octets
fn push_line(out: &mut String, line: &str) {
    let mut width = 0;
    for c in line.chars() {
        let len = c.len_utf8();
        if width + len > ICS_LINE_LIMIT {
            out.push_str("\r\n ");
            width = 1;
        }
        out.push(c);
        width += len;
    }
    out.push_str("\r\n");
}

fn ics_datetime(dt: &DateTime<Utc>) -> String {
    format!(
        "{:04}{:02}{:02}T{:02}{:02}{:02}Z",
        dt.year(),
        dt.month(),
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second()
    )
}

fn ics_date(date: NaiveDate) -> String {
    format!("{:04}{:02}{:02}", date.year(), date.month(), date.day())
}

/// RFC 5545 calendar with one `VEVENT` per activity
///
/// Timed events are written in UTC; all-day events as dates in `tz`.
pub fn to_ics(activities: &[ContentEntry<Activity>], now: DateTime<Utc>, tz: Tz) -> String {
    let mut out = String::new();
    push_line(&mut out, "BEGIN:VCALENDAR");
    push_line(&mut out, "VERSION:2.0");
    push_line(&mut out, "PRODID:-//Talentenraad//Activiteiten//NL");
    push_line(&mut out, "CALSCALE:GREGORIAN");
    push_line(&mut out, "METHOD:PUBLISH");
    push_line(&mut out, "X-WR-CALNAME:Talentenraad activiteiten");

    let stamp = ics_datetime(&now);
    for entry in activities {
        let activity = &entry.data;
        push_line(&mut out, "BEGIN:VEVENT");
        push_line(&mut out, &format!("UID:{}@{}", entry.id, UID_DOMAIN));
        push_line(&mut out, &format!("DTSTAMP:{}", stamp));

        if activity.all_day {
            let (first, last) = activity.local_days(tz);
            // DTEND of an all-day event is exclusive
            let end = last.checked_add_days(Days::new(1)).unwrap_or(last);
            push_line(&mut out, &format!("DTSTART;VALUE=DATE:{}", ics_date(first)));
            push_line(&mut out, &format!("DTEND;VALUE=DATE:{}", ics_date(end)));
        } else {
            push_line(&mut out, &format!("DTSTART:{}", ics_datetime(&activity.start)));
            if let Some(end) = &activity.end {
                push_line(&mut out, &format!("DTEND:{}", ics_datetime(end)));
            }
        }

        push_line(&mut out, &format!("SUMMARY:{}", escape_text(&activity.title)));
        if let Some(description) = activity.description.as_deref().filter(|d| !d.is_empty()) {
            push_line(&mut out, &format!("DESCRIPTION:{}", escape_text(description)));
        }
        if let Some(location) = activity.location.as_deref().filter(|l| !l.is_empty()) {
            push_line(&mut out, &format!("LOCATION:{}", escape_text(location)));
        }
        if let Some(category) = activity.category.as_deref().filter(|c| !c.is_empty()) {
            push_line(&mut out, &format!("CATEGORIES:{}", escape_text(category)));
        }
        push_line(&mut out, "END:VEVENT");
    }

    push_line(&mut out, "END:VCALENDAR");
    out
}
