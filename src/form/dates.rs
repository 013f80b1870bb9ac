use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, Month, OffsetDateTime};

const ISO_DATE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");
const ISO_DATE_INPUT: &[FormatItem<'static>] =
    format_description!("[year]-[month padding:none]-[day padding:none]");

/// Number of calendar months the default sample window reaches back.
pub const DEFAULT_WINDOW_MONTHS: u32 = 3;

pub fn parse_iso_date(value: &str) -> Option<Date> {
    Date::parse(value.trim(), ISO_DATE_INPUT).ok()
}

pub fn format_iso_date(date: Date) -> String {
    date.format(ISO_DATE)
        .unwrap_or_else(|_| format!("{:04}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day()))
}

pub fn today_local() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

/// Steps back whole calendar months. A day that does not exist in the target
/// month is clamped to that month's last day (May 31 -> Feb 28/29).
pub fn months_before(date: Date, months: u32) -> Date {
    let total = date.year() * 12 + (i32::from(u8::from(date.month())) - 1) - months as i32;
    let year = total.div_euclid(12);
    let month = match Month::try_from(total.rem_euclid(12) as u8 + 1) {
        Ok(month) => month,
        Err(_) => return date,
    };
    let mut day = date.day();
    loop {
        if let Ok(out) = Date::from_calendar_date(year, month, day) {
            return out;
        }
        if day <= 28 {
            return date;
        }
        day -= 1;
    }
}

/// `(start, end)` for a fresh creation form: `end` is `today`.
pub fn default_date_range(today: Date) -> (Date, Date) {
    (months_before(today, DEFAULT_WINDOW_MONTHS), today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn parses_only_real_calendar_dates() {
        assert_eq!(parse_iso_date("2024-02-29"), Some(date!(2024 - 02 - 29)));
        assert_eq!(parse_iso_date("2023-02-29"), None);
        assert_eq!(parse_iso_date("2023-13-01"), None);
        assert_eq!(parse_iso_date("yesterday"), None);
        assert_eq!(parse_iso_date(""), None);
    }

    #[test]
    fn parses_unpadded_month_and_day() {
        assert_eq!(parse_iso_date("2026-7-1"), Some(date!(2026 - 07 - 01)));
        assert_eq!(parse_iso_date("2026-07-1"), Some(date!(2026 - 07 - 01)));
        assert_eq!(format_iso_date(date!(2026 - 07 - 01)), "2026-07-01");
        assert_eq!(parse_iso_date("2026-7-32"), None);
    }

    #[test]
    fn months_before_clamps_to_month_end() {
        assert_eq!(months_before(date!(2024 - 05 - 31), 3), date!(2024 - 02 - 29));
        assert_eq!(months_before(date!(2023 - 05 - 31), 3), date!(2023 - 02 - 28));
        assert_eq!(months_before(date!(2024 - 02 - 15), 3), date!(2023 - 11 - 15));
    }

    #[test]
    fn default_range_ends_today() {
        let today = date!(2026 - 10 - 19);
        let (start, end) = default_date_range(today);
        assert_eq!(end, today);
        assert_eq!(format_iso_date(start), "2026-07-19");
    }
}
