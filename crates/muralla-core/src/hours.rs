//! Open/closed indicator for the café's opening hours.
//!
//! Times are café-local (Santiago). The weekly table has at most one
//! period per day; a special location scheduled for today overrides it.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;

use crate::models::SpecialLocation;

/// Time zone the opening hours are expressed in.
pub const STORE_TIME_ZONE: Tz = chrono_tz::America::Santiago;

/// Café-local wall clock for an instant.
///
/// `offset_minutes` pins a fixed offset from UTC instead of the store's
/// time zone rules.
pub fn local_time(instant: DateTime<Utc>, offset_minutes: Option<i32>) -> NaiveDateTime {
    match offset_minutes.and_then(|minutes| FixedOffset::east_opt(minutes * 60)) {
        Some(offset) => instant.with_timezone(&offset).naive_local(),
        None => instant.with_timezone(&STORE_TIME_ZONE).naive_local(),
    }
}

/// Opening period in minutes after midnight, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: u32,
    pub end: u32,
}

const fn hm(hour: u32, minute: u32) -> u32 {
    hour * 60 + minute
}

/// Opening periods for a weekday.
pub fn weekly_hours(day: Weekday) -> &'static [Period] {
    const MONDAY: [Period; 1] = [Period { start: hm(9, 0), end: hm(21, 0) }];
    const WEEKDAY: [Period; 1] = [Period { start: hm(10, 0), end: hm(21, 0) }];
    const SATURDAY: [Period; 1] = [Period { start: hm(12, 0), end: hm(21, 0) }];
    const SUNDAY: [Period; 1] = [Period { start: hm(12, 0), end: hm(20, 0) }];

    match day {
        Weekday::Mon => &MONDAY,
        Weekday::Tue | Weekday::Wed | Weekday::Thu | Weekday::Fri => &WEEKDAY,
        Weekday::Sat => &SATURDAY,
        Weekday::Sun => &SUNDAY,
    }
}

pub fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Lunes",
        Weekday::Tue => "Martes",
        Weekday::Wed => "Miércoles",
        Weekday::Thu => "Jueves",
        Weekday::Fri => "Viernes",
        Weekday::Sat => "Sábado",
        Weekday::Sun => "Domingo",
    }
}

fn clock(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

#[derive(Debug, Clone, PartialEq)]
pub enum OpenStatus {
    Open { closes_at: u32 },
    Closed { opens_on: Weekday, opens_at: u32, same_day: bool },
    /// No opening found in the coming week
    ClosedIndefinitely,
    Visiting(SpecialLocation),
}

impl OpenStatus {
    pub fn evaluate(local: NaiveDateTime, special_locations: &[SpecialLocation]) -> Self {
        let date = local.date().format("%Y-%m-%d").to_string();
        if let Some(special) = special_locations.iter().find(|loc| loc.date == date) {
            return OpenStatus::Visiting(special.clone());
        }

        let day = local.weekday();
        let now = hm(local.hour(), local.minute());

        for period in weekly_hours(day) {
            if now >= period.start && now < period.end {
                return OpenStatus::Open { closes_at: period.end };
            }
            if now < period.start {
                return OpenStatus::Closed {
                    opens_on: day,
                    opens_at: period.start,
                    same_day: true,
                };
            }
        }

        let mut next = day;
        for _ in 0..7 {
            next = next.succ();
            if let Some(period) = weekly_hours(next).first() {
                return OpenStatus::Closed {
                    opens_on: next,
                    opens_at: period.start,
                    same_day: false,
                };
            }
        }
        OpenStatus::ClosedIndefinitely
    }

    pub fn at(
        instant: DateTime<Utc>,
        offset_minutes: Option<i32>,
        special_locations: &[SpecialLocation],
    ) -> Self {
        Self::evaluate(local_time(instant, offset_minutes), special_locations)
    }

    pub fn now(offset_minutes: Option<i32>, special_locations: &[SpecialLocation]) -> Self {
        Self::at(Utc::now(), offset_minutes, special_locations)
    }

    pub fn is_open(&self) -> bool {
        matches!(self, OpenStatus::Open { .. } | OpenStatus::Visiting(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            OpenStatus::Open { .. } => "abierto",
            OpenStatus::Visiting(_) => "abierto de visita",
            OpenStatus::Closed { .. } | OpenStatus::ClosedIndefinitely => "cerrado",
        }
    }

    /// Tooltip text shown next to the indicator.
    pub fn message(&self) -> String {
        match self {
            OpenStatus::Open { closes_at } => format!("Cerramos a las {}", clock(*closes_at)),
            OpenStatus::Closed { opens_at, same_day: true, .. } => {
                format!("Abrimos a las {}", clock(*opens_at))
            }
            OpenStatus::Closed { opens_on, opens_at, .. } => {
                format!("Abrimos {} a las {}", day_name(*opens_on), clock(*opens_at))
            }
            OpenStatus::ClosedIndefinitely => String::new(),
            OpenStatus::Visiting(loc) => {
                format!("{}\n{}\n{}", loc.name, loc.address, loc.description)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn at(y: i32, m: u32, d: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_open_during_hours() {
        // 2025-11-03 is a Monday
        let status = OpenStatus::evaluate(at(2025, 11, 3, 9, 30), &[]);
        assert_eq!(status, OpenStatus::Open { closes_at: hm(21, 0) });
        assert_eq!(status.label(), "abierto");
        assert_eq!(status.message(), "Cerramos a las 21:00");
    }

    #[test]
    fn test_closed_before_opening() {
        // Tuesday 08:15
        let status = OpenStatus::evaluate(at(2025, 11, 4, 8, 15), &[]);
        assert_eq!(status.message(), "Abrimos a las 10:00");
        assert!(!status.is_open());
    }

    #[test]
    fn test_closing_time_is_exclusive() {
        // Sunday 20:00, closes at 20:00, next opening Monday
        let status = OpenStatus::evaluate(at(2025, 11, 2, 20, 0), &[]);
        assert_eq!(status.label(), "cerrado");
        assert_eq!(status.message(), "Abrimos Lunes a las 09:00");
    }

    #[test]
    fn test_special_location_wins() {
        let special = SpecialLocation {
            date: "2025-11-04".to_string(),
            name: "Feria Negrx".to_string(),
            address: "Carmen 1235".to_string(),
            description: "Venta".to_string(),
            maps_url: None,
        };
        let status = OpenStatus::evaluate(at(2025, 11, 4, 23, 0), &[special]);
        assert_eq!(status.label(), "abierto de visita");
        assert!(status.message().starts_with("Feria Negrx\nCarmen 1235"));
    }

    #[test]
    fn test_winter_uses_santiago_standard_time() {
        // Monday 2025-07-07 12:30 UTC is 08:30 in Santiago (UTC-4)
        let instant = Utc.with_ymd_and_hms(2025, 7, 7, 12, 30, 0).unwrap();
        assert_eq!(local_time(instant, None), at(2025, 7, 7, 8, 30));

        let status = OpenStatus::at(instant, None, &[]);
        assert_eq!(status.label(), "cerrado");
        assert_eq!(status.message(), "Abrimos a las 09:00");
    }

    #[test]
    fn test_summer_uses_santiago_daylight_time() {
        // Monday 2025-01-06 12:30 UTC is 09:30 in Santiago (UTC-3)
        let instant = Utc.with_ymd_and_hms(2025, 1, 6, 12, 30, 0).unwrap();
        assert_eq!(local_time(instant, None), at(2025, 1, 6, 9, 30));

        let status = OpenStatus::at(instant, None, &[]);
        assert_eq!(status.label(), "abierto");
        assert_eq!(status.message(), "Cerramos a las 21:00");
    }

    #[test]
    fn test_offset_override_pins_the_clock() {
        let instant = Utc.with_ymd_and_hms(2025, 7, 7, 12, 30, 0).unwrap();
        assert_eq!(local_time(instant, Some(-180)), at(2025, 7, 7, 9, 30));
        assert!(OpenStatus::at(instant, Some(-180), &[]).is_open());
    }
}
