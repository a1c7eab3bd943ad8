use crate::error::{AttendanceError, AttendanceResult};
use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }

    pub fn is_weekend(self) -> bool {
        matches!(self, Weekday::Saturday | Weekday::Sunday)
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(value: chrono::Weekday) -> Self {
        match value {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Weekday {
    type Err = AttendanceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_lowercase();
        Weekday::ALL
            .into_iter()
            .find(|day| {
                let name = day.name().to_lowercase();
                name == normalized || name[..3] == normalized
            })
            .ok_or_else(|| AttendanceError::InvalidSchedule(format!("unknown weekday: {raw}")))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekMode {
    #[default]
    Five,
    Seven,
}

impl WeekMode {
    pub fn days(self) -> &'static [Weekday] {
        match self {
            WeekMode::Five => &Weekday::ALL[..5],
            WeekMode::Seven => &Weekday::ALL,
        }
    }

    pub fn is_schedulable(self, day: Weekday) -> bool {
        match self {
            WeekMode::Five => !day.is_weekend(),
            WeekMode::Seven => true,
        }
    }
}

impl fmt::Display for WeekMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeekMode::Five => f.write_str("five"),
            WeekMode::Seven => f.write_str("seven"),
        }
    }
}

impl FromStr for WeekMode {
    type Err = AttendanceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "five" | "5" => Ok(WeekMode::Five),
            "seven" | "7" => Ok(WeekMode::Seven),
            _ => Err(AttendanceError::InvalidSchedule(format!(
                "unknown week mode: {raw}. Use five or seven"
            ))),
        }
    }
}

pub fn parse_date(raw: &str) -> AttendanceResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| AttendanceError::InvalidDate(raw.to_string()))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn weekday_of(raw: &str, mode: WeekMode) -> AttendanceResult<Option<Weekday>> {
    parse_date(raw).map(|date| weekday_of_date(date, mode))
}

pub fn weekday_of_date(date: NaiveDate, mode: WeekMode) -> Option<Weekday> {
    let day = Weekday::from(date.weekday());
    mode.is_schedulable(day).then_some(day)
}

pub fn shift_date(date: NaiveDate, offset_days: i64) -> NaiveDate {
    date + Duration::days(offset_days)
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_weekdays() {
        assert_eq!(
            weekday_of("2025-09-15", WeekMode::Five),
            Ok(Some(Weekday::Monday))
        );
        assert_eq!(
            weekday_of("2025-09-19", WeekMode::Five),
            Ok(Some(Weekday::Friday))
        );
        assert_eq!(weekday_of("2025-09-20", WeekMode::Five), Ok(None));
        assert_eq!(weekday_of("2025-09-21", WeekMode::Five), Ok(None));
    }

    #[test]
    fn seven_day_mode_keeps_weekends() {
        assert_eq!(
            weekday_of("2025-09-20", WeekMode::Seven),
            Ok(Some(Weekday::Saturday))
        );
        assert_eq!(
            weekday_of("2025-09-21", WeekMode::Seven),
            Ok(Some(Weekday::Sunday))
        );
    }

    #[test]
    fn handles_leap_days_and_year_boundaries() {
        assert_eq!(
            weekday_of("2024-02-29", WeekMode::Five),
            Ok(Some(Weekday::Thursday))
        );
        assert_eq!(
            weekday_of("2025-01-01", WeekMode::Five),
            Ok(Some(Weekday::Wednesday))
        );

        let new_year = shift_date(parse_date("2024-12-31").unwrap(), 1);
        assert_eq!(format_date(new_year), "2025-01-01");
        let leap = shift_date(parse_date("2024-03-01").unwrap(), -1);
        assert_eq!(format_date(leap), "2024-02-29");
    }

    #[test]
    fn rejects_malformed_dates() {
        for raw in ["2025-02-30", "2025/09/15", "", "15-09-2025", "2023-02-29"] {
            assert_eq!(
                weekday_of(raw, WeekMode::Five),
                Err(AttendanceError::InvalidDate(raw.to_string()))
            );
        }
    }

    #[test]
    fn parses_weekday_names() {
        assert_eq!("monday".parse::<Weekday>(), Ok(Weekday::Monday));
        assert_eq!("Fri".parse::<Weekday>(), Ok(Weekday::Friday));
        assert!("funday".parse::<Weekday>().is_err());
    }
}
