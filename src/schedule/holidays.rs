//! Mexican and US federal holidays.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

/// Country a holiday belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Country {
    Mexico,
    Usa,
}

/// How a holiday's date is derived for a given year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HolidayRule {
    /// Same calendar day every year
    Fixed { month: u32, day: u32 },
    /// `n`-th `weekday` of the month (1-based)
    NthWeekday { month: u32, weekday: Weekday, n: u32 },
    /// Last `weekday` of the month
    LastWeekday { month: u32, weekday: Weekday },
}

impl HolidayRule {
    /// Date of this rule in `year`.
    pub fn date_in(&self, year: i32) -> Option<NaiveDate> {
        match *self {
            Self::Fixed { month, day } => NaiveDate::from_ymd_opt(year, month, day),
            Self::NthWeekday { month, weekday, n } => {
                let first = NaiveDate::from_ymd_opt(year, month, 1)?;
                let offset = (7 + weekday.num_days_from_sunday()
                    - first.weekday().num_days_from_sunday())
                    % 7;
                let weeks = n.checked_sub(1)?.checked_mul(7)?;
                NaiveDate::from_ymd_opt(year, month, (1 + offset).checked_add(weeks)?)
            }
            Self::LastWeekday { month, weekday } => {
                let last = last_day_of_month(year, month)?;
                let diff = (7 + last.weekday().num_days_from_sunday()
                    - weekday.num_days_from_sunday())
                    % 7;
                NaiveDate::from_ymd_opt(year, month, last.day() - diff)
            }
        }
    }
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

/// A named holiday.
#[derive(Debug, Clone, Copy)]
pub struct Holiday {
    pub name: &'static str,
    pub country: Country,
    pub rule: HolidayRule,
}

const fn fixed(name: &'static str, country: Country, month: u32, day: u32) -> Holiday {
    Holiday { name, country, rule: HolidayRule::Fixed { month, day } }
}

const fn nth(name: &'static str, country: Country, month: u32, weekday: Weekday, n: u32) -> Holiday {
    Holiday { name, country, rule: HolidayRule::NthWeekday { month, weekday, n } }
}

/// Mexican federal holidays.
pub static MEXICAN_HOLIDAYS: [Holiday; 7] = [
    fixed("Año Nuevo", Country::Mexico, 1, 1),
    nth("Día de la Constitución", Country::Mexico, 2, Weekday::Mon, 1),
    nth("Natalicio de Benito Juárez", Country::Mexico, 3, Weekday::Mon, 3),
    fixed("Día del Trabajo", Country::Mexico, 5, 1),
    fixed("Día de la Independencia", Country::Mexico, 9, 16),
    nth("Día de la Revolución", Country::Mexico, 11, Weekday::Mon, 3),
    fixed("Navidad", Country::Mexico, 12, 25),
];

/// US federal holidays.
pub static US_HOLIDAYS: [Holiday; 8] = [
    fixed("New Year's Day", Country::Usa, 1, 1),
    nth("Martin Luther King Jr. Day", Country::Usa, 1, Weekday::Mon, 3),
    nth("Presidents Day", Country::Usa, 2, Weekday::Mon, 3),
    Holiday {
        name: "Memorial Day",
        country: Country::Usa,
        rule: HolidayRule::LastWeekday { month: 5, weekday: Weekday::Mon },
    },
    fixed("Independence Day", Country::Usa, 7, 4),
    nth("Labor Day", Country::Usa, 9, Weekday::Mon, 1),
    nth("Thanksgiving", Country::Usa, 11, Weekday::Thu, 4),
    fixed("Christmas Day", Country::Usa, 12, 25),
];

/// A holiday resolved to a concrete date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObservedHoliday {
    pub date: NaiveDate,
    pub name: &'static str,
    pub country: Country,
}

/// Every Mexican and US holiday in `year`, sorted by date.
pub fn holidays_for_year(year: i32) -> Vec<ObservedHoliday> {
    let mut holidays: Vec<_> = MEXICAN_HOLIDAYS
        .iter()
        .chain(US_HOLIDAYS.iter())
        .filter_map(|h| {
            h.rule.date_in(year).map(|date| ObservedHoliday { date, name: h.name, country: h.country })
        })
        .collect();
    holidays.sort_by_key(|h| h.date);
    holidays
}

/// Whether `date` is a holiday in either country.
pub fn is_holiday(date: NaiveDate) -> bool {
    MEXICAN_HOLIDAYS
        .iter()
        .chain(US_HOLIDAYS.iter())
        .any(|h| h.rule.date_in(date.year()) == Some(date))
}
