//! Business-day arithmetic and the delivery timeline.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

use super::holidays::is_holiday;

/// Saturday or Sunday.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Neither a weekend nor a Mexican/US holiday.
pub fn is_business_day(date: NaiveDate) -> bool {
    !is_weekend(date) && !is_holiday(date)
}

/// Advance `days` business days from `start`, one calendar day at a time.
///
/// `start` itself is never counted. Stops at the last representable date.
pub fn add_business_days(start: NaiveDate, days: u32) -> NaiveDate {
    let mut date = start;
    let mut added = 0;
    while added < days {
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
        if is_business_day(date) {
            added += 1;
        }
    }
    date
}

/// A stage of the delivery timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimelinePhase {
    pub key: &'static str,
    pub name: &'static str,
    /// Minimum business days
    pub min_days: u32,
    /// Maximum business days
    pub max_days: u32,
    /// Human-readable duration
    pub label: &'static str,
}

impl TimelinePhase {
    /// Business days budgeted for this stage: the rounded-up midpoint.
    pub fn planned_days(&self) -> u32 {
        (self.min_days + self.max_days).div_ceil(2)
    }
}

const fn stage(
    key: &'static str,
    name: &'static str,
    min_days: u32,
    max_days: u32,
    label: &'static str,
) -> TimelinePhase {
    TimelinePhase { key, name, min_days, max_days, label }
}

/// Timeline stages in delivery order.
pub static TIMELINE_PHASES: [TimelinePhase; 10] = [
    stage("pre-kickoff", "Pre-KO", 2, 3, "2-3 dias"),
    stage("kickoff-meeting", "KO Meeting", 1, 1, "1 dia"),
    stage("briefing", "Briefing", 2, 3, "2-3 dias"),
    stage("survey-design", "Survey Design", 10, 10, "2 semanas"),
    stage("programming", "Programming", 3, 5, "3-5 dias"),
    stage("soft-launch", "Soft Launch", 2, 3, "2-3 dias"),
    stage("full-launch", "Full Launch", 10, 10, "2 semanas"),
    stage("analysis-plan", "Analysis Plan", 3, 5, "3-5 dias"),
    stage("insights", "Insights", 3, 5, "3-5 dias"),
    stage("report", "Report", 10, 15, "2-3 semanas"),
];

/// Estimated delivery date of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub phase: TimelinePhase,
    pub date: NaiveDate,
}

/// Estimate delivery dates for every stage from the kickoff date.
///
/// Pre-kickoff is due on the kickoff date and the meeting itself one
/// business day later. Every later stage adds its planned days to the
/// previous stage's date.
pub fn calculate_delivery_dates(kickoff: NaiveDate) -> Vec<Delivery> {
    let mut deliveries = Vec::with_capacity(TIMELINE_PHASES.len());
    let mut date = kickoff;

    for (i, phase) in TIMELINE_PHASES.iter().enumerate() {
        date = match i {
            0 => kickoff,
            1 => add_business_days(kickoff, 1),
            _ => add_business_days(date, phase.planned_days()),
        };
        deliveries.push(Delivery { phase: *phase, date });
    }

    deliveries
}

const MONTHS_SHORT: [&str; 12] =
    ["Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic"];

const MONTHS_LONG: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// `"Ene 15"`
pub fn format_date_short(date: NaiveDate) -> String {
    format!("{} {}", MONTHS_SHORT[date.month0() as usize], date.day())
}

/// `"15 de Enero, 2024"`
pub fn format_date_long(date: NaiveDate) -> String {
    format!("{} de {}, {}", date.day(), MONTHS_LONG[date.month0() as usize], date.year())
}
