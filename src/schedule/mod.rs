//! Delivery calendar: business days, holidays and phase timelines.

mod business_days;
mod holidays;

pub use business_days::{
    add_business_days, calculate_delivery_dates, format_date_long, format_date_short,
    is_business_day, is_weekend, Delivery, TimelinePhase, TIMELINE_PHASES,
};
pub use holidays::{
    holidays_for_year, is_holiday, Country, Holiday, HolidayRule, ObservedHoliday,
    MEXICAN_HOLIDAYS, US_HOLIDAYS,
};
