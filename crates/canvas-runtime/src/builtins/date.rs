//! A deterministic `Date`: "now" is the configured clock, all fields UTC.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SecondsFormat, TimeDelta, Timelike, Utc};

use crate::error::EvalResult;
use crate::evaluator::Interpreter;
use crate::value::Value;

/// Largest magnitude of a valid time value, in milliseconds.
const MAX_TIME: f64 = 8.64e15;

const INVALID: &str = "Invalid Date";

/// Local date-time forms accepted besides RFC 3339, all read as UTC.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"];

pub(super) fn date_ctor() -> Value {
    let statics = Value::object_from([(
        "now",
        Value::native("now", |interp, _, _| Ok(Value::Number(interp.now_ms()))),
    )]);
    Value::native_with_statics("Date", statics, construct)
}

fn construct(interp: &mut Interpreter, _this: Value, args: Vec<Value>) -> EvalResult<Value> {
    let time = match args.as_slice() {
        [] => interp.now_ms(),
        [Value::String(text)] => parse_iso(text).unwrap_or(f64::NAN),
        [single] => single.to_number(),
        [year, month, rest @ ..] => {
            let field = |i: usize, default: f64| rest.get(i).map_or(default, Value::to_number);
            from_fields(
                year.to_number(),
                month.to_number(),
                field(0, 1.0),
                field(1, 0.0),
                field(2, 0.0),
                field(3, 0.0),
            )
        }
    };
    Ok(date_object(time_clip(time)))
}

fn time_clip(time: f64) -> f64 {
    if !time.is_finite() || time.abs() > MAX_TIME {
        f64::NAN
    } else {
        time.trunc()
    }
}

/// The UTC instant of a time value, `None` for an invalid date.
fn instant(time: f64) -> Option<DateTime<Utc>> {
    if time.is_nan() {
        return None;
    }
    DateTime::from_timestamp_millis(time as i64)
}

fn date_object(time: f64) -> Value {
    let getter = |name: &str, f: fn(&DateTime<Utc>) -> u32| {
        Value::native(name, move |_, _, _| {
            Ok(Value::Number(instant(time).map_or(f64::NAN, |at| f64::from(f(&at)))))
        })
    };
    let formatted = |name: &str, f: fn(&DateTime<Utc>) -> String| {
        Value::native(name, move |_, _, _| {
            Ok(Value::string(instant(time).map_or_else(|| INVALID.to_string(), |at| f(&at))))
        })
    };
    Value::object_from([
        ("getTime", Value::native("getTime", move |_, _, _| Ok(Value::Number(time)))),
        ("valueOf", Value::native("valueOf", move |_, _, _| Ok(Value::Number(time)))),
        (
            "getFullYear",
            Value::native("getFullYear", move |_, _, _| {
                Ok(Value::Number(instant(time).map_or(f64::NAN, |at| f64::from(at.year()))))
            }),
        ),
        ("getMonth", getter("getMonth", |at| at.month0())),
        ("getDate", getter("getDate", |at| at.day())),
        ("getDay", getter("getDay", |at| at.weekday().num_days_from_sunday())),
        ("getHours", getter("getHours", |at| at.hour())),
        ("getMinutes", getter("getMinutes", |at| at.minute())),
        ("getSeconds", getter("getSeconds", |at| at.second())),
        ("getMilliseconds", getter("getMilliseconds", |at| at.timestamp_subsec_millis())),
        ("toISOString", formatted("toISOString", iso_string)),
        ("toJSON", formatted("toJSON", iso_string)),
        ("toLocaleDateString", formatted("toLocaleDateString", locale_date)),
        ("toLocaleTimeString", formatted("toLocaleTimeString", locale_time)),
        (
            "toLocaleString",
            formatted("toLocaleString", |at| format!("{}, {}", locale_date(at), locale_time(at))),
        ),
        ("toDateString", formatted("toDateString", |at| at.format("%a %b %d %Y").to_string())),
    ])
}

/// `new Date(year, month, ...)`: out-of-range fields carry into the next
/// larger unit, and years 0 to 99 mean 1900 to 1999.
fn from_fields(year: f64, month: f64, day: f64, hours: f64, minutes: f64, seconds: f64) -> f64 {
    if [year, month, day, hours, minutes, seconds].iter().any(|n| !n.is_finite()) {
        return f64::NAN;
    }
    let year = year.trunc();
    let year = if (0.0..=99.0).contains(&year) { 1900.0 + year } else { year };
    let month = month.trunc();
    let whole_year = year + (month / 12.0).floor();
    let month0 = month.rem_euclid(12.0);
    if whole_year.abs() > 400_000.0 {
        return f64::NAN;
    }
    let Some(first) = NaiveDate::from_ymd_opt(whole_year as i32, month0 as u32 + 1, 1).and_then(midnight) else {
        return f64::NAN;
    };
    let offset = (day.trunc() - 1.0) * 86_400_000.0 + hours * 3_600_000.0 + minutes * 60_000.0 + seconds * 1000.0;
    if offset.abs() > MAX_TIME * 2.0 {
        return f64::NAN;
    }
    TimeDelta::try_milliseconds(offset as i64)
        .and_then(|delta| first.and_utc().checked_add_signed(delta))
        .map_or(f64::NAN, |at| at.timestamp_millis() as f64)
}

/// RFC 3339 timestamps, plus `YYYY-MM-DD` with an optional time and no
/// offset, read as UTC.
fn parse_iso(text: &str) -> Option<f64> {
    let text = text.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Some(at.timestamp_millis() as f64);
    }
    let naive = text.trim_end_matches('Z');
    if let Some(at) = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(naive, format).ok())
    {
        return Some(at.and_utc().timestamp_millis() as f64);
    }
    NaiveDate::parse_from_str(naive, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{naive}-01"), "%Y-%m-%d"))
        .ok()
        .and_then(midnight)
        .map(|at| at.and_utc().timestamp_millis() as f64)
}

fn midnight(date: NaiveDate) -> Option<NaiveDateTime> {
    date.and_hms_opt(0, 0, 0)
}

fn iso_string(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn locale_date(at: &DateTime<Utc>) -> String {
    at.format("%-m/%-d/%Y").to_string()
}

fn locale_time(at: &DateTime<Utc>) -> String {
    at.format("%-I:%M:%S %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::tests::run;

    fn at(time: f64) -> DateTime<Utc> {
        instant(time).unwrap()
    }

    #[test]
    fn test_field_overflow_carries() {
        assert_eq!(from_fields(1970.0, 0.0, 1.0, 0.0, 0.0, 0.0), 0.0);
        assert_eq!(
            from_fields(2023.0, 12.0, 1.0, 0.0, 0.0, 0.0),
            from_fields(2024.0, 0.0, 1.0, 0.0, 0.0, 0.0)
        );
        let leap = from_fields(2024.0, 2.0, 0.0, 0.0, 0.0, 0.0);
        assert_eq!(at(leap).day(), 29);
        assert_eq!(at(from_fields(99.0, 0.0, 1.0, 0.0, 0.0, 0.0)).year(), 1999);
        assert!(from_fields(f64::NAN, 0.0, 1.0, 0.0, 0.0, 0.0).is_nan());
    }

    #[test]
    fn test_iso_strings() {
        assert_eq!(iso_string(&at(0.0)), "1970-01-01T00:00:00.000Z");
        let t = parse_iso("2024-03-05T14:30:00Z").unwrap();
        assert_eq!(iso_string(&at(t)), "2024-03-05T14:30:00.000Z");
        assert_eq!(parse_iso("2024-03-05T14:30"), Some(t));
        assert_eq!(parse_iso("2024-03-05T16:30:00+02:00"), Some(t));
        assert_eq!(locale_time(&at(t)), "2:30:00 PM");
        assert_eq!(locale_date(&at(t)), "3/5/2024");
        assert!(parse_iso("yesterday").is_none());
    }

    #[test]
    fn test_now_is_the_configured_clock() {
        let value = run("const result = Date.now() === new Date().getTime();").unwrap();
        assert!(value.is_truthy());
        let year = run("const result = new Date(2020, 0, 15).getFullYear();").unwrap();
        assert_eq!(year.to_number(), 2020.0);
        let day = run("const result = new Date(0).getDay();").unwrap();
        assert_eq!(day.to_number(), 4.0);
    }

    #[test]
    fn test_invalid_dates() {
        let text = run("const result = new Date(\"soon\").toISOString();").unwrap();
        assert_eq!(text.to_js_string(), INVALID);
        let month = run("const result = new Date(NaN).getMonth();").unwrap();
        assert!(month.to_number().is_nan());
        let text = run("const result = new Date(0).toDateString();").unwrap();
        assert_eq!(text.to_js_string(), "Thu Jan 01 1970");
    }
}
