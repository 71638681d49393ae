//! Validators and formatters — raw text in, normalized value or `Rejected` out.
//!
//! Every function here is pure. The skip sentinel is never passed to a
//! validator: the engine intercepts it through [`is_skip_sentinel`] first.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Rejected;

/// Literal input meaning "leave this field blank".
pub const SKIP_SENTINEL: &str = "-";

/// Genitive month names used in contract dates.
const MONTHS_GENITIVE: [&str; 12] = [
    "января",
    "февраля",
    "марта",
    "апреля",
    "мая",
    "июня",
    "июля",
    "августа",
    "сентября",
    "октября",
    "ноября",
    "декабря",
];

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})\.(\d{1,2})\.(\d{4}|\d{2})$").expect("date pattern is valid")
});
static KADASTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{2}:\d{2}:\d{7}:\d{4}$").expect("cadastral pattern is valid")
});
static DECIMAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+(?:[.,][0-9]+)?$").expect("decimal pattern is valid")
});

/// The single predicate every field kind uses to recognise "skip".
pub fn is_skip_sentinel(raw: &str) -> bool {
    raw.trim() == SKIP_SENTINEL
}

/// Closed set of field validators.
///
/// Stored in the schema as data so deployments can describe fields without
/// code; [`Validator::apply`] dispatches to the matching formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Validator {
    NonEmpty,
    Date,
    PersonName,
    UpperCase,
    Digits { len: usize },
    Count,
    Area,
    Kadastr,
    Money,
    DayOfMonth,
    PositiveCount,
    MeterReading,
}

impl Validator {
    pub fn apply(&self, raw: &str) -> Result<String, Rejected> {
        match self {
            Self::NonEmpty => non_empty(raw),
            Self::Date => format_date(raw),
            Self::PersonName => format_person_name(raw),
            Self::UpperCase => to_upper(raw),
            Self::Digits { len } => fixed_digits(raw, *len),
            Self::Count => digits_only(raw),
            Self::Area => decimal(raw),
            Self::Kadastr => format_kadastr(raw),
            Self::Money => parse_money(raw).map(|amount| amount.to_string()),
            Self::DayOfMonth => day_of_month(raw),
            Self::PositiveCount => positive_count(raw),
            Self::MeterReading => decimal(raw),
        }
    }
}

pub fn non_empty(raw: &str) -> Result<String, Rejected> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(Rejected::new("Введите текст. Для пропуска используйте «-»."));
    }
    Ok(s.to_string())
}

/// Parse `ДД.ММ.ГГГГ` or `ДД.ММ.ГГ`. Two-digit years land in 20YY.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let caps = DATE_RE.captures(raw.trim())?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year_raw = &caps[3];
    let mut year: i32 = year_raw.parse().ok()?;
    if year_raw.len() == 2 {
        year += 2000;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Contract date form: `«02» февраля 2002 г.`
pub fn format_date(raw: &str) -> Result<String, Rejected> {
    let date = parse_date(raw)
        .ok_or_else(|| Rejected::new("❌ Неверная дата. Пример: 20.03.2025"))?;
    let month = MONTHS_GENITIVE[date.month0() as usize];
    Ok(format!("«{:02}» {} {} г.", date.day(), month, date.year()))
}

/// Capitalize the first character and lowercase the rest.
fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Title-case each hyphen-delimited segment independently and rejoin with
/// a bare hyphen: `санкт - петербург` → `Санкт-Петербург`.
pub fn title_case_hyphenated(raw: &str) -> String {
    raw.trim()
        .split('-')
        .map(|part| capitalize(part.trim()))
        .collect::<Vec<_>>()
        .join("-")
}

fn has_letter(s: &str) -> bool {
    s.chars().any(char::is_alphabetic)
}

fn has_digit(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
}

/// Personal name: every whitespace-separated word title-cased, hyphens kept.
pub fn format_person_name(raw: &str) -> Result<String, Rejected> {
    let words: Vec<String> = raw.split_whitespace().map(title_case_hyphenated).collect();
    if words.is_empty() || !has_letter(raw) {
        return Err(Rejected::new(
            "❌ Неверный формат ФИО. Пример: Иванов Иван Иванович",
        ));
    }
    Ok(words.join(" "))
}

pub fn to_upper(raw: &str) -> Result<String, Rejected> {
    non_empty(raw).map(|s| s.to_uppercase())
}

/// City or street: must contain a letter.
pub fn format_location(raw: &str) -> Result<String, Rejected> {
    if !has_letter(raw) {
        return Err(Rejected::new("Неверный формат. Пример: Тверская"));
    }
    Ok(title_case_hyphenated(raw))
}

/// House number: requires a digit and an already captured street.
///
/// Spaces are stripped and `корп.`/`стр.` shortened to `к`/`с`.
pub fn format_house(street: Option<&str>, raw: &str) -> Result<String, Rejected> {
    let house: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let street_ok = street.is_some_and(has_letter);
    if !street_ok || !has_digit(&house) {
        return Err(Rejected::new("Неверный дом. Пример: 10, 10к2, 10/2"));
    }
    Ok(house
        .replace("корп.", "к")
        .replace("корп", "к")
        .replace("стр.", "с")
        .replace("стр", "с"))
}

fn fixed_digits(raw: &str, len: usize) -> Result<String, Rejected> {
    let s = raw.trim();
    if s.len() == len && s.chars().all(|c| c.is_ascii_digit()) {
        Ok(s.to_string())
    } else {
        Err(Rejected::new(format!("❌ Нужно ровно {len} цифр.")))
    }
}

fn digits_only(raw: &str) -> Result<String, Rejected> {
    let s = raw.trim();
    if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
        Ok(s.to_string())
    } else {
        Err(Rejected::new("❌ Введите целое число."))
    }
}

/// Decimal with `.` or `,`, leading zeros preserved (meter readings, area).
fn decimal(raw: &str) -> Result<String, Rejected> {
    let s = raw.trim();
    if DECIMAL_RE.is_match(s) {
        Ok(s.to_string())
    } else {
        Err(Rejected::new("❌ Введите число. Пример: 00123 или 45,6"))
    }
}

pub fn format_kadastr(raw: &str) -> Result<String, Rejected> {
    let s = raw.trim();
    if KADASTR_RE.is_match(s) {
        Ok(s.to_string())
    } else {
        Err(Rejected::new(
            "❌ Неверный кадастровый номер. Пример: 00:00:0000000:0000",
        ))
    }
}

/// Money amount in whole roubles; spaces between digit groups are allowed.
pub fn parse_money(raw: &str) -> Result<u64, Rejected> {
    let digits: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(Rejected::new("❌ Неверная сумма. Пример: 30000 или 30 000"));
    }
    digits
        .parse()
        .map_err(|_| Rejected::new("❌ Слишком большая сумма."))
}

fn day_of_month(raw: &str) -> Result<String, Rejected> {
    let s = raw.trim();
    match s.parse::<u32>() {
        Ok(day) if (1..=31).contains(&day) && s.chars().all(|c| c.is_ascii_digit()) => {
            Ok(s.to_string())
        }
        _ => Err(Rejected::new("❌ Укажите число от 1 до 31.")),
    }
}

fn positive_count(raw: &str) -> Result<String, Rejected> {
    let s = digits_only(raw)?;
    if s.parse::<u64>().is_ok_and(|n| n > 0) {
        Ok(s)
    } else {
        Err(Rejected::new("❌ Количество должно быть больше нуля."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_sentinel_ignores_surrounding_space() {
        assert!(is_skip_sentinel("-"));
        assert!(is_skip_sentinel("  - "));
        assert!(!is_skip_sentinel("--"));
        assert!(!is_skip_sentinel(""));
    }

    #[test]
    fn dates_accept_short_and_long_years() {
        assert_eq!(format_date("20.03.25").unwrap(), "«20» марта 2025 г.");
        assert_eq!(format_date("2.2.2002").unwrap(), "«02» февраля 2002 г.");
        assert!(format_date("31.02.2025").is_err());
        assert!(format_date("2025-03-20").is_err());
        assert!(format_date("20.03.125").is_err());
    }

    #[test]
    fn person_name_title_cases_and_keeps_hyphens() {
        assert_eq!(
            format_person_name("  иванова-петрова   анна сергеевна ").unwrap(),
            "Иванова-Петрова Анна Сергеевна"
        );
        assert!(format_person_name("   ").is_err());
        assert!(format_person_name("123").is_err());
    }

    #[test]
    fn location_requires_a_letter() {
        assert_eq!(format_location("москва").unwrap(), "Москва");
        assert_eq!(format_location("санкт - петербург").unwrap(), "Санкт-Петербург");
        assert_eq!(format_location("ЛЕНИНА").unwrap(), "Ленина");
        assert!(format_location("123").is_err());
    }

    #[test]
    fn house_normalizes_abbreviations() {
        assert_eq!(format_house(Some("Тверская"), "10к2").unwrap(), "10к2");
        assert_eq!(format_house(Some("Тверская"), "10 корп. 2").unwrap(), "10к2");
        assert_eq!(format_house(Some("Тверская"), "5 стр 1").unwrap(), "5с1");
        assert!(format_house(Some("Тверская"), "А").is_err());
        assert!(format_house(None, "10").is_err());
    }

    #[test]
    fn passport_and_count_fields() {
        let series = Validator::Digits { len: 4 };
        assert_eq!(series.apply(" 4510 ").unwrap(), "4510");
        assert!(series.apply("451").is_err());
        assert!(series.apply("45a0").is_err());
        assert!(Validator::DayOfMonth.apply("0").is_err());
        assert!(Validator::DayOfMonth.apply("32").is_err());
        assert_eq!(Validator::DayOfMonth.apply("15").unwrap(), "15");
        assert!(Validator::PositiveCount.apply("0").is_err());
        assert_eq!(Validator::PositiveCount.apply("2").unwrap(), "2");
    }

    #[test]
    fn meter_reading_keeps_leading_zeros() {
        assert_eq!(Validator::MeterReading.apply("00123").unwrap(), "00123");
        assert_eq!(Validator::MeterReading.apply("0001,5").unwrap(), "0001,5");
        assert!(Validator::MeterReading.apply("12,").is_err());
    }

    #[test]
    fn kadastr_requires_exact_shape() {
        assert!(format_kadastr("78:11:0000000:1234").is_ok());
        assert!(format_kadastr("78:11:000000:1234").is_err());
    }

    #[test]
    fn money_accepts_grouped_input() {
        assert_eq!(parse_money("47 000").unwrap(), 47_000);
        assert_eq!(Validator::Money.apply("47000").unwrap(), "47000");
        assert!(parse_money("47к").is_err());
        assert!(parse_money("").is_err());
    }
}
