//! Entity Extractor (component B): deterministic regex/lexicon extraction
//! of dates, times, quantities, phones, emails, amounts and durations from
//! normalized Spanish-locale text.

use chrono::{Datelike, Duration as ChronoDuration, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Date,
    Time,
    Quantity,
    Phone,
    Email,
    Amount,
    Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub entity_type: EntityType,
    pub value: String,
    pub original_span: (usize, usize),
    pub confidence: f32,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Entity {
    fn new(
        entity_type: EntityType,
        value: impl Into<String>,
        span: (usize, usize),
        confidence: f32,
    ) -> Self {
        Self {
            entity_type,
            value: value.into(),
            original_span: span,
            confidence,
            metadata: serde_json::Map::new(),
        }
    }

    fn with_meta(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}

static WEEKDAY_WORDS: &[(&str, Weekday)] = &[
    ("lunes", Weekday::Mon),
    ("martes", Weekday::Tue),
    ("miercoles", Weekday::Wed),
    ("jueves", Weekday::Thu),
    ("viernes", Weekday::Fri),
    ("sabado", Weekday::Sat),
    ("domingo", Weekday::Sun),
];

static SPELLED_NUMBERS: &[(&str, u32)] = &[
    ("uno", 1),
    ("una", 1),
    ("dos", 2),
    ("tres", 3),
    ("cuatro", 4),
    ("cinco", 5),
    ("seis", 6),
    ("siete", 7),
    ("ocho", 8),
    ("nueve", 9),
    ("diez", 10),
    ("once", 11),
    ("doce", 12),
    ("trece", 13),
    ("catorce", 14),
    ("quince", 15),
    ("veinte", 20),
];

static MONTH_WORDS: &[(&str, u32)] = &[
    ("enero", 1),
    ("febrero", 2),
    ("marzo", 3),
    ("abril", 4),
    ("mayo", 5),
    ("junio", 6),
    ("julio", 7),
    ("agosto", 8),
    ("septiembre", 9),
    ("setiembre", 9),
    ("octubre", 10),
    ("noviembre", 11),
    ("diciembre", 12),
];

static TIME_12H_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(?::(\d{2}))?\s*(am|pm)\b").unwrap());
static TIME_A_LAS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\ba\s+las?\s+(\d{1,2})(?:\s*y\s*(media|cuarto)|:(\d{2}))?\b").unwrap()
});
static TIME_24H_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([01]?\d|2[0-3]):([0-5]\d)\b").unwrap());

static QUANTITY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:para|somos|seremos)\s+(\d{1,3}|uno|una|dos|tres|cuatro|cinco|seis|siete|ocho|nueve|diez|once|doce|trece|catorce|quince|veinte)\b|\b(\d{1,3}|uno|una|dos|tres|cuatro|cinco|seis|siete|ocho|nueve|diez|once|doce|trece|catorce|quince|veinte)\s+(?:personas|comensales|invitados)\b",
    )
    .unwrap()
});

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[\d][\d\s\-\.]{5,14}\d\b").unwrap());

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[\w.+-]+@[\w-]+\.[\w.-]+\b").unwrap());

static AMOUNT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\$\s?(\d+(?:[.,]\d+)?)|(\d+(?:[.,]\d+)?)\s*(pesos|mil|millon(?:es)?)\b")
        .unwrap()
});

static DURATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d+)\s*(horas?|minutos?)\b|\bmedia\s+hora\b|\bhora\s+y\s+media\b").unwrap()
});

static DATE_EXPLICIT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(\d{1,2})\s+de\s+(enero|febrero|marzo|abril|mayo|junio|julio|agosto|septiembre|setiembre|octubre|noviembre|diciembre)(?:\s+de\s+(\d{4}))?\b",
    )
    .unwrap()
});

fn spelled_to_number(word: &str) -> Option<u32> {
    SPELLED_NUMBERS
        .iter()
        .find(|(w, _)| *w == word)
        .map(|(_, n)| *n)
}

/// Resolves a relative/explicit date reference against `today`. Weekday
/// references always resolve to the next occurrence strictly after today:
/// if today is that weekday, we jump a full week rather than returning
/// today.
pub fn resolve_date(text: &str, today: NaiveDate) -> Option<(NaiveDate, f32)> {
    let lower = text.to_lowercase();

    if lower.contains("pasado mañana") || lower.contains("pasado manana") {
        return Some((today + ChronoDuration::days(2), 0.95));
    }
    if lower.contains("hoy") {
        return Some((today, 0.95));
    }
    if lower.contains("mañana") || lower.contains("manana") {
        return Some((today + ChronoDuration::days(1), 0.95));
    }
    if lower.contains("ayer") {
        return Some((today - ChronoDuration::days(1), 0.9));
    }

    for (word, weekday) in WEEKDAY_WORDS {
        if lower.contains(word) {
            let mut delta = (weekday.num_days_from_monday() as i64
                - today.weekday().num_days_from_monday() as i64
                + 7)
                % 7;
            if delta == 0 {
                delta = 7;
            }
            return Some((today + ChronoDuration::days(delta), 0.9));
        }
    }

    if let Some(caps) = DATE_EXPLICIT_PATTERN.captures(&lower) {
        let day: u32 = caps[1].parse().ok()?;
        let month = MONTH_WORDS
            .iter()
            .find(|(w, _)| *w == &caps[2])
            .map(|(_, m)| *m)?;
        let year = caps
            .get(3)
            .and_then(|y| y.as_str().parse::<i32>().ok())
            .unwrap_or_else(|| today.year());
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        return Some((date, 0.9));
    }

    None
}

/// Resolves a 12h/24h time reference to `HH:MM`, applying the "N<7 with no
/// period assumes PM" ambiguity rule for `a las N`.
pub fn resolve_time(text: &str) -> Option<(String, f32)> {
    let lower = text.to_lowercase();

    if let Some(caps) = TIME_12H_PATTERN.captures(&lower) {
        let mut hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
        let is_pm = caps[3].eq_ignore_ascii_case("pm");
        if is_pm && hour != 12 {
            hour += 12;
        }
        if !is_pm && hour == 12 {
            hour = 0;
        }
        return Some((format!("{hour:02}:{minute:02}"), 0.95));
    }

    if let Some(caps) = TIME_A_LAS_PATTERN.captures(&lower) {
        let mut hour: u32 = caps[1].parse().ok()?;
        let minute = match caps.get(2).map(|m| m.as_str()) {
            Some("media") => 30,
            Some("cuarto") => 15,
            _ => caps.get(3).and_then(|m| m.as_str().parse().ok()).unwrap_or(0),
        };
        if hour < 7 {
            hour += 12;
        }
        return Some((format!("{hour:02}:{minute:02}"), 0.8));
    }

    if let Some(caps) = TIME_24H_PATTERN.captures(&lower) {
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps[2].parse().ok()?;
        return Some((format!("{hour:02}:{minute:02}"), 0.9));
    }

    None
}

pub struct EntityExtractor;

impl Default for EntityExtractor {
    fn default() -> Self {
        Self
    }
}

impl EntityExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extracts all recognized entities from `text`, resolving dates/times
    /// relative to `today`. Overlapping spans keep the earlier (more
    /// specific) match.
    pub fn extract(&self, text: &str, today: NaiveDate) -> Vec<Entity> {
        let mut entities = Vec::new();
        let mut claimed: Vec<(usize, usize)> = Vec::new();

        let mut push = |e: Entity, claimed: &mut Vec<(usize, usize)>| {
            if claimed
                .iter()
                .any(|&(s, en)| e.original_span.0 < en && s < e.original_span.1)
            {
                return;
            }
            claimed.push(e.original_span);
            entities.push(e);
        };

        if let Some(m) = TIME_12H_PATTERN.find(text).or_else(|| TIME_A_LAS_PATTERN.find(text)) {
            if let Some((value, confidence)) = resolve_time(text) {
                push(
                    Entity::new(EntityType::Time, value, (m.start(), m.end()), confidence),
                    &mut claimed,
                );
            }
        } else if let Some(m) = TIME_24H_PATTERN.find(text) {
            if let Some((value, confidence)) = resolve_time(text) {
                push(
                    Entity::new(EntityType::Time, value, (m.start(), m.end()), confidence),
                    &mut claimed,
                );
            }
        }

        if let Some((date, confidence)) = resolve_date(text, today) {
            let span = DATE_EXPLICIT_PATTERN
                .find(text)
                .map(|m| (m.start(), m.end()))
                .unwrap_or((0, 0));
            push(
                Entity::new(
                    EntityType::Date,
                    date.format("%Y-%m-%d").to_string(),
                    span,
                    confidence,
                ),
                &mut claimed,
            );
        }

        if let Some(caps) = QUANTITY_PATTERN.captures(text) {
            let m = caps.get(0).unwrap();
            let raw = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|g| g.as_str())
                .unwrap_or_default();
            let qty = raw
                .parse::<u32>()
                .ok()
                .or_else(|| spelled_to_number(&raw.to_lowercase()));
            if let Some(qty) = qty.filter(|q| (1..=100).contains(q)) {
                push(
                    Entity::new(
                        EntityType::Quantity,
                        qty.to_string(),
                        (m.start(), m.end()),
                        0.9,
                    ),
                    &mut claimed,
                );
            }
        }

        if let Some(m) = EMAIL_PATTERN.find(text) {
            push(
                Entity::new(
                    EntityType::Email,
                    m.as_str().to_string(),
                    (m.start(), m.end()),
                    0.95,
                ),
                &mut claimed,
            );
        }

        if let Some(m) = PHONE_PATTERN.find(text) {
            let digits: String = m.as_str().chars().filter(|c| c.is_ascii_digit()).collect();
            if (7..=15).contains(&digits.len()) {
                let formatted = if digits.len() == 10 && digits.starts_with('3') {
                    format!("+57 {} {} {}", &digits[0..3], &digits[3..6], &digits[6..10])
                } else {
                    digits.clone()
                };
                push(
                    Entity::new(
                        EntityType::Phone,
                        formatted,
                        (m.start(), m.end()),
                        0.85,
                    )
                    .with_meta("digits", digits),
                    &mut claimed,
                );
            }
        }

        if let Some(caps) = AMOUNT_PATTERN.captures(text) {
            let m = caps.get(0).unwrap();
            let raw = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|g| g.as_str().replace(',', "."))
                .unwrap_or_default();
            if let Ok(mut amount) = raw.parse::<f64>() {
                if let Some(unit) = caps.get(3) {
                    let unit = unit.as_str().to_lowercase();
                    if unit == "mil" {
                        amount *= 1_000.0;
                    } else if unit.starts_with("millon") {
                        amount *= 1_000_000.0;
                    }
                }
                push(
                    Entity::new(
                        EntityType::Amount,
                        format!("{:.0}", amount),
                        (m.start(), m.end()),
                        0.9,
                    )
                    .with_meta("currency", "COP"),
                    &mut claimed,
                );
            }
        }

        if let Some(caps) = DURATION_PATTERN.captures(text) {
            let m = caps.get(0).unwrap();
            let minutes = if m.as_str().to_lowercase().contains("hora y media") {
                90
            } else if m.as_str().to_lowercase().contains("media hora") {
                30
            } else {
                let n: u32 = caps.get(1).and_then(|g| g.as_str().parse().ok()).unwrap_or(0);
                let unit = caps.get(2).map(|g| g.as_str().to_lowercase()).unwrap_or_default();
                if unit.starts_with("hora") {
                    n * 60
                } else {
                    n
                }
            };
            push(
                Entity::new(
                    EntityType::Duration,
                    minutes.to_string(),
                    (m.start(), m.end()),
                    0.9,
                ),
                &mut claimed,
            );
        }

        entities.sort_by_key(|e| e.original_span.0);
        entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, 30).unwrap() // a Thursday
    }

    #[test]
    fn resolves_tomorrow() {
        let (d, _) = resolve_date("para mañana", today()).unwrap();
        assert_eq!(d, today() + ChronoDuration::days(1));
    }

    #[test]
    fn weekday_resolves_strictly_after_today() {
        // today() is a Thursday; asking for "jueves" must jump to next week.
        let (d, _) = resolve_date("el jueves", today()).unwrap();
        assert_eq!(d, today() + ChronoDuration::days(7));
    }

    #[test]
    fn time_pm_ambiguity_rule() {
        let (t, _) = resolve_time("a las 8").unwrap();
        assert_eq!(t, "20:00");
    }

    #[test]
    fn extracts_quantity_guests() {
        let extractor = EntityExtractor::new();
        let entities = extractor.extract("somos 4 personas", today());
        assert!(entities
            .iter()
            .any(|e| e.entity_type == EntityType::Quantity && e.value == "4"));
    }

    #[test]
    fn normalizes_colombian_phone() {
        let extractor = EntityExtractor::new();
        let entities = extractor.extract("mi telefono es 3101234567", today());
        let phone = entities
            .iter()
            .find(|e| e.entity_type == EntityType::Phone)
            .unwrap();
        assert_eq!(phone.value, "+57 310 123 4567");
    }
}
