//! Front-matter parsing

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use super::ContentError;

/// Delimiter line that opens and closes the front-matter block
const DELIMITER: &str = "---";

/// Custom deserializer that accepts any YAML scalar as a string
///
/// `date: 2024` decodes as an integer and `date: 2024-01-15` as a string,
/// both are kept verbatim.
fn string_or_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct StringOrScalar;

    impl<'de> Visitor<'de> for StringOrScalar {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a scalar value")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(StringOrScalar)
}

/// Author of a writing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    /// Twitter handle without the leading `@`
    pub twitter: String,
}

/// Open-graph fields used by link previews
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenGraph {
    pub description: String,
    pub image: String,
}

/// Front-matter metadata of a writing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    pub author: Author,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og: Option<OpenGraph>,
    #[serde(
        default,
        deserialize_with = "string_or_scalar",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<String>,
    /// Short summary shown on the writings index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Additional custom fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Metadata {
    /// Split a raw document into its metadata and markdown body
    ///
    /// The document must open with a `---` line and the metadata block must
    /// be closed by another `---` line. The returned body is the text after
    /// the closing delimiter line, untouched.
    pub fn parse(raw: &str) -> Result<(Self, &str), ContentError> {
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

        let (first, rest) = split_line(raw);
        if !is_delimiter(first) {
            return Err(ContentError::MalformedFrontMatter(
                "missing opening `---` delimiter".to_string(),
            ));
        }

        let mut offset = 0;
        while offset < rest.len() {
            let (line, next) = split_line(&rest[offset..]);
            if is_delimiter(line) {
                let block = &rest[..offset];
                let metadata = serde_yaml::from_str::<Metadata>(block)
                    .map_err(|e| ContentError::MalformedFrontMatter(e.to_string()))?;
                return Ok((metadata, next));
            }
            offset = rest.len() - next.len();
        }

        Err(ContentError::MalformedFrontMatter(
            "missing closing `---` delimiter".to_string(),
        ))
    }

    /// Open-graph description, if any
    pub fn og_description(&self) -> Option<&str> {
        self.og.as_ref().map(|og| og.description.as_str())
    }

    /// Open-graph image, if any
    pub fn og_image(&self) -> Option<&str> {
        self.og.as_ref().map(|og| og.image.as_str())
    }

    /// Parse the date field into a timestamp
    pub fn parse_date(&self) -> Option<NaiveDateTime> {
        self.date.as_deref().and_then(parse_date_string)
    }
}

/// Split off the first line, returning it without its line ending
fn split_line(s: &str) -> (&str, &str) {
    match s.find('\n') {
        Some(pos) => (&s[..pos], &s[pos + 1..]),
        None => (s, ""),
    }
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == DELIMITER
}

/// Parse a date string in the formats writings use
fn parse_date_string(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    let formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
    ];
    for fmt in formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.naive_utc())
}
