//! Record parser and field normalization
//!
//! Turns one raw delimited row into a positional tuple of typed field
//! values, per the entity's descriptor. Normalization happens here, once,
//! so everything downstream of the parser only sees canonical values:
//!
//! - surrounding double quotes stripped, whitespace trimmed
//! - comma-decimal numerics become dot-decimal (`"1234,56"` -> 1234.56)
//! - single-character S/N flags become 1/0
//! - empty date strings become NULL, never a zero date
//! - CNAE activity codes are reformatted to `0000-0/00`
//!
//! Rows with fewer fields than the entity's minimum are skipped silently;
//! source files are known to contain trailing blank lines.

use crate::entities::{EntityDescriptor, FieldKind};
use crate::models::{FieldValue, Record};

/// Parser for one entity's rows
pub struct RecordParser<'a> {
    descriptor: &'a EntityDescriptor,
}

impl<'a> RecordParser<'a> {
    pub fn new(descriptor: &'a EntityDescriptor) -> Self {
        Self { descriptor }
    }

    /// Parse one raw row into a normalized record.
    ///
    /// Returns `None` for rows below the entity's minimum field count;
    /// those rows are dropped without an error. Fields beyond the
    /// descriptor's column list are ignored.
    pub fn parse<S: AsRef<str>>(&self, fields: &[S]) -> Option<Record> {
        if fields.len() < self.descriptor.min_fields {
            return None;
        }

        let record = self
            .descriptor
            .columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let raw = fields.get(idx).map(|f| f.as_ref()).unwrap_or("");
                normalize(column.kind, raw)
            })
            .collect();

        Some(record)
    }
}

/// Normalize one raw field into its canonical typed value
fn normalize(kind: FieldKind, raw: &str) -> FieldValue {
    let value = clean(raw);

    match kind {
        FieldKind::Text => FieldValue::Text(value.to_string()),
        FieldKind::Decimal => FieldValue::Real(parse_decimal(value)),
        FieldKind::Flag => FieldValue::Integer(i64::from(value == "S")),
        FieldKind::Date => {
            if value.is_empty() {
                FieldValue::Null
            } else {
                FieldValue::Text(value.to_string())
            }
        },
        FieldKind::ActivityCode => FieldValue::Text(format_activity_code(value)),
    }
}

/// Strip surrounding double quotes and whitespace
fn clean(raw: &str) -> &str {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('"').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('"').unwrap_or(trimmed);
    trimmed.trim()
}

/// Parse a comma-decimal numeric; unparseable values fall back to zero
fn parse_decimal(value: &str) -> f64 {
    value.replace(',', ".").parse().unwrap_or(0.0)
}

/// Reformat a CNAE code to the standard `0000-0/00` shape.
///
/// Non-digits are dropped first; codes shorter than seven digits are kept
/// as bare digits.
fn format_activity_code(value: &str) -> String {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() >= 7 {
        format!("{}-{}/{}", &digits[..4], &digits[4..5], &digits[5..])
    } else {
        digits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Entity;

    #[test]
    fn test_parse_empresa_row() {
        let desc = Entity::Empresas.descriptor();
        let parser = RecordParser::new(&desc);

        let fields = [
            "\"12345678\"",
            "\"ACME COMERCIO LTDA\"",
            "2062",
            "49",
            "\"1234,56\"",
            "03",
            "",
        ];
        let record = parser.parse(&fields).unwrap();

        assert_eq!(record[0], FieldValue::Text("12345678".to_string()));
        assert_eq!(record[1], FieldValue::Text("ACME COMERCIO LTDA".to_string()));
        assert_eq!(record[4], FieldValue::Real(1234.56));
        assert_eq!(record[6], FieldValue::Text(String::new()));
    }

    #[test]
    fn test_parse_short_row_is_skipped() {
        let desc = Entity::Empresas.descriptor();
        let parser = RecordParser::new(&desc);

        assert!(parser.parse(&["12345678", "ACME"]).is_none());
        assert!(parser.parse::<&str>(&[]).is_none());
    }

    #[test]
    fn test_parse_simples_flags_and_dates() {
        let desc = Entity::Simples.descriptor();
        let parser = RecordParser::new(&desc);

        let fields = ["12345678", "S", "20200101", "", "N", "", "20210630"];
        let record = parser.parse(&fields).unwrap();

        assert_eq!(record[1], FieldValue::Integer(1));
        assert_eq!(record[2], FieldValue::Text("20200101".to_string()));
        assert_eq!(record[3], FieldValue::Null);
        assert_eq!(record[4], FieldValue::Integer(0));
        assert_eq!(record[5], FieldValue::Null);
        assert_eq!(record[6], FieldValue::Text("20210630".to_string()));
    }

    #[test]
    fn test_parse_decimal_fallback() {
        assert_eq!(parse_decimal("1234,56"), 1234.56);
        assert_eq!(parse_decimal("1000"), 1000.0);
        assert_eq!(parse_decimal(""), 0.0);
        assert_eq!(parse_decimal("abc"), 0.0);
    }

    #[test]
    fn test_format_activity_code() {
        assert_eq!(format_activity_code("6201501"), "6201-5/01");
        assert_eq!(format_activity_code("6201-5/01"), "6201-5/01");
        assert_eq!(format_activity_code("123"), "123");
        assert_eq!(format_activity_code(""), "");
    }

    #[test]
    fn test_clean_strips_quotes_and_whitespace() {
        assert_eq!(clean("  \"ACME\"  "), "ACME");
        assert_eq!(clean("\"\""), "");
        assert_eq!(clean("plain"), "plain");
    }
}
