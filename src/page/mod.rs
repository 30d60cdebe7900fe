// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value extraction from page payloads.
//!
//! A `GET;<id>` command returns a flat list of items:
//!
//! ```text
//! <Content><item id='0x4816ac'><name>Aanvoer</name><value>22.0°C</value></item>
//! <item id='0x43e60c'><name>Oververhitting</name><value>4.8 K</value></item>
//! <name>Temperaturen</name></Content>
//! ```
//!
//! Values carry a unit suffix that is discarded without validation, and the
//! device reports `---` when it has no current reading. Firmware variants
//! depend on this exact leniency, so the item markup is matched literally
//! instead of through a full XML parser.
//!
//! # Examples
//!
//! ```
//! use luxws::page;
//!
//! let payload = "<Content><item id='0x1'><name>Flow</name><value>22.0°C</value></item>\
//!                <item id='0x2'><name>Solar</name><value>---</value></item></Content>";
//!
//! assert_eq!(page::extract(payload, "Flow").unwrap(), 22.0);
//! assert_eq!(page::extract(payload, "Solar").unwrap(), 0.0);
//! assert!(page::extract(payload, "Return").is_err());
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::error::PageError;

/// Token the device sends for an item without a current reading.
pub const NO_READING: &str = "---";

static ITEM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<item id='[^']*'><name>([^<]*)</name><value>([^<]*)</value></item>")
        .expect("item pattern is valid")
});

static NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9.]+").expect("number pattern is valid"));

/// Returns the numeric value of the first item named `item` on the page.
///
/// # Errors
///
/// Returns `PageError::ItemNotFound` if no item has that exact name, and
/// `PageError::ValueDecode` if its value is neither numeric nor `---`.
pub fn extract(payload: &str, item: &str) -> Result<f64, PageError> {
    let token = find_value(payload, item).ok_or_else(|| PageError::ItemNotFound {
        item: item.to_string(),
    })?;

    decode_value(token).ok_or_else(|| PageError::ValueDecode {
        item: item.to_string(),
        token: token.to_string(),
    })
}

/// Returns the raw value token of the first item named `item`.
#[must_use]
pub fn find_value<'a>(payload: &'a str, item: &str) -> Option<&'a str> {
    ITEM_PATTERN
        .captures_iter(payload)
        .find(|captures| &captures[1] == item)
        .and_then(|captures| captures.get(2))
        .map(|value| value.as_str())
}

/// Decodes a value token such as `22.0°C`, `-3.5 K` or `---`.
///
/// The unit suffix is dropped, `---` yields `0.0`, and anything without a
/// parseable numeric prefix yields `None`.
#[must_use]
pub fn decode_value(token: &str) -> Option<f64> {
    if token.starts_with(NO_READING) {
        return Some(0.0);
    }

    NUMBER_PATTERN
        .find(token)
        .and_then(|number| number.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPERATURES: &str = "<Content>\
        <item id='0x4816ac'><name>Aanvoer</name><value>22.0°C</value></item>\
        <item id='0x44fdcc'><name>Retour</name><value>22.3°C</value></item>\
        <item id='0x448894'><name>Buitentemperatuur</name><value>-1.6°C</value></item>\
        <item id='0x48047c'><name>Gemiddelde temp.</name><value>13.1°C</value></item>\
        <item id='0x461ecc'><name>Zonneboiler</name><value>---</value></item>\
        <item id='0x43e60c'><name>Oververhitting</name><value>4.8 K</value></item>\
        <name>Temperaturen</name></Content>";

    #[test]
    fn extracts_value_and_strips_unit() {
        assert!((extract(TEMPERATURES, "Retour").unwrap() - 22.3).abs() < f64::EPSILON);
        assert!((extract(TEMPERATURES, "Oververhitting").unwrap() - 4.8).abs() < f64::EPSILON);
    }

    #[test]
    fn extracts_negative_value() {
        assert!((extract(TEMPERATURES, "Buitentemperatuur").unwrap() + 1.6).abs() < f64::EPSILON);
    }

    #[test]
    fn sentinel_is_zero() {
        assert_eq!(extract(TEMPERATURES, "Zonneboiler").unwrap(), 0.0);
    }

    #[test]
    fn missing_item_fails() {
        let err = extract(TEMPERATURES, "Heetgas").unwrap_err();
        assert_eq!(
            err,
            PageError::ItemNotFound {
                item: "Heetgas".to_string()
            }
        );
    }

    #[test]
    fn name_must_match_exactly() {
        // A '.' in the requested name must not act as a wildcard.
        assert!(extract(TEMPERATURES, "Gemiddelde tempX").is_err());
        assert!(extract(TEMPERATURES, "Gemiddelde temp.").is_ok());
        assert!(extract(TEMPERATURES, "aanvoer").is_err());
        assert!(extract(TEMPERATURES, "Aanvoe").is_err());
    }

    #[test]
    fn first_duplicate_wins() {
        let payload = "<Content><item id='0x1'><name>Flow</name><value>1.0°C</value></item>\
                       <item id='0x2'><name>Flow</name><value>2.0°C</value></item></Content>";
        assert_eq!(extract(payload, "Flow").unwrap(), 1.0);
    }

    #[test]
    fn non_numeric_value_fails_with_token() {
        let payload = "<Content><item id='0x1'><name>Flow</name><value>N/A</value></item></Content>";
        let err = extract(payload, "Flow").unwrap_err();
        assert_eq!(
            err,
            PageError::ValueDecode {
                item: "Flow".to_string(),
                token: "N/A".to_string(),
            }
        );
    }

    #[test]
    fn decodes_tokens() {
        assert_eq!(decode_value("22.0°C"), Some(22.0));
        assert_eq!(decode_value("1.5 bar"), Some(1.5));
        assert_eq!(decode_value("230V"), Some(230.0));
        assert_eq!(decode_value("1200 l/h"), Some(1200.0));
        assert_eq!(decode_value("-0.5°C"), Some(-0.5));
        assert_eq!(decode_value("---"), Some(0.0));
        assert_eq!(decode_value("--- °C"), Some(0.0));
    }

    #[test]
    fn rejects_undecodable_tokens() {
        assert_eq!(decode_value("N/A"), None);
        assert_eq!(decode_value(""), None);
        assert_eq!(decode_value("."), None);
        assert_eq!(decode_value("1.2.3°C"), None);
        assert_eq!(decode_value(" 22.0°C"), None);
    }

    #[test]
    fn finds_raw_token() {
        assert_eq!(find_value(TEMPERATURES, "Aanvoer"), Some("22.0°C"));
        assert_eq!(find_value(TEMPERATURES, "Temperaturen"), None);
    }
}
