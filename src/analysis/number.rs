//! Locale-aware numeric literal parsing.
//!
//! A [`NumberParser`] recognises terms that are complete numbers in one
//! locale's notation: an optional minus sign, digits with optional grouping
//! separators, and an optional fractional part after the decimal separator.
//! Grouping is lenient (separators may appear between any two digits).
//! Digits may come from any decimal digit script (Arabic-Indic, Devanagari,
//! fullwidth, ...), since many locales write numbers in native digits.
//! Locale symbols come from the CLDR tables shipped with `num-format`; when a
//! locale is absent from those tables no parser can be built.

use num_format::Locale;

use crate::error::{FolioError, Result};

/// Parses numbers written in one locale's notation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NumberParser {
    locale: String,
    decimal: String,
    separator: String,
    minus_sign: String,
}

impl NumberParser {
    /// Build a parser for a locale name such as `en`, `fr` or `de-CH`.
    ///
    /// Fails when no number format data exists for the locale.
    pub fn for_locale(name: &str) -> Result<Self> {
        let locale = Locale::from_name(name).map_err(|e| {
            FolioError::resource(format!("no number format data for locale '{name}': {e}"))
        })?;

        Ok(Self::with_symbols(
            locale.name(),
            locale.decimal(),
            locale.separator(),
            locale.minus_sign(),
        ))
    }

    /// Build a parser from explicit symbols.
    pub fn with_symbols(locale: &str, decimal: &str, separator: &str, minus_sign: &str) -> Self {
        NumberParser {
            locale: locale.to_string(),
            decimal: decimal.to_string(),
            separator: separator.to_string(),
            minus_sign: minus_sign.to_string(),
        }
    }

    /// The locale this parser was built for.
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Returns `true` when the whole of `term` is a number.
    ///
    /// A term that merely starts with a number (`12abc`) is not a number.
    pub fn is_number(&self, term: &str) -> bool {
        self.parse(term).is_some()
    }

    /// Parse `term` completely, returning its value.
    pub fn parse(&self, term: &str) -> Option<f64> {
        let (negative, rest) = self.strip_minus(term);

        let mut integer = String::new();
        let mut fraction = String::new();
        let mut in_fraction = false;
        let mut previous_was_digit = false;
        let mut remaining = rest;

        while let Some(c) = remaining.chars().next() {
            if let Some(digit) = decimal_digit(c) {
                if in_fraction {
                    fraction.push(digit);
                } else {
                    integer.push(digit);
                }
                previous_was_digit = true;
                remaining = &remaining[c.len_utf8()..];
            } else if !in_fraction && !self.decimal.is_empty() && remaining.starts_with(&self.decimal)
            {
                in_fraction = true;
                previous_was_digit = false;
                remaining = &remaining[self.decimal.len()..];
            } else if !in_fraction
                && previous_was_digit
                && !self.separator.is_empty()
                && remaining.starts_with(&self.separator)
            {
                remaining = &remaining[self.separator.len()..];
                // A group separator must be followed by a digit.
                if !remaining.starts_with(|c: char| decimal_digit(c).is_some()) {
                    return None;
                }
            } else {
                return None;
            }
        }

        if integer.is_empty() && fraction.is_empty() {
            return None;
        }
        if in_fraction && fraction.is_empty() {
            return None;
        }

        let literal = format!(
            "{}{}.{}",
            if negative { "-" } else { "" },
            if integer.is_empty() { "0" } else { &integer },
            if fraction.is_empty() { "0" } else { &fraction },
        );
        literal.parse::<f64>().ok()
    }

    fn strip_minus<'a>(&self, term: &'a str) -> (bool, &'a str) {
        if !self.minus_sign.is_empty() && term.starts_with(&self.minus_sign) {
            (true, &term[self.minus_sign.len()..])
        } else if let Some(rest) = term.strip_prefix('-') {
            (true, rest)
        } else {
            (false, term)
        }
    }
}

/// Code points of the zero digit of every decimal digit run (general
/// category `Nd`); each run holds the ten digits in order.
const DIGIT_ZEROS: &[u32] = &[
    0x0030, 0x0660, 0x06F0, 0x07C0, 0x0966, 0x09E6, 0x0A66, 0x0AE6, 0x0B66, 0x0BE6, 0x0C66,
    0x0CE6, 0x0D66, 0x0DE6, 0x0E50, 0x0ED0, 0x0F20, 0x1040, 0x1090, 0x17E0, 0x1810, 0x1946,
    0x19D0, 0x1A80, 0x1A90, 0x1B50, 0x1BB0, 0x1C40, 0x1C50, 0xA620, 0xA8D0, 0xA900, 0xA9D0,
    0xA9F0, 0xAA50, 0xABF0, 0xFF10, 0x104A0, 0x10D30, 0x11066, 0x110F0, 0x11136, 0x111D0,
    0x112F0, 0x11450, 0x114D0, 0x11650, 0x116C0, 0x11730, 0x118E0, 0x11950, 0x11C50, 0x11D50,
    0x11DA0, 0x11F50, 0x16A60, 0x16AC0, 0x16B50, 0x1D7CE, 0x1D7D8, 0x1D7E2, 0x1D7EC, 0x1D7F6,
    0x1E140, 0x1E2F0, 0x1E4F0, 0x1E950, 0x1FBF0,
];

/// The ASCII digit with the same value as `c`, if `c` is a decimal digit.
fn decimal_digit(c: char) -> Option<char> {
    if c.is_ascii_digit() {
        return Some(c);
    }
    if !c.is_numeric() {
        return None;
    }
    let code = c as u32;
    let index = DIGIT_ZEROS.partition_point(|&zero| zero <= code);
    let zero = DIGIT_ZEROS[index.checked_sub(1)?];
    let value = code - zero;
    if value < 10 {
        char::from_digit(value, 10)
    } else {
        None
    }
}
