//! Locale-aware number presentation

/// How numbers are written in replies
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NumberFormat {
    pub decimal_separator: char,
    pub max_fraction_digits: usize,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            decimal_separator: '.',
            max_fraction_digits: 1,
        }
    }
}

impl NumberFormat {
    /// Format used for a language tag such as `de` or `en-US`
    pub fn for_language(language: &str) -> Self {
        let primary = language
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        let decimal_separator = match primary.as_str() {
            "de" | "fr" | "es" | "it" | "nl" | "pt" | "pl" => ',',
            _ => '.',
        };
        Self {
            decimal_separator,
            ..Self::default()
        }
    }

    /// Round to `max_fraction_digits` and drop trailing zeros
    pub fn format(&self, value: f64) -> String {
        let mut text = format!("{:.*}", self.max_fraction_digits, value);
        if text.contains('.') {
            let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
            text.truncate(trimmed);
        }
        if text == "-0" {
            text = "0".to_string();
        }
        text.replace('.', &self.decimal_separator.to_string())
    }
}
