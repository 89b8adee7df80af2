use thiserror::Error;

use crate::apis::gizmo::QueryValue;

pub const DATE_FROM: &str = "DateFrom";
pub const DATE_TO: &str = "DateTo";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgsError {
    #[error("insufficient request args provided, at least DateFrom and DateTo are required")]
    InsufficientArgs,
    #[error("DateFrom arg is missing")]
    MissingDateFrom,
    #[error("DateTo arg is missing")]
    MissingDateTo,
    #[error("invalid arg \"{0}\", expected KEY=VALUE")]
    Malformed(String),
}

/// Parses a single `KEY=VALUE` pair. Everything after the first `=` is the
/// value.
pub fn parse_key_value(text: &str) -> Result<(String, String), ArgsError> {
    match text.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_owned(), value.to_owned())),
        _ => Err(ArgsError::Malformed(text.to_owned())),
    }
}

/// Query arguments forwarded to the report endpoint. Always contains a
/// non-empty `DateFrom` and `DateTo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestArgs {
    pairs: Vec<(String, String)>,
}

impl RequestArgs {
    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, ArgsError> {
        let given: Vec<(String, String)> = pairs.into_iter().collect();
        if given.len() < 2 {
            return Err(ArgsError::InsufficientArgs);
        }

        // later occurrences of a key replace earlier ones in place
        let mut pairs: Vec<(String, String)> = Vec::with_capacity(given.len());
        for (key, value) in given {
            match pairs.iter_mut().find(|(k, _)| *k == key) {
                Some(existing) => existing.1 = value,
                None => pairs.push((key, value)),
            }
        }

        let args = Self { pairs };
        if args.get(DATE_FROM).map_or(true, str::is_empty) {
            return Err(ArgsError::MissingDateFrom);
        }
        if args.get(DATE_TO).map_or(true, str::is_empty) {
            return Err(ArgsError::MissingDateTo);
        }
        Ok(args)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn date_from(&self) -> &str {
        self.get(DATE_FROM).unwrap_or_default()
    }

    pub fn date_to(&self) -> &str {
        self.get(DATE_TO).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn to_query(&self) -> Vec<(String, QueryValue)> {
        self.pairs.iter().map(|(k, v)| (k.clone(), QueryValue::Text(v.clone()))).collect()
    }
}
