//! Order Numbers

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use rand::Rng;
use thiserror::Error;

const PREFIX: &str = "ORD";
const SUFFIX_LEN: usize = 6;
const SUFFIX_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// A malformed order number.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid order number: {0}")]
pub struct OrderNumberError(String);

/// Customer facing order reference, `ORD-<epoch millis>-<6 base36 chars>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Generate a new order number for the given creation time.
    pub fn generate<R>(epoch_millis: i64, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let suffix: String = (0..SUFFIX_LEN)
            .filter_map(|_| {
                SUFFIX_ALPHABET
                    .get(rng.gen_range(0..SUFFIX_ALPHABET.len()))
                    .map(|byte| char::from(*byte))
            })
            .collect();

        Self(format!("{PREFIX}-{epoch_millis}-{suffix}"))
    }

    /// The order number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl FromStr for OrderNumber {
    type Err = OrderNumberError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || OrderNumberError(value.to_string());

        let mut parts = value.split('-');

        let (Some(prefix), Some(millis), Some(suffix), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let well_formed = prefix == PREFIX
            && !millis.is_empty()
            && millis.bytes().all(|b| b.is_ascii_digit())
            && suffix.len() == SUFFIX_LEN
            && suffix.bytes().all(|b| SUFFIX_ALPHABET.contains(&b));

        if well_formed {
            Ok(Self(value.to_string()))
        } else {
            Err(invalid())
        }
    }
}
