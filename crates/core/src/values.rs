//! Value stream - little-endian base-64 integers over the fumen alphabet
//!
//! Every number in a fumen is written as a fixed count of symbols from
//! `A-Z a-z 0-9 + /`, least significant symbol first.

use std::collections::VecDeque;

use crate::error::FormatError;

/// Symbols in value order
pub const ENCODE_TABLE: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Radix of a single symbol
pub const TABLE_LENGTH: u32 = 64;

fn decode_symbol(c: char) -> Result<u8, FormatError> {
    let v = match c {
        'A'..='Z' => c as u8 - b'A',
        'a'..='z' => c as u8 - b'a' + 26,
        '0'..='9' => c as u8 - b'0' + 52,
        '+' => 62,
        '/' => 63,
        _ => return Err(FormatError::InvalidSymbol(c)),
    };
    Ok(v)
}

/// A queue of 6-bit symbols
///
/// Decoding consumes from the front with [`Values::poll`]; encoding appends
/// with [`Values::push`] and may patch earlier symbols with [`Values::set`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Values {
    symbols: VecDeque<u8>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a symbol string (already stripped of prefixes and noise)
    pub fn parse(data: &str) -> Result<Self, FormatError> {
        let symbols = data
            .chars()
            .map(decode_symbol)
            .collect::<Result<VecDeque<_>, _>>()?;
        Ok(Self { symbols })
    }

    /// Consume `count` symbols and decode them as one little-endian number
    pub fn poll(&mut self, count: usize) -> Result<u32, FormatError> {
        if self.symbols.len() < count {
            return Err(FormatError::Truncated {
                needed: count,
                remaining: self.symbols.len(),
            });
        }

        let mut value = 0u32;
        let mut weight = 1u32;
        for _ in 0..count {
            if let Some(symbol) = self.symbols.pop_front() {
                value += symbol as u32 * weight;
            }
            weight = weight.wrapping_mul(TABLE_LENGTH);
        }
        Ok(value)
    }

    /// Append `value` as `count` symbols
    ///
    /// Bits beyond `64^count` are dropped.
    pub fn push(&mut self, value: u32, count: usize) {
        debug_assert!(count >= 5 || value < TABLE_LENGTH.pow(count as u32));
        let mut current = value;
        for _ in 0..count {
            self.symbols.push_back((current % TABLE_LENGTH) as u8);
            current /= TABLE_LENGTH;
        }
    }

    /// Append every symbol of `other`
    pub fn merge(&mut self, other: Values) {
        self.symbols.extend(other.symbols);
    }

    /// Symbol at `index`
    pub fn get(&self, index: usize) -> Option<u8> {
        self.symbols.get(index).copied()
    }

    /// Overwrite the symbol at `index`
    ///
    /// Returns false if `index` is past the end.
    pub fn set(&mut self, index: usize, value: u8) -> bool {
        match self.symbols.get_mut(index) {
            Some(slot) => {
                *slot = value % TABLE_LENGTH as u8;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl std::fmt::Display for Values {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for &symbol in &self.symbols {
            write!(f, "{}", ENCODE_TABLE[symbol as usize] as char)?;
        }
        Ok(())
    }
}
