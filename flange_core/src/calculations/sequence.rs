//! Bolt marking sequence.
//!
//! Bolts are marked around the flange in a star pattern so that tightening
//! them "sequentially 1, 2, 3 ..." loads the gasket evenly. The order comes
//! from a bit-reversal permutation over half the bolt count: every odd
//! position in the pattern is visited first, then the diametrically paired
//! even positions.

use serde::{Deserialize, Serialize};

use crate::reference::ReferenceData;

/// Direction bolts are numbered in, starting near 12 o'clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NumberingDirection {
    #[default]
    #[serde(rename = "CW", alias = "cw", alias = "clockwise")]
    Clockwise,
    #[serde(rename = "CCW", alias = "ccw", alias = "counterclockwise")]
    CounterClockwise,
}

impl NumberingDirection {
    pub fn code(&self) -> &'static str {
        match self {
            NumberingDirection::Clockwise => "CW",
            NumberingDirection::CounterClockwise => "CCW",
        }
    }

    /// Word used in the marking instruction
    pub fn word(&self) -> &'static str {
        match self {
            NumberingDirection::Clockwise => "clockwise",
            NumberingDirection::CounterClockwise => "counterclockwise",
        }
    }

    /// Anything other than `CCW` numbers clockwise.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "CCW" | "COUNTERCLOCKWISE" => NumberingDirection::CounterClockwise,
            _ => NumberingDirection::Clockwise,
        }
    }
}

impl std::fmt::Display for NumberingDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.word())
    }
}

/// Reverse the lowest `bit_count` bits of `value`.
pub fn reverse_bits(value: u32, bit_count: u32) -> u32 {
    let mut v = value;
    let mut result = 0;
    for _ in 0..bit_count {
        result = (result << 1) | (v & 1);
        v >>= 1;
    }
    result
}

/// Marking order for an even bolt count of at least 4.
///
/// Odd counts and counts below 4 have no star pattern and return an empty
/// list.
///
/// ```rust
/// use flange_core::calculations::generate_bolt_sequence;
///
/// assert_eq!(generate_bolt_sequence(8), vec![1, 5, 3, 7, 2, 6, 4, 8]);
/// assert!(generate_bolt_sequence(7).is_empty());
/// ```
pub fn generate_bolt_sequence(bolt_count: u32) -> Vec<u32> {
    if bolt_count < 4 || bolt_count % 2 != 0 {
        return Vec::new();
    }
    let half = bolt_count / 2;
    let mut pow2 = 1u32;
    let mut bits = 0u32;
    while pow2 < half {
        pow2 <<= 1;
        bits += 1;
    }

    let order: Vec<u32> = (0..pow2)
        .map(|i| reverse_bits(i, bits))
        .filter(|&rev| rev < half)
        .collect();

    order
        .iter()
        .map(|v| 2 * v + 1)
        .chain(order.iter().map(|v| 2 * v + 2))
        .collect()
}

/// Marking order, using the reference table's fixed order when it has one.
pub fn bolt_sequence(data: &ReferenceData, bolt_count: u32) -> Vec<u32> {
    match data.sequence_override(bolt_count) {
        Some(seq) => seq.to_vec(),
        None => generate_bolt_sequence(bolt_count),
    }
}

/// Instruction printed on the form and report.
///
/// Falls back to plain `1..n` numbering when there is no star pattern.
pub fn marking_instruction(bolt_count: u32, direction: NumberingDirection, sequence: &[u32]) -> String {
    let order: Vec<String> = if sequence.is_empty() {
        (1..=bolt_count).map(|n| n.to_string()).collect()
    } else {
        sequence.iter().map(|n| n.to_string()).collect()
    };
    format!(
        "{bolt_count} bolt holes starting from approx. 12 o'clock going {}, \
         mark each bolt in this order: {}.\n\
         Tightening order: sequential 1, 2, 3, 4 ...",
        direction.word(),
        order.join(", ")
    )
}
