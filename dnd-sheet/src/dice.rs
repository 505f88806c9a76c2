//! Die types and dice-pool notation.
//!
//! Hit dice are stored on the character sheet as notation such as `3d8` or
//! `2d10+1d8` (one term per class). This module parses that notation and
//! rolls individual dice.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for dice parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("Invalid dice notation: {0}")]
    InvalidNotation(String),
    #[error("Invalid die size: {0}")]
    InvalidDieSize(u32),
    #[error("No dice specified")]
    NoDice,
    #[error("Too many {0} dice")]
    TooManyDice(DieType),
}

/// Standard D&D die types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DieType {
    D4,
    D6,
    D8,
    D10,
    D12,
    D20,
    D100,
}

impl DieType {
    pub fn sides(&self) -> u32 {
        match self {
            DieType::D4 => 4,
            DieType::D6 => 6,
            DieType::D8 => 8,
            DieType::D10 => 10,
            DieType::D12 => 12,
            DieType::D20 => 20,
            DieType::D100 => 100,
        }
    }

    pub fn from_sides(sides: u32) -> Option<DieType> {
        match sides {
            4 => Some(DieType::D4),
            6 => Some(DieType::D6),
            8 => Some(DieType::D8),
            10 => Some(DieType::D10),
            12 => Some(DieType::D12),
            20 => Some(DieType::D20),
            100 => Some(DieType::D100),
            _ => None,
        }
    }

    /// Roll one die of this type.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        rng.gen_range(1..=self.sides())
    }
}

impl fmt::Display for DieType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.sides())
    }
}

/// One `NdX` term of a dice pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceTerm {
    pub count: u32,
    pub die_type: DieType,
}

impl fmt::Display for DiceTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.count, self.die_type)
    }
}

impl FromStr for DiceTerm {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let term = s.trim().to_lowercase();
        let d_pos = term
            .find('d')
            .ok_or_else(|| DiceError::InvalidNotation(s.to_string()))?;

        let count_str = &term[..d_pos];
        let count: u32 = if count_str.is_empty() {
            1
        } else {
            count_str
                .parse()
                .map_err(|_| DiceError::InvalidNotation(s.to_string()))?
        };

        let sides: u32 = term[d_pos + 1..]
            .parse()
            .map_err(|_| DiceError::InvalidNotation(s.to_string()))?;
        let die_type = DieType::from_sides(sides).ok_or(DiceError::InvalidDieSize(sides))?;

        Ok(DiceTerm { count, die_type })
    }
}

/// Parse a pool such as `2d10+1d8` into its terms.
///
/// Modifiers and subtraction are not meaningful for hit dice and are
/// rejected.
pub fn parse_pool(notation: &str) -> Result<Vec<DiceTerm>, DiceError> {
    let trimmed = notation.trim();
    if trimmed.is_empty() {
        return Err(DiceError::NoDice);
    }

    let terms = trimmed
        .split('+')
        .map(str::parse)
        .collect::<Result<Vec<DiceTerm>, _>>()?;

    if terms.iter().all(|t| t.count == 0) {
        return Err(DiceError::NoDice);
    }
    Ok(terms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_parse_single_term() {
        let terms = parse_pool("3d8").unwrap();
        assert_eq!(
            terms,
            vec![DiceTerm {
                count: 3,
                die_type: DieType::D8
            }]
        );
    }

    #[test]
    fn test_parse_multiclass_pool() {
        let terms = parse_pool("2d10 + d8").unwrap();
        assert_eq!(terms.len(), 2);
        assert_eq!(terms[0].die_type, DieType::D10);
        assert_eq!(terms[1].count, 1);
        assert_eq!(terms[1].die_type, DieType::D8);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_pool(""), Err(DiceError::NoDice));
        assert_eq!(parse_pool("0d6"), Err(DiceError::NoDice));
        assert_eq!(parse_pool("2d7"), Err(DiceError::InvalidDieSize(7)));
        assert!(matches!(
            parse_pool("2d8-1"),
            Err(DiceError::InvalidNotation(_))
        ));
        assert!(matches!(parse_pool("eight"), Err(DiceError::InvalidNotation(_))));
    }

    #[test]
    fn test_roll_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let roll = DieType::D6.roll(&mut rng);
            assert!((1..=6).contains(&roll));
        }
    }

    #[test]
    fn test_display() {
        let term: DiceTerm = "4d12".parse().unwrap();
        assert_eq!(term.to_string(), "4d12");
    }
}
