//! Static rule tables the stat engine reads from.
//!
//! A [`RuleTables`] holds the experience thresholds, the proficiency bonus
//! for each level, and the governing ability of every skill. The standard
//! 5e tables are built once and shared; project-specific rulesets can be
//! loaded from JSON.

use crate::stats::StatError;
use crate::world::{Ability, Skill};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::path::Path;
use thiserror::Error;
use tokio::fs;

/// Errors from loading or saving rule tables.
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid rule tables: {0}")]
    Invalid(#[from] StatError),
}

/// Valid proficiency bonuses. Keeps every derived modifier within `i8`.
pub const PROFICIENCY_BONUS_RANGE: RangeInclusive<i8> = 0..=30;

/// Experience point thresholds for levels 1-20.
pub const STANDARD_EXPERIENCE_THRESHOLDS: [u32; 20] = [
    0, 300, 900, 2700, 6500, 14000, 23000, 34000, 48000, 64000, 85000, 100000, 120000, 140000,
    165000, 195000, 225000, 265000, 305000, 355000,
];

lazy_static::lazy_static! {
    /// The standard 5e tables.
    pub static ref STANDARD_RULES: RuleTables = RuleTables {
        experience_thresholds: STANDARD_EXPERIENCE_THRESHOLDS.to_vec(),
        proficiency_bonuses: (1..=20u8).map(|level| 2 + ((level - 1) / 4) as i8).collect(),
        skill_abilities: Skill::all()
            .iter()
            .map(|skill| (*skill, standard_governing_ability(*skill)))
            .collect(),
    };
}

fn standard_governing_ability(skill: Skill) -> Ability {
    match skill {
        Skill::Athletics => Ability::Strength,
        Skill::Acrobatics | Skill::SleightOfHand | Skill::Stealth => Ability::Dexterity,
        Skill::Arcana
        | Skill::History
        | Skill::Investigation
        | Skill::Nature
        | Skill::Religion => Ability::Intelligence,
        Skill::AnimalHandling
        | Skill::Insight
        | Skill::Medicine
        | Skill::Perception
        | Skill::Survival => Ability::Wisdom,
        Skill::Deception | Skill::Intimidation | Skill::Performance | Skill::Persuasion => {
            Ability::Charisma
        }
    }
}

/// Configuration tables for derived statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTables {
    /// Minimum experience for each level; index 0 is level 1.
    pub experience_thresholds: Vec<u32>,
    /// Proficiency bonus for each level; index 0 is level 1.
    pub proficiency_bonuses: Vec<i8>,
    /// Governing ability for each skill.
    pub skill_abilities: HashMap<Skill, Ability>,
}

impl RuleTables {
    /// A copy of the standard 5e tables.
    pub fn standard() -> Self {
        STANDARD_RULES.clone()
    }

    pub fn with_experience_thresholds(mut self, thresholds: Vec<u32>) -> Self {
        self.experience_thresholds = thresholds;
        self
    }

    pub fn with_proficiency_bonuses(mut self, bonuses: Vec<i8>) -> Self {
        self.proficiency_bonuses = bonuses;
        self
    }

    pub fn with_skill_ability(mut self, skill: Skill, ability: Ability) -> Self {
        self.skill_abilities.insert(skill, ability);
        self
    }

    pub fn without_skill(mut self, skill: Skill) -> Self {
        self.skill_abilities.remove(&skill);
        self
    }

    /// Highest level the threshold table reaches.
    pub fn max_level(&self) -> u8 {
        self.experience_thresholds.len().min(u8::MAX as usize) as u8
    }

    /// Experience needed to reach `level`, if the table covers it.
    pub fn threshold_for(&self, level: u8) -> Option<u32> {
        let index = usize::from(level).checked_sub(1)?;
        self.experience_thresholds.get(index).copied()
    }

    pub fn governing_ability(&self, skill: Skill) -> Result<Ability, StatError> {
        self.skill_abilities.get(&skill).copied().ok_or_else(|| {
            StatError::Configuration(format!("no governing ability configured for {skill}"))
        })
    }

    pub fn proficiency_for(&self, level: u8) -> Result<i8, StatError> {
        if level == 0 {
            return Err(StatError::InvalidLevel(level));
        }
        self.proficiency_bonuses
            .get(usize::from(level) - 1)
            .copied()
            .ok_or_else(|| {
                StatError::Configuration(format!(
                    "no proficiency bonus configured for level {level}"
                ))
            })
    }

    /// Check the tables are complete and consistent.
    pub fn validate(&self) -> Result<(), StatError> {
        match self.experience_thresholds.first() {
            None => {
                return Err(StatError::Configuration(
                    "experience threshold table is empty".to_string(),
                ))
            }
            Some(&first) if first != 0 => {
                return Err(StatError::Configuration(format!(
                    "level 1 threshold must be 0, found {first}"
                )))
            }
            Some(_) => {}
        }

        if self.experience_thresholds.len() > usize::from(u8::MAX) {
            return Err(StatError::Configuration(format!(
                "threshold table has {} levels, at most {} supported",
                self.experience_thresholds.len(),
                u8::MAX
            )));
        }

        if let Some(pair) = self
            .experience_thresholds
            .windows(2)
            .position(|w| w[1] <= w[0])
        {
            return Err(StatError::Configuration(format!(
                "experience thresholds must increase strictly (level {} -> {})",
                pair + 1,
                pair + 2
            )));
        }

        if self.proficiency_bonuses.len() < self.experience_thresholds.len() {
            return Err(StatError::Configuration(format!(
                "proficiency bonuses cover {} levels but thresholds reach level {}",
                self.proficiency_bonuses.len(),
                self.experience_thresholds.len()
            )));
        }

        if let Some((index, bonus)) = self
            .proficiency_bonuses
            .iter()
            .enumerate()
            .find(|(_, bonus)| !PROFICIENCY_BONUS_RANGE.contains(*bonus))
        {
            return Err(StatError::Configuration(format!(
                "proficiency bonus {bonus} for level {} is outside {}..={}",
                index + 1,
                PROFICIENCY_BONUS_RANGE.start(),
                PROFICIENCY_BONUS_RANGE.end()
            )));
        }

        if let Some(missing) = Skill::all()
            .iter()
            .find(|s| !self.skill_abilities.contains_key(*s))
        {
            return Err(StatError::Configuration(format!(
                "no governing ability configured for {missing}"
            )));
        }

        Ok(())
    }

    /// Parse and validate tables from JSON.
    pub fn from_json(json: &str) -> Result<Self, RulesError> {
        let tables: Self = serde_json::from_str(json)?;
        tables.validate()?;
        Ok(tables)
    }

    pub fn to_json(&self) -> Result<String, RulesError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate tables from a JSON file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, RulesError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await?;
        let tables = Self::from_json(&content)?;
        tracing::info!(
            path = %path.display(),
            max_level = tables.max_level(),
            "loaded rule tables"
        );
        Ok(tables)
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), RulesError> {
        fs::write(path, self.to_json()?).await?;
        Ok(())
    }
}

impl Default for RuleTables {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_tables_are_complete() {
        let rules = RuleTables::standard();
        assert!(rules.validate().is_ok());
        assert_eq!(rules.max_level(), 20);
        assert_eq!(rules.skill_abilities.len(), Skill::all().len());
    }

    #[test]
    fn test_standard_proficiency_steps() {
        let rules = RuleTables::standard();
        assert_eq!(rules.proficiency_for(1).unwrap(), 2);
        assert_eq!(rules.proficiency_for(4).unwrap(), 2);
        assert_eq!(rules.proficiency_for(5).unwrap(), 3);
        assert_eq!(rules.proficiency_for(9).unwrap(), 4);
        assert_eq!(rules.proficiency_for(13).unwrap(), 5);
        assert_eq!(rules.proficiency_for(17).unwrap(), 6);
        assert_eq!(rules.proficiency_for(20).unwrap(), 6);
        assert!(matches!(
            rules.proficiency_for(0),
            Err(StatError::InvalidLevel(0))
        ));
        assert!(matches!(
            rules.proficiency_for(21),
            Err(StatError::Configuration(_))
        ));
    }

    #[test]
    fn test_standard_governing_abilities() {
        let rules = RuleTables::standard();
        assert_eq!(rules.governing_ability(Skill::Athletics).unwrap(), Ability::Strength);
        assert_eq!(rules.governing_ability(Skill::Stealth).unwrap(), Ability::Dexterity);
        assert_eq!(rules.governing_ability(Skill::Arcana).unwrap(), Ability::Intelligence);
        assert_eq!(rules.governing_ability(Skill::Perception).unwrap(), Ability::Wisdom);
        assert_eq!(rules.governing_ability(Skill::Persuasion).unwrap(), Ability::Charisma);
    }

    #[test]
    fn test_threshold_for() {
        let rules = RuleTables::standard();
        assert_eq!(rules.threshold_for(1), Some(0));
        assert_eq!(rules.threshold_for(5), Some(6500));
        assert_eq!(rules.threshold_for(0), None);
        assert_eq!(rules.threshold_for(21), None);
    }

    #[test]
    fn test_validate_rejects_incomplete_tables() {
        let empty = RuleTables::standard().with_experience_thresholds(vec![]);
        assert!(matches!(empty.validate(), Err(StatError::Configuration(_))));

        let bad_start = RuleTables::standard().with_experience_thresholds(vec![100, 300]);
        assert!(bad_start.validate().is_err());

        let not_increasing = RuleTables::standard().with_experience_thresholds(vec![0, 300, 300]);
        assert!(not_increasing.validate().is_err());

        let short_bonuses = RuleTables::standard().with_proficiency_bonuses(vec![2, 2]);
        assert!(short_bonuses.validate().is_err());

        let huge_bonus = RuleTables::standard().with_proficiency_bonuses(vec![64; 20]);
        let err = huge_bonus.validate().unwrap_err();
        assert!(err.to_string().contains("proficiency bonus 64 for level 1"));

        let negative_bonus = RuleTables::standard().with_proficiency_bonuses(vec![-1; 20]);
        assert!(negative_bonus.validate().is_err());

        let missing_skill = RuleTables::standard().without_skill(Skill::Insight);
        let err = missing_skill.validate().unwrap_err();
        assert!(err.to_string().contains("Insight"));
    }

    #[test]
    fn test_json_round_trip_validates() {
        let json = RuleTables::standard().to_json().unwrap();
        let parsed = RuleTables::from_json(&json).unwrap();
        assert_eq!(parsed, RuleTables::standard());

        let broken = RuleTables::standard()
            .without_skill(Skill::Medicine)
            .to_json()
            .unwrap();
        assert!(matches!(
            RuleTables::from_json(&broken),
            Err(RulesError::Invalid(StatError::Configuration(_)))
        ));
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("rules.json");

        let custom = RuleTables::standard()
            .with_experience_thresholds(vec![0, 100, 250])
            .with_proficiency_bonuses(vec![2, 2, 3]);
        custom.save(&path).await.unwrap();

        let loaded = RuleTables::load(&path).await.unwrap();
        assert_eq!(loaded.max_level(), 3);
        assert_eq!(loaded.proficiency_for(3).unwrap(), 3);
    }
}
