//! Derived statistics for a character sheet.
//!
//! Everything here is a pure function of a [`Character`] snapshot and a set
//! of [`RuleTables`]: levels, ability modifiers, saving throws, skill
//! modifiers, initiative and passive perception. Nothing is cached and no
//! input is mutated, so the same snapshot always yields the same numbers.
//!
//! Invalid input is reported, never papered over: a score outside 1-30 is
//! [`StatError::InvalidScore`], negative experience is
//! [`StatError::InvalidExperience`], and a hole in the rule tables is
//! [`StatError::Configuration`].

use crate::rules::{RuleTables, STANDARD_RULES};
use crate::world::{Ability, Character, Skill};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use thiserror::Error;

/// Valid ability scores.
pub const SCORE_RANGE: RangeInclusive<i32> = 1..=30;

/// Errors from stat computation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatError {
    #[error("Invalid ability score: {score} (must be between 1 and 30)")]
    InvalidScore { score: i32 },

    #[error("Invalid experience points: {0} (must not be negative)")]
    InvalidExperience(i64),

    #[error("Invalid level: {0}")]
    InvalidLevel(u8),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Modifier for an ability score: `floor((score - 10) / 2)`.
pub fn ability_modifier(score: i32) -> Result<i8, StatError> {
    if !SCORE_RANGE.contains(&score) {
        return Err(StatError::InvalidScore { score });
    }
    // Floor division: 9 -> -1, not 0
    Ok((score - 10).div_euclid(2) as i8)
}

fn overflow(what: &str) -> StatError {
    StatError::Configuration(format!("{what} overflows with the configured proficiency bonus"))
}

fn checked_sum(parts: &[i8], what: &str) -> Result<i8, StatError> {
    parts
        .iter()
        .try_fold(0i8, |total, part| total.checked_add(*part))
        .ok_or_else(|| overflow(what))
}

/// Computes derived statistics against a borrowed set of rule tables.
#[derive(Debug, Clone, Copy)]
pub struct StatEngine<'r> {
    rules: &'r RuleTables,
}

impl StatEngine<'static> {
    /// Engine backed by the standard 5e tables.
    pub fn standard() -> Self {
        Self {
            rules: &STANDARD_RULES,
        }
    }
}

impl<'r> StatEngine<'r> {
    /// Create an engine without checking the tables up front.
    ///
    /// Gaps in the tables surface as [`StatError::Configuration`] when a
    /// computation needs the missing entry.
    pub fn new(rules: &'r RuleTables) -> Self {
        Self { rules }
    }

    /// Create an engine after validating the tables are complete.
    pub fn checked(rules: &'r RuleTables) -> Result<Self, StatError> {
        rules.validate()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &'r RuleTables {
        self.rules
    }

    /// Highest level whose threshold is at or below `exp_points`.
    pub fn level(&self, exp_points: i64) -> Result<u8, StatError> {
        if exp_points < 0 {
            return Err(StatError::InvalidExperience(exp_points));
        }
        if self.rules.experience_thresholds.is_empty() {
            return Err(StatError::Configuration(
                "experience threshold table is empty".to_string(),
            ));
        }

        let reached = self
            .rules
            .experience_thresholds
            .iter()
            .take_while(|&&threshold| i64::from(threshold) <= exp_points)
            .count();

        if reached == 0 {
            return Err(StatError::Configuration(format!(
                "no level reachable with {exp_points} experience (level 1 threshold is {})",
                self.rules.experience_thresholds[0]
            )));
        }
        Ok(reached.min(usize::from(u8::MAX)) as u8)
    }

    /// Experience still needed for the next level, or `None` at the top of the table.
    pub fn experience_to_next_level(&self, exp_points: i64) -> Result<Option<u32>, StatError> {
        let level = self.level(exp_points)?;
        Ok(self.rules.threshold_for(level.saturating_add(1)).map(|next| {
            let needed = i64::from(next) - exp_points;
            needed.max(0) as u32
        }))
    }

    pub fn proficiency_bonus(&self, level: u8) -> Result<i8, StatError> {
        self.rules.proficiency_for(level)
    }

    pub fn character_level(&self, character: &Character) -> Result<u8, StatError> {
        self.level(character.exp_points)
    }

    pub fn character_proficiency_bonus(&self, character: &Character) -> Result<i8, StatError> {
        self.proficiency_bonus(self.character_level(character)?)
    }

    pub fn ability_modifier(
        &self,
        ability: Ability,
        character: &Character,
    ) -> Result<i8, StatError> {
        character.ability_scores.modifier(ability)
    }

    pub fn saving_throw_modifier(
        &self,
        ability: Ability,
        character: &Character,
    ) -> Result<i8, StatError> {
        let ability_mod = self.ability_modifier(ability, character)?;
        if character.has_save_proficiency(ability) {
            let bonus = self.character_proficiency_bonus(character)?;
            checked_sum(&[ability_mod, bonus], "saving throw modifier")
        } else {
            Ok(ability_mod)
        }
    }

    /// Governing ability modifier plus proficiency, doubled for expertise.
    pub fn skill_modifier(&self, skill: Skill, character: &Character) -> Result<i8, StatError> {
        let ability = self.rules.governing_ability(skill)?;
        let ability_mod = self.ability_modifier(ability, character)?;
        let bonus = self.character_proficiency_bonus(character)?;
        let proficiency = character
            .proficiency_level(skill)
            .bonus(bonus)
            .ok_or_else(|| overflow("expertise bonus"))?;
        checked_sum(&[ability_mod, proficiency], "skill modifier")
    }

    pub fn initiative(&self, character: &Character) -> Result<i8, StatError> {
        self.ability_modifier(Ability::Dexterity, character)
    }

    pub fn passive_perception(&self, character: &Character) -> Result<i8, StatError> {
        let perception = self.skill_modifier(Skill::Perception, character)?;
        checked_sum(&[10, perception], "passive perception")
    }

    /// Spell save DC for a caster using `ability`.
    pub fn spell_save_dc(&self, ability: Ability, character: &Character) -> Result<i8, StatError> {
        let attack = self.spell_attack_bonus(ability, character)?;
        checked_sum(&[8, attack], "spell save DC")
    }

    pub fn spell_attack_bonus(
        &self,
        ability: Ability,
        character: &Character,
    ) -> Result<i8, StatError> {
        let ability_mod = self.ability_modifier(ability, character)?;
        let bonus = self.character_proficiency_bonus(character)?;
        checked_sum(&[ability_mod, bonus], "spell attack bonus")
    }

    /// Every derived value on the sheet at once.
    pub fn stat_block(&self, character: &Character) -> Result<StatBlock, StatError> {
        let level = self.character_level(character)?;
        let proficiency_bonus = self.proficiency_bonus(level)?;

        let ability_modifiers = Ability::all()
            .into_iter()
            .map(|a| Ok((a, self.ability_modifier(a, character)?)))
            .collect::<Result<Vec<_>, StatError>>()?;
        let saving_throws = Ability::all()
            .into_iter()
            .map(|a| Ok((a, self.saving_throw_modifier(a, character)?)))
            .collect::<Result<Vec<_>, StatError>>()?;
        let skills = Skill::all()
            .iter()
            .map(|s| Ok((*s, self.skill_modifier(*s, character)?)))
            .collect::<Result<Vec<_>, StatError>>()?;

        Ok(StatBlock {
            level,
            proficiency_bonus,
            experience_to_next_level: self.experience_to_next_level(character.exp_points)?,
            ability_modifiers,
            saving_throws,
            skills,
            initiative: self.initiative(character)?,
            passive_perception: self.passive_perception(character)?,
        })
    }
}

impl Default for StatEngine<'static> {
    fn default() -> Self {
        Self::standard()
    }
}

/// Snapshot of all derived statistics for a character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBlock {
    pub level: u8,
    pub proficiency_bonus: i8,
    pub experience_to_next_level: Option<u32>,
    pub ability_modifiers: Vec<(Ability, i8)>,
    pub saving_throws: Vec<(Ability, i8)>,
    pub skills: Vec<(Skill, i8)>,
    pub initiative: i8,
    pub passive_perception: i8,
}

impl StatBlock {
    pub fn saving_throw(&self, ability: Ability) -> Option<i8> {
        self.saving_throws
            .iter()
            .find(|(a, _)| *a == ability)
            .map(|(_, m)| *m)
    }

    pub fn skill(&self, skill: Skill) -> Option<i8> {
        self.skills.iter().find(|(s, _)| *s == skill).map(|(_, m)| *m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_character;
    use crate::world::{AbilityScores, ProficiencyLevel};

    #[test]
    fn test_ability_modifier_floor_division() {
        assert_eq!(ability_modifier(10).unwrap(), 0);
        assert_eq!(ability_modifier(11).unwrap(), 0);
        assert_eq!(ability_modifier(9).unwrap(), -1);
        assert_eq!(ability_modifier(8).unwrap(), -1);
        assert_eq!(ability_modifier(1).unwrap(), -5);
        assert_eq!(ability_modifier(20).unwrap(), 5);
        assert_eq!(ability_modifier(30).unwrap(), 10);
    }

    #[test]
    fn test_ability_modifier_all_valid_scores() {
        for score in SCORE_RANGE {
            let expected = ((score as f64 - 10.0) / 2.0).floor() as i8;
            assert_eq!(ability_modifier(score).unwrap(), expected, "score {score}");
        }
    }

    #[test]
    fn test_ability_modifier_rejects_out_of_range() {
        assert_eq!(
            ability_modifier(0),
            Err(StatError::InvalidScore { score: 0 })
        );
        assert_eq!(
            ability_modifier(-3),
            Err(StatError::InvalidScore { score: -3 })
        );
        assert_eq!(
            ability_modifier(31),
            Err(StatError::InvalidScore { score: 31 })
        );
    }

    #[test]
    fn test_level_lookup() {
        let engine = StatEngine::standard();
        assert_eq!(engine.level(0).unwrap(), 1);
        assert_eq!(engine.level(299).unwrap(), 1);
        assert_eq!(engine.level(300).unwrap(), 2);
        assert_eq!(engine.level(6499).unwrap(), 4);
        assert_eq!(engine.level(6500).unwrap(), 5);
        assert_eq!(engine.level(355_000).unwrap(), 20);
        assert_eq!(engine.level(10_000_000).unwrap(), 20);
    }

    #[test]
    fn test_level_rejects_negative_experience() {
        let engine = StatEngine::standard();
        assert_eq!(engine.level(-1), Err(StatError::InvalidExperience(-1)));
    }

    #[test]
    fn test_level_with_empty_or_offset_table() {
        let empty = RuleTables::standard().with_experience_thresholds(vec![]);
        let engine = StatEngine::new(&empty);
        assert!(matches!(engine.level(0), Err(StatError::Configuration(_))));

        let offset = RuleTables::standard().with_experience_thresholds(vec![50, 100]);
        let engine = StatEngine::new(&offset);
        assert!(matches!(engine.level(10), Err(StatError::Configuration(_))));
        assert_eq!(engine.level(75).unwrap(), 1);
    }

    #[test]
    fn test_checked_engine_rejects_incomplete_tables() {
        let rules = RuleTables::standard().without_skill(Skill::Stealth);
        assert!(StatEngine::checked(&rules).is_err());
        let standard = RuleTables::standard();
        assert!(StatEngine::checked(&standard).is_ok());
    }

    #[test]
    fn test_experience_to_next_level() {
        let engine = StatEngine::standard();
        assert_eq!(engine.experience_to_next_level(0).unwrap(), Some(300));
        assert_eq!(engine.experience_to_next_level(1000).unwrap(), Some(1700));
        assert_eq!(engine.experience_to_next_level(355_000).unwrap(), None);
    }

    #[test]
    fn test_saving_throws() {
        let engine = StatEngine::standard();
        // Level 1 rogue: DEX 16, INT 12 proficient saves
        let rogue = sample_character("Vex");

        assert_eq!(engine.saving_throw_modifier(Ability::Dexterity, &rogue).unwrap(), 5);
        assert_eq!(engine.saving_throw_modifier(Ability::Intelligence, &rogue).unwrap(), 3);
        // Not proficient: ability modifier only
        assert_eq!(engine.saving_throw_modifier(Ability::Strength, &rogue).unwrap(), -1);
    }

    #[test]
    fn test_skill_modifier_by_proficiency() {
        let engine = StatEngine::standard();
        let mut character = sample_character("Vex");
        character.exp_points = 6500; // level 5, proficiency +3

        character.set_skill(Skill::Stealth, ProficiencyLevel::None);
        assert_eq!(engine.skill_modifier(Skill::Stealth, &character).unwrap(), 3);

        character.set_skill(Skill::Stealth, ProficiencyLevel::Proficient);
        assert_eq!(engine.skill_modifier(Skill::Stealth, &character).unwrap(), 6);

        character.set_skill(Skill::Stealth, ProficiencyLevel::Expertise);
        assert_eq!(engine.skill_modifier(Skill::Stealth, &character).unwrap(), 9);
    }

    #[test]
    fn test_expertise_counts_without_proficiency_entry() {
        let engine = StatEngine::standard();
        let mut character = sample_character("Vex");
        character.skill_prof.remove(&Skill::Insight);
        character.skill_expert.insert(Skill::Insight);

        // WIS 10 at level 1: 0 + 2 * 2
        assert_eq!(engine.skill_modifier(Skill::Insight, &character).unwrap(), 4);
    }

    #[test]
    fn test_skill_modifier_missing_configuration() {
        let rules = RuleTables::standard().without_skill(Skill::Perception);
        let engine = StatEngine::new(&rules);
        let character = sample_character("Vex");

        assert!(matches!(
            engine.skill_modifier(Skill::Perception, &character),
            Err(StatError::Configuration(_))
        ));
        assert!(matches!(
            engine.passive_perception(&character),
            Err(StatError::Configuration(_))
        ));
        // Other skills still work
        assert!(engine.skill_modifier(Skill::Stealth, &character).is_ok());
    }

    #[test]
    fn test_invalid_score_propagates() {
        let engine = StatEngine::standard();
        let mut character = sample_character("Vex");
        character.ability_scores.dexterity = 0;

        assert_eq!(
            engine.initiative(&character),
            Err(StatError::InvalidScore { score: 0 })
        );
        assert!(engine.stat_block(&character).is_err());
    }

    #[test]
    fn test_initiative_and_passive_perception() {
        let engine = StatEngine::standard();
        let character = sample_character("Vex");

        assert_eq!(engine.initiative(&character).unwrap(), 3);
        let perception = engine.skill_modifier(Skill::Perception, &character).unwrap();
        assert_eq!(engine.passive_perception(&character).unwrap(), 10 + perception);
    }

    #[test]
    fn test_oversized_proficiency_bonus_is_a_configuration_error() {
        let rules = RuleTables::standard().with_proficiency_bonuses(vec![64; 20]);
        assert!(StatEngine::checked(&rules).is_err());

        // An unchecked engine reports the overflow instead of wrapping
        let engine = StatEngine::new(&rules);
        let character = sample_character("Vex");
        assert!(matches!(
            engine.skill_modifier(Skill::Stealth, &character),
            Err(StatError::Configuration(_))
        ));
        assert!(matches!(
            engine.stat_block(&character),
            Err(StatError::Configuration(_))
        ));

        let rules = RuleTables::standard().with_proficiency_bonuses(vec![120; 20]);
        let engine = StatEngine::new(&rules);
        assert!(matches!(
            engine.spell_save_dc(Ability::Intelligence, &character),
            Err(StatError::Configuration(_))
        ));
    }

    #[test]
    fn test_largest_allowed_bonus_fits() {
        let rules = RuleTables::standard().with_proficiency_bonuses(vec![30; 20]);
        let engine = StatEngine::checked(&rules).unwrap();
        let mut character = sample_character("Vex");
        character.ability_scores = AbilityScores::new(30, 30, 30, 30, 30, 30);
        character.set_skill(Skill::Perception, ProficiencyLevel::Expertise);

        assert_eq!(engine.passive_perception(&character).unwrap(), 80);
        assert_eq!(engine.spell_save_dc(Ability::Wisdom, &character).unwrap(), 48);
    }

    #[test]
    fn test_custom_skill_mapping() {
        let rules =
            RuleTables::standard().with_skill_ability(Skill::Intimidation, Ability::Strength);
        let engine = StatEngine::new(&rules);
        let mut character = sample_character("Vex");
        character.ability_scores = AbilityScores::new(18, 10, 10, 10, 10, 8);

        assert_eq!(engine.skill_modifier(Skill::Intimidation, &character).unwrap(), 4);
    }

    #[test]
    fn test_spellcasting_numbers() {
        let engine = StatEngine::standard();
        let character = sample_character("Vex");
        // INT 12 (+1), proficiency +2
        assert_eq!(engine.spell_attack_bonus(Ability::Intelligence, &character).unwrap(), 3);
        assert_eq!(engine.spell_save_dc(Ability::Intelligence, &character).unwrap(), 11);
    }

    #[test]
    fn test_stat_block_matches_individual_calls() {
        let engine = StatEngine::standard();
        let character = sample_character("Vex");
        let block = engine.stat_block(&character).unwrap();

        assert_eq!(block.level, 1);
        assert_eq!(block.proficiency_bonus, 2);
        assert_eq!(block.experience_to_next_level, Some(300));
        assert_eq!(block.ability_modifiers.len(), 6);
        assert_eq!(block.skills.len(), Skill::all().len());
        for skill in Skill::all() {
            assert_eq!(
                block.skill(*skill),
                Some(engine.skill_modifier(*skill, &character).unwrap())
            );
        }
        assert_eq!(
            block.saving_throw(Ability::Dexterity),
            Some(engine.saving_throw_modifier(Ability::Dexterity, &character).unwrap())
        );
        assert_eq!(block.initiative, 3);
    }

    #[test]
    fn test_engine_is_idempotent() {
        let engine = StatEngine::standard();
        let character = sample_character("Vex");
        let before = character.clone();

        let first = engine.stat_block(&character).unwrap();
        let second = engine.stat_block(&character).unwrap();
        assert_eq!(first, second);
        assert_eq!(character, before);
    }
}
