//! D&D 5e character sheet types.
//!
//! Contains the entity model: users, campaigns, characters and the
//! reference records (races, classes, backgrounds) a character points at.
//! Containers a character owns outright live in [`crate::items`] and
//! [`crate::spells`].

use crate::dice::{self, DiceError, DieType};
use crate::items::{Arsenal, Inventory, Wallet};
use crate::spells::Spellbook;
use crate::stats::{self, StatError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Unique identifier for users (players and dungeon masters).
    UserId
);
entity_id!(
    /// Unique identifier for campaigns.
    CampaignId
);
entity_id!(
    /// Unique identifier for characters.
    CharacterId
);
entity_id!(RaceId);
entity_id!(ClassId);
entity_id!(BackgroundId);
entity_id!(InventoryId);
entity_id!(WalletId);
entity_id!(ArsenalId);
entity_id!(SpellbookId);
entity_id!(WeaponId);
entity_id!(SpellId);

// ============================================================================
// Users and Campaigns
// ============================================================================

/// An account that can run campaigns and play characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

impl User {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            email: email.into(),
        }
    }
}

/// A campaign run by a single dungeon master.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub description: Option<String>,
    pub dungeon_master: UserId,
}

impl Campaign {
    pub fn new(name: impl Into<String>, dungeon_master: UserId) -> Self {
        Self {
            id: CampaignId::new(),
            name: name.into(),
            description: None,
            dungeon_master,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

// ============================================================================
// Ability Scores
// ============================================================================

/// The six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Ability::Strength => "STR",
            Ability::Dexterity => "DEX",
            Ability::Constitution => "CON",
            Ability::Intelligence => "INT",
            Ability::Wisdom => "WIS",
            Ability::Charisma => "CHA",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Ability::Strength => "Strength",
            Ability::Dexterity => "Dexterity",
            Ability::Constitution => "Constitution",
            Ability::Intelligence => "Intelligence",
            Ability::Wisdom => "Wisdom",
            Ability::Charisma => "Charisma",
        }
    }

    pub fn all() -> [Ability; 6] {
        [
            Ability::Strength,
            Ability::Dexterity,
            Ability::Constitution,
            Ability::Intelligence,
            Ability::Wisdom,
            Ability::Charisma,
        ]
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

impl FromStr for Ability {
    type Err = String;

    /// Accepts the abbreviation (`str`, `DEX`) or the full name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Ability::all()
            .into_iter()
            .find(|a| {
                a.abbreviation().eq_ignore_ascii_case(needle)
                    || a.name().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| format!("Unknown ability: {s}"))
    }
}

/// Ability scores container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    pub strength: u8,
    pub dexterity: u8,
    pub constitution: u8,
    pub intelligence: u8,
    pub wisdom: u8,
    pub charisma: u8,
}

impl AbilityScores {
    pub fn new(str: u8, dex: u8, con: u8, int: u8, wis: u8, cha: u8) -> Self {
        Self {
            strength: str,
            dexterity: dex,
            constitution: con,
            intelligence: int,
            wisdom: wis,
            charisma: cha,
        }
    }

    pub fn standard_array() -> Self {
        Self::new(15, 14, 13, 12, 10, 8)
    }

    pub fn get(&self, ability: Ability) -> u8 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }

    pub fn set(&mut self, ability: Ability, value: u8) {
        match ability {
            Ability::Strength => self.strength = value,
            Ability::Dexterity => self.dexterity = value,
            Ability::Constitution => self.constitution = value,
            Ability::Intelligence => self.intelligence = value,
            Ability::Wisdom => self.wisdom = value,
            Ability::Charisma => self.charisma = value,
        }
    }

    pub fn modifier(&self, ability: Ability) -> Result<i8, StatError> {
        stats::ability_modifier(i32::from(self.get(ability)))
    }

    /// First ability whose score falls outside the valid range, if any.
    pub fn first_invalid(&self) -> Option<(Ability, u8)> {
        Ability::all()
            .into_iter()
            .map(|a| (a, self.get(a)))
            .find(|(_, score)| !stats::SCORE_RANGE.contains(&i32::from(*score)))
    }
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self::new(10, 10, 10, 10, 10, 10)
    }
}

// ============================================================================
// Skills
// ============================================================================

/// D&D 5e skills.
///
/// The governing ability of each skill is configuration, not a property of
/// the enum; see [`crate::rules::RuleTables`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Skill {
    Athletics,
    Acrobatics,
    SleightOfHand,
    Stealth,
    Arcana,
    History,
    Investigation,
    Nature,
    Religion,
    AnimalHandling,
    Insight,
    Medicine,
    Perception,
    Survival,
    Deception,
    Intimidation,
    Performance,
    Persuasion,
}

impl Skill {
    pub fn name(&self) -> &'static str {
        match self {
            Skill::Athletics => "Athletics",
            Skill::Acrobatics => "Acrobatics",
            Skill::SleightOfHand => "Sleight of Hand",
            Skill::Stealth => "Stealth",
            Skill::Arcana => "Arcana",
            Skill::History => "History",
            Skill::Investigation => "Investigation",
            Skill::Nature => "Nature",
            Skill::Religion => "Religion",
            Skill::AnimalHandling => "Animal Handling",
            Skill::Insight => "Insight",
            Skill::Medicine => "Medicine",
            Skill::Perception => "Perception",
            Skill::Survival => "Survival",
            Skill::Deception => "Deception",
            Skill::Intimidation => "Intimidation",
            Skill::Performance => "Performance",
            Skill::Persuasion => "Persuasion",
        }
    }

    pub fn all() -> &'static [Skill] {
        &[
            Skill::Athletics,
            Skill::Acrobatics,
            Skill::SleightOfHand,
            Skill::Stealth,
            Skill::Arcana,
            Skill::History,
            Skill::Investigation,
            Skill::Nature,
            Skill::Religion,
            Skill::AnimalHandling,
            Skill::Insight,
            Skill::Medicine,
            Skill::Perception,
            Skill::Survival,
            Skill::Deception,
            Skill::Intimidation,
            Skill::Performance,
            Skill::Persuasion,
        ]
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Proficiency level for skills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ProficiencyLevel {
    #[default]
    None,
    Proficient,
    Expertise,
}

impl ProficiencyLevel {
    /// Bonus added to a check, or `None` if doubling overflows.
    pub fn bonus(&self, proficiency_bonus: i8) -> Option<i8> {
        match self {
            ProficiencyLevel::None => Some(0),
            ProficiencyLevel::Proficient => Some(proficiency_bonus),
            ProficiencyLevel::Expertise => proficiency_bonus.checked_mul(2),
        }
    }
}

// ============================================================================
// Alignment and Languages
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Alignment {
    LawfulGood,
    NeutralGood,
    ChaoticGood,
    LawfulNeutral,
    TrueNeutral,
    ChaoticNeutral,
    LawfulEvil,
    NeutralEvil,
    ChaoticEvil,
}

impl Alignment {
    pub fn name(&self) -> &'static str {
        match self {
            Alignment::LawfulGood => "Lawful Good",
            Alignment::NeutralGood => "Neutral Good",
            Alignment::ChaoticGood => "Chaotic Good",
            Alignment::LawfulNeutral => "Lawful Neutral",
            Alignment::TrueNeutral => "True Neutral",
            Alignment::ChaoticNeutral => "Chaotic Neutral",
            Alignment::LawfulEvil => "Lawful Evil",
            Alignment::NeutralEvil => "Neutral Evil",
            Alignment::ChaoticEvil => "Chaotic Evil",
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Standard and exotic languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Common,
    Dwarvish,
    Elvish,
    Giant,
    Gnomish,
    Goblin,
    Halfling,
    Orc,
    Abyssal,
    Celestial,
    Draconic,
    DeepSpeech,
    Infernal,
    Primordial,
    Sylvan,
    Undercommon,
}

impl Language {
    pub fn name(&self) -> &'static str {
        match self {
            Language::Common => "Common",
            Language::Dwarvish => "Dwarvish",
            Language::Elvish => "Elvish",
            Language::Giant => "Giant",
            Language::Gnomish => "Gnomish",
            Language::Goblin => "Goblin",
            Language::Halfling => "Halfling",
            Language::Orc => "Orc",
            Language::Abyssal => "Abyssal",
            Language::Celestial => "Celestial",
            Language::Draconic => "Draconic",
            Language::DeepSpeech => "Deep Speech",
            Language::Infernal => "Infernal",
            Language::Primordial => "Primordial",
            Language::Sylvan => "Sylvan",
            Language::Undercommon => "Undercommon",
        }
    }

    pub fn is_exotic(&self) -> bool {
        matches!(
            self,
            Language::Abyssal
                | Language::Celestial
                | Language::Draconic
                | Language::DeepSpeech
                | Language::Infernal
                | Language::Primordial
                | Language::Sylvan
                | Language::Undercommon
        )
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Hit Points and Hit Dice
// ============================================================================

/// Hit points tracking. `current` never exceeds `maximum`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitPoints {
    pub current: i32,
    pub maximum: i32,
}

impl HitPoints {
    pub fn new(maximum: i32) -> Self {
        Self {
            current: maximum,
            maximum,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.maximum >= 1 && self.current >= 0 && self.current <= self.maximum
    }

    /// Returns the damage actually absorbed.
    pub fn take_damage(&mut self, amount: u32) -> i32 {
        let old = self.current;
        self.current = (i64::from(self.current) - i64::from(amount)).max(0) as i32;
        old - self.current
    }

    /// Returns the amount actually healed.
    pub fn heal(&mut self, amount: u32) -> i32 {
        let old = self.current;
        self.current =
            (i64::from(self.current) + i64::from(amount)).min(i64::from(self.maximum)) as i32;
        self.current - old
    }

    pub fn is_unconscious(&self) -> bool {
        self.current <= 0
    }
}

impl Default for HitPoints {
    fn default() -> Self {
        Self::new(6)
    }
}

/// Hit dice tracking, keyed by die type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HitDice {
    pub total: BTreeMap<DieType, u32>,
    pub remaining: BTreeMap<DieType, u32>,
}

impl HitDice {
    pub fn new() -> Self {
        Self::default()
    }

    /// A full pool of a single die type.
    pub fn of(die_type: DieType, count: u32) -> Self {
        Self {
            total: BTreeMap::from([(die_type, count)]),
            remaining: BTreeMap::from([(die_type, count)]),
        }
    }

    /// Build a full pool from notation such as `3d8` or `2d10+1d8`.
    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let mut pool = Self::new();
        for term in dice::parse_pool(notation)? {
            pool.add(term.die_type, term.count)?;
        }
        Ok(pool)
    }

    /// Add dice to both the total and the remaining pool.
    pub fn add(&mut self, die_type: DieType, count: u32) -> Result<(), DiceError> {
        let total = self.total.get(&die_type).copied().unwrap_or(0);
        let remaining = self.remaining_of(die_type);
        let (Some(total), Some(remaining)) =
            (total.checked_add(count), remaining.checked_add(count))
        else {
            return Err(DiceError::TooManyDice(die_type));
        };
        self.total.insert(die_type, total);
        self.remaining.insert(die_type, remaining);
        Ok(())
    }

    pub fn remaining_of(&self, die_type: DieType) -> u32 {
        self.remaining.get(&die_type).copied().unwrap_or(0)
    }

    pub fn spend(&mut self, die_type: DieType) -> bool {
        if let Some(remaining) = self.remaining.get_mut(&die_type) {
            if *remaining > 0 {
                *remaining -= 1;
                return true;
            }
        }
        false
    }

    /// Long rest: regain half the total (rounded down, minimum one) of each die type.
    pub fn recover_half(&mut self) {
        for (die_type, total) in &self.total {
            let to_recover = (total / 2).max(1);
            let remaining = self.remaining.entry(*die_type).or_insert(0);
            *remaining = remaining.saturating_add(to_recover).min(*total);
        }
    }

    pub fn total_notation(&self) -> String {
        notation(&self.total)
    }

    pub fn remaining_notation(&self) -> String {
        notation(&self.remaining)
    }
}

fn notation(pool: &BTreeMap<DieType, u32>) -> String {
    pool.iter()
        .rev()
        .filter(|(_, count)| **count > 0)
        .map(|(die, count)| format!("{count}{die}"))
        .collect::<Vec<_>>()
        .join("+")
}

impl fmt::Display for HitDice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.remaining_notation(), self.total_notation())
    }
}

// ============================================================================
// Races, Classes, Backgrounds
// ============================================================================

/// Playable race. Shared reference data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Race {
    pub id: RaceId,
    pub name: String,
    pub description: Option<String>,
    pub speed: u32,
}

impl Race {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: RaceId::new(),
            name: name.into(),
            description: None,
            speed: 30,
        }
    }

    pub fn with_speed(mut self, speed: u32) -> Self {
        self.speed = speed;
        self
    }
}

/// Character class. Shared reference data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnDClass {
    pub id: ClassId,
    pub name: String,
    pub description: Option<String>,
    pub hit_die: DieType,
    pub spellcasting_ability: Option<Ability>,
}

impl DnDClass {
    pub fn new(name: impl Into<String>, hit_die: DieType) -> Self {
        Self {
            id: ClassId::new(),
            name: name.into(),
            description: None,
            hit_die,
            spellcasting_ability: None,
        }
    }

    pub fn with_spellcasting(mut self, ability: Ability) -> Self {
        self.spellcasting_ability = Some(ability);
        self
    }
}

/// Character background. Shared reference data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Background {
    pub id: BackgroundId,
    pub name: String,
    pub description: Option<String>,
}

impl Background {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: BackgroundId::new(),
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

// ============================================================================
// Character
// ============================================================================

/// Descriptive, non-mechanical character details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalDetails {
    pub age: u32,
    pub gender: String,
    pub height: String,
    pub weight: u32,
    pub appearance: Option<String>,
    pub personality_traits: Option<String>,
    pub ideals: Option<String>,
    pub bonds: Option<String>,
    pub flaws: Option<String>,
    pub background_story: Option<String>,
}

impl Default for PersonalDetails {
    fn default() -> Self {
        Self {
            age: 18,
            gender: String::new(),
            height: String::new(),
            weight: 100,
            appearance: None,
            personality_traits: None,
            ideals: None,
            bonds: None,
            flaws: None,
            background_story: None,
        }
    }
}

/// A player character within a campaign.
///
/// The backpack, wallet, arsenal and spellbook are owned by the character
/// and go away with it. Races, classes, backgrounds, weapons and spells are
/// shared and referenced by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub campaign: CampaignId,
    pub player: UserId,
    pub name: String,

    // Core stats
    pub exp_points: i64,
    pub alignment: Alignment,
    pub ability_scores: AbilityScores,

    // Proficiencies
    pub saving_throw_prof: HashSet<Ability>,
    #[serde(default)]
    pub skill_prof: HashSet<Skill>,
    #[serde(default)]
    pub skill_expert: HashSet<Skill>,
    #[serde(default)]
    pub tool_proficiencies: Option<String>,
    #[serde(default)]
    pub languages: HashSet<Language>,

    pub details: PersonalDetails,

    // Health
    pub hit_points: HitPoints,
    pub hit_dice: HitDice,
    #[serde(default)]
    pub inspiration: u32,

    // References
    pub race: RaceId,
    pub background: BackgroundId,
    pub classes: Vec<ClassId>,

    // Owned containers
    pub backpack: Inventory,
    pub wallet: Wallet,
    pub arsenal: Arsenal,
    pub spellbook: Spellbook,
}

impl Character {
    /// Effective proficiency in a skill. Expertise wins over plain proficiency.
    pub fn proficiency_level(&self, skill: Skill) -> ProficiencyLevel {
        if self.skill_expert.contains(&skill) {
            ProficiencyLevel::Expertise
        } else if self.skill_prof.contains(&skill) {
            ProficiencyLevel::Proficient
        } else {
            ProficiencyLevel::None
        }
    }

    /// Set the proficiency level for a skill, keeping expertise a subset of proficiency.
    pub fn set_skill(&mut self, skill: Skill, level: ProficiencyLevel) {
        match level {
            ProficiencyLevel::None => {
                self.skill_prof.remove(&skill);
                self.skill_expert.remove(&skill);
            }
            ProficiencyLevel::Proficient => {
                self.skill_prof.insert(skill);
                self.skill_expert.remove(&skill);
            }
            ProficiencyLevel::Expertise => {
                self.skill_prof.insert(skill);
                self.skill_expert.insert(skill);
            }
        }
    }

    pub fn has_save_proficiency(&self, ability: Ability) -> bool {
        self.saving_throw_prof.contains(&ability)
    }

    pub fn is_conscious(&self) -> bool {
        !self.hit_points.is_unconscious()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ability_modifier() {
        let scores = AbilityScores::new(16, 14, 12, 10, 8, 6);
        assert_eq!(scores.modifier(Ability::Strength).unwrap(), 3);
        assert_eq!(scores.modifier(Ability::Dexterity).unwrap(), 2);
        assert_eq!(scores.modifier(Ability::Constitution).unwrap(), 1);
        assert_eq!(scores.modifier(Ability::Intelligence).unwrap(), 0);
        assert_eq!(scores.modifier(Ability::Wisdom).unwrap(), -1);
        assert_eq!(scores.modifier(Ability::Charisma).unwrap(), -2);

        // Odd scores below 10 round toward negative infinity
        let odd_scores = AbilityScores::new(9, 7, 5, 11, 13, 15);
        assert_eq!(odd_scores.modifier(Ability::Strength).unwrap(), -1);
        assert_eq!(odd_scores.modifier(Ability::Dexterity).unwrap(), -2);
        assert_eq!(odd_scores.modifier(Ability::Constitution).unwrap(), -3);
        assert_eq!(odd_scores.modifier(Ability::Intelligence).unwrap(), 0);
        assert_eq!(odd_scores.modifier(Ability::Wisdom).unwrap(), 1);
        assert_eq!(odd_scores.modifier(Ability::Charisma).unwrap(), 2);
    }

    #[test]
    fn test_first_invalid_score() {
        let mut scores = AbilityScores::default();
        assert_eq!(scores.first_invalid(), None);

        scores.set(Ability::Wisdom, 0);
        assert_eq!(scores.first_invalid(), Some((Ability::Wisdom, 0)));
        assert!(scores.modifier(Ability::Wisdom).is_err());

        scores.set(Ability::Wisdom, 31);
        assert_eq!(scores.first_invalid(), Some((Ability::Wisdom, 31)));
    }

    #[test]
    fn test_ability_from_str() {
        assert_eq!("str".parse::<Ability>().unwrap(), Ability::Strength);
        assert_eq!("CHA".parse::<Ability>().unwrap(), Ability::Charisma);
        assert_eq!("wisdom".parse::<Ability>().unwrap(), Ability::Wisdom);
        assert!("luck".parse::<Ability>().is_err());
    }

    #[test]
    fn test_hit_points() {
        let mut hp = HitPoints::new(20);
        assert_eq!(hp.current, 20);

        assert_eq!(hp.take_damage(5), 5);
        assert_eq!(hp.current, 15);

        assert_eq!(hp.heal(10), 5);
        assert_eq!(hp.current, 20); // Capped at max

        assert_eq!(hp.take_damage(50), 20);
        assert_eq!(hp.current, 0);
        assert!(hp.is_unconscious());
        assert!(hp.is_valid());
    }

    #[test]
    fn test_hit_points_validity() {
        assert!(HitPoints::default().is_valid());
        assert!(!HitPoints {
            current: 7,
            maximum: 6
        }
        .is_valid());
        assert!(!HitPoints {
            current: 0,
            maximum: 0
        }
        .is_valid());
    }

    #[test]
    fn test_hit_dice_pool() {
        let mut dice = HitDice::parse("1d8+3d10").unwrap();
        assert_eq!(dice.total_notation(), "3d10+1d8");
        assert_eq!(dice.remaining_of(DieType::D10), 3);

        assert!(dice.spend(DieType::D8));
        assert!(!dice.spend(DieType::D8));
        assert!(!dice.spend(DieType::D6));
        assert!(dice.spend(DieType::D10));
        assert!(dice.spend(DieType::D10));
        assert_eq!(dice.remaining_notation(), "1d10");
        assert_eq!(dice.to_string(), "1d10/3d10+1d8");

        dice.recover_half();
        // d10: 3 total -> recover 1; d8: 1 total -> recover at least 1
        assert_eq!(dice.remaining_of(DieType::D10), 2);
        assert_eq!(dice.remaining_of(DieType::D8), 1);
    }

    #[test]
    fn test_hit_dice_count_overflow() {
        assert_eq!(
            HitDice::parse("4294967295d8+1d8"),
            Err(DiceError::TooManyDice(DieType::D8))
        );

        let mut dice = HitDice::of(DieType::D12, u32::MAX);
        assert!(dice.add(DieType::D12, 1).is_err());
        assert_eq!(dice.remaining_of(DieType::D12), u32::MAX);
        assert!(dice.add(DieType::D6, 2).is_ok());

        dice.spend(DieType::D12);
        dice.recover_half();
        assert_eq!(dice.remaining_of(DieType::D12), u32::MAX);
    }

    #[test]
    fn test_proficiency_bonus_scaling() {
        assert_eq!(ProficiencyLevel::None.bonus(3), Some(0));
        assert_eq!(ProficiencyLevel::Proficient.bonus(3), Some(3));
        assert_eq!(ProficiencyLevel::Expertise.bonus(3), Some(6));
        assert_eq!(ProficiencyLevel::Expertise.bonus(64), None);
    }

    #[test]
    fn test_language_exotic() {
        assert!(Language::Draconic.is_exotic());
        assert!(!Language::Dwarvish.is_exotic());
    }
}
