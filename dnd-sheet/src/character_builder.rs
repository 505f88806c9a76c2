//! Character builder for new character sheets.
//!
//! Collects the fields a player chooses at creation and validates them
//! before producing a [`Character`]. Saving throw proficiencies must be
//! chosen explicitly; skills, expertise and languages start empty.

use crate::dice::DiceError;
use crate::items::{Arsenal, Inventory, Wallet};
use crate::spells::Spellbook;
use crate::world::{
    Ability, AbilityScores, Alignment, BackgroundId, CampaignId, Character, CharacterId, ClassId,
    HitDice, HitPoints, Language, PersonalDetails, ProficiencyLevel, RaceId, Skill, UserId,
};
use std::collections::HashSet;

/// Builder for creating characters.
#[derive(Debug, Clone)]
pub struct CharacterBuilder {
    campaign: CampaignId,
    player: UserId,
    name: Option<String>,
    alignment: Option<Alignment>,
    ability_scores: AbilityScores,
    saving_throws: Option<HashSet<Ability>>,
    skills: Vec<(Skill, ProficiencyLevel)>,
    tool_proficiencies: Option<String>,
    languages: HashSet<Language>,
    details: PersonalDetails,
    hit_points: HitPoints,
    hit_dice: Option<String>,
    race: Option<RaceId>,
    background: Option<BackgroundId>,
    classes: Vec<ClassId>,
}

/// Error from character building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuilderError {
    MissingName,
    MissingAlignment,
    MissingSavingThrows,
    MissingRace,
    MissingBackground,
    MissingHitDice,
    InvalidScore { ability: Ability, score: u8 },
    InvalidHitPoints { current: i32, maximum: i32 },
    InvalidHitDice(DiceError),
}

impl std::fmt::Display for BuilderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuilderError::MissingName => write!(f, "Character name is required"),
            BuilderError::MissingAlignment => write!(f, "Alignment is required"),
            BuilderError::MissingSavingThrows => {
                write!(f, "Saving throw proficiencies must be chosen")
            }
            BuilderError::MissingRace => write!(f, "Race selection is required"),
            BuilderError::MissingBackground => write!(f, "Background selection is required"),
            BuilderError::MissingHitDice => write!(f, "Hit dice are required"),
            BuilderError::InvalidScore { ability, score } => {
                write!(f, "{} score {score} is outside 1-30", ability.name())
            }
            BuilderError::InvalidHitPoints { current, maximum } => {
                write!(f, "Hit points {current}/{maximum} are invalid")
            }
            BuilderError::InvalidHitDice(e) => write!(f, "Invalid hit dice: {e}"),
        }
    }
}

impl std::error::Error for BuilderError {}

impl CharacterBuilder {
    pub fn new(campaign: CampaignId, player: UserId) -> Self {
        Self {
            campaign,
            player,
            name: None,
            alignment: None,
            ability_scores: AbilityScores::default(),
            saving_throws: None,
            skills: Vec::new(),
            tool_proficiencies: None,
            languages: HashSet::new(),
            details: PersonalDetails::default(),
            hit_points: HitPoints::default(),
            hit_dice: None,
            race: None,
            background: None,
            classes: Vec::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = Some(alignment);
        self
    }

    pub fn ability_scores(mut self, scores: AbilityScores) -> Self {
        self.ability_scores = scores;
        self
    }

    /// Saving throw proficiencies. Required, though the set may be empty.
    pub fn saving_throws(mut self, abilities: impl IntoIterator<Item = Ability>) -> Self {
        self.saving_throws = Some(abilities.into_iter().collect());
        self
    }

    pub fn skill(mut self, skill: Skill) -> Self {
        self.skills.push((skill, ProficiencyLevel::Proficient));
        self
    }

    /// Expertise in a skill; implies proficiency.
    pub fn expertise(mut self, skill: Skill) -> Self {
        self.skills.push((skill, ProficiencyLevel::Expertise));
        self
    }

    pub fn tool_proficiencies(mut self, tools: impl Into<String>) -> Self {
        self.tool_proficiencies = Some(tools.into());
        self
    }

    pub fn language(mut self, language: Language) -> Self {
        self.languages.insert(language);
        self
    }

    pub fn details(mut self, details: PersonalDetails) -> Self {
        self.details = details;
        self
    }

    pub fn hit_points(mut self, maximum: i32) -> Self {
        self.hit_points = HitPoints::new(maximum);
        self
    }

    pub fn hit_dice(mut self, notation: impl Into<String>) -> Self {
        self.hit_dice = Some(notation.into());
        self
    }

    pub fn race(mut self, race: RaceId) -> Self {
        self.race = Some(race);
        self
    }

    pub fn background(mut self, background: BackgroundId) -> Self {
        self.background = Some(background);
        self
    }

    pub fn class(mut self, class: ClassId) -> Self {
        if !self.classes.contains(&class) {
            self.classes.push(class);
        }
        self
    }

    /// Validate the choices and produce a character with empty containers.
    pub fn build(self) -> Result<Character, BuilderError> {
        let name = self.name.ok_or(BuilderError::MissingName)?;
        let alignment = self.alignment.ok_or(BuilderError::MissingAlignment)?;
        let saving_throw_prof = self.saving_throws.ok_or(BuilderError::MissingSavingThrows)?;
        let race = self.race.ok_or(BuilderError::MissingRace)?;
        let background = self.background.ok_or(BuilderError::MissingBackground)?;

        if let Some((ability, score)) = self.ability_scores.first_invalid() {
            return Err(BuilderError::InvalidScore { ability, score });
        }

        if !self.hit_points.is_valid() {
            return Err(BuilderError::InvalidHitPoints {
                current: self.hit_points.current,
                maximum: self.hit_points.maximum,
            });
        }

        let notation = self.hit_dice.ok_or(BuilderError::MissingHitDice)?;
        let hit_dice = HitDice::parse(&notation).map_err(BuilderError::InvalidHitDice)?;

        let mut character = Character {
            id: CharacterId::new(),
            campaign: self.campaign,
            player: self.player,
            name,
            exp_points: 0,
            alignment,
            ability_scores: self.ability_scores,
            saving_throw_prof,
            skill_prof: HashSet::new(),
            skill_expert: HashSet::new(),
            tool_proficiencies: self.tool_proficiencies,
            languages: self.languages,
            details: self.details,
            hit_points: self.hit_points,
            hit_dice,
            inspiration: 0,
            race,
            background,
            classes: self.classes,
            backpack: Inventory::new(),
            wallet: Wallet::new(),
            arsenal: Arsenal::new(),
            spellbook: Spellbook::new(),
        };

        for (skill, level) in self.skills {
            // Never downgrade expertise chosen earlier
            if character.proficiency_level(skill) != ProficiencyLevel::Expertise {
                character.set_skill(skill, level);
            }
        }

        Ok(character)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::DieType;

    fn base_builder() -> CharacterBuilder {
        CharacterBuilder::new(CampaignId::new(), UserId::new())
            .name("Tamsin")
            .alignment(Alignment::NeutralGood)
            .race(RaceId::new())
            .background(BackgroundId::new())
            .hit_dice("1d8")
    }

    #[test]
    fn test_build_with_defaults() {
        let character = base_builder()
            .saving_throws([Ability::Wisdom, Ability::Charisma])
            .build()
            .unwrap();

        assert_eq!(character.name, "Tamsin");
        assert_eq!(character.exp_points, 0);
        assert_eq!(character.hit_points, HitPoints::new(6));
        assert_eq!(character.details.age, 18);
        assert_eq!(character.details.weight, 100);
        assert_eq!(character.inspiration, 0);
        assert!(character.skill_prof.is_empty());
        assert!(character.skill_expert.is_empty());
        assert!(character.languages.is_empty());
        assert!(character.has_save_proficiency(Ability::Wisdom));
        assert!(character.backpack.items.is_empty());
        assert_eq!(character.wallet.total_copper(), 0);
    }

    #[test]
    fn test_saving_throws_required() {
        assert_eq!(
            base_builder().build().unwrap_err(),
            BuilderError::MissingSavingThrows
        );

        // An explicit empty choice is accepted
        let character = base_builder().saving_throws([]).build().unwrap();
        assert!(character.saving_throw_prof.is_empty());
    }

    #[test]
    fn test_expertise_implies_proficiency() {
        let character = base_builder()
            .saving_throws([Ability::Dexterity])
            .expertise(Skill::Stealth)
            .skill(Skill::Stealth)
            .skill(Skill::Acrobatics)
            .build()
            .unwrap();

        assert!(character.skill_prof.contains(&Skill::Stealth));
        assert!(character.skill_expert.contains(&Skill::Stealth));
        assert_eq!(
            character.proficiency_level(Skill::Acrobatics),
            ProficiencyLevel::Proficient
        );
    }

    #[test]
    fn test_missing_fields() {
        let err = CharacterBuilder::new(CampaignId::new(), UserId::new())
            .build()
            .unwrap_err();
        assert_eq!(err, BuilderError::MissingName);

        let err = CharacterBuilder::new(CampaignId::new(), UserId::new())
            .name("Nobody")
            .alignment(Alignment::TrueNeutral)
            .saving_throws([])
            .build()
            .unwrap_err();
        assert_eq!(err, BuilderError::MissingRace);
    }

    #[test]
    fn test_invalid_scores_rejected() {
        let err = base_builder()
            .saving_throws([])
            .ability_scores(AbilityScores::new(10, 10, 0, 10, 10, 10))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            BuilderError::InvalidScore {
                ability: Ability::Constitution,
                score: 0
            }
        );
    }

    #[test]
    fn test_invalid_hit_points_and_dice() {
        let err = base_builder()
            .saving_throws([])
            .hit_points(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, BuilderError::InvalidHitPoints { .. }));

        let err = base_builder()
            .saving_throws([])
            .hit_dice("1d7")
            .build()
            .unwrap_err();
        assert_eq!(err, BuilderError::InvalidHitDice(DiceError::InvalidDieSize(7)));
        assert!(err.to_string().contains("Invalid hit dice"));
    }

    #[test]
    fn test_hit_dice_count_too_large() {
        let err = base_builder()
            .saving_throws([])
            .hit_dice("4294967295d8+1d8")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            BuilderError::InvalidHitDice(DiceError::TooManyDice(DieType::D8))
        );
    }

    #[test]
    fn test_classes_deduplicated() {
        let fighter = ClassId::new();
        let character = base_builder()
            .saving_throws([])
            .class(fighter)
            .class(fighter)
            .build()
            .unwrap();
        assert_eq!(character.classes, vec![fighter]);
    }
}
