//! Testing utilities for character sheets.
//!
//! This module provides fixtures for unit and integration tests:
//! - `sample_character` for a standalone level 1 rogue
//! - `TestHarness` for a populated store with one campaign and two characters
//! - Assertion helpers for verifying store state

use crate::dice::DieType;
use crate::items::{Arsenal, Inventory, Wallet};
use crate::spells::Spellbook;
use crate::store::{EntityStore, MemoryStore, StoreError};
use crate::world::{
    Ability, AbilityScores, Alignment, Background, BackgroundId, Campaign, CampaignId, Character,
    CharacterId, ClassId, DnDClass, HitDice, HitPoints, Language, PersonalDetails, Race, RaceId,
    Skill, User, UserId,
};
use std::collections::HashSet;

/// A level 1 rogue with no campaign, player, race or background on record.
///
/// Scores are STR 8, DEX 16, CON 14, INT 12, WIS 10, CHA 13. Proficient in
/// DEX and INT saves and in Acrobatics, Perception, Sleight of Hand and
/// Stealth, with expertise in Stealth.
pub fn sample_character(name: &str) -> Character {
    Character {
        id: CharacterId::new(),
        campaign: CampaignId::new(),
        player: UserId::new(),
        name: name.to_string(),
        exp_points: 0,
        alignment: Alignment::ChaoticNeutral,
        ability_scores: AbilityScores::new(8, 16, 14, 12, 10, 13),
        saving_throw_prof: [Ability::Dexterity, Ability::Intelligence].into_iter().collect(),
        skill_prof: [
            Skill::Acrobatics,
            Skill::Perception,
            Skill::SleightOfHand,
            Skill::Stealth,
        ]
        .into_iter()
        .collect(),
        skill_expert: [Skill::Stealth].into_iter().collect(),
        tool_proficiencies: Some("Thieves' tools".to_string()),
        languages: [Language::Common, Language::Halfling].into_iter().collect(),
        details: PersonalDetails::default(),
        hit_points: HitPoints::new(10),
        hit_dice: HitDice::of(DieType::D8, 1),
        inspiration: 0,
        race: RaceId::new(),
        background: BackgroundId::new(),
        classes: Vec::new(),
        backpack: Inventory::new(),
        wallet: Wallet::new(),
        arsenal: Arsenal::new(),
        spellbook: Spellbook::new(),
    }
}

/// A store seeded with reference data, one campaign, and two characters.
///
/// The DM runs "Lost Mine"; `player` plays the halfling rogue Vex and `ally`
/// plays the human fighter Roland.
pub struct TestHarness {
    pub store: MemoryStore,
    pub dm: UserId,
    pub player: UserId,
    pub ally: UserId,
    pub campaign: CampaignId,
    pub human: RaceId,
    pub halfling: RaceId,
    pub fighter_class: ClassId,
    pub rogue_class: ClassId,
    pub soldier: BackgroundId,
    pub criminal: BackgroundId,
    pub rogue: CharacterId,
    pub fighter: CharacterId,
}

impl TestHarness {
    /// Create the fixture. Panics if the fixture itself is inconsistent.
    pub fn new() -> Self {
        Self::try_new().expect("test harness fixture should be consistent")
    }

    /// Create the fixture, reporting store errors instead of panicking.
    pub fn try_new() -> Result<Self, StoreError> {
        let mut store = MemoryStore::new();
        store.seed_reference_data();

        let dm = store.add_user(User::new("dm", "dm@example.com"));
        let player = store.add_user(User::new("vex_player", "vex@example.com"));
        let ally = store.add_user(User::new("roland_player", "roland@example.com"));

        let campaign = store.add_campaign(
            Campaign::new("Lost Mine", dm).with_description("Goblins on the Triboar Trail"),
        )?;

        let human = store.add_race(Race::new("Human"));
        let halfling = store.add_race(Race::new("Halfling").with_speed(25));
        let fighter_class = store.add_class(DnDClass::new("Fighter", DieType::D10));
        let rogue_class = store.add_class(DnDClass::new("Rogue", DieType::D8));
        let soldier = store.add_background(Background::new("Soldier"));
        let criminal = store.add_background(Background::new("Criminal"));

        let mut vex = sample_character("Vex");
        vex.campaign = campaign;
        vex.player = player;
        vex.race = halfling;
        vex.background = criminal;
        vex.classes = vec![rogue_class];
        let rogue = store.add_character(vex)?;

        let mut roland = sample_character("Roland");
        roland.campaign = campaign;
        roland.player = ally;
        roland.race = human;
        roland.background = soldier;
        roland.classes = vec![fighter_class];
        roland.alignment = Alignment::LawfulGood;
        roland.ability_scores = AbilityScores::new(16, 12, 14, 10, 11, 9);
        roland.saving_throw_prof = [Ability::Strength, Ability::Constitution].into_iter().collect();
        roland.skill_prof = [Skill::Athletics, Skill::Intimidation].into_iter().collect();
        roland.skill_expert = HashSet::new();
        roland.tool_proficiencies = None;
        roland.languages = [Language::Common].into_iter().collect();
        roland.exp_points = 900;
        roland.hit_points = HitPoints::new(28);
        roland.hit_dice = HitDice::of(DieType::D10, 3);
        let fighter = store.add_character(roland)?;

        Ok(Self {
            store,
            dm,
            player,
            ally,
            campaign,
            human,
            halfling,
            fighter_class,
            rogue_class,
            soldier,
            criminal,
            rogue,
            fighter,
        })
    }

    /// Current and maximum hit points of a stored character.
    pub fn hp(&self, id: CharacterId) -> Option<(i32, i32)> {
        self.store
            .character(id)
            .ok()
            .map(|c| (c.hit_points.current, c.hit_points.maximum))
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Assert a character's hit points.
pub fn assert_hp(harness: &TestHarness, id: CharacterId, current: i32, max: i32) {
    assert_eq!(
        harness.hp(id),
        Some((current, max)),
        "Expected HP {current}/{max}"
    );
}

/// Assert a character is no longer in the store.
pub fn assert_deleted(harness: &TestHarness, id: CharacterId) {
    assert!(
        harness.store.character(id).is_err(),
        "Expected character {id} to be deleted"
    );
}
