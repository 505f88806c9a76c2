//! Entity store for campaigns, characters and shared reference data.
//!
//! [`EntityStore`] is the seam between the stat engine and whatever holds
//! the records. Its provided methods are the only sanctioned way to mutate
//! a character during play: they enforce the sheet invariants (hit points
//! within bounds, non-negative experience, expertise implying proficiency).
//! [`MemoryStore`] is the in-process implementation, with cascade-delete
//! semantics matching the ownership model: deleting a campaign or a user
//! removes their characters, and a character takes its backpack, wallet,
//! arsenal and spellbook with it.

use crate::dice::DieType;
use crate::items::{Coin, Item, Weapon, WalletError, STANDARD_WEAPONS};
use crate::spells::{Spell, STANDARD_SPELLS};
use crate::stats::{StatEngine, StatError};
use crate::world::{
    Ability, Background, BackgroundId, Campaign, CampaignId, Character, CharacterId, ClassId,
    DnDClass, HitPoints, Language, ProficiencyLevel, Race, RaceId, Skill, SpellId, User, UserId,
    WeaponId,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

/// Errors from store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Invalid hit points: {current}/{maximum}")]
    InvalidHitPoints { current: i32, maximum: i32 },

    #[error("Awarding {amount} experience to {current} overflows")]
    ExperienceOverflow { current: i64, amount: u32 },

    #[error("No {0} hit dice remaining")]
    NoHitDieRemaining(DieType),

    #[error(transparent)]
    Stat(#[from] StatError),

    #[error(transparent)]
    Wallet(#[from] WalletError),
}

fn not_found(kind: &'static str, id: impl fmt::Display) -> StoreError {
    StoreError::NotFound {
        kind,
        id: id.to_string(),
    }
}

/// Result of awarding experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelChange {
    pub old_level: u8,
    pub new_level: u8,
    pub exp_points: i64,
}

impl LevelChange {
    pub fn leveled_up(&self) -> bool {
        self.new_level > self.old_level
    }
}

/// Read and write access to character records.
pub trait EntityStore {
    fn character(&self, id: CharacterId) -> Result<&Character, StoreError>;

    /// Apply `f` to a stored character. The change is kept only if `f` succeeds.
    fn update_character<T, F>(&mut self, id: CharacterId, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Character) -> Result<T, StoreError>;

    fn set_experience(&mut self, id: CharacterId, exp_points: i64) -> Result<(), StoreError> {
        if exp_points < 0 {
            return Err(StatError::InvalidExperience(exp_points).into());
        }
        self.update_character(id, |c| {
            c.exp_points = exp_points;
            Ok(())
        })?;
        tracing::debug!(character = %id, exp_points, "experience set");
        Ok(())
    }

    fn award_experience(
        &mut self,
        id: CharacterId,
        amount: u32,
        engine: &StatEngine<'_>,
    ) -> Result<LevelChange, StoreError> {
        let current = self.character(id)?.exp_points;
        let old_level = engine.level(current)?;
        let exp_points = current
            .checked_add(i64::from(amount))
            .ok_or(StoreError::ExperienceOverflow { current, amount })?;
        let new_level = engine.level(exp_points)?;

        self.update_character(id, |c| {
            c.exp_points = exp_points;
            Ok(())
        })?;

        let change = LevelChange {
            old_level,
            new_level,
            exp_points,
        };
        if change.leveled_up() {
            tracing::info!(character = %id, old_level, new_level, "character leveled up");
        } else {
            tracing::debug!(character = %id, amount, exp_points, "experience awarded");
        }
        Ok(change)
    }

    fn set_hit_points(
        &mut self,
        id: CharacterId,
        current: i32,
        maximum: i32,
    ) -> Result<(), StoreError> {
        let hit_points = HitPoints { current, maximum };
        if !hit_points.is_valid() {
            return Err(StoreError::InvalidHitPoints { current, maximum });
        }
        self.update_character(id, |c| {
            c.hit_points = hit_points;
            Ok(())
        })
    }

    /// Returns the damage actually taken; hit points stop at zero.
    fn apply_damage(&mut self, id: CharacterId, amount: u32) -> Result<i32, StoreError> {
        let taken = self.update_character(id, |c| Ok(c.hit_points.take_damage(amount)))?;
        tracing::debug!(character = %id, taken, "damage applied");
        Ok(taken)
    }

    /// Returns the amount actually healed; hit points stop at the maximum.
    fn heal(&mut self, id: CharacterId, amount: u32) -> Result<i32, StoreError> {
        self.update_character(id, |c| Ok(c.hit_points.heal(amount)))
    }

    fn set_saving_throws<I>(&mut self, id: CharacterId, abilities: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = Ability>,
    {
        let abilities: HashSet<Ability> = abilities.into_iter().collect();
        self.update_character(id, |c| {
            c.saving_throw_prof = abilities;
            Ok(())
        })
    }

    fn grant_skill(
        &mut self,
        id: CharacterId,
        skill: Skill,
        level: ProficiencyLevel,
    ) -> Result<(), StoreError> {
        self.update_character(id, |c| {
            c.set_skill(skill, level);
            Ok(())
        })?;
        tracing::debug!(character = %id, %skill, ?level, "skill proficiency changed");
        Ok(())
    }

    /// Removes both proficiency and expertise.
    fn revoke_skill(&mut self, id: CharacterId, skill: Skill) -> Result<(), StoreError> {
        self.grant_skill(id, skill, ProficiencyLevel::None)
    }

    /// Returns false if the language was already known.
    fn add_language(&mut self, id: CharacterId, language: Language) -> Result<bool, StoreError> {
        self.update_character(id, |c| Ok(c.languages.insert(language)))
    }

    /// Short rest: spend one hit die, healing the roll plus CON modifier (never negative).
    fn spend_hit_die<R: Rng + ?Sized>(
        &mut self,
        id: CharacterId,
        die: DieType,
        rng: &mut R,
    ) -> Result<i32, StoreError> {
        let healed = self.update_character(id, |c| {
            let con_mod = c.ability_scores.modifier(Ability::Constitution)?;
            if !c.hit_dice.spend(die) {
                return Err(StoreError::NoHitDieRemaining(die));
            }
            let roll = die.roll(rng) as i32;
            let amount = (roll + i32::from(con_mod)).max(0) as u32;
            Ok(c.hit_points.heal(amount))
        })?;
        tracing::debug!(character = %id, %die, healed, "hit die spent");
        Ok(healed)
    }

    /// Long rest: full hit points and half the hit dice back.
    fn long_rest(&mut self, id: CharacterId) -> Result<(), StoreError> {
        self.update_character(id, |c| {
            c.hit_points.current = c.hit_points.maximum;
            c.hit_dice.recover_half();
            Ok(())
        })
    }
}

/// Serializable contents of a [`MemoryStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub users: Vec<User>,
    pub campaigns: Vec<Campaign>,
    pub races: Vec<Race>,
    pub classes: Vec<DnDClass>,
    pub backgrounds: Vec<Background>,
    pub weapons: Vec<Weapon>,
    pub spells: Vec<Spell>,
    pub characters: Vec<Character>,
}

/// In-memory entity store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    users: HashMap<UserId, User>,
    campaigns: HashMap<CampaignId, Campaign>,
    characters: HashMap<CharacterId, Character>,
    races: HashMap<RaceId, Race>,
    classes: HashMap<ClassId, DnDClass>,
    backgrounds: HashMap<BackgroundId, Background>,
    weapons: HashMap<WeaponId, Weapon>,
    spells: HashMap<SpellId, Spell>,
}

impl EntityStore for MemoryStore {
    fn character(&self, id: CharacterId) -> Result<&Character, StoreError> {
        self.characters
            .get(&id)
            .ok_or_else(|| not_found("Character", id))
    }

    fn update_character<T, F>(&mut self, id: CharacterId, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Character) -> Result<T, StoreError>,
    {
        let stored = self
            .characters
            .get_mut(&id)
            .ok_or_else(|| not_found("Character", id))?;

        // Work on a copy so a failed update leaves the record untouched
        let mut draft = stored.clone();
        let result = f(&mut draft)?;
        *stored = draft;
        Ok(result)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the standard weapon and spell catalogs.
    pub fn seed_reference_data(&mut self) {
        for weapon in STANDARD_WEAPONS.iter() {
            self.weapons.insert(weapon.id, weapon.clone());
        }
        for spell in STANDARD_SPELLS.iter() {
            self.spells.insert(spell.id, spell.clone());
        }
        tracing::debug!(
            weapons = self.weapons.len(),
            spells = self.spells.len(),
            "reference data seeded"
        );
    }

    // ------------------------------------------------------------------
    // Users and campaigns
    // ------------------------------------------------------------------

    pub fn add_user(&mut self, user: User) -> UserId {
        let id = user.id;
        self.users.insert(id, user);
        id
    }

    pub fn user(&self, id: UserId) -> Result<&User, StoreError> {
        self.users.get(&id).ok_or_else(|| not_found("User", id))
    }

    pub fn add_campaign(&mut self, campaign: Campaign) -> Result<CampaignId, StoreError> {
        self.user(campaign.dungeon_master)?;
        let id = campaign.id;
        tracing::debug!(campaign = %id, name = %campaign.name, "campaign created");
        self.campaigns.insert(id, campaign);
        Ok(id)
    }

    pub fn campaign(&self, id: CampaignId) -> Result<&Campaign, StoreError> {
        self.campaigns
            .get(&id)
            .ok_or_else(|| not_found("Campaign", id))
    }

    pub fn campaigns_run_by(&self, user: UserId) -> Vec<&Campaign> {
        let mut campaigns: Vec<_> = self
            .campaigns
            .values()
            .filter(|c| c.dungeon_master == user)
            .collect();
        campaigns.sort_by(|a, b| a.name.cmp(&b.name));
        campaigns
    }

    // ------------------------------------------------------------------
    // Reference data
    // ------------------------------------------------------------------

    pub fn add_race(&mut self, race: Race) -> RaceId {
        let id = race.id;
        self.races.insert(id, race);
        id
    }

    pub fn race(&self, id: RaceId) -> Result<&Race, StoreError> {
        self.races.get(&id).ok_or_else(|| not_found("Race", id))
    }

    pub fn add_class(&mut self, class: DnDClass) -> ClassId {
        let id = class.id;
        self.classes.insert(id, class);
        id
    }

    pub fn class(&self, id: ClassId) -> Result<&DnDClass, StoreError> {
        self.classes.get(&id).ok_or_else(|| not_found("Class", id))
    }

    pub fn add_background(&mut self, background: Background) -> BackgroundId {
        let id = background.id;
        self.backgrounds.insert(id, background);
        id
    }

    pub fn background(&self, id: BackgroundId) -> Result<&Background, StoreError> {
        self.backgrounds
            .get(&id)
            .ok_or_else(|| not_found("Background", id))
    }

    pub fn add_weapon(&mut self, weapon: Weapon) -> WeaponId {
        let id = weapon.id;
        self.weapons.insert(id, weapon);
        id
    }

    pub fn weapon(&self, id: WeaponId) -> Result<&Weapon, StoreError> {
        self.weapons.get(&id).ok_or_else(|| not_found("Weapon", id))
    }

    pub fn weapon_by_name(&self, name: &str) -> Option<&Weapon> {
        self.weapons
            .values()
            .find(|w| w.name.eq_ignore_ascii_case(name))
    }

    pub fn add_spell(&mut self, spell: Spell) -> SpellId {
        let id = spell.id;
        self.spells.insert(id, spell);
        id
    }

    pub fn spell(&self, id: SpellId) -> Result<&Spell, StoreError> {
        self.spells.get(&id).ok_or_else(|| not_found("Spell", id))
    }

    pub fn spell_by_name(&self, name: &str) -> Option<&Spell> {
        self.spells
            .values()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    // ------------------------------------------------------------------
    // Characters
    // ------------------------------------------------------------------

    /// Store a new character after checking its references and invariants.
    pub fn add_character(&mut self, character: Character) -> Result<CharacterId, StoreError> {
        self.campaign(character.campaign)?;
        self.user(character.player)?;
        self.race(character.race)?;
        self.background(character.background)?;
        for class in &character.classes {
            self.class(*class)?;
        }
        for weapon in &character.arsenal.weapons {
            self.weapon(*weapon)?;
        }
        for spell in &character.spellbook.spells {
            self.spell(*spell)?;
        }

        if let Some((_, score)) = character.ability_scores.first_invalid() {
            return Err(StatError::InvalidScore {
                score: i32::from(score),
            }
            .into());
        }
        if character.exp_points < 0 {
            return Err(StatError::InvalidExperience(character.exp_points).into());
        }
        if !character.hit_points.is_valid() {
            return Err(StoreError::InvalidHitPoints {
                current: character.hit_points.current,
                maximum: character.hit_points.maximum,
            });
        }

        let id = character.id;
        tracing::debug!(
            character = %id,
            campaign = %character.campaign,
            name = %character.name,
            "character created"
        );
        self.characters.insert(id, character);
        Ok(id)
    }

    pub fn characters_in_campaign(&self, campaign: CampaignId) -> Vec<&Character> {
        self.characters_where(|c| c.campaign == campaign)
    }

    pub fn characters_of_player(&self, player: UserId) -> Vec<&Character> {
        self.characters_where(|c| c.player == player)
    }

    fn characters_where(&self, predicate: impl Fn(&Character) -> bool) -> Vec<&Character> {
        let mut characters: Vec<_> = self.characters.values().filter(|c| predicate(c)).collect();
        characters.sort_by(|a, b| a.name.cmp(&b.name));
        characters
    }

    pub fn character_count(&self) -> usize {
        self.characters.len()
    }

    // ------------------------------------------------------------------
    // Owned containers
    // ------------------------------------------------------------------

    pub fn add_item(&mut self, id: CharacterId, item: Item) -> Result<(), StoreError> {
        self.update_character(id, |c| {
            c.backpack.add_item(item);
            Ok(())
        })
    }

    /// Returns false if the backpack doesn't hold that many.
    pub fn remove_item(
        &mut self,
        id: CharacterId,
        name: &str,
        quantity: u32,
    ) -> Result<bool, StoreError> {
        self.update_character(id, |c| Ok(c.backpack.remove_item(name, quantity)))
    }

    pub fn deposit(&mut self, id: CharacterId, coin: Coin, amount: u64) -> Result<(), StoreError> {
        self.update_character(id, |c| Ok(c.wallet.deposit(coin, amount)?))
    }

    /// Pay `cost` copper pieces' worth from the character's wallet.
    pub fn spend(&mut self, id: CharacterId, cost: u64) -> Result<(), StoreError> {
        self.update_character(id, |c| Ok(c.wallet.spend(cost)?))?;
        tracing::debug!(character = %id, cost, "coins spent");
        Ok(())
    }

    /// Returns false if the weapon was already in the arsenal.
    pub fn arm_weapon(&mut self, id: CharacterId, weapon: WeaponId) -> Result<bool, StoreError> {
        self.weapon(weapon)?;
        self.update_character(id, |c| Ok(c.arsenal.add(weapon)))
    }

    pub fn disarm_weapon(&mut self, id: CharacterId, weapon: WeaponId) -> Result<bool, StoreError> {
        self.update_character(id, |c| Ok(c.arsenal.remove(weapon)))
    }

    /// Returns false if the spell was already known.
    pub fn learn_spell(&mut self, id: CharacterId, spell: SpellId) -> Result<bool, StoreError> {
        self.spell(spell)?;
        self.update_character(id, |c| Ok(c.spellbook.learn(spell)))
    }

    pub fn forget_spell(&mut self, id: CharacterId, spell: SpellId) -> Result<bool, StoreError> {
        self.update_character(id, |c| Ok(c.spellbook.forget(spell)))
    }

    // ------------------------------------------------------------------
    // Deletion
    // ------------------------------------------------------------------

    /// Remove a single character along with everything it owns.
    pub fn delete_character(&mut self, id: CharacterId) -> Result<Character, StoreError> {
        self.characters
            .remove(&id)
            .ok_or_else(|| not_found("Character", id))
    }

    fn remove_characters_where(
        &mut self,
        predicate: impl Fn(&Character) -> bool,
    ) -> Vec<CharacterId> {
        let doomed: Vec<CharacterId> = self
            .characters
            .values()
            .filter(|c| predicate(c))
            .map(|c| c.id)
            .collect();
        for id in &doomed {
            self.characters.remove(id);
        }
        doomed
    }

    /// Delete a campaign and every character in it. Returns the removed characters.
    pub fn delete_campaign(&mut self, id: CampaignId) -> Result<Vec<CharacterId>, StoreError> {
        self.campaigns
            .remove(&id)
            .ok_or_else(|| not_found("Campaign", id))?;
        let removed = self.remove_characters_where(|c| c.campaign == id);
        tracing::info!(campaign = %id, characters = removed.len(), "campaign deleted");
        Ok(removed)
    }

    /// Delete a user, the campaigns they run, and every character they play
    /// or that lives in one of their campaigns.
    pub fn delete_user(&mut self, id: UserId) -> Result<Vec<CharacterId>, StoreError> {
        self.users.remove(&id).ok_or_else(|| not_found("User", id))?;

        let run: Vec<CampaignId> = self
            .campaigns
            .values()
            .filter(|c| c.dungeon_master == id)
            .map(|c| c.id)
            .collect();

        let mut removed = Vec::new();
        for campaign in run {
            removed.extend(self.delete_campaign(campaign)?);
        }
        removed.extend(self.remove_characters_where(|c| c.player == id));

        tracing::info!(user = %id, characters = removed.len(), "user deleted");
        Ok(removed)
    }

    /// Delete a race and the characters of that race.
    pub fn delete_race(&mut self, id: RaceId) -> Result<Vec<CharacterId>, StoreError> {
        self.races.remove(&id).ok_or_else(|| not_found("Race", id))?;
        let removed = self.remove_characters_where(|c| c.race == id);
        tracing::info!(race = %id, characters = removed.len(), "race deleted");
        Ok(removed)
    }

    /// Delete a background and the characters with that background.
    pub fn delete_background(&mut self, id: BackgroundId) -> Result<Vec<CharacterId>, StoreError> {
        self.backgrounds
            .remove(&id)
            .ok_or_else(|| not_found("Background", id))?;
        let removed = self.remove_characters_where(|c| c.background == id);
        tracing::info!(background = %id, characters = removed.len(), "background deleted");
        Ok(removed)
    }

    /// Delete a class and unlink it from every character.
    pub fn delete_class(&mut self, id: ClassId) -> Result<(), StoreError> {
        self.classes.remove(&id).ok_or_else(|| not_found("Class", id))?;
        for character in self.characters.values_mut() {
            character.classes.retain(|c| *c != id);
        }
        Ok(())
    }

    /// Delete a weapon and drop it from every arsenal.
    pub fn delete_weapon(&mut self, id: WeaponId) -> Result<(), StoreError> {
        self.weapons.remove(&id).ok_or_else(|| not_found("Weapon", id))?;
        for character in self.characters.values_mut() {
            character.arsenal.remove(id);
        }
        Ok(())
    }

    /// Delete a spell and drop it from every spellbook.
    pub fn delete_spell(&mut self, id: SpellId) -> Result<(), StoreError> {
        self.spells.remove(&id).ok_or_else(|| not_found("Spell", id))?;
        for character in self.characters.values_mut() {
            character.spellbook.forget(id);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    pub fn snapshot(&self) -> StoreSnapshot {
        let mut snapshot = StoreSnapshot {
            users: self.users.values().cloned().collect(),
            campaigns: self.campaigns.values().cloned().collect(),
            races: self.races.values().cloned().collect(),
            classes: self.classes.values().cloned().collect(),
            backgrounds: self.backgrounds.values().cloned().collect(),
            weapons: self.weapons.values().cloned().collect(),
            spells: self.spells.values().cloned().collect(),
            characters: self.characters.values().cloned().collect(),
        };
        snapshot.users.sort_by(|a, b| a.username.cmp(&b.username));
        snapshot.campaigns.sort_by(|a, b| a.name.cmp(&b.name));
        snapshot.races.sort_by(|a, b| a.name.cmp(&b.name));
        snapshot.classes.sort_by(|a, b| a.name.cmp(&b.name));
        snapshot.backgrounds.sort_by(|a, b| a.name.cmp(&b.name));
        snapshot.weapons.sort_by(|a, b| a.name.cmp(&b.name));
        snapshot.spells.sort_by(|a, b| a.name.cmp(&b.name));
        snapshot.characters.sort_by(|a, b| a.name.cmp(&b.name));
        snapshot
    }

    /// Rebuild a store, re-checking every reference and invariant.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self, StoreError> {
        let mut store = Self::new();
        for user in snapshot.users {
            store.add_user(user);
        }
        for race in snapshot.races {
            store.add_race(race);
        }
        for class in snapshot.classes {
            store.add_class(class);
        }
        for background in snapshot.backgrounds {
            store.add_background(background);
        }
        for weapon in snapshot.weapons {
            store.add_weapon(weapon);
        }
        for spell in snapshot.spells {
            store.add_spell(spell);
        }
        for campaign in snapshot.campaigns {
            store.add_campaign(campaign)?;
        }
        for character in snapshot.characters {
            store.add_character(character)?;
        }
        Ok(store)
    }
}
