//! Spells and spellbooks.
//!
//! Spells are shared reference data. A spellbook belongs to one character
//! and records which spells that character knows.

use crate::world::{SpellId, SpellbookId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Schools of magic in D&D.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpellSchool {
    Abjuration,
    Conjuration,
    Divination,
    Enchantment,
    Evocation,
    Illusion,
    Necromancy,
    Transmutation,
}

impl SpellSchool {
    pub fn name(&self) -> &'static str {
        match self {
            SpellSchool::Abjuration => "Abjuration",
            SpellSchool::Conjuration => "Conjuration",
            SpellSchool::Divination => "Divination",
            SpellSchool::Enchantment => "Enchantment",
            SpellSchool::Evocation => "Evocation",
            SpellSchool::Illusion => "Illusion",
            SpellSchool::Necromancy => "Necromancy",
            SpellSchool::Transmutation => "Transmutation",
        }
    }
}

/// A spell definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spell {
    pub id: SpellId,
    pub name: String,
    pub description: Option<String>,
    /// 0 for cantrips.
    pub level: u8,
    pub school: SpellSchool,
}

impl Spell {
    pub fn new(name: impl Into<String>, level: u8, school: SpellSchool) -> Self {
        Self {
            id: SpellId::new(),
            name: name.into(),
            description: None,
            level,
            school,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_cantrip(&self) -> bool {
        self.level == 0
    }
}

/// The spells a character knows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Spellbook {
    pub id: SpellbookId,
    pub spells: HashSet<SpellId>,
}

impl Spellbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the spell was already known.
    pub fn learn(&mut self, spell: SpellId) -> bool {
        self.spells.insert(spell)
    }

    pub fn forget(&mut self, spell: SpellId) -> bool {
        self.spells.remove(&spell)
    }

    pub fn knows(&self, spell: SpellId) -> bool {
        self.spells.contains(&spell)
    }
}

lazy_static::lazy_static! {
    /// A small SRD spell list for seeding a store.
    pub static ref STANDARD_SPELLS: Vec<Spell> = vec![
        Spell::new("Fire Bolt", 0, SpellSchool::Evocation)
            .with_description("Hurl a mote of fire at a creature or object within range."),
        Spell::new("Light", 0, SpellSchool::Evocation)
            .with_description("An object you touch sheds bright light in a 20-foot radius."),
        Spell::new("Mage Hand", 0, SpellSchool::Conjuration)
            .with_description("A spectral, floating hand appears at a point you choose."),
        Spell::new("Sacred Flame", 0, SpellSchool::Evocation)
            .with_description("Flame-like radiance descends on a creature you can see."),
        Spell::new("Cure Wounds", 1, SpellSchool::Evocation)
            .with_description("A creature you touch regains hit points."),
        Spell::new("Detect Magic", 1, SpellSchool::Divination)
            .with_description("Sense the presence of magic within 30 feet of you."),
        Spell::new("Magic Missile", 1, SpellSchool::Evocation)
            .with_description("Three glowing darts of magical force strike creatures you can see."),
        Spell::new("Shield", 1, SpellSchool::Abjuration)
            .with_description(
                "An invisible barrier of magical force grants +5 AC until your next turn.",
            ),
        Spell::new("Sleep", 1, SpellSchool::Enchantment)
            .with_description("Send creatures into a magical slumber."),
        Spell::new("Misty Step", 2, SpellSchool::Conjuration)
            .with_description("Teleport up to 30 feet to an unoccupied space you can see."),
        Spell::new("Fireball", 3, SpellSchool::Evocation)
            .with_description("A bright streak blossoms into an explosion of flame."),
    ];
}

/// Get a standard spell by name (case-insensitive).
pub fn get_spell(name: &str) -> Option<&'static Spell> {
    let name_lower = name.to_lowercase();
    STANDARD_SPELLS
        .iter()
        .find(|s| s.name.to_lowercase() == name_lower)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_spell() {
        let fireball = get_spell("fireball").unwrap();
        assert_eq!(fireball.level, 3);
        assert_eq!(fireball.school, SpellSchool::Evocation);
        assert!(get_spell("Light").unwrap().is_cantrip());
        assert!(get_spell("Wish").is_none());
    }

    #[test]
    fn test_spellbook() {
        let mut book = Spellbook::new();
        let shield = get_spell("Shield").unwrap().id;

        assert!(book.learn(shield));
        assert!(!book.learn(shield));
        assert!(book.knows(shield));
        assert!(book.forget(shield));
        assert!(!book.knows(shield));
    }
}
