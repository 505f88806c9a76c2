//! D&D 5e character sheets.
//!
//! This crate provides:
//! - A campaign store for users, campaigns, characters and shared reference data
//! - A pure stat engine for levels, modifiers, saving throws and skills
//! - Configurable rule tables (experience thresholds, proficiency bonuses, skill abilities)
//! - Versioned JSON persistence
//!
//! # Quick Start
//!
//! ```ignore
//! use dnd_sheet::{CharacterBuilder, EntityStore, MemoryStore, StatEngine};
//! use dnd_sheet::world::{Ability, Alignment, Background, Campaign, Race, Skill, User};
//!
//! let mut store = MemoryStore::new();
//! store.seed_reference_data();
//!
//! let dm = store.add_user(User::new("dm", "dm@example.com"));
//! let campaign = store.add_campaign(Campaign::new("Lost Mine", dm))?;
//! let race = store.add_race(Race::new("Halfling"));
//! let background = store.add_background(Background::new("Criminal"));
//!
//! let character = CharacterBuilder::new(campaign, dm)
//!     .name("Vex")
//!     .alignment(Alignment::ChaoticNeutral)
//!     .saving_throws([Ability::Dexterity, Ability::Intelligence])
//!     .expertise(Skill::Stealth)
//!     .race(race)
//!     .background(background)
//!     .hit_dice("1d8")
//!     .build()?;
//! let id = store.add_character(character)?;
//!
//! let engine = StatEngine::standard();
//! let sheet = engine.stat_block(store.character(id)?)?;
//! println!("Passive Perception {}", sheet.passive_perception);
//! ```

pub mod character_builder;
pub mod dice;
pub mod items;
pub mod persist;
pub mod rules;
pub mod spells;
pub mod stats;
pub mod store;
pub mod testing;
pub mod world;

// Primary public API
pub use character_builder::{BuilderError, CharacterBuilder};
pub use persist::{PersistError, SavedCharacter, SavedStore};
pub use rules::{RuleTables, RulesError};
pub use stats::{StatBlock, StatEngine, StatError};
pub use store::{EntityStore, LevelChange, MemoryStore, StoreError};
pub use testing::TestHarness;
