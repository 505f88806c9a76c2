//! Equipment: the backpack, the wallet, and weapons.
//!
//! Backpacks, wallets and arsenals belong to exactly one character.
//! Weapons are shared reference data; an arsenal only records which
//! weapons its owner carries. A standard weapon catalog is provided for
//! seeding a store.

use crate::world::{ArsenalId, InventoryId, WalletId, WeaponId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

// ============================================================================
// Inventory
// ============================================================================

/// Inventory item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub quantity: u32,
    pub weight: f32,
    pub description: Option<String>,
    pub item_type: ItemType,
}

impl Item {
    pub fn new(name: impl Into<String>, item_type: ItemType) -> Self {
        Self {
            name: name.into(),
            quantity: 1,
            weight: 0.0,
            description: None,
            item_type,
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    /// Armor, shields and wondrous items are distinct objects; everything else stacks.
    pub fn is_stackable(&self) -> bool {
        match self.item_type {
            ItemType::Armor | ItemType::Shield | ItemType::Wondrous => false,
            ItemType::Potion | ItemType::Scroll | ItemType::Adventuring | ItemType::Tool => true,
            ItemType::Other => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemType {
    Armor,
    Shield,
    Potion,
    Scroll,
    Wondrous,
    Adventuring,
    Tool,
    Other,
}

/// A character's backpack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Inventory {
    pub id: InventoryId,
    pub items: Vec<Item>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_weight(&self) -> f32 {
        self.items
            .iter()
            .map(|i| i.weight * i.quantity as f32)
            .sum()
    }

    /// Add an item, merging it into an existing stack when it is stackable.
    pub fn add_item(&mut self, item: Item) {
        if item.is_stackable() {
            // A stack that would overflow is left as is and a new one started
            if let Some(existing) = self.items.iter_mut().find(|i| {
                i.name == item.name && i.quantity.checked_add(item.quantity).is_some()
            }) {
                existing.quantity += item.quantity;
                return;
            }
        }
        self.items.push(item);
    }

    /// Remove an item from the inventory. Returns true if successful.
    /// Name matching is case-insensitive.
    pub fn remove_item(&mut self, name: &str, quantity: u32) -> bool {
        let name_lower = name.to_lowercase();
        if let Some(idx) = self
            .items
            .iter()
            .position(|i| i.name.to_lowercase() == name_lower)
        {
            if self.items[idx].quantity >= quantity {
                self.items[idx].quantity -= quantity;
                if self.items[idx].quantity == 0 {
                    self.items.remove(idx);
                }
                return true;
            }
        }
        false
    }

    pub fn find_item(&self, name: &str) -> Option<&Item> {
        self.items
            .iter()
            .find(|i| i.name.to_lowercase() == name.to_lowercase())
    }

    pub fn has_item(&self, name: &str) -> bool {
        self.find_item(name).is_some()
    }
}

// ============================================================================
// Wallet
// ============================================================================

/// Errors from wallet operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("Insufficient funds: need {needed} cp, have {available} cp")]
    InsufficientFunds { needed: u64, available: u64 },

    #[error("Wallet total would exceed {} cp", u64::MAX)]
    Overflow,
}

/// Coin denominations, in ascending value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Coin {
    Copper,
    Silver,
    Electrum,
    Gold,
    Platinum,
}

impl Coin {
    pub fn copper_value(&self) -> u64 {
        match self {
            Coin::Copper => 1,
            Coin::Silver => 10,
            Coin::Electrum => 50,
            Coin::Gold => 100,
            Coin::Platinum => 1000,
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            Coin::Copper => "cp",
            Coin::Silver => "sp",
            Coin::Electrum => "ep",
            Coin::Gold => "gp",
            Coin::Platinum => "pp",
        }
    }

    pub fn ascending() -> [Coin; 5] {
        [
            Coin::Copper,
            Coin::Silver,
            Coin::Electrum,
            Coin::Gold,
            Coin::Platinum,
        ]
    }
}

/// A character's coin purse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Wallet {
    pub id: WalletId,
    pub copper: u64,
    pub silver: u64,
    pub electrum: u64,
    pub gold: u64,
    pub platinum: u64,
}

impl Wallet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, coin: Coin) -> u64 {
        match coin {
            Coin::Copper => self.copper,
            Coin::Silver => self.silver,
            Coin::Electrum => self.electrum,
            Coin::Gold => self.gold,
            Coin::Platinum => self.platinum,
        }
    }

    fn count_mut(&mut self, coin: Coin) -> &mut u64 {
        match coin {
            Coin::Copper => &mut self.copper,
            Coin::Silver => &mut self.silver,
            Coin::Electrum => &mut self.electrum,
            Coin::Gold => &mut self.gold,
            Coin::Platinum => &mut self.platinum,
        }
    }

    /// Total value in copper pieces, saturating at `u64::MAX`.
    pub fn total_copper(&self) -> u64 {
        self.checked_total().unwrap_or(u64::MAX)
    }

    fn checked_total(&self) -> Option<u64> {
        Coin::ascending().iter().try_fold(0u64, |total, c| {
            self.count(*c).checked_mul(c.copper_value())?.checked_add(total)
        })
    }

    /// Add coins. Fails, leaving the wallet unchanged, if the total value
    /// would no longer fit in a `u64` of copper pieces.
    pub fn deposit(&mut self, coin: Coin, amount: u64) -> Result<(), WalletError> {
        let previous = self.count(coin);
        *self.count_mut(coin) = previous.checked_add(amount).ok_or(WalletError::Overflow)?;
        if self.checked_total().is_none() {
            *self.count_mut(coin) = previous;
            return Err(WalletError::Overflow);
        }
        Ok(())
    }

    /// Pay `cost` copper pieces' worth, smallest coins first, taking change
    /// in gold, silver and copper when a larger coin has to be broken.
    pub fn spend(&mut self, cost: u64) -> Result<(), WalletError> {
        let available = self.checked_total().ok_or(WalletError::Overflow)?;
        if cost > available {
            return Err(WalletError::InsufficientFunds {
                needed: cost,
                available,
            });
        }

        let mut owed = cost;
        for coin in Coin::ascending() {
            if owed == 0 {
                break;
            }
            let value = coin.copper_value();
            let used = owed.div_ceil(value).min(self.count(coin));
            *self.count_mut(coin) -= used;

            let paid = used * value;
            if paid >= owed {
                self.receive_change(paid - owed);
                owed = 0;
            } else {
                owed -= paid;
            }
        }
        Ok(())
    }

    fn receive_change(&mut self, mut change: u64) {
        for coin in [Coin::Gold, Coin::Silver, Coin::Copper] {
            let value = coin.copper_value();
            *self.count_mut(coin) += change / value;
            change %= value;
        }
    }
}

impl fmt::Display for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = Coin::ascending()
            .iter()
            .rev()
            .filter(|c| self.count(**c) > 0)
            .map(|c| format!("{} {}", self.count(*c), c.abbreviation()))
            .collect();
        if parts.is_empty() {
            write!(f, "0 cp")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

// ============================================================================
// Weapons
// ============================================================================

/// Weapon damage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponDamageType {
    Slashing,
    Piercing,
    Bludgeoning,
}

/// Weapon properties per D&D 5e.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponProperty {
    Finesse,
    Light,
    Heavy,
    TwoHanded,
    Versatile(String),
    Thrown,
    Ammunition,
    Loading,
    Reach,
}

/// A weapon definition. Shared by every arsenal that carries it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub id: WeaponId,
    pub name: String,
    pub description: Option<String>,
    pub damage_dice: String,
    pub damage_type: WeaponDamageType,
    pub properties: Vec<WeaponProperty>,
}

impl Weapon {
    pub fn new(
        name: impl Into<String>,
        damage_dice: impl Into<String>,
        damage_type: WeaponDamageType,
    ) -> Self {
        Self {
            id: WeaponId::new(),
            name: name.into(),
            description: None,
            damage_dice: damage_dice.into(),
            damage_type,
            properties: Vec::new(),
        }
    }

    pub fn with_properties(mut self, properties: Vec<WeaponProperty>) -> Self {
        self.properties = properties;
        self
    }

    pub fn is_finesse(&self) -> bool {
        self.properties.contains(&WeaponProperty::Finesse)
    }
}

/// The set of weapons a character carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Arsenal {
    pub id: ArsenalId,
    pub weapons: HashSet<WeaponId>,
}

impl Arsenal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the weapon was already carried.
    pub fn add(&mut self, weapon: WeaponId) -> bool {
        self.weapons.insert(weapon)
    }

    pub fn remove(&mut self, weapon: WeaponId) -> bool {
        self.weapons.remove(&weapon)
    }

    pub fn contains(&self, weapon: WeaponId) -> bool {
        self.weapons.contains(&weapon)
    }
}

lazy_static::lazy_static! {
    /// Standard D&D 5e weapons.
    pub static ref STANDARD_WEAPONS: Vec<Weapon> = vec![
        // Simple
        Weapon::new("Club", "1d4", WeaponDamageType::Bludgeoning)
            .with_properties(vec![WeaponProperty::Light]),
        Weapon::new("Dagger", "1d4", WeaponDamageType::Piercing)
            .with_properties(vec![
                WeaponProperty::Finesse,
                WeaponProperty::Light,
                WeaponProperty::Thrown,
            ]),
        Weapon::new("Handaxe", "1d6", WeaponDamageType::Slashing)
            .with_properties(vec![WeaponProperty::Light, WeaponProperty::Thrown]),
        Weapon::new("Mace", "1d6", WeaponDamageType::Bludgeoning),
        Weapon::new("Quarterstaff", "1d6", WeaponDamageType::Bludgeoning)
            .with_properties(vec![WeaponProperty::Versatile("1d8".to_string())]),
        Weapon::new("Spear", "1d6", WeaponDamageType::Piercing)
            .with_properties(vec![
                WeaponProperty::Thrown,
                WeaponProperty::Versatile("1d8".to_string()),
            ]),
        Weapon::new("Light Crossbow", "1d8", WeaponDamageType::Piercing)
            .with_properties(vec![
                WeaponProperty::Ammunition,
                WeaponProperty::Loading,
                WeaponProperty::TwoHanded,
            ]),
        Weapon::new("Shortbow", "1d6", WeaponDamageType::Piercing)
            .with_properties(vec![WeaponProperty::Ammunition, WeaponProperty::TwoHanded]),
        // Martial
        Weapon::new("Battleaxe", "1d8", WeaponDamageType::Slashing)
            .with_properties(vec![WeaponProperty::Versatile("1d10".to_string())]),
        Weapon::new("Greataxe", "1d12", WeaponDamageType::Slashing)
            .with_properties(vec![WeaponProperty::Heavy, WeaponProperty::TwoHanded]),
        Weapon::new("Greatsword", "2d6", WeaponDamageType::Slashing)
            .with_properties(vec![WeaponProperty::Heavy, WeaponProperty::TwoHanded]),
        Weapon::new("Longsword", "1d8", WeaponDamageType::Slashing)
            .with_properties(vec![WeaponProperty::Versatile("1d10".to_string())]),
        Weapon::new("Rapier", "1d8", WeaponDamageType::Piercing)
            .with_properties(vec![WeaponProperty::Finesse]),
        Weapon::new("Shortsword", "1d6", WeaponDamageType::Piercing)
            .with_properties(vec![WeaponProperty::Finesse, WeaponProperty::Light]),
        Weapon::new("Warhammer", "1d8", WeaponDamageType::Bludgeoning)
            .with_properties(vec![WeaponProperty::Versatile("1d10".to_string())]),
        Weapon::new("Glaive", "1d10", WeaponDamageType::Slashing)
            .with_properties(vec![
                WeaponProperty::Heavy,
                WeaponProperty::Reach,
                WeaponProperty::TwoHanded,
            ]),
        Weapon::new("Longbow", "1d8", WeaponDamageType::Piercing)
            .with_properties(vec![
                WeaponProperty::Ammunition,
                WeaponProperty::Heavy,
                WeaponProperty::TwoHanded,
            ]),
    ];
}

/// Get a standard weapon by name (case-insensitive).
pub fn get_weapon(name: &str) -> Option<&'static Weapon> {
    let name_lower = name.to_lowercase();
    STANDARD_WEAPONS
        .iter()
        .find(|w| w.name.to_lowercase() == name_lower)
}
