//! Shared domain models.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Header metadata for the running game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameInfo {
    /// Short name shown as the status line title.
    pub name: String,
    /// Optional one-line description rendered under the header.
    pub description: String,
    /// Project name; the header is hidden while this is empty.
    pub project_name: String,
}

impl GameInfo {
    /// Returns the header label, preferring the project name.
    pub fn display_name(&self) -> &str {
        if self.project_name.is_empty() {
            &self.name
        } else {
            &self.project_name
        }
    }
}

/// The game aspects a panel can represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelKind {
    /// Upgradeable buildings; the only payout-eligible collection.
    Buildings,
    /// Capital ledger.
    Capital,
    /// Weapon inventory.
    Weapons,
    /// Resource aggregation view.
    Overview,
}

impl PanelKind {
    /// Tab label; also the routing identity for readiness events.
    pub fn tab_name(self) -> &'static str {
        match self {
            PanelKind::Buildings => "Buildings",
            PanelKind::Capital => "Capital",
            PanelKind::Weapons => "Weapons",
            PanelKind::Overview => "Overview",
        }
    }

    /// Cosmetic display path.
    pub fn path(self) -> &'static str {
        match self {
            PanelKind::Buildings => "/buildings",
            PanelKind::Capital => "/capital",
            PanelKind::Weapons => "/weapons",
            PanelKind::Overview => "/overview",
        }
    }
}

impl fmt::Display for PanelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tab_name())
    }
}

/// A named, leveled item owned by exactly one panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique name within the owning panel.
    pub name: String,
    /// Level for buildings, value for capital and weapons.
    pub level: u64,
    /// Cost per level; zero for entities that are not bought.
    #[serde(default)]
    pub cost: u64,
}

impl Entity {
    /// Create an entity.
    pub fn new(name: impl Into<String>, level: u64, cost: u64) -> Self {
        Self {
            name: name.into(),
            level,
            cost,
        }
    }

    /// Contribution of this entity to one payout cycle.
    pub fn yield_per_cycle(&self) -> u64 {
        self.level.saturating_mul(self.cost)
    }
}

/// Drop entities whose name was already seen, keeping the first occurrence.
pub fn dedupe_by_name(entities: Vec<Entity>) -> Vec<Entity> {
    let mut unique: Vec<Entity> = Vec::with_capacity(entities.len());
    for entity in entities {
        if unique.iter().any(|existing| existing.name == entity.name) {
            warn!(name = %entity.name, "Dropping duplicate entity");
            continue;
        }
        unique.push(entity);
    }
    unique
}

/// Fixed starter set for a collection panel.
pub fn starter_entities(kind: PanelKind) -> Vec<Entity> {
    match kind {
        PanelKind::Buildings => vec![
            Entity::new("Building 1", 1, 100),
            Entity::new("Building 2", 1, 200),
            Entity::new("Building 3", 1, 300),
        ],
        PanelKind::Capital => vec![
            Entity::new("Capital 1", 1000, 0),
            Entity::new("Capital 2", 2000, 0),
            Entity::new("Capital 3", 3000, 0),
        ],
        PanelKind::Weapons => vec![
            Entity::new("Weapon 1", 1000, 0),
            Entity::new("Weapon 2", 2000, 0),
            Entity::new("Weapon 3", 3000, 0),
        ],
        PanelKind::Overview => Vec::new(),
    }
}
