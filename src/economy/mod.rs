//! Economy domain — the sect market catalog and its stock.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::save::{GameClock, SaveData, StorageBackend, StorageHandle};
use crate::settings::StoreSettings;
use crate::shared::*;
use crate::store::{ListenerId, Store};

pub mod shop;

pub use shop::{default_catalog, format_amount, ShopCategory, ShopItem};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShopState {
    pub items: Vec<ShopItem>,
    /// Milliseconds since the Unix epoch; `None` until the first restock.
    pub last_restocked: Option<i64>,
}

impl Default for ShopState {
    fn default() -> Self {
        Self {
            items: default_catalog(),
            last_restocked: None,
        }
    }
}

impl SaveData for ShopState {}

#[derive(Resource)]
pub struct ShopStore {
    store: Store<ShopState>,
    clock: SharedClock,
}

impl ShopStore {
    pub fn open(slot: impl Into<String>, storage: Arc<dyn StorageBackend>, clock: SharedClock) -> Self {
        Self {
            store: Store::open(slot, storage),
            clock,
        }
    }

    pub fn in_memory(clock: SharedClock) -> Self {
        Self {
            store: Store::in_memory("lingxu-shop"),
            clock,
        }
    }

    pub fn state(&self) -> &ShopState {
        self.store.state()
    }

    pub fn subscribe(&mut self, listener: impl Fn(&ShopState) + Send + Sync + 'static) -> ListenerId {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.store.unsubscribe(id)
    }

    pub fn item(&self, id: &str) -> Option<&ShopItem> {
        self.state().items.iter().find(|i| i.id == id)
    }

    pub fn filter_by_category(&self, category: ShopCategory) -> Vec<&ShopItem> {
        self.state()
            .items
            .iter()
            .filter(|i| i.category == category)
            .collect()
    }

    /// Case-insensitive substring match on the item name. An empty query
    /// matches everything.
    pub fn search(&self, query: &str) -> Vec<&ShopItem> {
        let needle = query.trim().to_lowercase();
        self.state()
            .items
            .iter()
            .filter(|i| i.name.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn total_revenue(&self) -> u64 {
        self.state()
            .items
            .iter()
            .fold(0u64, |total, i| total.saturating_add(i.revenue))
    }

    /// Items with `quantity <= threshold`.
    pub fn low_stock(&self, threshold: u32) -> Vec<&ShopItem> {
        self.state()
            .items
            .iter()
            .filter(|i| i.quantity <= threshold)
            .collect()
    }

    /// Add `quantity` units of `item_id`. Returns the new quantity.
    pub fn restock(&mut self, item_id: &str, quantity: u32) -> Result<u32, Rejection> {
        if quantity == 0 {
            return Err(Rejection::ZeroAmount);
        }
        let now = self.clock.now_millis();
        let stocked = self.store.update(|state| {
            let item = state
                .items
                .iter_mut()
                .find(|i| i.id == item_id)
                .ok_or_else(|| Rejection::UnknownItem(item_id.to_string()))?;
            item.quantity = item.quantity.saturating_add(quantity);
            let stocked = item.quantity;
            state.last_restocked = Some(now);
            Ok(stocked)
        })?;
        info!("[Shop] Restocked {} (+{}), now {}", item_id, quantity, stocked);
        Ok(stocked)
    }

    pub fn apply(&mut self, command: ShopCommand) -> Result<ShopApplied, Rejection> {
        match command {
            ShopCommand::Restock { item_id, quantity } => {
                let stocked = self.restock(&item_id, quantity)?;
                Ok(ShopApplied::Restocked { item_id, quantity: stocked })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShopCommand {
    Restock { item_id: String, quantity: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShopApplied {
    Restocked { item_id: String, quantity: u32 },
}

#[derive(Event, Debug, Clone)]
pub struct ShopCommandEvent(pub ShopCommand);

#[derive(Event, Debug, Clone)]
pub struct ShopOutcomeEvent {
    pub command: ShopCommand,
    pub outcome: Result<ShopApplied, Rejection>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugin
// ─────────────────────────────────────────────────────────────────────────────

pub struct EconomyPlugin;

impl Plugin for EconomyPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ShopStore>()
            .add_event::<ShopCommandEvent>()
            .add_event::<ShopOutcomeEvent>()
            .add_systems(Update, handle_shop_commands);

        info!("[Economy] EconomyPlugin registered.");
    }
}

impl FromWorld for ShopStore {
    fn from_world(world: &mut World) -> Self {
        let slot = world.resource::<StoreSettings>().slots.shop.clone();
        let storage = world.resource::<StorageHandle>().0.clone();
        let clock = world.resource::<GameClock>().0.clone();
        ShopStore::open(slot, storage, clock)
    }
}

pub fn handle_shop_commands(
    mut commands: EventReader<ShopCommandEvent>,
    mut store: ResMut<ShopStore>,
    mut outcomes: EventWriter<ShopOutcomeEvent>,
) {
    for ev in commands.read() {
        let outcome = store.apply(ev.0.clone());
        if let Err(reason) = &outcome {
            info!("[Shop] {:?} rejected: {}", ev.0, reason);
        }
        outcomes.send(ShopOutcomeEvent {
            command: ev.0.clone(),
            outcome,
        });
    }
}
