//! Fishing domain — casting, the catch inventory and display tank, rods,
//! bait and the species collection log.

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::progression::{apply_exp_gain, LevelCurve, Progress};
use crate::save::{GameClock, SaveData, StorageBackend, StorageHandle};
use crate::settings::StoreSettings;
use crate::shared::*;
use crate::store::{ListenerId, Store};

mod fish_select;
mod gear;

pub use fish_select::*;
pub use gear::*;

pub const TANK_CAPACITY: usize = 20;

// ─── State ───────────────────────────────────────────────────────────────────

/// One caught fish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fish {
    pub uid: u64,
    pub species: String,
    pub name: String,
    pub rarity: Rarity,
    pub weight_grams: u32,
    pub price: u64,
    /// Milliseconds since the Unix epoch.
    pub caught_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FishingState {
    pub coins: u64,
    pub pearls: u64,
    pub level: u32,
    pub exp: u64,
    pub max_exp: u64,
    pub inventory: Vec<Fish>,
    pub fish_tank: Vec<Fish>,
    /// Species ids caught at least once.
    pub achieved_fish: BTreeSet<String>,
    pub rod: RodTier,
    pub bait: BaitKind,
    pub bait_stock: BaitStock,
    pub next_fish_id: u64,
    pub total_caught: u64,
}

impl Default for FishingState {
    fn default() -> Self {
        Self {
            coins: 200,
            pearls: 10,
            level: 1,
            exp: 0,
            max_exp: 100,
            inventory: Vec::new(),
            fish_tank: Vec::new(),
            achieved_fish: BTreeSet::new(),
            rod: RodTier::default(),
            bait: BaitKind::default(),
            bait_stock: BaitStock::default(),
            next_fish_id: 1,
            total_caught: 0,
        }
    }
}

impl SaveData for FishingState {
    fn repair(&mut self) {
        let settled = apply_exp_gain(self.progress(), 0, &LevelCurve::FISHING);
        self.set_progress(settled.progress);
    }
}

impl FishingState {
    fn progress(&self) -> Progress {
        Progress {
            level: self.level,
            exp: self.exp,
            max_exp: self.max_exp,
            power: 0,
        }
    }

    fn balance(&self, currency: Currency) -> u64 {
        match currency {
            Currency::Coins => self.coins,
            Currency::Pearls => self.pearls,
        }
    }

    fn balance_mut(&mut self, currency: Currency) -> &mut u64 {
        match currency {
            Currency::Coins => &mut self.coins,
            Currency::Pearls => &mut self.pearls,
        }
    }

    fn debit(&mut self, currency: Currency, cost: u64) -> Result<(), Rejection> {
        let available = self.balance(currency);
        if available < cost {
            return Err(Rejection::insufficient(currency.label(), cost, available));
        }
        *self.balance_mut(currency) -= cost;
        Ok(())
    }

    /// Uid for the next catch. Never reuses a uid still held, even when
    /// `next_fish_id` is missing from an older blob.
    fn claim_fish_id(&mut self) -> u64 {
        let floor = self
            .inventory
            .iter()
            .chain(&self.fish_tank)
            .map(|f| f.uid.saturating_add(1))
            .max()
            .unwrap_or(0);
        let uid = self.next_fish_id.max(floor);
        self.next_fish_id = uid.saturating_add(1);
        uid
    }

    fn set_progress(&mut self, progress: Progress) {
        self.level = progress.level;
        self.exp = progress.exp;
        self.max_exp = progress.max_exp;
    }

    fn inventory_index(&self, uid: u64) -> Result<usize, Rejection> {
        self.inventory
            .iter()
            .position(|f| f.uid == uid)
            .ok_or(Rejection::UnknownFish(uid))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatchReport {
    pub fish: Fish,
    pub first_of_species: bool,
    pub levels_gained: u32,
}

// ─── Store ───────────────────────────────────────────────────────────────────

#[derive(Resource)]
pub struct FishingStore {
    store: Store<FishingState>,
    clock: SharedClock,
}

impl FishingStore {
    pub fn open(slot: impl Into<String>, storage: Arc<dyn StorageBackend>, clock: SharedClock) -> Self {
        Self {
            store: Store::open(slot, storage),
            clock,
        }
    }

    pub fn in_memory(clock: SharedClock) -> Self {
        Self {
            store: Store::in_memory("lingxu-fishing"),
            clock,
        }
    }

    pub fn state(&self) -> &FishingState {
        self.store.state()
    }

    pub fn snapshot(&self) -> FishingState {
        self.store.snapshot()
    }

    pub fn subscribe(&mut self, listener: impl Fn(&FishingState) + Send + Sync + 'static) -> ListenerId {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.store.unsubscribe(id)
    }

    /// Cast with the selected bait, consuming one.
    pub fn cast<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<CatchReport, Rejection> {
        let (rod, bait) = (self.state().rod, self.state().bait);
        if self.state().bait_stock.get(bait) == 0 {
            return Err(Rejection::OutOfBait(bait.label().to_string()));
        }
        let species = select_species(rng, rod, bait);
        let grams = roll_weight(rng, species);
        let caught_at = self.clock.now_millis();

        let report = self.store.mutate(|state| {
            *state.bait_stock.get_mut(bait) -= 1;
            let fish = Fish {
                uid: state.claim_fish_id(),
                species: species.id.to_string(),
                name: species.name.to_string(),
                rarity: species.rarity,
                weight_grams: grams,
                price: sale_price(species, grams),
                caught_at,
            };
            state.total_caught = state.total_caught.saturating_add(1);
            state.inventory.push(fish.clone());
            let first_of_species = state.achieved_fish.insert(species.id.to_string());

            let outcome = apply_exp_gain(state.progress(), species.exp, &LevelCurve::FISHING);
            state.set_progress(outcome.progress);

            CatchReport {
                fish,
                first_of_species,
                levels_gained: outcome.levels_gained,
            }
        });

        info!(
            "[Fishing] Caught {} ({} g, {:?})",
            report.fish.name, report.fish.weight_grams, report.fish.rarity
        );
        if report.levels_gained > 0 {
            info!("[Fishing] Fishing level {}", self.state().level);
        }
        Ok(report)
    }

    /// Sell a fish from the inventory. Returns the coins earned.
    pub fn sell_fish(&mut self, uid: u64) -> Result<u64, Rejection> {
        self.store.update(|state| {
            let index = state.inventory_index(uid)?;
            let fish = state.inventory.swap_remove(index);
            state.coins = state.coins.saturating_add(fish.price);
            Ok(fish.price)
        })
    }

    pub fn move_to_tank(&mut self, uid: u64) -> Result<(), Rejection> {
        self.store.update(|state| {
            if state.fish_tank.len() >= TANK_CAPACITY {
                return Err(Rejection::TankFull(TANK_CAPACITY));
            }
            let index = state.inventory_index(uid)?;
            let fish = state.inventory.swap_remove(index);
            state.fish_tank.push(fish);
            Ok(())
        })
    }

    pub fn upgrade_rod(&mut self) -> Result<RodTier, Rejection> {
        let rod = self.store.update(|state| {
            let (Some(next), Some(cost)) = (state.rod.next(), state.rod.upgrade_cost()) else {
                return Err(Rejection::MaxRodTier);
            };
            state.debit(Currency::Coins, cost)?;
            state.rod = next;
            Ok(next)
        })?;
        info!("[Fishing] Rod upgraded to {:?}", rod);
        Ok(rod)
    }

    /// Buy `quantity` of `kind`. Returns the new stock.
    pub fn buy_bait(&mut self, kind: BaitKind, quantity: u32) -> Result<u32, Rejection> {
        if quantity == 0 {
            return Err(Rejection::ZeroAmount);
        }
        let (currency, unit_price) = kind.price();
        self.store.update(|state| {
            state.debit(currency, unit_price.saturating_mul(quantity as u64))?;
            let stock = state.bait_stock.get_mut(kind);
            *stock = stock.saturating_add(quantity);
            Ok(*stock)
        })
    }

    pub fn select_bait(&mut self, kind: BaitKind) -> Result<(), Rejection> {
        self.store.update(|state| {
            if state.bait_stock.get(kind) == 0 {
                return Err(Rejection::OutOfBait(kind.label().to_string()));
            }
            state.bait = kind;
            Ok(())
        })
    }

    /// Share of known species caught at least once, 0.0..=100.0.
    pub fn collection_progress(&self) -> f32 {
        let seen = SPECIES
            .iter()
            .filter(|s| self.state().achieved_fish.contains(s.id))
            .count();
        seen as f32 * 100.0 / SPECIES.len() as f32
    }

    pub fn apply<R: Rng + ?Sized>(
        &mut self,
        command: FishingCommand,
        rng: &mut R,
    ) -> Result<FishingApplied, Rejection> {
        match command {
            FishingCommand::Cast => self.cast(rng).map(FishingApplied::Caught),
            FishingCommand::Sell { uid } => self.sell_fish(uid).map(|coins| FishingApplied::Sold { uid, coins }),
            FishingCommand::MoveToTank { uid } => {
                self.move_to_tank(uid).map(|()| FishingApplied::Tanked { uid })
            }
            FishingCommand::UpgradeRod => self.upgrade_rod().map(FishingApplied::RodUpgraded),
            FishingCommand::BuyBait { kind, quantity } => self
                .buy_bait(kind, quantity)
                .map(|stock| FishingApplied::BaitBought { kind, stock }),
            FishingCommand::SelectBait(kind) => {
                self.select_bait(kind).map(|()| FishingApplied::BaitSelected(kind))
            }
        }
    }
}

// ─── Commands ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FishingCommand {
    Cast,
    Sell { uid: u64 },
    MoveToTank { uid: u64 },
    UpgradeRod,
    BuyBait { kind: BaitKind, quantity: u32 },
    SelectBait(BaitKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FishingApplied {
    Caught(CatchReport),
    Sold { uid: u64, coins: u64 },
    Tanked { uid: u64 },
    RodUpgraded(RodTier),
    BaitBought { kind: BaitKind, stock: u32 },
    BaitSelected(BaitKind),
}

#[derive(Event, Debug, Clone)]
pub struct FishingCommandEvent(pub FishingCommand);

#[derive(Event, Debug, Clone)]
pub struct FishingOutcomeEvent {
    pub command: FishingCommand,
    pub outcome: Result<FishingApplied, Rejection>,
}

// ─── Plugin ──────────────────────────────────────────────────────────────────

pub struct FishingPlugin;

impl Plugin for FishingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FishingStore>()
            .add_event::<FishingCommandEvent>()
            .add_event::<FishingOutcomeEvent>()
            .add_systems(Update, handle_fishing_commands);
    }
}

impl FromWorld for FishingStore {
    fn from_world(world: &mut World) -> Self {
        let slot = world.resource::<StoreSettings>().slots.fishing.clone();
        let storage = world.resource::<StorageHandle>().0.clone();
        let clock = world.resource::<GameClock>().0.clone();
        FishingStore::open(slot, storage, clock)
    }
}

pub fn handle_fishing_commands(
    mut commands: EventReader<FishingCommandEvent>,
    mut store: ResMut<FishingStore>,
    mut outcomes: EventWriter<FishingOutcomeEvent>,
) {
    let mut rng = rand::thread_rng();
    for ev in commands.read() {
        let outcome = store.apply(ev.0.clone(), &mut rng);
        if let Err(reason) = &outcome {
            info!("[Fishing] {:?} rejected: {}", ev.0, reason);
        }
        outcomes.send(FishingOutcomeEvent {
            command: ev.0.clone(),
            outcome,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::save::MemoryStorage;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fishing() -> FishingStore {
        FishingStore::in_memory(Arc::new(ManualClock::new(0)))
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_cast_consumes_bait_and_records_species() {
        let mut store = fishing();
        let report = store.cast(&mut rng()).unwrap();

        let state = store.state();
        assert_eq!(state.bait_stock.worm, 9);
        assert_eq!(state.inventory, vec![report.fish.clone()]);
        assert!(state.achieved_fish.contains(&report.fish.species));
        assert!(report.first_of_species);
        assert_eq!(state.total_caught, 1);
        assert_eq!(state.next_fish_id, 2);
        assert!(state.exp < state.max_exp);
    }

    #[test]
    fn test_cast_without_bait_is_rejected() {
        let mut store = fishing();
        let mut rng = rng();
        for _ in 0..10 {
            store.cast(&mut rng).unwrap();
        }
        let before = store.snapshot();
        assert_eq!(
            store.cast(&mut rng),
            Err(Rejection::OutOfBait("worm".to_string()))
        );
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_fishing_levels_on_its_own_curve() {
        let mut store = fishing();
        let mut rng = rng();
        let mut gained = 0;
        store.store.mutate(|s| s.bait_stock.worm = 200);
        for _ in 0..200 {
            gained += store.cast(&mut rng).unwrap().levels_gained;
        }
        let state = store.state();
        assert_eq!(state.level, 1 + gained);
        assert!(state.level > 1);
        // 100, 150, 225, ...
        assert!(state.max_exp >= 150);
        assert!(state.exp < state.max_exp);
    }

    #[test]
    fn test_stale_blob_without_next_fish_id_keeps_uids_unique() {
        let blob = r#"{
            "inventory": [{"uid":1,"species":"mud_loach","name":"Mud Loach","rarity":"common","weightGrams":100,"price":5,"caughtAt":0}],
            "fishTank": [{"uid":4,"species":"jade_koi","name":"Jade Koi","rarity":"uncommon","weightGrams":900,"price":24,"caughtAt":0}]
        }"#;
        let storage = Arc::new(MemoryStorage::new().with_slot("fishing", blob));
        let mut store = FishingStore::open("fishing", storage, Arc::new(ManualClock::new(0)));

        let fish = store.cast(&mut rng()).unwrap().fish;
        assert_eq!(fish.uid, 5);
        assert_eq!(store.state().next_fish_id, 6);
        assert_eq!(store.sell_fish(1), Ok(5));
    }

    #[test]
    fn test_loaded_exp_over_requirement_is_settled() {
        let storage = Arc::new(MemoryStorage::new().with_slot("fishing", r#"{"exp":260,"maxExp":100}"#));
        let store = FishingStore::open("fishing", storage, Arc::new(ManualClock::new(0)));
        let state = store.state();
        // 260 - 100 - 150 = 10
        assert_eq!((state.level, state.exp, state.max_exp), (3, 10, 225));
    }

    #[test]
    fn test_sell_fish_credits_coins() {
        let mut store = fishing();
        let fish = store.cast(&mut rng()).unwrap().fish;

        assert_eq!(store.sell_fish(fish.uid), Ok(fish.price));
        assert_eq!(store.state().coins, 200 + fish.price);
        assert!(store.state().inventory.is_empty());
        assert_eq!(store.sell_fish(fish.uid), Err(Rejection::UnknownFish(fish.uid)));
        // The collection log keeps the species.
        assert!(store.state().achieved_fish.contains(&fish.species));
    }

    #[test]
    fn test_tank_capacity() {
        let mut store = fishing();
        let mut rng = rng();
        store.store.mutate(|s| s.bait_stock.worm = 30);
        for _ in 0..(TANK_CAPACITY + 1) {
            store.cast(&mut rng).unwrap();
        }
        let uids: Vec<u64> = store.state().inventory.iter().map(|f| f.uid).collect();
        for uid in &uids[..TANK_CAPACITY] {
            store.move_to_tank(*uid).unwrap();
        }
        assert_eq!(
            store.move_to_tank(uids[TANK_CAPACITY]),
            Err(Rejection::TankFull(TANK_CAPACITY))
        );
        assert_eq!(store.state().fish_tank.len(), TANK_CAPACITY);
        assert_eq!(store.state().inventory.len(), 1);
    }

    #[test]
    fn test_rod_upgrade_is_gated_by_coins() {
        let mut store = fishing();
        assert_eq!(
            store.upgrade_rod(),
            Err(Rejection::insufficient("coins", 500, 200))
        );
        assert_eq!(store.state().rod, RodTier::Bamboo);

        store.store.mutate(|s| s.coins = 10_500);
        assert_eq!(store.upgrade_rod(), Ok(RodTier::Spiritwood));
        assert_eq!(store.upgrade_rod(), Ok(RodTier::Jade));
        assert_eq!(store.upgrade_rod(), Ok(RodTier::Dragonbone));
        assert_eq!(store.state().coins, 0);
        assert_eq!(store.upgrade_rod(), Err(Rejection::MaxRodTier));
    }

    #[test]
    fn test_buy_bait_in_the_right_currency() {
        let mut store = fishing();
        assert_eq!(store.buy_bait(BaitKind::SpiritShrimp, 4), Ok(4));
        assert_eq!(store.state().coins, 0);

        assert_eq!(store.buy_bait(BaitKind::GoldenLure, 2), Ok(2));
        assert_eq!(store.state().pearls, 0);

        assert_eq!(
            store.buy_bait(BaitKind::Worm, 1),
            Err(Rejection::insufficient("coins", 10, 0))
        );
        assert_eq!(store.buy_bait(BaitKind::Worm, 0), Err(Rejection::ZeroAmount));
    }

    #[test]
    fn test_select_bait_requires_stock() {
        let mut store = fishing();
        assert_eq!(
            store.select_bait(BaitKind::GoldenLure),
            Err(Rejection::OutOfBait("golden lure".to_string()))
        );
        store.buy_bait(BaitKind::GoldenLure, 1).unwrap();
        store.select_bait(BaitKind::GoldenLure).unwrap();
        store.cast(&mut rng()).unwrap();
        assert_eq!(store.state().bait_stock.golden_lure, 0);
    }

    #[test]
    fn test_collection_progress_counts_known_species() {
        let mut store = fishing();
        assert_eq!(store.collection_progress(), 0.0);
        store.store.mutate(|s| {
            s.achieved_fish.insert("jade_koi".to_string());
            s.achieved_fish.insert("mud_loach".to_string());
            s.achieved_fish.insert("retired_species".to_string());
        });
        assert_eq!(store.collection_progress(), 20.0);
    }

    #[test]
    fn test_fishing_state_survives_reload() {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(0));
        let mut store = FishingStore::open("fishing", storage.clone(), clock.clone());
        store.cast(&mut rng()).unwrap();
        store.buy_bait(BaitKind::Worm, 5).unwrap();

        let reopened = FishingStore::open("fishing", storage, clock);
        assert_eq!(reopened.state(), store.state());
    }
}
