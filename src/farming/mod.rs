//! Farming domain — spirit-herb plots, time-based ripening, harvest.
//!
//! Ripeness is pulled from the clock whenever it is needed; nothing ticks
//! in the background.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::game::GameStore;
use crate::save::{GameClock, SaveData, StorageBackend, StorageHandle};
use crate::settings::StoreSettings;
use crate::shared::*;
use crate::store::{ListenerId, Store};

mod crops;

pub use crops::*;

pub const STARTING_PLOTS: u32 = 6;
pub const MAX_PLOTS: u32 = 12;
/// Farm experience per existing plot needed to unlock the next one.
pub const UNLOCK_COST_PER_PLOT: u64 = 50;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FarmPlot {
    pub id: u32,
    pub crop: Option<String>,
    pub planted_time: Option<i64>,
    /// Minutes.
    pub growth_time: u32,
    pub is_ready: bool,
    #[serde(rename = "yield")]
    pub yield_amount: u32,
    pub pet_bonus: u32,
}

impl FarmPlot {
    fn empty(id: u32) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    fn ripe_at(&self, now: i64) -> bool {
        self.planted_time
            .is_some_and(|planted| now.saturating_sub(planted) >= growth_millis(self.growth_time))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FarmState {
    pub plots: Vec<FarmPlot>,
    pub total_harvested: u64,
    pub experience: u64,
    /// Added to the yield of every crop planted from now on.
    pub pet_bonus: u32,
}

impl Default for FarmState {
    fn default() -> Self {
        Self {
            plots: (1..=STARTING_PLOTS).map(FarmPlot::empty).collect(),
            total_harvested: 0,
            experience: 0,
            pet_bonus: 0,
        }
    }
}

impl SaveData for FarmState {
    /// A plot with a crop but no planting time (or the reverse) could never
    /// be harvested or replanted; clear it.
    fn repair(&mut self) {
        for plot in &mut self.plots {
            if plot.crop.is_some() != plot.planted_time.is_some() {
                warn!("[Farm] Plot {} was half-planted in the save, clearing it.", plot.id);
                *plot = FarmPlot::empty(plot.id);
            }
        }
    }
}

impl FarmState {
    pub fn plot(&self, id: u32) -> Option<&FarmPlot> {
        self.plots.iter().find(|p| p.id == id)
    }

    fn plot_mut(&mut self, id: u32) -> Option<&mut FarmPlot> {
        self.plots.iter_mut().find(|p| p.id == id)
    }

    pub fn ready_plots(&self) -> impl Iterator<Item = &FarmPlot> {
        self.plots.iter().filter(|p| p.is_ready)
    }

    pub fn unlock_cost(&self) -> u64 {
        self.plots.len() as u64 * UNLOCK_COST_PER_PLOT
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestReceipt {
    pub plot: u32,
    pub crop: String,
    pub amount: u64,
}

#[derive(Resource)]
pub struct FarmStore {
    store: Store<FarmState>,
    clock: SharedClock,
}

impl FarmStore {
    pub fn open(slot: impl Into<String>, storage: Arc<dyn StorageBackend>, clock: SharedClock) -> Self {
        Self {
            store: Store::open(slot, storage),
            clock,
        }
    }

    pub fn in_memory(clock: SharedClock) -> Self {
        Self {
            store: Store::in_memory("lingxu-farm"),
            clock,
        }
    }

    pub fn state(&self) -> &FarmState {
        self.store.state()
    }

    pub fn snapshot(&self) -> FarmState {
        self.store.snapshot()
    }

    pub fn subscribe(&mut self, listener: impl Fn(&FarmState) + Send + Sync + 'static) -> ListenerId {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.store.unsubscribe(id)
    }

    pub fn plant_crop(&mut self, plot: u32, crop_id: &str) -> Result<(), Rejection> {
        let def = crop(crop_id).ok_or_else(|| Rejection::UnknownCrop(crop_id.to_string()))?;
        let now = self.clock.now_millis();
        self.store.update(|state| {
            let pet_bonus = state.pet_bonus;
            let target = state.plot_mut(plot).ok_or(Rejection::UnknownPlot(plot))?;
            if target.crop.is_some() {
                return Err(Rejection::PlotOccupied(plot));
            }
            target.crop = Some(def.id.to_string());
            target.planted_time = Some(now);
            target.growth_time = def.growth_minutes;
            target.is_ready = false;
            target.yield_amount = def.base_yield;
            target.pet_bonus = pet_bonus;
            Ok(())
        })?;
        info!("[Farm] Planted {} in plot {}", def.name, plot);
        Ok(())
    }

    /// Recompute every plot's readiness. Returns how many became ready.
    pub fn update_plot_readiness(&mut self) -> usize {
        let now = self.clock.now_millis();
        if self.state().plots.iter().all(|p| p.ripe_at(now) == p.is_ready) {
            return 0;
        }
        let ripened = self.store.mutate(|state| {
            let mut ripened = 0;
            for plot in &mut state.plots {
                let ripe = plot.ripe_at(now);
                if ripe && !plot.is_ready {
                    ripened += 1;
                }
                plot.is_ready = ripe;
            }
            ripened
        });
        if ripened > 0 {
            debug!("[Farm] {} plot(s) ripened", ripened);
        }
        ripened
    }

    pub fn harvest_crop(&mut self, plot: u32) -> Result<HarvestReceipt, Rejection> {
        self.update_plot_readiness();
        let now = self.clock.now_millis();
        let receipt = self.store.update(|state| {
            let target = state.plot_mut(plot).ok_or(Rejection::UnknownPlot(plot))?;
            let (Some(crop), Some(planted)) = (target.crop.clone(), target.planted_time) else {
                return Err(Rejection::PlotEmpty(plot));
            };
            if !target.is_ready {
                return Err(Rejection::NotReady {
                    plot,
                    remaining_minutes: remaining_minutes(planted, target.growth_time, now),
                });
            }

            let amount = target.yield_amount as u64 + target.pet_bonus as u64;
            *target = FarmPlot::empty(plot);
            state.total_harvested = state.total_harvested.saturating_add(amount);
            state.experience = state.experience.saturating_add(amount);
            Ok(HarvestReceipt { plot, crop, amount })
        })?;
        info!("[Farm] Harvested {} x{} from plot {}", receipt.crop, receipt.amount, plot);
        Ok(receipt)
    }

    /// Bonus yield for crops planted after this call. Planted crops keep theirs.
    pub fn set_pet_bonus(&mut self, bonus: u32) {
        self.store.mutate(|state| state.pet_bonus = bonus);
    }

    /// Spend farm experience on a new plot. `extra_plots` raises the cap
    /// above [`MAX_PLOTS`] (the VIP bonus). Returns the new plot's id.
    pub fn unlock_plot(&mut self, extra_plots: u32) -> Result<u32, Rejection> {
        let id = self.store.update(|state| {
            if state.plots.len() as u32 >= MAX_PLOTS.saturating_add(extra_plots) {
                return Err(Rejection::NoLockedPlots);
            }
            let cost = state.unlock_cost();
            if state.experience < cost {
                return Err(Rejection::insufficient("farm experience", cost, state.experience));
            }
            let id = state.plots.iter().map(|p| p.id).max().unwrap_or(0).saturating_add(1);
            state.experience -= cost;
            state.plots.push(FarmPlot::empty(id));
            Ok(id)
        })?;
        info!("[Farm] Unlocked plot {}", id);
        Ok(id)
    }

    pub fn apply(&mut self, command: FarmCommand, extra_plots: u32) -> Result<FarmApplied, Rejection> {
        match command {
            FarmCommand::Plant { plot, crop } => {
                self.plant_crop(plot, &crop).map(|()| FarmApplied::Planted { plot })
            }
            FarmCommand::Harvest { plot } => self.harvest_crop(plot).map(FarmApplied::Harvested),
            FarmCommand::RefreshReadiness => {
                Ok(FarmApplied::Ripened(self.update_plot_readiness()))
            }
            FarmCommand::SetPetBonus(bonus) => {
                self.set_pet_bonus(bonus);
                Ok(FarmApplied::PetBonus(bonus))
            }
            FarmCommand::UnlockPlot => self.unlock_plot(extra_plots).map(FarmApplied::Unlocked),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FarmCommand {
    Plant { plot: u32, crop: String },
    Harvest { plot: u32 },
    RefreshReadiness,
    SetPetBonus(u32),
    UnlockPlot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FarmApplied {
    Planted { plot: u32 },
    Harvested(HarvestReceipt),
    Ripened(usize),
    PetBonus(u32),
    Unlocked(u32),
}

#[derive(Event, Debug, Clone)]
pub struct FarmCommandEvent(pub FarmCommand);

#[derive(Event, Debug, Clone)]
pub struct FarmOutcomeEvent {
    pub command: FarmCommand,
    pub outcome: Result<FarmApplied, Rejection>,
}

pub struct FarmingPlugin;

impl Plugin for FarmingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FarmStore>()
            .add_event::<FarmCommandEvent>()
            .add_event::<FarmOutcomeEvent>()
            .add_systems(Update, handle_farm_commands);
    }
}

impl FromWorld for FarmStore {
    fn from_world(world: &mut World) -> Self {
        let slot = world.resource::<StoreSettings>().slots.farm.clone();
        let storage = world.resource::<StorageHandle>().0.clone();
        let clock = world.resource::<GameClock>().0.clone();
        FarmStore::open(slot, storage, clock)
    }
}

pub fn handle_farm_commands(
    mut commands: EventReader<FarmCommandEvent>,
    mut store: ResMut<FarmStore>,
    game: Option<Res<GameStore>>,
    mut outcomes: EventWriter<FarmOutcomeEvent>,
) {
    let extra_plots = game.map_or(0, |game| game.vip_farm_plots());
    for ev in commands.read() {
        let outcome = store.apply(ev.0.clone(), extra_plots);
        if let Err(reason) = &outcome {
            info!("[Farm] {:?} rejected: {}", ev.0, reason);
        }
        outcomes.send(FarmOutcomeEvent {
            command: ev.0.clone(),
            outcome,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::save::MemoryStorage;

    const MINUTE: i64 = 60_000;

    fn farm() -> (FarmStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        (FarmStore::in_memory(clock.clone()), clock)
    }

    #[test]
    fn test_default_farm_has_six_empty_plots() {
        let state = FarmState::default();
        assert_eq!(state.plots.len(), 6);
        assert!(state.plots.iter().all(|p| p.crop.is_none()));
        assert_eq!(state.plots.first().map(|p| p.id), Some(1));
    }

    #[test]
    fn test_plot_ripens_at_growth_time() {
        let (mut farm, clock) = farm();
        farm.plant_crop(1, "spirit_rice").unwrap();

        clock.advance_minutes(29);
        assert_eq!(farm.update_plot_readiness(), 0);
        assert!(!farm.state().plot(1).unwrap().is_ready);

        clock.advance_minutes(1);
        assert_eq!(farm.update_plot_readiness(), 1);
        assert!(farm.state().plot(1).unwrap().is_ready);
        // Already ready: nothing new.
        assert_eq!(farm.update_plot_readiness(), 0);
    }

    #[test]
    fn test_plant_rejections() {
        let (mut farm, _) = farm();
        assert_eq!(farm.plant_crop(99, "spirit_rice"), Err(Rejection::UnknownPlot(99)));
        assert_eq!(
            farm.plant_crop(1, "weeds"),
            Err(Rejection::UnknownCrop("weeds".to_string()))
        );
        farm.plant_crop(1, "fire_lotus").unwrap();
        assert_eq!(farm.plant_crop(1, "spirit_rice"), Err(Rejection::PlotOccupied(1)));
    }

    #[test]
    fn test_harvest_requires_ripe_crop() {
        let (mut farm, clock) = farm();
        assert_eq!(farm.harvest_crop(2), Err(Rejection::PlotEmpty(2)));

        farm.plant_crop(2, "moonlight_herb").unwrap();
        clock.advance_minutes(20);
        assert_eq!(
            farm.harvest_crop(2),
            Err(Rejection::NotReady {
                plot: 2,
                remaining_minutes: 40
            })
        );
    }

    #[test]
    fn test_harvest_credits_yield_plus_pet_bonus() {
        let (mut farm, clock) = farm();
        farm.set_pet_bonus(3);
        farm.plant_crop(1, "spirit_rice").unwrap();
        farm.set_pet_bonus(7);
        clock.advance_millis(30 * MINUTE);

        let receipt = farm.harvest_crop(1).unwrap();
        assert_eq!(receipt.amount, 13);
        assert_eq!(receipt.crop, "spirit_rice");

        let state = farm.state();
        assert_eq!(state.total_harvested, 13);
        assert_eq!(state.experience, 13);
        assert_eq!(state.plot(1), Some(&FarmPlot::empty(1)));
    }

    #[test]
    fn test_unlock_plot_spends_experience() {
        let (mut farm, _) = farm();
        assert_eq!(
            farm.unlock_plot(0),
            Err(Rejection::insufficient("farm experience", 300, 0))
        );

        farm.store.mutate(|s| s.experience = 350);
        assert_eq!(farm.unlock_plot(0), Ok(7));
        assert_eq!(farm.state().experience, 50);
        assert_eq!(farm.state().plots.len(), 7);
    }

    #[test]
    fn test_unlock_stops_at_max_plots() {
        let (mut farm, _) = farm();
        farm.store.mutate(|s| s.experience = 100_000);
        for _ in STARTING_PLOTS..MAX_PLOTS {
            farm.unlock_plot(0).unwrap();
        }
        assert_eq!(farm.unlock_plot(0), Err(Rejection::NoLockedPlots));
        assert_eq!(farm.state().plots.len(), MAX_PLOTS as usize);
    }

    #[test]
    fn test_vip_plots_raise_the_cap() {
        let (mut farm, _) = farm();
        farm.store.mutate(|s| s.experience = 100_000);
        for _ in STARTING_PLOTS..MAX_PLOTS {
            farm.unlock_plot(2).unwrap();
        }
        assert_eq!(farm.unlock_plot(2), Ok(MAX_PLOTS + 1));
        assert_eq!(farm.apply(FarmCommand::UnlockPlot, 2), Ok(FarmApplied::Unlocked(MAX_PLOTS + 2)));
        assert_eq!(farm.unlock_plot(2), Err(Rejection::NoLockedPlots));
    }

    #[test]
    fn test_extreme_planted_time_does_not_panic() {
        let blob = r#"{"plots":[{"id":1,"crop":"spirit_rice","plantedTime":-9223372036854775808,"growthTime":30}]}"#;
        let storage = Arc::new(MemoryStorage::new().with_slot("farm", blob));
        let mut farm = FarmStore::open("farm", storage, Arc::new(ManualClock::new(1_000_000)));

        assert_eq!(farm.update_plot_readiness(), 1);
        assert_eq!(farm.harvest_crop(1).map(|r| r.amount), Ok(0));
    }

    #[test]
    fn test_half_planted_plot_is_cleared_on_load() {
        let blob = r#"{"plots":[{"id":1,"crop":"spirit_rice"},{"id":2,"plantedTime":5}]}"#;
        let storage = Arc::new(MemoryStorage::new().with_slot("farm", blob));
        let mut farm = FarmStore::open("farm", storage, Arc::new(ManualClock::new(0)));

        assert_eq!(farm.state().plot(1), Some(&FarmPlot::empty(1)));
        assert_eq!(farm.state().plot(2), Some(&FarmPlot::empty(2)));
        assert_eq!(farm.plant_crop(1, "spirit_rice"), Ok(()));
    }

    #[test]
    fn test_farm_persists_yield_under_wire_name() {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(0));
        let mut farm = FarmStore::open("farm", storage.clone(), clock.clone());
        farm.plant_crop(3, "jade_ginseng").unwrap();

        let blob = storage.get("farm").unwrap().unwrap();
        assert!(blob.contains("\"yield\":25"));
        assert!(blob.contains("\"plantedTime\":0"));

        let reopened = FarmStore::open("farm", storage, clock);
        assert_eq!(reopened.state(), farm.state());
    }

    #[test]
    fn test_apply_routes_commands() {
        let (mut farm, clock) = farm();
        assert_eq!(
            farm.apply(
                FarmCommand::Plant {
                    plot: 4,
                    crop: "frost_grass".to_string()
                },
                0
            ),
            Ok(FarmApplied::Planted { plot: 4 })
        );
        clock.advance_minutes(45);
        assert_eq!(farm.apply(FarmCommand::RefreshReadiness, 0), Ok(FarmApplied::Ripened(1)));
        assert!(matches!(
            farm.apply(FarmCommand::Harvest { plot: 4 }, 0),
            Ok(FarmApplied::Harvested(HarvestReceipt { amount: 12, .. }))
        ));
    }
}
