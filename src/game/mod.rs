//! Game state store — the player's balances, progression, daily activity,
//! server events and notifications.
//!
//! Every change goes through a named operation (or a [`GameCommand`] in the
//! app), so the exp bound and the notification cap are enforced here and
//! nowhere else.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::notifications::NotificationLog;
use crate::progression::{apply_exp_gain, LevelCurve, Progress};
use crate::save::{GameClock, SaveData, StorageBackend, StorageHandle};
use crate::settings::StoreSettings;
use crate::shared::*;
use crate::store::{ListenerId, Store};

mod commands;
mod quests;
pub mod vip;

pub use commands::*;
pub use quests::*;
use vip::VipChange;

// ═══════════════════════════════════════════════════════════════════════
// MODEL
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerProfile {
    pub name: String,
    pub level: u32,
    pub exp: u64,
    /// Exp required for the next level. Always greater than `exp`.
    pub max_exp: u64,
    pub vip_level: u32,
    /// Cumulative real-money recharge, whole currency units.
    pub total_recharge: u64,
    pub silver: u64,
    pub gold_ingots: u64,
    pub spirit_stones: u64,
    pub recharge_spirit_stones: u64,
    pub combat_power: u64,
    pub sect: Option<SectId>,
    pub has_completed_tutorial: bool,
}

impl Default for PlayerProfile {
    fn default() -> Self {
        Self {
            name: String::from("Wandering Cultivator"),
            level: 1,
            exp: 45,
            max_exp: 100,
            vip_level: 0,
            total_recharge: 0,
            silver: 1_000,
            gold_ingots: 50,
            spirit_stones: 100,
            recharge_spirit_stones: 0,
            combat_power: 180,
            sect: None,
            has_completed_tutorial: false,
        }
    }
}

impl PlayerProfile {
    pub fn progress(&self) -> Progress {
        Progress {
            level: self.level,
            exp: self.exp,
            max_exp: self.max_exp,
            power: self.combat_power,
        }
    }

    fn set_progress(&mut self, progress: Progress) {
        self.level = progress.level;
        self.exp = progress.exp;
        self.max_exp = progress.max_exp;
        self.combat_power = progress.power;
    }

    pub fn balance(&self, kind: ResourceKind) -> u64 {
        match kind {
            ResourceKind::Silver => self.silver,
            ResourceKind::GoldIngots => self.gold_ingots,
            ResourceKind::SpiritStones => self.spirit_stones,
            ResourceKind::RechargeSpiritStones => self.recharge_spirit_stones,
            ResourceKind::Exp => self.exp,
        }
    }

    /// Add `amount` to the balance. Exp runs the cultivation curve; returns levels gained.
    fn credit(&mut self, kind: ResourceKind, amount: u64) -> u32 {
        let balance = match kind {
            ResourceKind::Silver => &mut self.silver,
            ResourceKind::GoldIngots => &mut self.gold_ingots,
            ResourceKind::SpiritStones => &mut self.spirit_stones,
            ResourceKind::RechargeSpiritStones => &mut self.recharge_spirit_stones,
            ResourceKind::Exp => {
                let outcome = apply_exp_gain(self.progress(), amount, &LevelCurve::CULTIVATION);
                self.set_progress(outcome.progress);
                return outcome.levels_gained;
            }
        };
        *balance = balance.saturating_add(amount);
        0
    }
}

/// Per-day counters. The store never resets them on its own; see
/// [`GameStore::record_login`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DailyActivity {
    pub login_days: u32,
    pub quests_completed: u32,
    pub bosses_defeated: u32,
    /// Minutes.
    pub cultivation_time: u64,
    /// `YYYY-MM-DD`, empty before the first login.
    pub last_login_date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Server-wide disaster the players fight off together.
    Calamity,
    /// Server-wide blessing window.
    GoldenFate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerEvent {
    pub id: String,
    pub kind: EventKind,
    pub title: String,
    pub description: String,
    /// Milliseconds since the Unix epoch.
    pub ends_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventReward {
    pub id: String,
    pub event_id: String,
    pub resource: ResourceKind,
    pub amount: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerEvents {
    pub active_events: Vec<ServerEvent>,
    pub available_rewards: Vec<EventReward>,
    pub claimed_rewards: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameState {
    pub player: PlayerProfile,
    pub daily_activities: DailyActivity,
    pub events: ServerEvents,
    pub notifications: NotificationLog,
}

/// What a successful reward claim credited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardReceipt {
    pub kind: ResourceKind,
    pub amount: u64,
    pub levels_gained: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginReport {
    pub login_days: u32,
    pub vip_silver: u64,
}

fn reward_message(label: &str, amount: u64, items: &[String], reached_level: Option<u32>) -> String {
    let mut message = format!("Claimed {} {}", amount, label);
    if let Some(level) = reached_level {
        message.push_str(&format!(", broke through to level {}", level));
    }
    if !items.is_empty() {
        message.push_str(&format!(" and items: {}", items.join(", ")));
    }
    message
}

impl SaveData for GameState {
    fn repair(&mut self) {
        let settled = apply_exp_gain(self.player.progress(), 0, &LevelCurve::CULTIVATION);
        self.player.set_progress(settled.progress);
        self.notifications.repair();
    }
}

impl GameState {
    fn claim(&mut self, kind: ResourceKind, amount: u64, items: &[String], now: i64) -> RewardReceipt {
        let levels_gained = self.player.credit(kind, amount);
        let reached = (levels_gained > 0).then_some(self.player.level);
        self.notifications.push(
            reward_message(kind.label(), amount, items, reached),
            Severity::Success,
            now,
        );
        RewardReceipt {
            kind,
            amount,
            levels_gained,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// STORE
// ═══════════════════════════════════════════════════════════════════════

#[derive(Resource)]
pub struct GameStore {
    store: Store<GameState>,
    clock: SharedClock,
}

impl GameStore {
    pub fn open(slot: impl Into<String>, storage: Arc<dyn StorageBackend>, clock: SharedClock) -> Self {
        Self {
            store: Store::open(slot, storage),
            clock,
        }
    }

    pub fn in_memory(clock: SharedClock) -> Self {
        Self {
            store: Store::in_memory("lingxu-game"),
            clock,
        }
    }

    pub fn state(&self) -> &GameState {
        self.store.state()
    }

    pub fn snapshot(&self) -> GameState {
        self.store.snapshot()
    }

    pub fn subscribe(&mut self, listener: impl Fn(&GameState) + Send + Sync + 'static) -> ListenerId {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.store.unsubscribe(id)
    }

    // ── Rewards ─────────────────────────────────────────────────────────

    /// Credit `amount` to `kind` and record a success notification.
    ///
    /// A zero amount changes no balance but still records the notification.
    pub fn claim_reward(
        &mut self,
        kind: ResourceKind,
        amount: u64,
        items: &[String],
    ) -> Result<RewardReceipt, Rejection> {
        let now = self.clock.now_millis();
        let receipt = self.store.mutate(|state| state.claim(kind, amount, items, now));
        if receipt.levels_gained > 0 {
            info!(
                "[Game] +{} exp: {} level(s) gained, now level {}",
                amount,
                receipt.levels_gained,
                self.state().player.level
            );
        }
        Ok(receipt)
    }

    /// String-keyed reward claim, as used by quest and event data.
    ///
    /// An unrecognized `kind` credits nothing but the notification is still
    /// recorded; the call reports [`Rejection::UnknownResource`].
    pub fn claim_reward_named(
        &mut self,
        kind: &str,
        amount: u64,
        items: &[String],
    ) -> Result<RewardReceipt, Rejection> {
        match kind.parse::<ResourceKind>() {
            Ok(kind) => self.claim_reward(kind, amount, items),
            Err(rejection) => {
                let now = self.clock.now_millis();
                let message = reward_message(kind, amount, items, None);
                self.store
                    .mutate(|state| state.notifications.push(message, Severity::Success, now));
                warn!("[Game] Reward of {} '{}' credited nothing: {}", amount, kind, rejection);
                Err(rejection)
            }
        }
    }

    /// Count the quest, then claim every reward line whose amount parses.
    pub fn complete_quest<S: AsRef<str>>(&mut self, quest_id: u32, rewards: &[S]) -> QuestReport {
        self.store
            .mutate(|state| state.daily_activities.quests_completed += 1);

        let mut report = QuestReport {
            quest_id,
            ..Default::default()
        };
        for line in rewards {
            let line = line.as_ref();
            let Some(parsed) = parse_reward_line(line) else {
                debug!("[Game] Quest {}: skipping malformed reward '{}'", quest_id, line);
                report.skipped.push(line.to_string());
                continue;
            };
            match self.claim_reward_named(parsed.kind, parsed.amount, &[]) {
                Ok(receipt) => report.claimed.push(receipt),
                Err(rejection) => report.rejected.push((line.to_string(), rejection)),
            }
        }
        report
    }

    // ── Notifications ───────────────────────────────────────────────────

    pub fn add_notification(&mut self, message: impl Into<String>, severity: Severity) -> u64 {
        let now = self.clock.now_millis();
        let message = message.into();
        self.store
            .mutate(|state| state.notifications.push(message, severity, now))
    }

    // ── Identity ────────────────────────────────────────────────────────

    /// Join `sect` and mark onboarding complete. Calling again switches sect.
    pub fn set_sect(&mut self, sect: SectId) {
        let now = self.clock.now_millis();
        self.store.mutate(|state| {
            state.player.sect = Some(sect);
            state.player.has_completed_tutorial = true;
            state.notifications.push(
                format!("Joined the {}", sect.display_name()),
                Severity::Success,
                now,
            );
        });
        info!("[Game] Player joined {}", sect.id());
    }

    pub fn rename_player(&mut self, name: &str) -> Result<(), Rejection> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Rejection::EmptyName);
        }
        self.store.update(|state| {
            state.player.name = name.to_string();
            Ok(())
        })
    }

    // ── VIP ─────────────────────────────────────────────────────────────

    /// Record a recharge of `amount` currency units.
    pub fn recharge(&mut self, amount: u64) -> Result<VipChange, Rejection> {
        if amount == 0 {
            return Err(Rejection::ZeroAmount);
        }
        let now = self.clock.now_millis();
        let change = self.store.mutate(|state| {
            let player = &mut state.player;
            let previous_level = player.vip_level;
            let stones_credited = amount.saturating_mul(vip::RECHARGE_STONES_PER_UNIT);

            player.total_recharge = player.total_recharge.saturating_add(amount);
            player.recharge_spirit_stones = player.recharge_spirit_stones.saturating_add(stones_credited);
            player.vip_level = vip::vip_level_for(player.total_recharge);

            let mut message = format!(
                "Recharged {}, received {} recharge spirit stones",
                amount, stones_credited
            );
            if player.vip_level > previous_level {
                message.push_str(&format!(". VIP {} unlocked!", player.vip_level));
            }
            state.notifications.push(message, Severity::Success, now);

            VipChange {
                previous_level,
                new_level: state.player.vip_level,
                stones_credited,
            }
        });
        info!(
            "[Game] Recharge {}: VIP {} -> {}",
            amount, change.previous_level, change.new_level
        );
        Ok(change)
    }

    // ── Daily activity ──────────────────────────────────────────────────

    /// Whether the clock's date differs from the last recorded login.
    pub fn is_new_day(&self) -> bool {
        self.state().daily_activities.last_login_date != self.clock.today()
    }

    /// Start a new day: count the login, reset the per-day counters and pay
    /// the VIP daily stipend.
    pub fn record_login(&mut self) -> Result<LoginReport, Rejection> {
        let today = self.clock.today();
        if self.state().daily_activities.last_login_date == today {
            return Err(Rejection::AlreadyLoggedIn(today));
        }
        let now = self.clock.now_millis();
        let report = self.store.mutate(|state| {
            let daily = &mut state.daily_activities;
            daily.login_days = daily.login_days.saturating_add(1);
            daily.quests_completed = 0;
            daily.bosses_defeated = 0;
            daily.cultivation_time = 0;
            daily.last_login_date = today;
            let login_days = daily.login_days;

            let vip_silver = vip::benefits(state.player.vip_level).daily_silver;
            if vip_silver > 0 {
                state.player.silver = state.player.silver.saturating_add(vip_silver);
                state.notifications.push(
                    format!("VIP {} daily stipend: {} silver", state.player.vip_level, vip_silver),
                    Severity::Success,
                    now,
                );
            }
            LoginReport {
                login_days,
                vip_silver,
            }
        });
        Ok(report)
    }

    /// Record `minutes` of cultivation, sped up by the VIP bonus. Returns
    /// today's total.
    pub fn add_cultivation_time(&mut self, minutes: u64) -> Result<u64, Rejection> {
        if minutes == 0 {
            return Err(Rejection::ZeroAmount);
        }
        Ok(self.store.mutate(|state| {
            let speed = u64::from(vip::benefits(state.player.vip_level).cultivation_speed_percent);
            let credited = minutes.saturating_add(minutes.saturating_mul(speed) / 100);
            let daily = &mut state.daily_activities;
            daily.cultivation_time = daily.cultivation_time.saturating_add(credited);
            daily.cultivation_time
        }))
    }

    /// Farm plots granted on top of the base cap by the current VIP level.
    pub fn vip_farm_plots(&self) -> u32 {
        vip::benefits(self.state().player.vip_level).extra_farm_plots
    }

    pub fn record_boss_defeat(&mut self) -> u32 {
        self.store.mutate(|state| {
            state.daily_activities.bosses_defeated += 1;
            state.daily_activities.bosses_defeated
        })
    }

    // ── Server events ───────────────────────────────────────────────────

    /// Announce a calamity or golden-fate event with its claimable rewards.
    pub fn publish_event(&mut self, event: ServerEvent, rewards: Vec<EventReward>) -> Result<(), Rejection> {
        if self.state().events.active_events.iter().any(|e| e.id == event.id) {
            return Err(Rejection::DuplicateEvent(event.id));
        }
        let now = self.clock.now_millis();
        let (prefix, severity) = match event.kind {
            EventKind::Calamity => ("Calamity", Severity::Warning),
            EventKind::GoldenFate => ("Golden Fate", Severity::Info),
        };
        let message = format!("{}: {}", prefix, event.title);
        self.store.mutate(|state| {
            state.events.active_events.push(event);
            state.events.available_rewards.extend(rewards);
            state.notifications.push(message, severity, now);
        });
        Ok(())
    }

    pub fn claim_event_reward(&mut self, reward_id: &str) -> Result<RewardReceipt, Rejection> {
        let events = &self.state().events;
        if events.claimed_rewards.iter().any(|id| id == reward_id) {
            return Err(Rejection::AlreadyClaimed(reward_id.to_string()));
        }
        let Some(reward) = events.available_rewards.iter().find(|r| r.id == reward_id).cloned() else {
            return Err(Rejection::UnknownReward(reward_id.to_string()));
        };
        // Rewards close with their event, whether or not `expire_events` ran.
        let now = self.clock.now_millis();
        let running = events
            .active_events
            .iter()
            .any(|e| e.id == reward.event_id && e.ends_at > now);
        if !running {
            return Err(Rejection::EventEnded(reward.event_id));
        }

        Ok(self.store.mutate(|state| {
            state.events.claimed_rewards.push(reward.id.clone());
            state.claim(reward.resource, reward.amount, &[], now)
        }))
    }

    /// Drop events whose end time has passed, along with their rewards.
    pub fn expire_events(&mut self) -> usize {
        let now = self.clock.now_millis();
        let expired: Vec<String> = self
            .state()
            .events
            .active_events
            .iter()
            .filter(|e| e.ends_at <= now)
            .map(|e| e.id.clone())
            .collect();
        if expired.is_empty() {
            return 0;
        }

        self.store.mutate(|state| {
            state.events.active_events.retain(|e| !expired.contains(&e.id));
            state
                .events
                .available_rewards
                .retain(|r| !expired.contains(&r.event_id));
        });
        info!("[Game] {} server event(s) ended.", expired.len());
        expired.len()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════

pub struct GameStatePlugin;

impl Plugin for GameStatePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GameStore>()
            .add_event::<GameCommandEvent>()
            .add_event::<GameOutcomeEvent>()
            .add_event::<ToastEvent>()
            .init_resource::<ToastCursor>()
            .add_systems(PreStartup, prime_toast_cursor)
            .add_systems(
                Update,
                (handle_game_commands, forward_notification_toasts).chain(),
            );

        info!("[Game] GameStatePlugin registered.");
    }
}

impl FromWorld for GameStore {
    fn from_world(world: &mut World) -> Self {
        let slot = world.resource::<StoreSettings>().slots.game.clone();
        let storage = world.resource::<StorageHandle>().0.clone();
        let clock = world.resource::<GameClock>().0.clone();
        GameStore::open(slot, storage, clock)
    }
}

/// Sent by the presentation layer to run one store operation.
#[derive(Event, Debug, Clone)]
pub struct GameCommandEvent(pub GameCommand);

/// Sent after each [`GameCommandEvent`] with what the store did.
#[derive(Event, Debug, Clone)]
pub struct GameOutcomeEvent {
    pub command: GameCommand,
    pub outcome: Result<GameApplied, Rejection>,
}

pub fn handle_game_commands(
    mut commands: EventReader<GameCommandEvent>,
    mut store: ResMut<GameStore>,
    mut outcomes: EventWriter<GameOutcomeEvent>,
) {
    for ev in commands.read() {
        let outcome = store.apply(ev.0.clone());
        if let Err(reason) = &outcome {
            info!("[Game] {:?} rejected: {}", ev.0, reason);
        }
        outcomes.send(GameOutcomeEvent {
            command: ev.0.clone(),
            outcome,
        });
    }
}

/// Id of the newest notification already shown as a toast.
#[derive(Resource, Debug, Default)]
pub struct ToastCursor {
    last_id: Option<u64>,
}

/// Mark the notifications loaded from the save as seen, so they are not
/// replayed as toasts.
pub fn prime_toast_cursor(store: Res<GameStore>, mut cursor: ResMut<ToastCursor>) {
    cursor.last_id = store.state().notifications.latest().map(|m| m.id);
}

/// Forward notifications recorded since the last frame as [`ToastEvent`]s.
pub fn forward_notification_toasts(
    store: Res<GameStore>,
    mut cursor: ResMut<ToastCursor>,
    mut toasts: EventWriter<ToastEvent>,
) {
    let log = &store.state().notifications;
    if !store.is_changed() {
        return;
    }
    for entry in log.newer_than(cursor.last_id) {
        toasts.send(ToastEvent {
            message: entry.message.clone(),
            severity: entry.severity,
        });
    }
    if let Some(latest) = log.latest() {
        cursor.last_id = Some(latest.id);
    }
}
