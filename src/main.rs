use bevy::log::LogPlugin;
use bevy::prelude::*;
use std::path::Path;

use lingxu::economy::{format_amount, EconomyPlugin, ShopStore};
use lingxu::farming::{FarmStore, FarmingPlugin};
use lingxu::fishing::{FishingPlugin, FishingStore};
use lingxu::game::{GameStatePlugin, GameStore};
use lingxu::save::SavePlugin;
use lingxu::settings::{StoreSettings, DEFAULT_SETTINGS_PATH};

/// Stock at or below this is reported in the status summary.
const LOW_STOCK_THRESHOLD: u32 = 10;

fn main() {
    let settings = StoreSettings::load(Path::new(DEFAULT_SETTINGS_PATH));

    let mut app = App::new();
    app.add_plugins((MinimalPlugins, LogPlugin::default()))
        // Storage and clock first: the store plugins read them in FromWorld.
        .add_plugins(SavePlugin::new(settings))
        .add_plugins((GameStatePlugin, FarmingPlugin, FishingPlugin, EconomyPlugin))
        .add_systems(Startup, (start_session, log_status_summary).chain());

    // One frame: open the stores, run the session start, report.
    app.update();
}

/// Daily login bookkeeping and lazy time-based refreshes.
fn start_session(mut game: ResMut<GameStore>, mut farm: ResMut<FarmStore>) {
    if game.is_new_day() {
        match game.record_login() {
            Ok(report) => info!(
                "[Game] Login day {} (VIP stipend: {} silver)",
                report.login_days, report.vip_silver
            ),
            Err(e) => warn!("[Game] Login not recorded: {}", e),
        }
    }
    game.expire_events();
    farm.update_plot_readiness();
}

fn log_status_summary(
    game: Res<GameStore>,
    farm: Res<FarmStore>,
    fishing: Res<FishingStore>,
    shop: Res<ShopStore>,
) {
    let state = game.state();
    let player = &state.player;
    info!(
        "[Game] {} | level {} ({}/{} exp) | combat power {} | VIP {}",
        player.name, player.level, player.exp, player.max_exp, player.combat_power, player.vip_level
    );
    info!(
        "[Game] silver {} | gold ingots {} | spirit stones {} (+{} recharge)",
        format_amount(player.silver),
        format_amount(player.gold_ingots),
        format_amount(player.spirit_stones),
        format_amount(player.recharge_spirit_stones)
    );
    match player.sect {
        Some(sect) => info!("[Game] Sect: {}", sect.display_name()),
        None => info!("[Game] No sect chosen yet."),
    }
    info!(
        "[Game] {} active event(s), {} unread notification(s)",
        state.events.active_events.len(),
        state.notifications.unread_count
    );

    let farm = farm.state();
    info!(
        "[Farm] {} plot(s), {} ready, {} harvested in total",
        farm.plots.len(),
        farm.ready_plots().count(),
        farm.total_harvested
    );

    let pond = fishing.state();
    info!(
        "[Fishing] level {} | {} coins, {} pearls | {} in inventory, {} in tank | collection {:.0}%",
        pond.level,
        pond.coins,
        pond.pearls,
        pond.inventory.len(),
        pond.fish_tank.len(),
        fishing.collection_progress()
    );

    let low = shop.low_stock(LOW_STOCK_THRESHOLD);
    info!(
        "[Shop] {} listing(s), revenue {} silver, {} low on stock",
        shop.state().items.len(),
        format_amount(shop.total_revenue()),
        low.len()
    );
    for item in low {
        info!("[Shop]   {} x{}", item.name, item.quantity);
    }
}
