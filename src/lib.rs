//! Lingxu library crate — the state layer of a cultivation idle game.
//!
//! Each store owns one persisted aggregate and exposes named operations;
//! the Bevy plugins wrap them as resources driven by command events. The
//! binary (`main.rs`) is a headless host, and `tests/` drive the same
//! plugins under `MinimalPlugins`.

pub mod shared;
pub mod notifications;
pub mod progression;
pub mod store;
pub mod settings;
pub mod save;
pub mod game;
pub mod farming;
pub mod fishing;
pub mod economy;
