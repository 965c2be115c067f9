//! HUD sync kernel: the state synchronization and reconciliation engine
//! behind the in-game HUD overlay.
//!
//! Leaves first: `envelope` decodes host messages, `reducer` merges them,
//! `effects`, `theme`, `kinematics` and `visibility` derive the rest, and
//! `engine` ties them together behind an explicit clock. `runtime`, `mqtt`
//! and `http` are the async shell around it.

pub mod bridge;
pub mod config;
pub mod effects;
pub mod engine;
pub mod envelope;
pub mod health;
pub mod http;
pub mod kinematics;
pub mod legacy;
pub mod models;
pub mod mqtt;
pub mod reducer;
pub mod runtime;
pub mod scheduler;
pub mod state;
pub mod style;
pub mod theme;
pub mod view;
pub mod visibility;
pub mod weapon;

pub use engine::{DashboardAction, Engine, Input, Notice, Outbox};
pub use envelope::{decode, decode_bytes, Command, Envelope};
pub use models::HudSnapshot;
