// SPDX-License-Identifier: Apache-2.0
//! Tick dispatcher, command handlers, combat resolver, registration, and
//! sector projection. This crate owns the only code that mutates a
//! [`sim_model::World`]; everything else treats it as read-only.

mod combat;
mod commands;
mod projection;
mod registration;
mod tick;

pub use commands::{AttackTarget, Command, CommandError, QueueKind};
pub use projection::{sector_view, NpcPresence, SectorProjection};
pub use registration::{login, register, AuthError};
pub use tick::{Engine, TickOutcome};
