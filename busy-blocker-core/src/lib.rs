//! Core types and reconciliation logic for busy-blocker.
//!
//! This crate is provider-agnostic:
//! - `event` holds the calendar event model shared with gateways
//! - `gateway` defines the narrow list/insert/delete capability the
//!   reconciler needs, with `memory` providing an in-process implementation
//! - `reconcile` computes and applies the creates and deletes that make the
//!   destination calendar mirror the source calendar's busy blocks

pub mod error;
pub mod event;
pub mod gateway;
pub mod memory;
pub mod placeholder;
pub mod reconcile;
pub mod settings;
pub mod window;

pub use error::{ConfigError, GatewayError, Operation, SyncError, SyncResult};
pub use event::{CalendarEvent, EventSource, EventTime, PrivateProperties};
pub use gateway::{CalendarGateway, ListQuery};
pub use memory::MemoryGateway;
pub use reconcile::{Reconciler, SyncPlan, SyncReport};
pub use settings::{PlaceholderStyle, SyncSettings, TagKeys};
pub use window::SyncWindow;
