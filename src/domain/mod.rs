//! Venue-agnostic domain types.
//!
//! Everything here is plain data plus the invariants that belong to it:
//! the event-time window bound, the one-way stop ratchet and the
//! instrument's price and volume grids.

pub mod event;
pub mod id;
pub mod instrument;
pub mod market;
pub mod money;
pub mod order;
pub mod position;
pub mod side;
pub mod window;

pub use event::PositionEvent;
pub use id::{EngineId, OrderRef, ParticipantId, Ticket};
pub use instrument::Instrument;
pub use market::{Bar, Quote};
pub use money::{Pnl, Price, Volume};
pub use order::{LimitOrderRequest, PendingOrder, TradeMode, VenueOrder};
pub use position::{FillQuality, Position};
pub use side::Side;
pub use window::ClusterWindow;
