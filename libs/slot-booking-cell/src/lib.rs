pub mod error;
pub mod models;
pub mod services;
pub mod view;

pub use error::SlotBookingError;
pub use models::*;
pub use services::booking::{BookingFailure, BookingOutcome, BookingTransaction, FailureKind};
pub use services::calendar::{build_grid, CalendarState, VisibleMonth};
pub use services::clock::{Clock, FixedClock, SystemClock};
pub use services::gateway::{BackendSlotGateway, SlotGateway};
pub use services::poller::{expire_passed_slots, AvailabilityPoller, PollerConfig};
pub use services::selection::SlotSelection;
pub use view::{BookingReport, BookingViewConfig, SlotBookingView};
