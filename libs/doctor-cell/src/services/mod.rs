pub mod availability;
pub mod buffer;
pub mod slots;

pub use availability::AvailabilityService;
pub use buffer::{is_within_booking_window, BufferWindowService};
pub use slots::SlotGenerator;
