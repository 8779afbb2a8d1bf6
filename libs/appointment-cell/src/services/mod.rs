pub mod lifecycle;
pub mod store;

pub use lifecycle::{is_legal_transition, AppointmentLifecycleService, StatusAction};
pub use store::{AppointmentStore, InMemoryAppointmentStore, StoreError};
