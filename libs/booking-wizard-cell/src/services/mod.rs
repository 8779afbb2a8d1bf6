pub mod validation;
pub mod wizard;

pub use validation::PatientFormValidator;
pub use wizard::BookingWizard;
