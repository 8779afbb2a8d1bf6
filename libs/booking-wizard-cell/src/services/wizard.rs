// libs/booking-wizard-cell/src/services/wizard.rs
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, info, instrument, warn};

use appointment_cell::{
    Appointment, AppointmentKind, AppointmentStore, BookingSource, ClinicalReason,
};
use doctor_cell::{Provider, SlotGenerator, TimeSlot};
use shared_config::InitialBookingStatus;
use shared_models::{AppointmentMode, AppointmentStatus, ExistingAppointment, ValidationErrors};
use shared_utils::Clock;

use crate::models::{
    BookingDraft, DraftField, PatientForm, WizardCapabilities, WizardError, WizardStep,
};
use crate::services::validation::PatientFormValidator;

/// Multi-step booking flow. One wizard exclusively owns one draft; dropping
/// the wizard abandons the draft.
pub struct BookingWizard {
    step: WizardStep,
    draft: BookingDraft,
    capabilities: WizardCapabilities,
    slots: Vec<TimeSlot>,
    submitted: Option<Appointment>,
    generator: Arc<SlotGenerator>,
    validator: PatientFormValidator,
    clock: Arc<dyn Clock>,
}

impl BookingWizard {
    pub fn new(
        capabilities: WizardCapabilities,
        generator: Arc<SlotGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let draft = BookingDraft {
            doctor: capabilities.pinned_provider().cloned(),
            ..BookingDraft::default()
        };

        Self {
            step: WizardStep::Source,
            draft,
            capabilities,
            slots: Vec::new(),
            submitted: None,
            generator,
            validator: PatientFormValidator::new(),
            clock,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    pub fn capabilities(&self) -> &WizardCapabilities {
        &self.capabilities
    }

    /// Slots computed by the last [`select_date`](Self::select_date).
    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn submitted(&self) -> Option<&Appointment> {
        self.submitted.as_ref()
    }

    pub fn choose_source(&mut self, source: BookingSource) -> Result<(), WizardError> {
        self.require_step(WizardStep::Source, "choose_source")?;
        self.draft.source = Some(source);
        self.advance();
        Ok(())
    }

    pub fn choose_appointment_type(&mut self, kind: AppointmentKind) -> Result<(), WizardError> {
        self.require_step(WizardStep::ApptType, "choose_appointment_type")?;
        self.draft.appointment_type = Some(kind);
        self.advance();
        Ok(())
    }

    pub fn choose_clinical_reason(&mut self, reason: ClinicalReason) -> Result<(), WizardError> {
        self.require_step(WizardStep::ClinicalReason, "choose_clinical_reason")?;
        self.draft.clinical_reason = Some(reason);
        self.advance();
        Ok(())
    }

    pub fn choose_doctor(&mut self, provider: Provider) -> Result<(), WizardError> {
        self.require_step(WizardStep::Doctor, "choose_doctor")?;

        if let Some(pinned) = self.capabilities.pinned_provider() {
            if !pinned.same_provider(&provider) {
                warn!(
                    "Refusing doctor {:?}, wizard is pinned to {:?}",
                    provider.doctor_id(),
                    pinned.doctor_id()
                );
                return Err(WizardError::DoctorPinned);
            }
        }

        self.draft.doctor = Some(provider);
        self.advance();
        Ok(())
    }

    /// Compute and cache the slots for `date`. Any previously picked time
    /// is cleared.
    #[instrument(skip(self, existing_appointments))]
    pub fn select_date(
        &mut self,
        date: NaiveDate,
        mode: AppointmentMode,
        existing_appointments: &[ExistingAppointment],
    ) -> Result<&[TimeSlot], WizardError> {
        self.require_step(WizardStep::Calendar, "select_date")?;

        let provider = self
            .draft
            .doctor
            .as_ref()
            .ok_or_else(|| ValidationErrors::single("doctor", "Please select a doctor"))?;

        let today = self.clock.today();
        let range = self.generator.buffer().booking_range(provider, today);
        if !range.contains(date) {
            debug!("Rejected date {} outside {} ..= {}", date, range.min, range.max);
            return Err(WizardError::OutsideBookingWindow {
                date,
                min: range.min,
                max: range.max,
            });
        }

        let slots = self
            .generator
            .generate_slots(provider, date, today, existing_appointments, mode);

        self.draft.date = Some(date);
        self.draft.mode = Some(mode);
        self.draft.time_slot = None;
        self.slots = slots;

        debug!("Cached {} slots for {} ({})", self.slots.len(), date, mode);
        Ok(&self.slots)
    }

    pub fn select_slot(&mut self, time: NaiveTime) -> Result<(), WizardError> {
        self.require_step(WizardStep::Calendar, "select_slot")?;

        let date = self
            .draft
            .date
            .ok_or_else(|| ValidationErrors::single("date", "Please select a date"))?;

        let slot = self
            .slots
            .iter()
            .find(|slot| slot.time == time)
            .ok_or_else(|| WizardError::SlotUnavailable(format!("no slot at {} on {}", time, date)))?;

        if slot.full {
            return Err(WizardError::SlotUnavailable(format!(
                "{} on {} is fully booked",
                slot.label, date
            )));
        }
        if !slot.is_selectable(date, self.clock.now()) {
            return Err(WizardError::SlotUnavailable(format!(
                "{} on {} has already started",
                slot.label, date
            )));
        }

        self.draft.time_slot = Some(slot.clone());
        self.advance();
        Ok(())
    }

    /// Move forward when the current step's fields are already filled, as
    /// happens for a pinned doctor after going back.
    pub fn next(&mut self) -> Result<WizardStep, WizardError> {
        match self.step {
            WizardStep::Submitted => return Err(WizardError::AlreadySubmitted),
            WizardStep::PatientForm => {
                return Err(WizardError::WrongStep {
                    operation: "next",
                    step: self.step,
                })
            }
            _ => {}
        }

        let mut missing = ValidationErrors::new();
        for field in self.step.owned_fields() {
            if !field.is_optional() && !self.draft.is_set(*field) {
                missing.add(field.key(), "This field is required");
            }
        }
        missing.into_result()?;

        self.advance();
        Ok(self.step)
    }

    /// Return to the previous step, clearing what it and every later step
    /// had filled in. A pinned doctor is kept.
    pub fn back(&mut self) -> Result<WizardStep, WizardError> {
        if self.step == WizardStep::Submitted {
            return Err(WizardError::AlreadySubmitted);
        }
        let previous = self.step.previous().ok_or(WizardError::NoPreviousStep)?;

        for step in previous.and_later() {
            for field in step.owned_fields() {
                if *field == DraftField::Doctor && self.capabilities.is_pinned() {
                    continue;
                }
                self.draft.clear(*field);
            }
        }
        if previous <= WizardStep::Calendar {
            self.slots.clear();
        }

        info!("Booking wizard moved back from {} to {}", self.step, previous);
        self.step = previous;
        Ok(previous)
    }

    pub fn fill_patient_form(&mut self, form: PatientForm) -> Result<(), WizardError> {
        self.require_step(WizardStep::PatientForm, "fill_patient_form")?;

        self.validator
            .validate_form(&form, self.draft.source)
            .into_result()?;

        self.draft.patient = Some(form.patient);
        self.draft.referral_name = form.referral_name.filter(|name| !name.trim().is_empty());
        self.draft.notes = form.notes.filter(|notes| !notes.trim().is_empty());
        Ok(())
    }

    /// Revalidate the whole draft and persist it. On failure the wizard
    /// stays on the patient form with the draft untouched.
    #[instrument(skip(self, store))]
    pub async fn submit(
        &mut self,
        store: &dyn AppointmentStore,
        initial_status: InitialBookingStatus,
    ) -> Result<Appointment, WizardError> {
        self.require_step(WizardStep::PatientForm, "submit")?;

        let mut errors = self.validator.validate_draft(&self.draft);
        let now = self.clock.now();
        if let (Some(date), Some(slot)) = (self.draft.date, &self.draft.time_slot) {
            if slot.starts_at(date) <= now {
                errors.add("timeSlot", "The selected time has already passed");
            }
        }
        errors.into_result()?;

        let booking = self.draft.to_booking()?;
        let appointment = match store
            .insert(booking, AppointmentStatus::from(initial_status), now)
            .await
        {
            Ok(appointment) => appointment,
            Err(err) => {
                warn!("Booking submission failed: {}", err);
                return Err(err.into());
            }
        };

        info!(
            "Booking {} submitted with status {}",
            appointment.id, appointment.status
        );
        self.step = WizardStep::Submitted;
        self.submitted = Some(appointment.clone());
        Ok(appointment)
    }

    fn require_step(&self, expected: WizardStep, operation: &'static str) -> Result<(), WizardError> {
        if self.step == WizardStep::Submitted {
            return Err(WizardError::AlreadySubmitted);
        }
        if self.step != expected {
            return Err(WizardError::WrongStep {
                operation,
                step: self.step,
            });
        }
        Ok(())
    }

    fn advance(&mut self) {
        if let Some(next) = self.step.next() {
            info!("Booking wizard moved from {} to {}", self.step, next);
            self.step = next;
        }
    }
}
