//! Editing session for a single plan.
//!
//! The legacy screen kept the plan as a basket of loose form variables
//! mutated from many handlers. Here the whole edit is one `InstallmentPlan`
//! value advanced by pure transitions: every operator action becomes a
//! [`PlanEvent`], [`apply`] returns the successor value, and the session
//! wraps the current value together with the submit gate and whatever field
//! errors the persistence gateway last returned.

use crate::domain::derivation::per_installment;
use crate::domain::discount;
use crate::domain::money::MoneyCodec;
use crate::domain::plan_service::{GatewayError, PlanGateway};
use crate::domain::slots;
use crate::wire;
use shared::{ActiveFlag, FieldErrors, InstallmentPlan, ParcelOption, TermEntry, DEFAULT_INSTALLMENTS};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;
use tracing::info;

/// One operator edit.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanEvent {
    SetName(String),
    SetCourse(Option<i64>),
    /// Total price edit; accepts masked or raw text and re-derives every
    /// row's value.
    SetTotal(String),
    SetActive(ActiveFlag),
    SetNote(String),
    SetLegacyCourseType(String),
    SetClassScope(Vec<i64>),
    /// Adds a row at the lowest free slot.
    AddOption,
    RemoveOption(u32),
    /// Changes one row's payment count and re-derives only that row.
    SetInstallmentCount { slot: u32, count: u32 },
    SetOptionValue { slot: u32, value: String },
    SetOptionDiscount { slot: u32, discount: String },
    SetOptionEntryType { slot: u32, entry_type: String },
    SetOptionEntryValue { slot: u32, entry_value: String },
    SetOptionInterest { slot: u32, interest: String },
    AddTerm,
    RemoveTerm(usize),
    SetTermLabel { position: usize, label: String },
    SetTermText { position: usize, text: String },
}

/// Applies one transition, returning the successor plan value. Events aimed
/// at a slot or term position that no longer exists change nothing.
pub fn apply(plan: &InstallmentPlan, event: PlanEvent, codec: &MoneyCodec) -> InstallmentPlan {
    let mut next = plan.clone();
    match event {
        PlanEvent::SetName(name) => next.name = name,
        PlanEvent::SetCourse(course_id) => next.course_id = course_id,
        PlanEvent::SetTotal(total) => {
            next.total_value = codec.remove_mask(&total);
            // every row follows the new total; explicit edits are overwritten
            let total = next.total_value.clone();
            for option in next.options.values_mut() {
                option.value = per_installment(codec, &total, option.installment_count);
            }
        }
        PlanEvent::SetActive(active) => next.active = active,
        PlanEvent::SetNote(note) => next.note = note,
        PlanEvent::SetLegacyCourseType(legacy_course_type) => {
            next.legacy_course_type = legacy_course_type;
        }
        PlanEvent::SetClassScope(class_scope) => next.class_scope = class_scope,
        PlanEvent::AddOption => {
            let slot = slots::next_available(&next.options);
            let mut option = ParcelOption::with_count(DEFAULT_INSTALLMENTS);
            option.value = per_installment(codec, &next.total_value, option.installment_count);
            next.options.insert(slot, option);
        }
        PlanEvent::RemoveOption(slot) => {
            next.options.remove(&slot);
        }
        PlanEvent::SetInstallmentCount { slot, count } => {
            let total = next.total_value.clone();
            if let Some(option) = next.options.get_mut(&slot) {
                option.installment_count = count;
                option.value = per_installment(codec, &total, count);
            }
        }
        PlanEvent::SetOptionValue { slot, value } => {
            if let Some(option) = next.options.get_mut(&slot) {
                option.value = canonical_or_none(codec, &value);
            }
        }
        PlanEvent::SetOptionDiscount { slot, discount } => {
            if let Some(option) = next.options.get_mut(&slot) {
                option.discount = canonical_or_none(codec, &discount);
            }
        }
        PlanEvent::SetOptionEntryType { slot, entry_type } => {
            if let Some(option) = next.options.get_mut(&slot) {
                option.entry_type = entry_type;
            }
        }
        PlanEvent::SetOptionEntryValue { slot, entry_value } => {
            if let Some(option) = next.options.get_mut(&slot) {
                option.entry_value = entry_value;
            }
        }
        PlanEvent::SetOptionInterest { slot, interest } => {
            if let Some(option) = next.options.get_mut(&slot) {
                option.interest = interest;
            }
        }
        PlanEvent::AddTerm => next.extra_terms.push(TermEntry::default()),
        PlanEvent::RemoveTerm(position) => {
            if position < next.extra_terms.len() {
                next.extra_terms.remove(position);
            }
        }
        PlanEvent::SetTermLabel { position, label } => {
            if let Some(term) = next.extra_terms.get_mut(position) {
                term.label = label;
            }
        }
        PlanEvent::SetTermText { position, text } => {
            if let Some(term) = next.extra_terms.get_mut(position) {
                term.text = text;
            }
        }
    }
    next
}

fn canonical_or_none(codec: &MoneyCodec, value: &str) -> Option<String> {
    let canonical = codec.remove_mask(value);
    (!canonical.is_empty()).then_some(canonical)
}

/// Outcome of a save request.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// The gateway accepted the plan; the session now tracks the persisted
    /// value (id and timestamp included).
    Saved,
    /// The discount ceiling is violated on the listed slots; nothing was
    /// sent to the gateway.
    BlockedByDiscount(BTreeSet<u32>),
    /// The gateway rejected one or more fields; the edits are kept.
    Rejected(FieldErrors),
}

/// A single operator's edit of one plan, from open to save or discard.
#[derive(Debug, Clone)]
pub struct PlanSession {
    plan: InstallmentPlan,
    codec: MoneyCodec,
    field_errors: FieldErrors,
}

impl PlanSession {
    /// Opens the create screen: a fresh draft with one default row.
    pub fn draft(course_id: Option<i64>) -> Self {
        Self::from_plan(InstallmentPlan::draft(course_id))
    }

    /// Opens the edit screen over an already persisted plan.
    pub fn from_plan(plan: InstallmentPlan) -> Self {
        Self {
            plan,
            codec: MoneyCodec::default(),
            field_errors: FieldErrors::default(),
        }
    }

    pub fn with_codec(mut self, codec: MoneyCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn plan(&self) -> &InstallmentPlan {
        &self.plan
    }

    pub fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    pub fn dispatch(&mut self, event: PlanEvent) {
        self.plan = apply(&self.plan, event, &self.codec);
    }

    /// Slot values the "Opção" selector offers right now.
    pub fn slot_range(&self) -> RangeInclusive<u32> {
        slots::slot_range(&self.plan.options)
    }

    /// Rows currently violating the discount ceiling.
    pub fn flagged_slots(&self) -> BTreeSet<u32> {
        discount::invalid_indices(&self.codec, &self.plan.options, &self.plan.total_value)
    }

    /// Warning to show beside a row, when it is flagged.
    pub fn row_warning(&self, slot: u32) -> Option<&'static str> {
        self.flagged_slots()
            .contains(&slot)
            .then_some(discount::DISCOUNT_WARNING)
    }

    pub fn can_submit(&self) -> bool {
        !discount::has_invalid(&self.codec, &self.plan.options, &self.plan.total_value)
    }

    /// Masked rendering of a row's value for display.
    pub fn display_value(&self, slot: u32) -> String {
        let Some(option) = self.plan.options.get(&slot) else {
            return String::new();
        };
        match &option.value {
            Some(value) => self.codec.format(value),
            None => String::new(),
        }
    }

    /// "Salvar e continuar": persist and keep editing the saved plan.
    pub fn save_and_continue(&mut self, gateway: &impl PlanGateway) -> anyhow::Result<SaveOutcome> {
        self.save(gateway)
    }

    /// "Salvar e finalizar": persist before leaving the screen.
    pub fn save_and_finish(&mut self, gateway: &impl PlanGateway) -> anyhow::Result<SaveOutcome> {
        self.save(gateway)
    }

    fn save(&mut self, gateway: &impl PlanGateway) -> anyhow::Result<SaveOutcome> {
        let flagged = self.flagged_slots();
        if !flagged.is_empty() {
            info!(rows = flagged.len(), "save refused, discount ceiling violated");
            return Ok(SaveOutcome::BlockedByDiscount(flagged));
        }

        let payload = wire::encode(&self.plan, &self.codec);
        let result = match self.plan.id {
            Some(id) => gateway.update(id, &payload),
            None => gateway.create(&payload),
        };

        match result {
            Ok(saved) => {
                self.field_errors = FieldErrors::default();
                self.plan = saved;
                Ok(SaveOutcome::Saved)
            }
            Err(GatewayError::Validation(errors)) => {
                // the operator's edits stay in place next to the messages
                self.field_errors = errors.clone();
                Ok(SaveOutcome::Rejected(errors))
            }
            // transport and storage failures: keep the plan, let the
            // operator retry
            Err(error) => Err(error.into()),
        }
    }
}
