//! Persistence gateway for plans.
//!
//! [`PlanGateway`] is the boundary the editing session submits through;
//! [`PlanService`] implements it over a [`PlanStore`] backend: decode the
//! wire payload, validate it into a field-error map, stamp the update
//! timestamp, persist.

use crate::domain::money::MoneyCodec;
use crate::storage::PlanStore;
use crate::wire::{self, WirePair};
use chrono::Utc;
use shared::{FieldErrors, InstallmentPlan, PlanListRequest, PlanPage, MAX_INSTALLMENTS};
use thiserror::Error;
use tracing::{info, warn};

/// Errors surfaced by the persistence gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// One or more fields were rejected; keyed by wire field name so the
    /// messages land beside the right inputs.
    #[error("validação falhou: {0}")]
    Validation(FieldErrors),
    #[error("tabela de parcelamento {0} não encontrada")]
    NotFound(i64),
    /// Storage or transport failure; the operator may retry.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// The persistence boundary: exactly the five operations the editing
/// session and the REST surface need.
pub trait PlanGateway: Send + Sync {
    fn create(&self, payload: &[WirePair]) -> Result<InstallmentPlan, GatewayError>;
    fn update(&self, id: i64, payload: &[WirePair]) -> Result<InstallmentPlan, GatewayError>;
    fn get_by_id(&self, id: i64) -> Result<InstallmentPlan, GatewayError>;
    fn delete(&self, id: i64) -> Result<(), GatewayError>;
    fn list(&self, request: &PlanListRequest) -> Result<PlanPage, GatewayError>;
}

pub struct PlanService<S: PlanStore> {
    store: S,
    codec: MoneyCodec,
}

impl<S: PlanStore> PlanService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            codec: MoneyCodec::default(),
        }
    }

    pub fn with_codec(store: S, codec: MoneyCodec) -> Self {
        Self { store, codec }
    }

    fn validate(&self, plan: &InstallmentPlan, exclude_id: Option<i64>) -> Result<(), GatewayError> {
        let mut errors = FieldErrors::default();

        if plan.course_id.is_none() {
            errors.push("id_curso", "O campo curso é obrigatório");
        }
        if plan.name.trim().is_empty() {
            errors.push("nome", "O campo nome é obrigatório");
        } else if self
            .store
            .name_taken(plan.course_id, &plan.name, exclude_id)
            .map_err(GatewayError::Internal)?
        {
            errors.push("nome", "Já existe uma tabela com este nome para o curso");
        }
        for (slot, option) in &plan.options {
            if option.installment_count == 0 || option.installment_count > MAX_INSTALLMENTS {
                errors.push(
                    &format!("parcelas[{slot}][parcela]"),
                    format!("O número de parcelas deve estar entre 1 e {MAX_INSTALLMENTS}"),
                );
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            warn!(fields = errors.fields.len(), "plan rejected by validation");
            Err(GatewayError::Validation(errors))
        }
    }

    fn timestamp() -> String {
        Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

impl<S: PlanStore> PlanGateway for PlanService<S> {
    fn create(&self, payload: &[WirePair]) -> Result<InstallmentPlan, GatewayError> {
        let mut plan = wire::decode(payload, &self.codec);
        plan.id = None;
        self.validate(&plan, None)?;
        plan.updated_at = Some(Self::timestamp());

        let stored = self.store.insert_plan(&plan)?;
        info!(id = ?stored.id, name = %stored.name, "plan created");
        Ok(stored)
    }

    fn update(&self, id: i64, payload: &[WirePair]) -> Result<InstallmentPlan, GatewayError> {
        let mut plan = wire::decode(payload, &self.codec);
        plan.id = Some(id);
        self.validate(&plan, Some(id))?;
        plan.updated_at = Some(Self::timestamp());

        match self.store.update_plan(&plan)? {
            Some(stored) => {
                info!(id, "plan updated");
                Ok(stored)
            }
            None => Err(GatewayError::NotFound(id)),
        }
    }

    fn get_by_id(&self, id: i64) -> Result<InstallmentPlan, GatewayError> {
        self.store
            .get_plan(id)?
            .ok_or(GatewayError::NotFound(id))
    }

    fn delete(&self, id: i64) -> Result<(), GatewayError> {
        if self.store.delete_plan(id)? {
            info!(id, "plan deleted");
            Ok(())
        } else {
            Err(GatewayError::NotFound(id))
        }
    }

    fn list(&self, request: &PlanListRequest) -> Result<PlanPage, GatewayError> {
        let page = request.page();
        let per_page = request.per_page();
        let (plans, total) = self.store.list_plans(page, per_page)?;
        let total_pages = (total as u32).div_ceil(per_page);

        Ok(PlanPage {
            plans,
            page,
            per_page,
            total,
            total_pages,
        })
    }
}
