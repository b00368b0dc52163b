//! Domain logic for payment plans: money masking, value derivation, slot
//! allocation, the discount invariant, the editing session, and the
//! persistence gateway.

pub mod derivation;
pub mod discount;
pub mod money;
pub mod plan_service;
pub mod session;
pub mod slots;

pub use money::MoneyCodec;
pub use plan_service::{GatewayError, PlanGateway, PlanService};
pub use session::{PlanEvent, PlanSession, SaveOutcome};
