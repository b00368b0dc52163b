//! Storage abstraction for persisted plans.
//!
//! Keeps the domain layer ignorant of where records actually live.
//! Operations are synchronous; the async surface stays at the HTTP boundary.

use anyhow::Result;
use shared::InstallmentPlan;

pub trait PlanStore: Send + Sync {
    /// Persist a new plan, assigning its id. Returns the stored value.
    fn insert_plan(&self, plan: &InstallmentPlan) -> Result<InstallmentPlan>;

    /// Replace an existing plan. Returns `None` when the id is unknown.
    fn update_plan(&self, plan: &InstallmentPlan) -> Result<Option<InstallmentPlan>>;

    fn get_plan(&self, id: i64) -> Result<Option<InstallmentPlan>>;

    /// Returns true when a plan was found and deleted.
    fn delete_plan(&self, id: i64) -> Result<bool>;

    /// One page of plans ordered by id, plus the total record count.
    fn list_plans(&self, page: u32, per_page: u32) -> Result<(Vec<InstallmentPlan>, u64)>;

    /// Whether another plan of the same course already uses this name.
    fn name_taken(&self, course_id: Option<i64>, name: &str, exclude_id: Option<i64>)
        -> Result<bool>;
}
