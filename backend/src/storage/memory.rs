//! In-memory plan storage.
//!
//! The shipped backend and the test double: plans live in a `BTreeMap`
//! behind an `RwLock`, ids come from a monotonic counter.

use crate::storage::PlanStore;
use anyhow::{anyhow, Result};
use shared::InstallmentPlan;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
pub struct MemoryPlanStore {
    plans: RwLock<BTreeMap<i64, InstallmentPlan>>,
    next_id: AtomicI64,
}

impl MemoryPlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<i64, InstallmentPlan>>> {
        self.plans.read().map_err(|_| anyhow!("plan store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<i64, InstallmentPlan>>> {
        self.plans.write().map_err(|_| anyhow!("plan store lock poisoned"))
    }
}

impl PlanStore for MemoryPlanStore {
    fn insert_plan(&self, plan: &InstallmentPlan) -> Result<InstallmentPlan> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let mut stored = plan.clone();
        stored.id = Some(id);
        self.write()?.insert(id, stored.clone());
        Ok(stored)
    }

    fn update_plan(&self, plan: &InstallmentPlan) -> Result<Option<InstallmentPlan>> {
        let Some(id) = plan.id else {
            return Ok(None);
        };
        let mut plans = self.write()?;
        if !plans.contains_key(&id) {
            return Ok(None);
        }
        plans.insert(id, plan.clone());
        Ok(Some(plan.clone()))
    }

    fn get_plan(&self, id: i64) -> Result<Option<InstallmentPlan>> {
        Ok(self.read()?.get(&id).cloned())
    }

    fn delete_plan(&self, id: i64) -> Result<bool> {
        Ok(self.write()?.remove(&id).is_some())
    }

    fn list_plans(&self, page: u32, per_page: u32) -> Result<(Vec<InstallmentPlan>, u64)> {
        let plans = self.read()?;
        let total = plans.len() as u64;
        let skip = (page.saturating_sub(1) as usize).saturating_mul(per_page as usize);
        let items = plans
            .values()
            .skip(skip)
            .take(per_page as usize)
            .cloned()
            .collect();
        Ok((items, total))
    }

    fn name_taken(
        &self,
        course_id: Option<i64>,
        name: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool> {
        let name = name.trim();
        Ok(self.read()?.values().any(|plan| {
            plan.id != exclude_id && plan.course_id == course_id && plan.name.trim() == name
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named_plan(course_id: i64, name: &str) -> InstallmentPlan {
        let mut plan = InstallmentPlan::draft(Some(course_id));
        plan.name = name.to_string();
        plan
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let store = MemoryPlanStore::new();
        let first = store.insert_plan(&named_plan(1, "a")).unwrap();
        let second = store.insert_plan(&named_plan(1, "b")).unwrap();

        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
        assert_eq!(store.get_plan(1).unwrap().unwrap().name, "a");
    }

    #[test]
    fn test_update_unknown_plan_is_none() {
        let store = MemoryPlanStore::new();
        let mut plan = named_plan(1, "a");
        plan.id = Some(99);
        assert!(store.update_plan(&plan).unwrap().is_none());
    }

    #[test]
    fn test_delete() {
        let store = MemoryPlanStore::new();
        let stored = store.insert_plan(&named_plan(1, "a")).unwrap();
        assert!(store.delete_plan(stored.id.unwrap()).unwrap());
        assert!(!store.delete_plan(stored.id.unwrap()).unwrap());
    }

    #[test]
    fn test_list_paginates_in_id_order() {
        let store = MemoryPlanStore::new();
        for i in 0..5 {
            store.insert_plan(&named_plan(1, &format!("plan {i}"))).unwrap();
        }

        let (items, total) = store.list_plans(1, 2).unwrap();
        assert_eq!(total, 5);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "plan 0");

        let (items, _) = store.list_plans(3, 2).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "plan 4");

        let (items, _) = store.list_plans(4, 2).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_name_taken_is_scoped_to_the_course() {
        let store = MemoryPlanStore::new();
        let stored = store.insert_plan(&named_plan(1, "Plano A")).unwrap();

        assert!(store.name_taken(Some(1), "Plano A", None).unwrap());
        assert!(store.name_taken(Some(1), " Plano A ", None).unwrap());
        assert!(!store.name_taken(Some(2), "Plano A", None).unwrap());
        // the plan itself is excluded when updating
        assert!(!store.name_taken(Some(1), "Plano A", stored.id).unwrap());
    }
}
