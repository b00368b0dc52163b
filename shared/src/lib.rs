use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Maximum number of payments a single option row may represent.
pub const MAX_INSTALLMENTS: u32 = 12;

/// Installment count given to the default row of a freshly created plan.
pub const DEFAULT_INSTALLMENTS: u32 = 6;

/// Activation flag carried on the wire as `"s"` / `"n"`, with the legacy
/// `"y"` spelling some older records still use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActiveFlag {
    Active,
    Inactive,
    /// Written as `"y"` by a prior version; behaves as active and re-encodes
    /// as `"y"` so old records round-trip unchanged.
    LegacyActive,
}

impl ActiveFlag {
    pub fn as_wire(&self) -> &'static str {
        match self {
            ActiveFlag::Active => "s",
            ActiveFlag::Inactive => "n",
            ActiveFlag::LegacyActive => "y",
        }
    }

    /// Unknown values decode as active, matching how the legacy screens
    /// treated anything that was not an explicit `"n"`.
    pub fn from_wire(value: &str) -> Self {
        match value {
            "n" => ActiveFlag::Inactive,
            "y" => ActiveFlag::LegacyActive,
            _ => ActiveFlag::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, ActiveFlag::Inactive)
    }
}

impl Default for ActiveFlag {
    fn default() -> Self {
        ActiveFlag::Active
    }
}

/// One row of a payment plan ("Opção").
///
/// The 1-based slot index lives in the plan's option map key, so two rows can
/// never share a slot. `entry_type`, `entry_value` and `interest` are carried
/// through for the contract layer and never interpreted here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParcelOption {
    /// Number of payments, 1 to [`MAX_INSTALLMENTS`].
    pub installment_count: u32,
    pub entry_type: String,
    pub entry_value: String,
    pub interest: String,
    /// Canonical decimal value of each payment; `None` means "derive from the
    /// plan total".
    pub value: Option<String>,
    /// Canonical decimal discount; must never exceed the row's effective value.
    pub discount: Option<String>,
}

impl ParcelOption {
    pub fn with_count(installment_count: u32) -> Self {
        Self {
            installment_count,
            ..Self::default()
        }
    }
}

/// Free-form promotional or contract clause attached to a plan
/// (the `tx2` block of the wire format).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TermEntry {
    pub label: String,
    pub text: String,
}

/// A named payment-plan template ("Tabela de Parcelamento"), attachable to a
/// course and optionally scoped to a subset of its class offerings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstallmentPlan {
    /// Present only once the plan has been persisted.
    pub id: Option<i64>,
    /// Owning course; required before the plan can be saved.
    pub course_id: Option<i64>,
    pub name: String,
    /// Canonical decimal base price; empty for discount-only plans.
    pub total_value: String,
    pub active: ActiveFlag,
    /// Free-text annotation, stored as rich content.
    pub note: String,
    /// Opaque carry-through from a prior course categorization scheme.
    pub legacy_course_type: String,
    /// Class offerings the plan applies to. Empty means "all classes of the
    /// course", which is a meaningful value and must survive round-trips.
    pub class_scope: Vec<i64>,
    /// Option rows keyed by their 1-based "Opção" slot.
    pub options: BTreeMap<u32, ParcelOption>,
    pub extra_terms: Vec<TermEntry>,
    /// Server-stamped on every save (`atualizado` on the wire).
    pub updated_at: Option<String>,
}

impl InstallmentPlan {
    /// A fresh plan as the create screen opens it: one default row at slot 1.
    pub fn draft(course_id: Option<i64>) -> Self {
        let mut plan = Self {
            course_id,
            ..Self::default()
        };
        plan.options
            .insert(1, ParcelOption::with_count(DEFAULT_INSTALLMENTS));
        plan
    }

    /// Highest slot index currently in use, 0 when the plan has no rows.
    pub fn max_used_slot(&self) -> u32 {
        self.options.keys().next_back().copied().unwrap_or(0)
    }

    pub fn applies_to_all_classes(&self) -> bool {
        self.class_scope.is_empty()
    }
}

/// Query parameters of the paginated plan listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanListRequest {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PlanListRequest {
    pub const DEFAULT_PER_PAGE: u32 = 15;
    pub const MAX_PER_PAGE: u32 = 100;

    /// Requested page, 1-based; zero and absent both mean the first page.
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Requested page size, clamped to 1..=[`Self::MAX_PER_PAGE`].
    pub fn per_page(&self) -> u32 {
        self.per_page
            .unwrap_or(Self::DEFAULT_PER_PAGE)
            .clamp(1, Self::MAX_PER_PAGE)
    }
}

/// One page of persisted plans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanPage {
    pub plans: Vec<InstallmentPlan>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u32,
}

/// Field-level validation errors, keyed by wire field name
/// (`nome`, `id_curso`, `parcelas[3][parcela]`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldErrors {
    pub fields: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// First message for a field, the one shown beside its input.
    pub fn first_message(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    /// Combined summary: the first message of every field, in field order.
    pub fn summary(&self) -> String {
        self.fields
            .values()
            .filter_map(|messages| messages.first())
            .cloned()
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_flag_wire_round_trip() {
        for flag in [
            ActiveFlag::Active,
            ActiveFlag::Inactive,
            ActiveFlag::LegacyActive,
        ] {
            assert_eq!(ActiveFlag::from_wire(flag.as_wire()), flag);
        }
    }

    #[test]
    fn test_active_flag_unknown_decodes_as_active() {
        assert_eq!(ActiveFlag::from_wire(""), ActiveFlag::Active);
        assert_eq!(ActiveFlag::from_wire("1"), ActiveFlag::Active);
        assert_eq!(ActiveFlag::from_wire("sim"), ActiveFlag::Active);
    }

    #[test]
    fn test_legacy_active_counts_as_active() {
        assert!(ActiveFlag::Active.is_active());
        assert!(ActiveFlag::LegacyActive.is_active());
        assert!(!ActiveFlag::Inactive.is_active());
    }

    #[test]
    fn test_draft_has_one_default_row() {
        let plan = InstallmentPlan::draft(Some(42));

        assert_eq!(plan.course_id, Some(42));
        assert_eq!(plan.options.len(), 1);
        assert_eq!(
            plan.options.get(&1).unwrap().installment_count,
            DEFAULT_INSTALLMENTS
        );
        assert!(plan.id.is_none());
        assert!(plan.applies_to_all_classes());
    }

    #[test]
    fn test_max_used_slot() {
        let mut plan = InstallmentPlan::draft(None);
        assert_eq!(plan.max_used_slot(), 1);

        plan.options.insert(7, ParcelOption::with_count(3));
        assert_eq!(plan.max_used_slot(), 7);

        plan.options.clear();
        assert_eq!(plan.max_used_slot(), 0);
    }

    #[test]
    fn test_list_request_defaults_and_clamps() {
        let request = PlanListRequest::default();
        assert_eq!(request.page(), 1);
        assert_eq!(request.per_page(), PlanListRequest::DEFAULT_PER_PAGE);

        let request = PlanListRequest {
            page: Some(0),
            per_page: Some(10_000),
        };
        assert_eq!(request.page(), 1);
        assert_eq!(request.per_page(), PlanListRequest::MAX_PER_PAGE);
    }

    #[test]
    fn test_field_errors_first_message_and_summary() {
        let mut errors = FieldErrors::default();
        assert!(errors.is_empty());

        errors.push("nome", "O campo nome é obrigatório");
        errors.push("nome", "Nome muito longo");
        errors.push("id_curso", "O campo curso é obrigatório");

        assert_eq!(
            errors.first_message("nome"),
            Some("O campo nome é obrigatório")
        );
        assert_eq!(errors.first_message("valor"), None);
        // one message per field, in field order
        assert_eq!(
            errors.summary(),
            "O campo curso é obrigatório; O campo nome é obrigatório"
        );
    }

    #[test]
    fn test_plan_serializes_to_json() {
        let plan = InstallmentPlan::draft(Some(7));
        let json = serde_json::to_string(&plan).unwrap();
        let back: InstallmentPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plan);
    }
}
