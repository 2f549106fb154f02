//! Typed preference blobs and their default-merging rules.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{AutomationLevel, Permission, WorkerPermissions};

/// `users.ai_automation_settings`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAutomationSettings {
    pub automation_level: AutomationLevel,
    pub auto_fill_receipts: bool,
    pub auto_assign_jobs: bool,
    pub auto_calculate_labor_costs: bool,
    pub auto_generate_summaries: bool,
    pub auto_generate_insights: bool,
}

impl Default for AiAutomationSettings {
    fn default() -> Self {
        Self {
            automation_level: AutomationLevel::Assist,
            auto_fill_receipts: true,
            auto_assign_jobs: true,
            auto_calculate_labor_costs: true,
            auto_generate_summaries: false,
            auto_generate_insights: true,
        }
    }
}

/// PUT body for AI automation; absent fields fall back to the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAutomationUpdate {
    pub automation_level: Option<AutomationLevel>,
    pub auto_fill_receipts: Option<bool>,
    pub auto_assign_jobs: Option<bool>,
    pub auto_calculate_labor_costs: Option<bool>,
    pub auto_generate_summaries: Option<bool>,
    pub auto_generate_insights: Option<bool>,
}

impl AiAutomationUpdate {
    pub fn merged_with_defaults(self) -> AiAutomationSettings {
        let d = AiAutomationSettings::default();
        AiAutomationSettings {
            automation_level: self.automation_level.unwrap_or(d.automation_level),
            auto_fill_receipts: self.auto_fill_receipts.unwrap_or(d.auto_fill_receipts),
            auto_assign_jobs: self.auto_assign_jobs.unwrap_or(d.auto_assign_jobs),
            auto_calculate_labor_costs: self.auto_calculate_labor_costs.unwrap_or(d.auto_calculate_labor_costs),
            auto_generate_summaries: self.auto_generate_summaries.unwrap_or(d.auto_generate_summaries),
            auto_generate_insights: self.auto_generate_insights.unwrap_or(d.auto_generate_insights),
        }
    }
}

/// Owner-level AI thresholds, `users.ai_settings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiSettings {
    pub ai_mode: AutomationLevel,
    pub auto_fill_receipts: bool,
    pub auto_assign_receipts: bool,
    pub auto_calculate_labor: bool,
    pub auto_generate_summaries: bool,
    pub auto_generate_insights: bool,
    /// Percent, 0 to 100.
    pub min_confidence: u8,
    pub flag_low_confidence: bool,
    pub flag_unusual_hours: bool,
    pub max_daily_hours: u8,
    /// Percent of project value spent before an alert fires.
    pub budget_alert_threshold: u8,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            ai_mode: AutomationLevel::Assist,
            auto_fill_receipts: true,
            auto_assign_receipts: true,
            auto_calculate_labor: true,
            auto_generate_summaries: false,
            auto_generate_insights: true,
            min_confidence: 85,
            flag_low_confidence: true,
            flag_unusual_hours: true,
            max_daily_hours: 12,
            budget_alert_threshold: 75,
        }
    }
}

impl AiSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.min_confidence > 100 {
            return Err("minConfidence must be between 0 and 100".into());
        }
        if !(1..=24).contains(&self.max_daily_hours) {
            return Err("maxDailyHours must be between 1 and 24".into());
        }
        if self.budget_alert_threshold > 100 {
            return Err("budgetAlertThreshold must be between 0 and 100".into());
        }
        Ok(())
    }
}

/// Partial permission update as sent to `/api/settings/permissions`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionTemplateUpdate {
    pub can_view_financials: Option<bool>,
    pub can_upload_receipts: Option<bool>,
    pub can_approve_timesheets: Option<bool>,
    #[serde(rename = "canSeeAIInsights")]
    pub can_see_ai_insights: Option<bool>,
    pub can_view_all_jobs: Option<bool>,
}

impl PermissionTemplateUpdate {
    pub fn merged_with_defaults(self) -> WorkerPermissions {
        let d = WorkerPermissions::default();
        WorkerPermissions {
            can_view_financials: self.can_view_financials.unwrap_or(d.can_view_financials),
            can_upload_receipts: self.can_upload_receipts.unwrap_or(d.can_upload_receipts),
            can_approve_timesheets: self.can_approve_timesheets.unwrap_or(d.can_approve_timesheets),
            can_see_ai_insights: self.can_see_ai_insights.unwrap_or(d.can_see_ai_insights),
            can_view_all_jobs: self.can_view_all_jobs.unwrap_or(d.can_view_all_jobs),
        }
    }
}

/// Outcome of applying a per-worker permission map.
#[derive(Debug, PartialEq, Eq)]
pub enum PermissionPatch {
    Applied(WorkerPermissions),
    UnknownKeys(Vec<String>),
    NotBoolean(String),
}

/// Overlay `{ "canX": bool, ... }` on `current`. Every key must be a known
/// permission and every value a boolean.
pub fn apply_permission_patch(current: WorkerPermissions, patch: &Map<String, Value>) -> PermissionPatch {
    let unknown: Vec<String> = patch
        .keys()
        .filter(|k| Permission::from_key(k).is_none())
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return PermissionPatch::UnknownKeys(unknown);
    }

    let mut next = current;
    for (key, value) in patch {
        let Some(flag) = value.as_bool() else {
            return PermissionPatch::NotBoolean(key.clone());
        };
        if let Some(permission) = Permission::from_key(key) {
            next.set(permission, flag);
        }
    }
    PermissionPatch::Applied(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ai_automation_update_fills_defaults() {
        let update: AiAutomationUpdate =
            serde_json::from_value(json!({ "automationLevel": "auto", "autoFillReceipts": false })).unwrap();
        let merged = update.merged_with_defaults();
        assert_eq!(merged.automation_level, AutomationLevel::Auto);
        assert!(!merged.auto_fill_receipts);
        assert!(merged.auto_assign_jobs);
        assert!(!merged.auto_generate_summaries);

        let stored = serde_json::to_value(merged).unwrap();
        assert_eq!(stored["automationLevel"], "auto");
        assert_eq!(stored["autoCalculateLaborCosts"], true);
    }

    #[test]
    fn rejects_unknown_automation_level() {
        let result: Result<AiAutomationUpdate, _> = serde_json::from_value(json!({ "automationLevel": "yolo" }));
        assert!(result.is_err());
    }

    #[test]
    fn ai_settings_partial_body_uses_defaults() {
        let settings: AiSettings = serde_json::from_value(json!({ "minConfidence": 90 })).unwrap();
        assert_eq!(settings.min_confidence, 90);
        assert_eq!(settings.max_daily_hours, 12);
        assert_eq!(settings.budget_alert_threshold, 75);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn ai_settings_range_checks() {
        let settings = AiSettings {
            max_daily_hours: 30,
            ..AiSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn permission_template_merges_defaults() {
        let update: PermissionTemplateUpdate =
            serde_json::from_value(json!({ "canSeeAIInsights": true })).unwrap();
        let merged = update.merged_with_defaults();
        assert!(merged.can_see_ai_insights);
        assert!(merged.can_upload_receipts);
        assert!(!merged.can_view_financials);
    }

    #[test]
    fn permission_patch_rejects_unknown_keys() {
        let patch = json!({ "canViewFinancials": true, "canFly": true });
        let outcome = apply_permission_patch(WorkerPermissions::default(), patch.as_object().unwrap());
        assert_eq!(outcome, PermissionPatch::UnknownKeys(vec!["canFly".to_string()]));
    }

    #[test]
    fn permission_patch_overlays_current_flags() {
        let patch = json!({ "canViewAllJobs": true, "canUploadReceipts": false });
        match apply_permission_patch(WorkerPermissions::default(), patch.as_object().unwrap()) {
            PermissionPatch::Applied(p) => {
                assert!(p.can_view_all_jobs);
                assert!(!p.can_upload_receipts);
                assert!(!p.can_view_financials);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn permission_patch_requires_booleans() {
        let patch = json!({ "canViewAllJobs": "yes" });
        assert_eq!(
            apply_permission_patch(WorkerPermissions::default(), patch.as_object().unwrap()),
            PermissionPatch::NotBoolean("canViewAllJobs".to_string())
        );
    }
}
