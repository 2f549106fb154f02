/// Shared types used across the codebase
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role. Stored as lowercase text in `users.role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Worker,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Worker => "worker",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Role::Owner),
            "worker" => Ok(Role::Worker),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declares a text-backed enum with `as_str`, `FromStr` and the list of accepted values.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const VALUES: &'static [&'static str] = &[$($text),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!(
                        "invalid value '{}', expected one of: {}",
                        other,
                        Self::VALUES.join(", ")
                    )),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum!(
    /// UI theme preference.
    Theme {
        Light => "light",
        Dark => "dark",
        System => "system",
    }
);

text_enum!(JobStatus {
    Active => "active",
    Completed => "completed",
    OnHold => "on_hold",
    Cancelled => "cancelled",
});

text_enum!(TimesheetStatus {
    Working => "working",
    Completed => "completed",
    Flagged => "flagged",
});

text_enum!(
    /// How a worker payment was made.
    PaymentMethod {
        Cash => "cash",
        Check => "check",
        BankTransfer => "bank_transfer",
        DirectDeposit => "direct_deposit",
        Paypal => "paypal",
        Venmo => "venmo",
        Zelle => "zelle",
        Other => "other",
    }
);

text_enum!(FileType {
    Pdf => "pdf",
    Image => "image",
    Other => "other",
});

text_enum!(InsightSeverity {
    Info => "info",
    Warning => "warning",
    Critical => "critical",
});

text_enum!(AutomationLevel {
    Manual => "manual",
    Assist => "assist",
    Auto => "auto",
});

/// Capability flags an owner can grant to a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ViewFinancials,
    UploadReceipts,
    ApproveTimesheets,
    SeeAiInsights,
    ViewAllJobs,
}

impl Permission {
    pub const ALL: [Permission; 5] = [
        Permission::ViewFinancials,
        Permission::UploadReceipts,
        Permission::ApproveTimesheets,
        Permission::SeeAiInsights,
        Permission::ViewAllJobs,
    ];

    /// JSON key used in `worker_permissions`.
    pub fn key(&self) -> &'static str {
        match self {
            Permission::ViewFinancials => "canViewFinancials",
            Permission::UploadReceipts => "canUploadReceipts",
            Permission::ApproveTimesheets => "canApproveTimesheets",
            Permission::SeeAiInsights => "canSeeAIInsights",
            Permission::ViewAllJobs => "canViewAllJobs",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == key)
    }

    pub fn valid_keys() -> Vec<&'static str> {
        Self::ALL.iter().map(Permission::key).collect()
    }
}

/// Worker capability flags stored as JSON on the user row. Missing keys take
/// the defaults below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerPermissions {
    #[serde(rename = "canViewFinancials")]
    pub can_view_financials: bool,
    #[serde(rename = "canUploadReceipts")]
    pub can_upload_receipts: bool,
    #[serde(rename = "canApproveTimesheets")]
    pub can_approve_timesheets: bool,
    #[serde(rename = "canSeeAIInsights")]
    pub can_see_ai_insights: bool,
    #[serde(rename = "canViewAllJobs")]
    pub can_view_all_jobs: bool,
}

impl Default for WorkerPermissions {
    fn default() -> Self {
        Self {
            can_view_financials: false,
            can_upload_receipts: true,
            can_approve_timesheets: false,
            can_see_ai_insights: false,
            can_view_all_jobs: false,
        }
    }
}

impl WorkerPermissions {
    /// Every flag set; what an owner effectively holds.
    pub fn all_granted() -> Self {
        Self {
            can_view_financials: true,
            can_upload_receipts: true,
            can_approve_timesheets: true,
            can_see_ai_insights: true,
            can_view_all_jobs: true,
        }
    }

    pub fn allows(&self, permission: Permission) -> bool {
        match permission {
            Permission::ViewFinancials => self.can_view_financials,
            Permission::UploadReceipts => self.can_upload_receipts,
            Permission::ApproveTimesheets => self.can_approve_timesheets,
            Permission::SeeAiInsights => self.can_see_ai_insights,
            Permission::ViewAllJobs => self.can_view_all_jobs,
        }
    }

    pub fn set(&mut self, permission: Permission, value: bool) {
        match permission {
            Permission::ViewFinancials => self.can_view_financials = value,
            Permission::UploadReceipts => self.can_upload_receipts = value,
            Permission::ApproveTimesheets => self.can_approve_timesheets = value,
            Permission::SeeAiInsights => self.can_see_ai_insights = value,
            Permission::ViewAllJobs => self.can_view_all_jobs = value,
        }
    }
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp and keeps the calendar date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|d| d.date_naive()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_accepts_only_known_values() {
        assert_eq!("dark".parse::<Theme>(), Ok(Theme::Dark));
        assert_eq!("system".parse::<Theme>(), Ok(Theme::System));
        assert!("purple".parse::<Theme>().is_err());
        assert!("Dark".parse::<Theme>().is_err());
    }

    #[test]
    fn payment_method_serializes_snake_case() {
        let json = serde_json::to_string(&PaymentMethod::BankTransfer).unwrap();
        assert_eq!(json, "\"bank_transfer\"");
        let parsed: PaymentMethod = serde_json::from_str("\"zelle\"").unwrap();
        assert_eq!(parsed, PaymentMethod::Zelle);
    }

    #[test]
    fn role_round_trips_text() {
        assert_eq!("worker".parse::<Role>().unwrap(), Role::Worker);
        assert_eq!(Role::Owner.to_string(), "owner");
    }

    #[test]
    fn missing_permission_keys_take_defaults() {
        let perms: WorkerPermissions = serde_json::from_str(r#"{"canViewFinancials": true}"#).unwrap();
        assert!(perms.can_view_financials);
        assert!(perms.can_upload_receipts);
        assert!(!perms.can_view_all_jobs);
    }

    #[test]
    fn permission_keys_round_trip() {
        for p in Permission::ALL {
            assert_eq!(Permission::from_key(p.key()), Some(p));
        }
        assert_eq!(Permission::from_key("canFly"), None);
        assert_eq!(Permission::valid_keys().len(), 5);
    }

    #[test]
    fn parses_plain_and_timestamp_dates() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(parse_date("2024-03-09"), Some(expected));
        assert_eq!(parse_date("2024-03-09T12:30:00.000Z"), Some(expected));
        assert_eq!(parse_date("09/03/2024"), None);
    }
}
