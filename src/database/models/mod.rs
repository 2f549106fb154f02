pub mod ai_insight;
pub mod alert;
pub mod client_payment;
pub mod document;
pub mod job;
pub mod notification;
pub mod receipt;
pub mod timesheet;
pub mod user;
pub mod worker_payment;

pub use ai_insight::AiInsight;
pub use alert::Alert;
pub use client_payment::ClientPayment;
pub use document::Document;
pub use job::{Job, JobWithCosts, JOB_COST_COLUMNS};
pub use notification::Notification;
pub use receipt::Receipt;
pub use timesheet::{Timesheet, TimesheetView, TIMESHEET_LIST_SELECT};
pub use user::{AccountView, User, UserProfile, USER_COLUMNS};
pub use worker_payment::{PaymentTotals, WorkerPayment};
