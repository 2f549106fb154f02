mod common;

use anyhow::Result;
use serde_json::{json, Value};

use common::{call, unique_email};

async fn signup_owner(router: &axum::Router) -> Result<(String, Value)> {
    let res = call(
        router,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({
            "email": unique_email("owner"),
            "password": "Sitel3dger",
            "name": "Pat Owner"
        })),
    )
    .await?;
    assert_eq!(res.status.as_u16(), 201, "signup failed: {}", res.text);
    let body = res.json();
    let token = body["accessToken"].as_str().unwrap_or_default().to_string();
    Ok((token, body["user"].clone()))
}

#[tokio::test]
async fn owner_job_worker_and_payment_flow() -> Result<()> {
    let Some(router) = common::database_router().await? else {
        return Ok(());
    };
    let (owner, profile) = signup_owner(&router).await?;
    assert_eq!(profile["role"], "owner");

    // Duplicate signup is a 400, not a 409
    let dup = call(
        &router,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({ "email": profile["email"], "password": "Sitel3dger", "name": "Again" })),
    )
    .await?;
    assert_eq!(dup.status.as_u16(), 400);
    assert_eq!(dup.json()["error"], "Email already registered");

    let job = call(
        &router,
        "POST",
        "/api/jobs",
        Some(&owner),
        Some(json!({
            "jobName": "Kitchen remodel",
            "clientName": "Rivera",
            "projectValue": 12000,
            "amountPaid": 2000,
            "startDate": "2024-05-01"
        })),
    )
    .await?;
    assert_eq!(job.status.as_u16(), 201, "job create failed: {}", job.text);
    let job = job.json();
    let job_id = job["id"].as_str().unwrap_or_default().to_string();
    assert_eq!(job["remainingBalance"].as_f64(), Some(10000.0));

    let overpaid = call(
        &router,
        "POST",
        "/api/jobs",
        Some(&owner),
        Some(json!({
            "jobName": "Deck",
            "clientName": "Rivera",
            "projectValue": 100,
            "amountPaid": 200,
            "startDate": "2024-05-01"
        })),
    )
    .await?;
    assert_eq!(overpaid.status.as_u16(), 400);

    // Worker with a generated temporary password
    let worker_email = unique_email("crew");
    let worker = call(
        &router,
        "POST",
        "/api/workers",
        Some(&owner),
        Some(json!({ "email": worker_email, "name": "Sam Crew", "hourlyRate": 30 })),
    )
    .await?;
    assert_eq!(worker.status.as_u16(), 201, "worker create failed: {}", worker.text);
    let worker = worker.json();
    let worker_id = worker["id"].as_str().unwrap_or_default().to_string();
    let temp_password = worker["tempPassword"].as_str().unwrap_or_default().to_string();
    assert!(!temp_password.is_empty());

    let login = call(
        &router,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": worker_email, "password": temp_password })),
    )
    .await?;
    assert_eq!(login.status.as_u16(), 200, "worker login failed: {}", login.text);
    let worker_token = login.json()["accessToken"].as_str().unwrap_or_default().to_string();

    // Workers cannot reach owner-only groups or unassigned jobs
    let denied = call(&router, "GET", "/api/workers", Some(&worker_token), None).await?;
    assert_eq!(denied.status.as_u16(), 403);
    let hidden = call(&router, "GET", &format!("/api/jobs/{job_id}"), Some(&worker_token), None).await?;
    assert_eq!(hidden.status.as_u16(), 403);

    let assign = call(
        &router,
        "POST",
        &format!("/api/jobs/{job_id}/assign-worker"),
        Some(&owner),
        Some(json!({ "workerID": worker_id })),
    )
    .await?;
    assert_eq!(assign.status.as_u16(), 200, "assign failed: {}", assign.text);

    let visible = call(&router, "GET", &format!("/api/jobs/{job_id}"), Some(&worker_token), None).await?;
    assert_eq!(visible.status.as_u16(), 200);

    // Client payment moves amount_paid inside one transaction
    let payment = call(
        &router,
        "POST",
        "/api/client-payments",
        Some(&owner),
        Some(json!({ "jobId": job_id, "amount": 500, "method": "check", "date": "2024-05-10" })),
    )
    .await?;
    assert_eq!(payment.status.as_u16(), 201, "payment failed: {}", payment.text);
    let payment_id = payment.json()["id"].as_str().unwrap_or_default().to_string();

    let after = call(&router, "GET", &format!("/api/jobs/{job_id}"), Some(&owner), None).await?.json();
    assert_eq!(after["amountPaid"].as_f64(), Some(2500.0));

    let removed = call(
        &router,
        "DELETE",
        &format!("/api/client-payments/{payment_id}"),
        Some(&owner),
        None,
    )
    .await?;
    assert_eq!(removed.status.as_u16(), 200);
    let after = call(&router, "GET", &format!("/api/jobs/{job_id}"), Some(&owner), None).await?.json();
    assert_eq!(after["amountPaid"].as_f64(), Some(2000.0));

    // A client overpayment must not lock the job against later edits
    let small = call(
        &router,
        "POST",
        "/api/jobs",
        Some(&owner),
        Some(json!({ "jobName": "Fence", "clientName": "Rivera", "projectValue": 100, "startDate": "2024-05-01" })),
    )
    .await?
    .json();
    let small_id = small["id"].as_str().unwrap_or_default().to_string();
    let over = call(
        &router,
        "POST",
        "/api/client-payments",
        Some(&owner),
        Some(json!({ "jobId": small_id, "amount": 150, "method": "cash", "date": "2024-05-11" })),
    )
    .await?;
    assert_eq!(over.status.as_u16(), 201, "{}", over.text);
    let renamed = call(
        &router,
        "PUT",
        &format!("/api/jobs/{small_id}"),
        Some(&owner),
        Some(json!({ "notes": "final invoice settled" })),
    )
    .await?;
    assert_eq!(renamed.status.as_u16(), 200, "{}", renamed.text);
    assert_eq!(renamed.json()["amountPaid"].as_f64(), Some(150.0));
    let lowered = call(
        &router,
        "PUT",
        &format!("/api/jobs/{small_id}"),
        Some(&owner),
        Some(json!({ "projectValue": 120 })),
    )
    .await?;
    assert_eq!(lowered.status.as_u16(), 400);

    // Worker payment earnings are hours x rate
    let paid = call(
        &router,
        "POST",
        "/api/worker-payments",
        Some(&owner),
        Some(json!({
            "workerID": worker_id,
            "amount": 300,
            "paymentDate": "2024-05-15",
            "periodStart": "2024-05-01",
            "periodEnd": "2024-05-14",
            "hoursWorked": 10,
            "hourlyRate": 30,
            "paymentMethod": "zelle"
        })),
    )
    .await?;
    assert_eq!(paid.status.as_u16(), 201, "worker payment failed: {}", paid.text);
    assert_eq!(paid.json()["calculatedEarnings"].as_f64(), Some(300.0));
    let payroll_id = paid.json()["id"].as_str().unwrap_or_default().to_string();

    let rerated = call(
        &router,
        "PUT",
        &format!("/api/worker-payments/{payroll_id}"),
        Some(&owner),
        Some(json!({ "hourlyRate": 32.5 })),
    )
    .await?;
    assert_eq!(rerated.status.as_u16(), 200, "{}", rerated.text);
    assert_eq!(rerated.json()["calculatedEarnings"].as_f64(), Some(325.0));

    let oversized = call(
        &router,
        "PUT",
        &format!("/api/worker-payments/{payroll_id}"),
        Some(&owner),
        Some(json!({ "hoursWorked": 1e15, "hourlyRate": 1e15 })),
    )
    .await?;
    assert_eq!(oversized.status.as_u16(), 400, "{}", oversized.text);
    assert!(oversized.json()["error"].is_string());

    let own = call(
        &router,
        "GET",
        &format!("/api/worker-payments/worker/{worker_id}"),
        Some(&worker_token),
        None,
    )
    .await?;
    assert_eq!(own.status.as_u16(), 200);
    assert_eq!(own.json().as_array().map(Vec::len), Some(1));

    let export = call(&router, "GET", "/api/export/jobs", Some(&owner), None).await?;
    assert_eq!(export.status.as_u16(), 200);
    let disposition = export
        .headers
        .get("content-disposition")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(disposition.starts_with("attachment; filename=\"jobs-export-"), "{disposition}");
    assert!(export.text.starts_with("\"Job ID\""), "{}", export.text);
    assert!(export.text.contains("\"Kitchen remodel\""));

    Ok(())
}

#[tokio::test]
async fn preferences_default_validate_and_echo() -> Result<()> {
    let Some(router) = common::database_router().await? else {
        return Ok(());
    };
    let (owner, _) = signup_owner(&router).await?;

    let theme = call(&router, "GET", "/api/preferences/theme", Some(&owner), None).await?;
    assert_eq!(theme.json(), json!({ "theme": "light" }));

    let bad = call(
        &router,
        "PUT",
        "/api/preferences/theme",
        Some(&owner),
        Some(json!({ "theme": "neon" })),
    )
    .await?;
    assert_eq!(bad.status.as_u16(), 400);
    assert_eq!(bad.json()["error"], "Invalid theme. Must be light, dark, or system");

    let good = call(
        &router,
        "PUT",
        "/api/preferences/theme",
        Some(&owner),
        Some(json!({ "theme": "dark" })),
    )
    .await?;
    assert_eq!(good.json()["theme"], "dark");

    let ai = call(
        &router,
        "PUT",
        "/api/preferences/ai-automation",
        Some(&owner),
        Some(json!({ "automationLevel": "auto" })),
    )
    .await?;
    assert_eq!(ai.status.as_u16(), 200, "{}", ai.text);
    assert_eq!(ai.json()["settings"]["automationLevel"], "auto");
    assert_eq!(ai.json()["settings"]["autoFillReceipts"], true);

    let all = call(&router, "GET", "/api/preferences/all", Some(&owner), None).await?.json();
    assert_eq!(all["theme"], "dark");
    assert_eq!(all["notifications"], json!({}));
    assert_eq!(all["aiAutomation"]["automationLevel"], "auto");

    let mine = call(&router, "GET", "/api/permissions/my-permissions", Some(&owner), None).await?.json();
    assert_eq!(mine["role"], "owner");
    assert_eq!(mine["permissions"]["canViewFinancials"], true);

    Ok(())
}

#[tokio::test]
async fn worker_permission_updates_validate_keys() -> Result<()> {
    let Some(router) = common::database_router().await? else {
        return Ok(());
    };
    let (owner, _) = signup_owner(&router).await?;

    let worker = call(
        &router,
        "POST",
        "/api/workers",
        Some(&owner),
        Some(json!({ "email": unique_email("perm"), "name": "Lee Crew" })),
    )
    .await?
    .json();
    let worker_id = worker["id"].as_str().unwrap_or_default().to_string();
    let uri = format!("/api/permissions/worker/{worker_id}");

    let invalid = call(
        &router,
        "PUT",
        &uri,
        Some(&owner),
        Some(json!({ "permissions": { "canDeleteEverything": true } })),
    )
    .await?;
    assert_eq!(invalid.status.as_u16(), 400);
    assert_eq!(invalid.json()["invalid"][0], "canDeleteEverything");

    let ok = call(
        &router,
        "PUT",
        &uri,
        Some(&owner),
        Some(json!({ "permissions": { "canViewFinancials": true } })),
    )
    .await?;
    assert_eq!(ok.status.as_u16(), 200, "{}", ok.text);
    assert_eq!(ok.json()["permissions"]["canViewFinancials"], true);
    assert_eq!(ok.json()["permissions"]["canUploadReceipts"], true);

    let missing = call(
        &router,
        "GET",
        &format!("/api/permissions/worker/{}", uuid::Uuid::new_v4()),
        Some(&owner),
        None,
    )
    .await?;
    assert_eq!(missing.status.as_u16(), 404);

    Ok(())
}

#[tokio::test]
async fn worker_clock_in_and_out_at_site() -> Result<()> {
    let Some(router) = common::database_router().await? else {
        return Ok(());
    };
    let (owner, _) = signup_owner(&router).await?;

    let job = call(
        &router,
        "POST",
        "/api/jobs",
        Some(&owner),
        Some(json!({
            "jobName": "Bathroom tile",
            "clientName": "Moreau",
            "projectValue": 4000,
            "startDate": "2024-06-01",
            "latitude": 40.7128,
            "longitude": -74.0060,
            "geofenceEnabled": true,
            "geofenceRadius": 150
        })),
    )
    .await?;
    assert_eq!(job.status.as_u16(), 201, "{}", job.text);
    let job_id = job.json()["id"].as_str().unwrap_or_default().to_string();

    let email = unique_email("tiler");
    let worker = call(
        &router,
        "POST",
        "/api/workers",
        Some(&owner),
        Some(json!({ "email": email, "name": "Ana Tiler", "hourlyRate": 28 })),
    )
    .await?
    .json();
    let worker_id = worker["id"].as_str().unwrap_or_default().to_string();
    let password = worker["tempPassword"].as_str().unwrap_or_default().to_string();
    let assign = call(
        &router,
        "POST",
        &format!("/api/jobs/{job_id}/assign-worker"),
        Some(&owner),
        Some(json!({ "workerID": worker_id })),
    )
    .await?;
    assert_eq!(assign.status.as_u16(), 200, "{}", assign.text);

    let login = call(
        &router,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await?;
    let worker_token = login.json()["accessToken"].as_str().unwrap_or_default().to_string();

    // Receipts need canViewFinancials, which workers lack by default
    let receipts = call(&router, "GET", "/api/receipts", Some(&worker_token), None).await?;
    assert_eq!(receipts.status.as_u16(), 403);
    assert_eq!(receipts.json()["required"], "canViewFinancials");

    let bad_id = call(&router, "GET", "/api/jobs/not-a-uuid", Some(&worker_token), None).await?;
    assert_eq!(bad_id.status.as_u16(), 400);
    assert!(bad_id.json()["error"].is_string(), "{}", bad_id.text);

    let early = call(&router, "POST", "/api/timesheets/clock-out", Some(&worker_token), Some(json!({}))).await?;
    assert_eq!(early.status.as_u16(), 400);
    assert_eq!(early.json()["error"], "Not clocked in");

    let far = call(
        &router,
        "POST",
        "/api/timesheets/clock-in",
        Some(&worker_token),
        Some(json!({ "jobID": job_id, "latitude": 40.7580, "longitude": -73.9855 })),
    )
    .await?;
    assert_eq!(far.status.as_u16(), 400);
    assert_eq!(far.json()["error"], "You are outside the job site geofence");

    let clock_in = call(
        &router,
        "POST",
        "/api/timesheets/clock-in",
        Some(&worker_token),
        Some(json!({ "jobID": job_id, "latitude": 40.7129, "longitude": -74.0061, "location": "front gate" })),
    )
    .await?;
    assert_eq!(clock_in.status.as_u16(), 201, "{}", clock_in.text);
    let shift = clock_in.json();
    assert_eq!(shift["status"], "working");
    assert_eq!(shift["isLocationValid"], true);

    let again = call(
        &router,
        "POST",
        "/api/timesheets/clock-in",
        Some(&worker_token),
        Some(json!({ "jobID": job_id, "latitude": 40.7129, "longitude": -74.0061 })),
    )
    .await?;
    assert_eq!(again.status.as_u16(), 400);
    assert_eq!(again.json()["error"], "Already clocked in to a job");

    let clock_out = call(
        &router,
        "POST",
        "/api/timesheets/clock-out",
        Some(&worker_token),
        Some(json!({ "notes": "grout curing" })),
    )
    .await?;
    assert_eq!(clock_out.status.as_u16(), 200, "{}", clock_out.text);
    let done = clock_out.json();
    assert_eq!(done["id"], shift["id"]);
    assert_eq!(done["status"], "completed");
    assert!(done["hours"].is_number(), "{}", clock_out.text);
    assert!(done["clockOut"].is_string());

    let after = call(&router, "POST", "/api/timesheets/clock-out", Some(&worker_token), Some(json!({}))).await?;
    assert_eq!(after.status.as_u16(), 400);

    Ok(())
}
