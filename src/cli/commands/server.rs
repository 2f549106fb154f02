use anyhow::Context;
use serde_json::Value;

use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;

/// GET `<url>/health`; a non-2xx status is reported and treated as failure.
pub async fn health(url: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let endpoint = format!("{}/health", url.trim_end_matches('/'));
    let response = reqwest::get(&endpoint)
        .await
        .with_context(|| format!("could not reach {endpoint}"))?;

    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    if status.is_success() {
        output_success(&output_format, &format!("{endpoint} is healthy"), Some(body))
    } else {
        output_error(
            &output_format,
            &format!("{endpoint} returned {status}"),
            body.get("database").and_then(Value::as_str),
        )?;
        anyhow::bail!("server unhealthy")
    }
}
