use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Print a success line, or a JSON object when `--json` is set.
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(body), Some(Value::Object(extra))) = (response.as_object_mut(), data) {
                body.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: &OutputFormat, message: &str, detail: Option<&str>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(detail) = detail {
                response["detail"] = json!(detail);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => match detail {
            Some(detail) => eprintln!("Error: {} ({})", message, detail),
            None => eprintln!("Error: {}", message),
        },
    }
    Ok(())
}
