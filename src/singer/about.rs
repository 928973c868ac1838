use crate::config::config_schema;
use crate::constants::{CAPABILITIES, TAP_NAME};
use crate::errors::{AppError, AppResult};
use serde_json::{json, Value};

/// Output format of `--about`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AboutFormat {
    Json,
    Markdown,
}

impl TryFrom<&str> for AboutFormat {
    type Error = AppError;

    fn try_from(value: &str) -> AppResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(AppError::InvalidInput(format!(
                "Unknown about format {other:?}, expected 'json' or 'markdown'"
            ))),
        }
    }
}

/// Describes the tap: name, version, capabilities and accepted settings.
pub fn about_info(format: AboutFormat) -> AppResult<String> {
    let info = json!({
        "name": TAP_NAME,
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "version": env!("CARGO_PKG_VERSION"),
        "capabilities": CAPABILITIES,
        "settings": config_schema(),
    });

    match format {
        AboutFormat::Json => Ok(serde_json::to_string_pretty(&info)?),
        AboutFormat::Markdown => Ok(render_markdown(&info)),
    }
}

fn render_markdown(info: &Value) -> String {
    let mut out = format!(
        "# `{}`\n\n{}\n\nVersion: {}\n\n## Capabilities\n\n",
        info["name"].as_str().unwrap_or_default(),
        info["description"].as_str().unwrap_or_default(),
        info["version"].as_str().unwrap_or_default(),
    );
    for capability in CAPABILITIES {
        out.push_str(&format!("* `{capability}`\n"));
    }

    out.push_str("\n## Settings\n\n| Setting | Required | Type | Description |\n|:--------|:--------:|:----:|:------------|\n");
    let required: Vec<&str> = info["settings"]["required"]
        .as_array()
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    if let Some(properties) = info["settings"]["properties"].as_object() {
        for (name, property) in properties {
            out.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                name,
                if required.contains(&name.as_str()) { "True" } else { "False" },
                property["type"].as_str().unwrap_or("any"),
                property["description"].as_str().unwrap_or_default(),
            ));
        }
    }
    out
}
