//! `shopdesk create`, `update` and `delete`.

use std::sync::Arc;

use owo_colors::OwoColorize;
use serde_json::json;

use super::{CommandOutput, ConsoleNotifier, RecordController, build_controller};
use crate::config::Config;
use crate::error::{Result, ShopdeskError};
use crate::record::{JsonObjectValidator, Record};
use crate::remote::{MutationOutcome, MutationRequest};

fn controller_for(resource: &str) -> Result<RecordController> {
    let config = Config::load()?;
    let (controller, _) = build_controller(&config, resource, Arc::new(ConsoleNotifier))?;
    Ok(controller)
}

/// Parse `--data`; malformed JSON is a validation error.
fn parse_payload(data: &str) -> Result<Record> {
    Record::parse(data)
        .map_err(|e| ShopdeskError::Validation(format!("--data is not valid JSON: {e}")))
}

fn validate_id(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ShopdeskError::InvalidInput("id cannot be empty".to_string()));
    }
    Ok(id)
}

fn print_outcome(
    action: &str,
    resource: &str,
    id: Option<&str>,
    outcome: MutationOutcome<Record>,
    json: bool,
) -> Result<()> {
    let json_output = json!({
        "action": action,
        "resource": resource,
        "id": id,
        "success": true,
        "entity": outcome.entity,
    });

    let mut text = match id {
        Some(id) => format!("{action} {} {}", resource.cyan(), id),
        None => format!("{action} {}", resource.cyan()),
    };
    if let Some(entity) = &outcome.entity {
        text.push('\n');
        text.push_str(&serde_json::to_string_pretty(entity)?);
    }

    CommandOutput::new(json_output).with_text(text).print(json)
}

/// Create a record from a JSON object
pub async fn cmd_create(resource: &str, data: &str, json: bool) -> Result<()> {
    let mut controller = controller_for(resource)?;
    let payload = parse_payload(data)?;

    let outcome = controller
        .submit_validated(MutationRequest::Create(payload), &JsonObjectValidator::new())
        .await?;
    print_outcome("created", resource, None, outcome, json)
}

/// Replace a record with a JSON object
pub async fn cmd_update(resource: &str, id: &str, data: &str, json: bool) -> Result<()> {
    let id = validate_id(id)?;
    let mut controller = controller_for(resource)?;
    let payload = parse_payload(data)?;

    let outcome = controller
        .submit_validated(
            MutationRequest::Update(id.to_string(), payload),
            &JsonObjectValidator::new(),
        )
        .await?;
    print_outcome("updated", resource, Some(id), outcome, json)
}

/// Delete a record. The page the record is on is loaded first so the
/// delete can be reconciled against it.
pub async fn cmd_delete(resource: &str, id: &str, page: Option<u32>, json: bool) -> Result<()> {
    let id = validate_id(id)?;
    let mut controller = controller_for(resource)?;

    if let Some(page) = page {
        controller.set_page(page).await?;
    } else {
        controller.load().await?;
    }

    let outcome = controller
        .submit(MutationRequest::Delete(id.to_string()))
        .await?;
    print_outcome("deleted", resource, Some(id), outcome, json)
}
