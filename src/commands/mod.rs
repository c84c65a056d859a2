mod config;
mod list;
mod mutate;

pub use config::{cmd_config_get, cmd_config_set, cmd_config_show};
pub use list::{ListOptions, cmd_list, render_page_window};
pub use mutate::{cmd_create, cmd_delete, cmd_update};

use std::sync::Arc;

use owo_colors::{OwoColorize, Stream};
use serde_json::Value;

use crate::config::{Config, ResourceConfig};
use crate::error::Result;
use crate::list::filter::{Matcher, field_matcher};
use crate::list::notify::{Notification, NotificationSink};
use crate::list::ListController;
use crate::record::Record;
use crate::remote::HttpStore;

/// List controller over an untyped REST resource.
pub type RecordController = ListController<HttpStore<Record>>;

/// Output of a command in both machine and human form.
pub struct CommandOutput {
    json: Value,
    text: Option<String>,
}

impl CommandOutput {
    pub fn new(json: Value) -> Self {
        Self { json, text: None }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Print as JSON when `json` is set, otherwise as text (falling back to
    /// JSON when no text form was given).
    pub fn print(self, json: bool) -> Result<()> {
        match (json, self.text) {
            (false, Some(text)) => {
                println!("{text}");
                Ok(())
            }
            _ => print_json(&self.json),
        }
    }
}

/// Pretty-print a JSON value to stdout.
pub fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints notifications to stderr, colored by kind.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl NotificationSink for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        let color = notification.color();
        eprintln!(
            "{}",
            notification
                .message
                .if_supports_color(Stream::Stderr, |text| text.color(color))
        );
    }
}

/// Search matchers for a resource: its configured fields, or every value.
pub fn matchers_for(resource: &ResourceConfig) -> Vec<Matcher<Record>> {
    if resource.search_fields.is_empty() {
        vec![Record::all_text_matcher()]
    } else {
        resource
            .search_fields
            .iter()
            .map(|field| field_matcher(field.clone()))
            .collect()
    }
}

/// Controller for the resource called `name`, wired from configuration.
pub fn build_controller(
    config: &Config,
    name: &str,
    notifier: Arc<dyn NotificationSink>,
) -> Result<(RecordController, ResourceConfig)> {
    let resource = config.resource(name)?;
    let store: HttpStore<Record> = HttpStore::from_config(config, &resource)?;

    let controller = ListController::new(store, config.page_size)
        .with_strategy(resource.fetch_strategy(config.fetch_limit))
        .with_matchers(matchers_for(&resource))
        .with_id_field(resource.id_field.clone())
        .with_delete_policy(config.delete_policy)
        .with_notifier(notifier)
        .with_label(name);

    Ok((controller, resource))
}
