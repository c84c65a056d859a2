//! `shopdesk list`: one page of a resource as a table or JSON.

use std::sync::Arc;

use jiff::civil::Date;
use owo_colors::OwoColorize;
use serde_json::json;
use tabled::builder::Builder;
use tabled::settings::Style;

use super::{CommandOutput, ConsoleNotifier, build_controller};
use crate::config::{Config, ResourceConfig};
use crate::error::{Result, ShopdeskError};
use crate::list::pagination::{PageSlot, page_window};
use crate::record::Record;
use crate::remote::{DateRange, ListQuery, ListResult};

/// Columns shown when a resource has none configured
const MAX_INFERRED_COLUMNS: usize = 6;

/// Longest cell text before truncation
const MAX_CELL_WIDTH: usize = 40;

/// Options for `shopdesk list`
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub resource: String,
    pub page: u32,
    pub page_size: Option<u32>,
    pub search: Option<String>,
    pub filters: Vec<(String, String)>,
    pub date_field: String,
    pub from: Option<Date>,
    pub to: Option<Date>,
    pub json: bool,
}

impl ListOptions {
    fn query(&self, default_page_size: u32) -> Result<ListQuery> {
        if let (Some(from), Some(to)) = (self.from, self.to)
            && from > to
        {
            return Err(ShopdeskError::InvalidInput(format!(
                "--from {from} is after --to {to}"
            )));
        }

        let mut query = ListQuery::new(self.page_size.unwrap_or(default_page_size)).page(self.page);
        for (key, value) in &self.filters {
            query = query.filter(key.clone(), value.clone());
        }
        if let Some(term) = &self.search {
            query = query.search(term.clone());
        }
        if self.from.is_some() || self.to.is_some() {
            query = query.date_range(DateRange::new(self.date_field.clone(), self.from, self.to));
        }
        Ok(query)
    }
}

/// List one page of a resource
pub async fn cmd_list(options: ListOptions) -> Result<()> {
    let config = Config::load()?;
    let query = options.query(config.page_size)?;

    let (controller, resource) =
        build_controller(&config, &options.resource, Arc::new(ConsoleNotifier))?;
    let mut controller = controller.with_query(query);
    controller.load().await?;

    let Some(result) = controller.view().result() else {
        return Ok(());
    };

    let json_output = json!({
        "resource": options.resource,
        "items": result.items,
        "totalCount": result.total_count,
        "pageNumber": result.page_number,
        "pageSize": result.page_size,
        "totalPages": result.total_pages,
    });

    let text_output = render_text(result, &resource);

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(options.json)
}

fn render_text(result: &ListResult<Record>, resource: &ResourceConfig) -> String {
    if result.items.is_empty() {
        return format!("{}", "No matching records.".dimmed());
    }

    let columns = columns_for(&result.items, resource);
    let mut builder = Builder::default();
    builder.push_record(columns.iter().cloned());
    for record in &result.items {
        builder.push_record(
            columns
                .iter()
                .map(|column| truncate(&record.field(column).unwrap_or_default())),
        );
    }

    let mut table = builder.build();
    table.with(Style::rounded());

    format!(
        "{table}\n{}  {}",
        format!(
            "Page {} of {} ({} total)",
            result.page_number, result.total_pages, result.total_count
        )
        .dimmed(),
        render_page_window(result.total_pages, result.page_number)
    )
}

/// Configured columns, or the first keys of the first record.
fn columns_for(items: &[Record], resource: &ResourceConfig) -> Vec<String> {
    if !resource.columns.is_empty() {
        return resource.columns.clone();
    }

    let mut columns = items.first().map(Record::keys).unwrap_or_default();
    // Keep the id first when present
    if let Some(pos) = columns.iter().position(|c| *c == resource.id_field) {
        let id = columns.remove(pos);
        columns.insert(0, id);
    }
    columns.truncate(MAX_INFERRED_COLUMNS);
    columns
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_CELL_WIDTH {
        return text.to_string();
    }
    let mut short: String = text.chars().take(MAX_CELL_WIDTH - 1).collect();
    short.push('…');
    short
}

/// Page navigation line such as `1 2 … 7 [8] 9 … 20`.
pub fn render_page_window(total_pages: u32, current: u32) -> String {
    page_window(total_pages, current, 2, 1)
        .into_iter()
        .map(|slot| match slot {
            PageSlot::Page(n) if n == current => format!("[{n}]"),
            PageSlot::Page(n) => n.to_string(),
            PageSlot::Gap => "…".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
