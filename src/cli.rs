use clap::{Parser, Subcommand};
use jiff::civil::Date;

use crate::commands::{
    ListOptions, cmd_config_get, cmd_config_set, cmd_config_show, cmd_create, cmd_delete,
    cmd_list, cmd_update,
};

#[derive(Parser)]
#[command(name = "shopdesk")]
#[command(about = "Browse and edit e-commerce admin resources")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List one page of a resource
    #[command(visible_alias = "ls")]
    List {
        /// Resource name (e.g. vouchers, orders, brands)
        resource: String,

        /// Page number, starting at 1
        #[arg(short, long, default_value = "1", value_parser = parse_positive)]
        page: u32,

        /// Rows per page (default: page_size from config)
        #[arg(long, value_parser = parse_positive)]
        page_size: Option<u32>,

        /// Case-insensitive text search
        #[arg(short, long)]
        search: Option<String>,

        /// Field filter as key=value (repeatable)
        #[arg(short, long = "filter", value_parser = parse_key_val)]
        filters: Vec<(String, String)>,

        /// Earliest date, inclusive (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        from: Option<Date>,

        /// Latest date, inclusive (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        to: Option<Date>,

        /// Field the date range applies to
        #[arg(long, default_value = "createdAt")]
        date_field: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a record
    Create {
        /// Resource name
        resource: String,

        /// Record as a JSON object
        #[arg(short, long)]
        data: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Update a record
    Update {
        /// Resource name
        resource: String,

        /// Record id
        id: String,

        /// Record as a JSON object
        #[arg(short, long)]
        data: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a record
    #[command(visible_alias = "rm")]
    Delete {
        /// Resource name
        resource: String,

        /// Record id
        id: String,

        /// Page the record is shown on
        #[arg(short, long, value_parser = parse_positive)]
        page: Option<u32>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set a configuration value
    Set {
        /// Configuration key (api.base_url, auth.token, page_size, resources.<name>.<field>, ...)
        key: String,
        /// Value to set
        value: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// Run the selected command
    pub async fn run(self) -> crate::error::Result<()> {
        match self {
            Commands::List {
                resource,
                page,
                page_size,
                search,
                filters,
                from,
                to,
                date_field,
                json,
            } => {
                let options = ListOptions {
                    resource,
                    page,
                    page_size,
                    search,
                    filters,
                    date_field,
                    from,
                    to,
                    json,
                };
                cmd_list(options).await
            }

            Commands::Create {
                resource,
                data,
                json,
            } => cmd_create(&resource, &data, json).await,

            Commands::Update {
                resource,
                id,
                data,
                json,
            } => cmd_update(&resource, &id, &data, json).await,

            Commands::Delete {
                resource,
                id,
                page,
                json,
            } => cmd_delete(&resource, &id, page, json).await,

            Commands::Config { action } => match action {
                ConfigAction::Show { json } => cmd_config_show(json),
                ConfigAction::Set { key, value, json } => cmd_config_set(&key, &value, json),
                ConfigAction::Get { key, json } => cmd_config_get(&key, json),
            },
        }
    }
}

fn parse_positive(s: &str) -> Result<u32, String> {
    match s.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("'{s}' is not a positive whole number")),
    }
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid filter '{s}'. Expected key=value"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("invalid filter '{s}'. Key cannot be empty"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

fn parse_date(s: &str) -> Result<Date, String> {
    s.parse::<Date>()
        .map_err(|e| format!("invalid date '{s}': {e}. Expected YYYY-MM-DD"))
}
