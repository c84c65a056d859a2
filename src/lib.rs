pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod list;
pub mod paths;
pub mod record;
pub mod remote;

pub use config::{Config, ResourceConfig, StrategyKind};
pub use error::{ErrorInfo, ErrorKind, Result, ShopdeskError};
pub use list::{
    DeletePolicy, FetchStrategy, ListController, LoadPhase, LookupTable, Notification,
    NotificationKind, NotificationSink, SharedController, ViewState,
};
pub use record::{JsonObjectValidator, Record};
pub use remote::{
    DateRange, HttpStore, ListQuery, ListResult, MutationKind, MutationOutcome, MutationRequest,
    RemoteStore,
};
