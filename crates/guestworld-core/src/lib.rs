//! Core library crate exposing the guest world schedule query engine.

pub mod config;
pub mod dates;
pub mod logging;
pub mod query;
pub mod session;
pub mod speech;
pub mod store;

pub use config::{
    ConfigError, ConfigLoadResult, ConfigSource, FileConfig, config_directory, config_path,
    load_config, save_config,
};
pub use dates::{
    QueryClock, ResolvedDate, SCHEDULE_TZ, ordinal_date, ordinal_day, resolve_date_slot,
};
pub use logging::{LoggingDestination, LoggingError, current_log_path, init_logging};
pub use query::{Intent, Query, Slots, SpokenAnswer, handle_query};
pub use session::{LastContext, SessionContext};
pub use store::{
    ChallengeCategory, ChallengeData, ChallengeDay, ChallengeEntry, ChallengeMonth, Dataset,
    ScheduleStore, StoreError, WorldList,
};
