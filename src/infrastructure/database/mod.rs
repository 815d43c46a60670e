//! `SQLite`-backed persistence. This is the only part of the crate that
//! knows about `sqlx`; everything else depends on the store traits in
//! `domain::ports`.

mod connection;
mod event_log_store;
mod job_store;
mod notification_store;
mod schedule_store;
mod watcher_state_store;

pub use connection::DatabaseConnection;
pub use event_log_store::SqliteEventLogStore;
pub use job_store::SqliteJobStore;
pub use notification_store::DatabaseNotifier;
pub use schedule_store::SqliteScheduleStore;
pub use watcher_state_store::SqliteWatcherStateStore;
