//! Sentryd - execution substrate for an autonomous web3 security research
//! agent.
//!
//! - Action registry and dispatch (C1/C2)
//! - An append-only event bus with registered handler fan-out (C3)
//! - A background job manager with cooperative cancellation (C4)
//! - A watcher subsystem polling external state on independent cadences (C5)
//! - A webhook server for inbound triggers (C6)
//! - A fixed-interval scheduler for recurring actions (C7)
//! - A budget-bounded LLM planner loop (C8)
//! - A manifest-driven extension loader (C9)
//! - Notification fan-out to the database and outbound chat transports (C10)

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use infrastructure::database::DatabaseConnection;
