//! # sched-cli
//!
//! Administration tools for the scheduler control daemon.
//!
//! - `schedacct` - create, modify, list, find, block and remove accounts,
//!   users and QoS policies
//! - `schedctl` - inspect nodes, partitions and jobs, change job limits,
//!   drain/resume nodes, dump the configuration
//!
//! # Architecture
//!
//! Both binaries parse arguments with [`cli`], validate them into a plan
//! ([`commands`]), then connect to the daemon through [`client::CtldClient`]
//! and run the plan. Modifications are resolved by [`resolve`] into ordered
//! attribute changes and sent one at a time by [`dispatch`].
//!
//! ```text
//! ┌───────────┐    ctl protocol     ┌────────────┐
//! │ schedacct │◄───────────────────►│            │
//! ├───────────┤    (WebSocket)      │    ctld    │
//! │ schedctl  │◄───────────────────►│            │
//! └───────────┘                     └────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod fieldfmt;
pub mod flatten;
pub mod output;
pub mod query;
pub mod resolve;
pub mod units;

pub use cli::{AcctCli, CtlCli, Format};
pub use client::{ControlClient, CtldClient, Transport};
pub use error::CliError;
pub use output::OutputFormat;
