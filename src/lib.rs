// Copyright 2024 RisingLight Project Authors. Licensed under Apache-2.0.

//! A SQL driver over file-backed datasets.
//!
//! Tables are datasets under a storage root, located by name through the path
//! layout of the connection's format. Tables referenced by a query are bound into
//! the session just before it runs, and their schemas are kept for metadata queries.
//!
//! ```no_run
//! # async fn demo() -> Result<(), filelight::Error> {
//! let session = filelight::connect_url("filelight:/data?format=csv", Default::default())?;
//! let batches = session.run("SELECT * FROM orders").await?;
//! let columns = session.describe_table("orders")?;
//! # Ok(())
//! # }
//! ```

#![deny(unused_must_use)]

pub mod binder;
pub mod catalog;
pub mod config;
pub mod parser;
mod session;
pub mod storage;
pub mod types;

pub use self::session::{Error, ErrorKind, Session, SessionBuilder, connect, connect_url};
