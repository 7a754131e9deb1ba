//! `NestDB` - Path-Addressed Nested Buckets
//!
//! `NestDB` stores values in a tree of named buckets inside a single embedded
//! database file. Every operation names its bucket by a path, root-first, and
//! missing buckets along a write path are created on demand.
//!
//! # Quick Start
//!
//! ```ignore
//! use nestdb::{Config, Resolution, Store};
//!
//! let mut store = Store::new(Config::new("data/app.db"));
//! store.open()?;
//!
//! // A write session commits only if none of its operations failed
//! let mut session = store.write_session()?;
//! session.write(&["users", "alice"], "email", b"alice@example.com")?;
//! let id = session.next_seq(&["users"])?;
//! assert_eq!(session.close()?, Resolution::Committed);
//!
//! // Read sessions always roll back
//! let mut session = store.read_session()?;
//! let email = session.read(&["users", "alice"], "email")?;
//! session.close()?;
//! ```
//!
//! ## Listing
//!
//! Listings are paged. Pass an empty token for the first page and the
//! returned `next_token` until it comes back empty:
//!
//! ```ignore
//! let mut token = String::new();
//! loop {
//!     let page = session.list_keys(&["users"], &token)?;
//!     for key in &page.items {
//!         println!("{key}");
//!     }
//!     if page.is_last() {
//!         break;
//!     }
//!     token = page.next_token;
//! }
//! ```
//!
//! ## Ad-hoc Operations
//!
//! [`Store::auto_commit`] returns a handle that runs each call in its own
//! transaction, committing every successful mutation immediately.
//!
//! # Modules
//!
//! - [`Store`] - Opening and closing the database file
//! - [`Session`] - A unit of work over one transaction
//! - [`AutoCommit`] - One transaction per operation
//! - [`Config`] - Store configuration

mod auto_commit;
mod config;
mod error;
mod ops;
mod page;
mod path;
mod session;
mod store;

pub use auto_commit::AutoCommit;
pub use config::Config;
pub use error::{Error, Result};
pub use page::{Page, Scan, PAGE_SIZE};
pub use session::{Access, Outcome, Resolution, Session};
pub use store::Store;
