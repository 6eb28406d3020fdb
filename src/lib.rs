//! Reads plain-text triangle meshes into a [`MeshStore`], writing a
//! human-readable mirror of every value parsed alongside.
//!
//! ```no_run
//! use meshmirror::MeshStore;
//!
//! let mut store = MeshStore::new();
//! store.ingest("plate.txt", "plate.mirror.txt")?;
//! store.print_nodes();
//! # Ok::<(), meshmirror::IngestError>(())
//! ```

pub mod config;
pub mod datatypes;
pub mod dump;
pub mod error;
pub mod logger;
pub mod reader;
pub mod store;

pub use config::IngestConfig;
pub use datatypes::{Element, Material, Node};
pub use error::{IngestError, Section};
pub use store::MeshStore;
