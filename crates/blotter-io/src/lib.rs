#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/blotter/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod reader;
pub mod report;
pub mod writer;

pub use error::{IoError, Result};
pub use reader::{BlotterReader, REQUIRED_COLUMNS, ReaderConfig};
pub use report::RunSummary;
pub use writer::{BlotterWriter, WriterConfig, format_decimal};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
