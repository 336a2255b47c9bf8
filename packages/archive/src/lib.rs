#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Fetch and extract steps of the coverage pipeline.
//!
//! [`download::download_file`] streams the zipped geodatabase to the
//! working directory and [`extract::extract_all`] unpacks it next to it.

pub mod download;
pub mod extract;

pub use download::{DownloadError, build_client, download_file};
pub use extract::{ArchiveError, extract_all};
