//! Production and mock implementations of the `cloud_interface` traits.
//!
//! - [`ProcessRunner`]: runs `gcloud`, `kubectl` and `git` as child processes
//! - [`RestCloudApi`]: Google Cloud REST APIs authenticated through gcloud
//! - [`mock`]: in-memory doubles used by the server's tests

pub mod gcloud;
pub mod mock;
pub mod rest;

pub use gcloud::{ProcessRunner, ProcessRunnerConfig};
pub use mock::{ApiCall, MockCloudApi, MockCommandRunner, MockResponse};
pub use rest::{Endpoints, RestCloudApi};
