//! Discovery of CI base images from the Dockerfiles of a source checkout.
//!
//! Dockerfiles live at `openshift/ci-operator/<dir>/<dir>/Dockerfile`. Every
//! `FROM` line referencing the internal CI registry is parsed into a canonical
//! `namespace/name:tag` identity, and all spellings of the same identity are
//! collected so a configuration builder can accept any of them as input.

pub mod config;
pub mod discovery;
pub mod dockerfile;
pub mod output;
pub mod pullspec;

pub use discovery::{discover, BuildFile, DiscoveredImageSet, Discoverer, Discovery};
pub use dockerfile::{BuildContext, Scanner};
pub use pullspec::ImageStreamTagReference;
