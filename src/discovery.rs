//! Discovery of base images across all Dockerfiles of a repository.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};
use glob::Pattern;
use log::{debug, info};
use thiserror::Error;
use crate::config;
use crate::dockerfile::{self, BuildContext, Scanner};
use crate::pullspec::{self, ImageStreamTagReference};

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed while discovering container images in {dir}: {err}")]
    Pattern {
        err: glob::PatternError,
        dir: String,
    },

    #[error("failed while discovering container images in {dir}: {err}")]
    Glob {
        err: glob::GlobError,
        dir: String,
    },

    #[error("could not get pull images from dockerfile: {0}")]
    Dockerfile(#[from] dockerfile::Error),

    #[error("failed to parse string {pull_string} in {path} as pullspec: {err}")]
    PullSpec {
        err: pullspec::Error,
        pull_string: String,
        path: String,
    },
}

/// Base images keyed by canonical identity, each with every pull string that resolves to it.
///
/// Different registries can resolve to the same identity, e.g.
/// `registry.ci.openshift.org/ns/base` and `registry.svc.ci.openshift.org/ns/base`,
/// so a build step must accept either spelling as an input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredImageSet {
    images: BTreeMap<ImageStreamTagReference, BTreeSet<String>>,
}

impl DiscoveredImageSet {
    pub fn insert(&mut self, reference: ImageStreamTagReference, pull_string: &str) {
        self.images
            .entry(reference)
            .or_default()
            .insert(pull_string.to_string());
    }

    /// Required base images, in identity order.
    pub fn base_images(&self) -> impl Iterator<Item = &ImageStreamTagReference> {
        self.images.keys()
    }

    /// Sorted pull strings known to resolve to `reference`.
    pub fn aliases(&self, reference: &ImageStreamTagReference) -> Option<&BTreeSet<String>> {
        self.images.get(reference)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ImageStreamTagReference, &BTreeSet<String>)> {
        self.images.iter()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// A Dockerfile found below the convention directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildFile {
    /// Location on disk, as found while globbing.
    pub path: PathBuf,

    /// Path relative to the repository root, with `/` separators.
    pub dockerfile_path: String,

    pub context: BuildContext,

    /// Base images declared by this Dockerfile alone.
    pub inputs: DiscoveredImageSet,
}

/// Result of a single discovery pass over a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    pub images: DiscoveredImageSet,
    pub build_files: Vec<BuildFile>,
}

pub struct Discoverer {
    cfg: config::File,
    scanner: Scanner,
}

impl Discoverer {
    pub fn new(cfg: config::File) -> Result<Self, Error> {
        let scanner = Scanner::from_config(&cfg)?;
        Ok(Self { cfg, scanner })
    }

    /// Sorted paths of all Dockerfiles exactly two directories below the convention directory.
    pub fn dockerfiles(&self, repository_directory: &Path) -> Result<Vec<PathBuf>, Error> {
        let dir = self.cfg.convention_path(repository_directory);
        let dir_name = dir.display().to_string();
        let pattern = format!(
            "{}/*/*/{}",
            Pattern::escape(&dir.to_string_lossy()),
            Pattern::escape(&self.cfg.dockerfile_name),
        );

        let mut dockerfiles = glob::glob(&pattern)
            .map_err(|err| Error::Pattern {
                err,
                dir: dir_name.clone(),
            })?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| Error::Glob {
                err,
                dir: dir_name.clone(),
            })?;
        dockerfiles.sort();

        Ok(dockerfiles)
    }

    /// Scan and parse a single Dockerfile.
    pub fn build_file(&self, repository_directory: &Path, path: &Path) -> Result<BuildFile, Error> {
        let mut inputs = DiscoveredImageSet::default();
        for pull_string in self.scanner.scan(path)? {
            let reference = pullspec::parse(&pull_string).map_err(|err| Error::PullSpec {
                err,
                pull_string: pull_string.clone(),
                path: path.display().to_string(),
            })?;
            debug!("{pull_string} resolves to {reference}");
            inputs.insert(reference, &pull_string);
        }

        let relative = path.strip_prefix(repository_directory).unwrap_or(path);
        Ok(BuildFile {
            path: path.to_path_buf(),
            dockerfile_path: slash_path(relative),
            context: BuildContext::from_path(relative, &self.cfg.test_images_directory),
            inputs,
        })
    }

    /// Discover all base images of the repository.
    ///
    /// Any unreadable Dockerfile or unparseable pull string fails the whole pass.
    pub fn discover(&self, repository_directory: &Path) -> Result<Discovery, Error> {
        info!("{}: discovering images", repository_directory.display());

        let dockerfiles = self.dockerfiles(repository_directory)?;
        info!(
            "{}: discovered {} Dockerfiles",
            repository_directory.display(),
            dockerfiles.len()
        );

        let mut discovery = Discovery::default();
        for path in dockerfiles {
            let build_file = self.build_file(repository_directory, &path)?;
            debug!(
                "{} ({:?}): {} base images",
                build_file.dockerfile_path,
                build_file.context,
                build_file.inputs.len()
            );
            for (reference, aliases) in build_file.inputs.iter() {
                for alias in aliases {
                    discovery.images.insert(reference.clone(), alias);
                }
            }
            discovery.build_files.push(build_file);
        }

        Ok(discovery)
    }
}

/// Discover base images using the built-in configuration.
pub fn discover(repository_directory: &Path) -> Result<Discovery, Error> {
    Discoverer::new(config::File::default())?.discover(repository_directory)
}

fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
