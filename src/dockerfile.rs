//! Extraction of base image pull strings from Dockerfiles.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Component, Path};
use log::debug;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use crate::config;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to open Dockerfile {path}: {err}")]
    Open {
        err: std::io::Error,
        path: String,
    },

    #[error("failed to read Dockerfile {path}: {err}")]
    Read {
        err: std::io::Error,
        path: String,
    },

    #[error("invalid registry pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Whether a Dockerfile produces an image shipped to production or one used only by tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildContext {
    Production,
    Test,
}

impl BuildContext {
    /// `Test` if any directory in `path` is named `test_images_directory`.
    pub fn from_path(path: &Path, test_images_directory: &str) -> Self {
        let is_test = path.components().any(|component| match component {
            Component::Normal(segment) => segment == test_images_directory,
            _ => false,
        });
        if is_test {
            BuildContext::Test
        } else {
            BuildContext::Production
        }
    }
}

/// Finds base image declarations that reference the internal CI registry.
///
/// Declarations of any other image, e.g. `FROM busybox`, are ignored.
#[derive(Debug, Clone)]
pub struct Scanner {
    keyword: String,
    registry: Regex,
}

impl Scanner {
    pub fn new(keyword: &str, registry_pattern: &str) -> Result<Self, Error> {
        Ok(Self {
            keyword: keyword.to_string(),
            registry: Regex::new(registry_pattern)?,
        })
    }

    pub fn from_config(cfg: &config::File) -> Result<Self, Error> {
        Self::new(&cfg.declaration_keyword, &cfg.registry_pattern)
    }

    /// Pull string on a single line, if the line is a declaration of an internal base image.
    pub fn pull_string<'a>(&self, line: &'a str) -> Option<&'a str> {
        if !line.contains(&self.keyword) {
            return None;
        }
        self.registry.find(line).map(|m| m.as_str())
    }

    /// All pull strings in `path`, in file order. Duplicates are kept.
    pub fn scan(&self, path: &Path) -> Result<Vec<String>, Error> {
        let file = File::open(path).map_err(|err| Error::Open {
            err,
            path: path.display().to_string(),
        })?;

        let mut images = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|err| Error::Read {
                err,
                path: path.display().to_string(),
            })?;
            if let Some(pull_string) = self.pull_string(&line) {
                debug!("{}: found base image {pull_string}", path.display());
                images.push(pull_string.to_string());
            }
        }

        Ok(images)
    }
}

impl Default for Scanner {
    fn default() -> Self {
        // The built-in pattern is compiled into the program and exercised by the tests below.
        Self::from_config(&config::File::default()).unwrap()
    }
}
