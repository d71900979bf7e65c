//! Rendering of a discovery as ci-operator style configuration.

use std::collections::BTreeMap;
use clap::ValueEnum;
use serde::Serialize;
use thiserror::Error;
use crate::discovery::{DiscoveredImageSet, Discovery};
use crate::dockerfile::BuildContext;
use crate::pullspec::ImageStreamTagReference;

#[derive(Error, Debug)]
pub enum Error {
    #[error("base images {first} and {second} both render as key {key}")]
    KeyCollision {
        key: String,
        first: String,
        second: String,
    },

    #[error("serialize yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("serialize json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Yaml,
    Json,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ImageBuildInputs {
    #[serde(rename = "as")]
    pub aliases: Vec<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub context: BuildContext,
    pub dockerfile_path: String,
    pub inputs: BTreeMap<String, ImageBuildInputs>,
}

/// Everything a configuration builder needs from a discovery pass.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub base_images: BTreeMap<String, ImageStreamTagReference>,
    pub images: Vec<Image>,
    pub inputs: BTreeMap<String, ImageBuildInputs>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DockerfileList {
    pub images: Vec<DockerfileEntry>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DockerfileEntry {
    pub context: BuildContext,
    pub dockerfile_path: String,
}

impl Document {
    pub fn new(discovery: &Discovery) -> Result<Self, Error> {
        let mut base_images: BTreeMap<String, ImageStreamTagReference> = BTreeMap::new();
        for reference in discovery.images.base_images() {
            let key = reference.key();
            if let Some(existing) = base_images.get(&key) {
                return Err(Error::KeyCollision {
                    key,
                    first: format!("{}/{}:{}", existing.namespace, existing.name, existing.tag),
                    second: format!("{}/{}:{}", reference.namespace, reference.name, reference.tag),
                });
            }
            base_images.insert(key, reference.clone());
        }

        Ok(Self {
            base_images,
            images: discovery
                .build_files
                .iter()
                .map(|build_file| Image {
                    context: build_file.context,
                    dockerfile_path: build_file.dockerfile_path.clone(),
                    inputs: inputs(&build_file.inputs),
                })
                .collect(),
            inputs: inputs(&discovery.images),
        })
    }
}

impl DockerfileList {
    pub fn new(discovery: &Discovery) -> Self {
        Self {
            images: discovery
                .build_files
                .iter()
                .map(|build_file| DockerfileEntry {
                    context: build_file.context,
                    dockerfile_path: build_file.dockerfile_path.clone(),
                })
                .collect(),
        }
    }
}

fn inputs(images: &DiscoveredImageSet) -> BTreeMap<String, ImageBuildInputs> {
    images
        .iter()
        .map(|(reference, aliases)| {
            (
                reference.key(),
                ImageBuildInputs {
                    aliases: aliases.iter().cloned().collect(),
                },
            )
        })
        .collect()
}

pub fn render<T: Serialize>(value: &T, format: Format) -> Result<String, Error> {
    Ok(match format {
        Format::Yaml => serde_yaml::to_string(value)?,
        Format::Json => serde_json::to_string_pretty(value)?,
    })
}
