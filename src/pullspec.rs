use std::fmt::{Display, Formatter};
use serde::Serialize;
use thiserror::Error;

/// Namespace assigned to pull strings without a namespace segment, e.g. `busybox`.
pub const NAMESPACE_SENTINEL: &str = "_";

/// Tag assigned to pull strings without a `:tag` suffix.
pub const DEFAULT_TAG: &str = "latest";

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("pull string {pull_string:?} couldn't be parsed, expected between one and three elements after splitting on '/', got {segments}")]
    MalformedReference {
        pull_string: String,
        segments: usize,
    },

    #[error("pull string {0:?} has an empty repository name")]
    EmptyRepository(String),
}

/// Canonical identity of a base image, independent of the registry host
/// used to reference it.
///
/// Ordering and equality are structural, so two identities are never
/// merged just because their rendered keys happen to look alike.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ImageStreamTagReference {
    pub namespace: String,
    pub name: String,
    pub tag: String,
}

impl ImageStreamTagReference {
    /// Key used for this identity in rendered configuration, `namespace_name_tag`.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl Display for ImageStreamTagReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}_{}_{}", self.namespace, self.name, self.tag))
    }
}

/// Parse a pull string of the form `[registry/][namespace/]repository[:tag]`.
///
/// The registry host is discarded. A repository segment containing more
/// than one colon is kept whole and gets the default tag.
pub fn parse(pull_string: &str) -> Result<ImageStreamTagReference, Error> {
    if pull_string.is_empty() {
        return Err(Error::MalformedReference {
            pull_string: pull_string.to_string(),
            segments: 0,
        });
    }

    let segments: Vec<&str> = pull_string.split('/').collect();
    let (namespace, repository) = match segments.as_slice() {
        [repository] => (NAMESPACE_SENTINEL, *repository),
        [namespace, repository] => (*namespace, *repository),
        [_registry, namespace, repository] => (*namespace, *repository),
        _ => {
            return Err(Error::MalformedReference {
                pull_string: pull_string.to_string(),
                segments: segments.len(),
            })
        }
    };

    let (name, tag) = match repository.split(':').collect::<Vec<_>>().as_slice() {
        [name, tag] => (*name, *tag),
        _ => (repository, DEFAULT_TAG),
    };

    if name.is_empty() {
        return Err(Error::EmptyRepository(pull_string.to_string()));
    }

    Ok(ImageStreamTagReference {
        namespace: namespace.to_string(),
        name: name.to_string(),
        tag: tag.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(namespace: &str, name: &str, tag: &str) -> ImageStreamTagReference {
        ImageStreamTagReference {
            namespace: namespace.into(),
            name: name.into(),
            tag: tag.into(),
        }
    }

    #[test]
    fn registry_host_is_discarded() {
        assert_eq!(parse("quay.io/org/repo:v1"), Ok(reference("org", "repo", "v1")));
        assert_eq!(
            parse("registry.ci.openshift.org/ocp/builder:golang"),
            Ok(reference("ocp", "builder", "golang"))
        );
    }

    #[test]
    fn bare_repository_gets_sentinel_namespace_and_default_tag() {
        assert_eq!(parse("repo"), Ok(reference("_", "repo", "latest")));
        assert_eq!(parse("repo:1.2"), Ok(reference("_", "repo", "1.2")));
    }

    #[test]
    fn namespace_and_repository() {
        assert_eq!(parse("openshift/release"), Ok(reference("openshift", "release", "latest")));
        assert_eq!(
            parse("openshift/release:golang-1.21"),
            Ok(reference("openshift", "release", "golang-1.21"))
        );
    }

    #[test]
    fn too_many_segments_are_rejected() {
        assert_eq!(
            parse("registry.ci.openshift.org/a/b/c:tag"),
            Err(Error::MalformedReference {
                pull_string: "registry.ci.openshift.org/a/b/c:tag".into(),
                segments: 4,
            })
        );
        assert!(matches!(
            parse("a/b/c/d/e"),
            Err(Error::MalformedReference { segments: 5, .. })
        ));
    }

    #[test]
    fn empty_pull_string_is_rejected() {
        assert_eq!(
            parse(""),
            Err(Error::MalformedReference {
                pull_string: "".into(),
                segments: 0,
            })
        );
    }

    #[test]
    fn empty_repository_name_is_rejected() {
        assert_eq!(parse("ns/:v1"), Err(Error::EmptyRepository("ns/:v1".into())));
        assert_eq!(parse("ns/"), Err(Error::EmptyRepository("ns/".into())));
    }

    #[test]
    fn multiple_colons_keep_repository_whole() {
        assert_eq!(parse("ns/repo:a:b"), Ok(reference("ns", "repo:a:b", "latest")));
    }

    #[test]
    fn parsing_is_idempotent() {
        let pull_string = "registry.svc.ci.openshift.org/ns/base:latest";
        assert_eq!(parse(pull_string), parse(pull_string));
    }

    #[test]
    fn different_registries_share_a_key() {
        let ci = parse("registry.ci.openshift.org/ns/base:latest").unwrap();
        let svc = parse("registry.svc.ci.openshift.org/ns/base:latest").unwrap();
        assert_eq!(ci, svc);
        assert_eq!(ci.key(), "ns_base_latest");
    }
}
