use serde::Deserialize;
use serde_inline_default::serde_inline_default;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_CONFIG: &str = include_str!("../default.toml");

/// File name of a configuration file picked up implicitly from the repository root.
pub const DEFAULT_CONFIG_FILE: &str = "image-discovery.toml";

#[derive(Error, Debug)]
pub enum Error {
    #[error("read {path}: {err}")]
    ReadFile {
        err: std::io::Error,
        path: String,
    },

    #[error("deserialize: {0}")]
    Deserialize(#[from] toml::de::Error),
}

/// An image-discovery.toml file.
///
/// Keys missing from a user supplied file fall back to the values in
/// the [built-in config](../default.toml).
#[serde_inline_default]
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct File {
    pub description: Option<String>,

    /// Directory, relative to the repository root, holding the build files.
    #[serde_inline_default("openshift/ci-operator".to_string())]
    pub convention_directory: String,

    #[serde_inline_default("Dockerfile".to_string())]
    pub dockerfile_name: String,

    /// Build files below a directory with this name produce test images.
    #[serde_inline_default("test-images".to_string())]
    pub test_images_directory: String,

    /// Only lines containing this keyword are searched for base images.
    #[serde_inline_default("FROM ".to_string())]
    pub declaration_keyword: String,

    #[serde_inline_default(r"registry\.(|svc\.)ci\.openshift\.org/\S+".to_string())]
    pub registry_pattern: String,
}

impl Default for File {
    fn default() -> Self {
        // The default config is compiled into the program, so
        // make sure to test default() to catch panics compile-time.
        toml::from_str(DEFAULT_CONFIG).unwrap()
    }
}

impl File {
    pub fn parse(toml_string: &str) -> Result<Self, Error> {
        Ok(toml::from_str(toml_string)?)
    }

    /// Read a user configuration file, filling in defaults for any missing keys.
    pub fn default_with_user_config_file(path: &Path) -> Result<Self, Error> {
        Self::parse(&std::fs::read_to_string(path).map_err(|err| Error::ReadFile {
            err,
            path: path.display().to_string(),
        })?)
    }

    /// Directory searched for build files below `repository_directory`.
    pub fn convention_path(&self, repository_directory: &Path) -> PathBuf {
        self.convention_directory
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(repository_directory.to_path_buf(), |path, segment| path.join(segment))
    }
}

#[cfg(test)]
pub mod test {
    use super::File;
    use std::io::Write;
    use std::path::Path;

    #[test]
    pub fn load_default_configuration() {
        let cfg = File::default();
        assert_eq!(cfg.description, Some("Default configuration file".into()));
        assert_eq!(cfg.convention_directory, "openshift/ci-operator");
        assert_eq!(cfg.dockerfile_name, "Dockerfile");
        assert_eq!(cfg.test_images_directory, "test-images");
    }

    #[test]
    pub fn inline_defaults_match_builtin_file() {
        let empty = File::parse("").unwrap();
        let builtin = File::default();
        assert_eq!(empty.description, None);
        assert_eq!(
            File { description: builtin.description.clone(), ..empty },
            builtin
        );
    }

    #[test]
    pub fn user_file_overrides_single_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "test_images_directory = \"e2e-images\"").unwrap();

        let cfg = File::default_with_user_config_file(file.path()).unwrap();
        assert_eq!(cfg.test_images_directory, "e2e-images");
        assert_eq!(cfg.dockerfile_name, "Dockerfile");
    }

    #[test]
    pub fn missing_user_file() {
        let err = File::default_with_user_config_file(Path::new("/nonexistent/image-discovery.toml"))
            .unwrap_err();
        assert!(matches!(err, super::Error::ReadFile { .. }));
    }

    #[test]
    pub fn invalid_user_file() {
        assert!(matches!(
            File::parse("dockerfile_name = [1, 2]"),
            Err(super::Error::Deserialize(_))
        ));
    }

    #[test]
    pub fn convention_path_is_joined_per_segment() {
        let cfg = File::default();
        assert_eq!(
            cfg.convention_path(Path::new("/src/repo")),
            Path::new("/src/repo/openshift/ci-operator")
        );
    }
}
