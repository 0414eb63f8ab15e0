//! Path Operations Module
//!
//! This module handles path operations for directories and files.

use std::path::PathBuf;

/// Join Paths
///
/// Takes a slice of strings and joins them into a single path string.
/// It uses the PathBuf type to handle platform-specific separators and conversions.
/// It returns the joined path as a String, or panics if the conversion fails.
pub fn join(paths: &[&str]) -> String {
    let mut path: PathBuf = PathBuf::new();
    for p in paths {
        path.push(p);
    }
    path.into_os_string().into_string().unwrap()
}

pub mod dir {
    //! Directory Operations Submodule

    use std::fs;
    use std::path::Path;

    use super::{FieldcamDir, FieldcamPath};
    use crate::module::define;

    /// Creates a directory with the joined path.
    /// Returns `Some(path)` if the directory creation succeeds, or `None` if it fails.
    pub fn create_dir_from_path_list(paths: &[&str]) -> Option<String> {
        let path = super::join(paths);
        match fs::create_dir_all(Path::new(&path)) {
            Ok(_) => Some(path),
            Err(_) => None,
        }
    }

    /// Creates a subdirectory named `name` in `dir1` if `dir1` exists,
    /// otherwise in `dir2`.
    pub fn create_subdir_in_either_dir(dir1: &str, dir2: &str, name: &str) -> Option<String> {
        let exist: bool = Path::new(dir1).is_dir();
        let parent: &str = match exist {
            true => dir1,
            false => dir2,
        };
        create_dir_from_path_list(&[parent, name])
    }

    /// Creates the application data directory under the persistent parent if
    /// it exists, falling back to the ephemeral parent.
    pub fn create_data_dir() -> String {
        let res = create_subdir_in_either_dir(
            define::path::PERSISTENT_DIR,
            define::path::EPHEMERAL_DIR,
            define::system::NAME,
        );
        match res {
            Some(path) => path,
            None => panic!("Can't Create Data Dir."),
        }
    }

    /// Creates the data and log directories and constructs the path
    /// configuration object.
    pub fn create_app_sub_dir() -> FieldcamPath {
        let data_dir = create_data_dir();
        let log_dir = create_dir_from_path_list(&[&data_dir, define::path::LOG_DIR]).unwrap();
        FieldcamPath {
            dir: FieldcamDir {
                data: data_dir,
                log: log_dir,
            },
        }
    }

    /// Creates the staging directory for captured stills under the home root.
    /// Idempotent. Unlike the helpers above, a failure here propagates:
    /// nothing downstream can succeed without the staging directory.
    pub fn create_staging_dir(root: &str) -> std::io::Result<String> {
        let path = super::join(&[root, define::path::STAGING_DIR]);
        fs::create_dir_all(Path::new(&path))?;
        Ok(path)
    }
}

/// Paths of Resources
///
/// This struct represents the paths of the resources used by the application.
#[derive(Debug, Clone)]
pub struct FieldcamPath {
    /// Directories Paths
    pub dir: FieldcamDir,
}

/// Paths of Directories
#[derive(Debug, Clone)]
pub struct FieldcamDir {
    /// Data Directory Path
    pub data: String,
    /// Log Directory Path
    pub log: String,
}
