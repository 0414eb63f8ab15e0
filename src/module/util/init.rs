//! Prepares the resources needed by the application, such as directories and
//! configurations.

pub mod resource {
    use super::FieldcamProperty;

    /// Initialize the application resources and return a FieldcamProperty
    /// instance containing paths and configurations.
    pub fn init() -> FieldcamProperty {
        // Prepare the app data directory
        let paths = crate::module::util::path::dir::create_app_sub_dir();

        // Load the app configuration file
        let conf = crate::module::util::conf::toml::load(&paths.dir.data);

        FieldcamProperty { path: paths, conf }
    }
}

/// Properties of the app: paths and configurations.
#[derive(Debug, Clone)]
pub struct FieldcamProperty {
    pub path: crate::module::util::path::FieldcamPath,
    pub conf: crate::module::util::conf::Config,
}
