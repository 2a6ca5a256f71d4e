use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

const APP_NAME: &str = "reach-poster";

pub fn app_root() -> PathBuf {
    if let Some(project_dirs) = ProjectDirs::from("", "", APP_NAME) {
        return project_dirs.data_dir().to_path_buf();
    }

    if let Some(base_dirs) = BaseDirs::new() {
        return base_dirs.data_local_dir().join(APP_NAME);
    }

    std::env::temp_dir().join(APP_NAME)
}

pub fn default_db_path() -> String {
    app_root()
        .join("data")
        .join("scheduled_posts.db")
        .to_string_lossy()
        .to_string()
}

pub fn default_image_dir() -> String {
    app_root()
        .join("generated_images")
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_live_under_app_root() {
        let root = app_root();
        assert!(PathBuf::from(default_db_path()).starts_with(&root));
        assert!(default_db_path().ends_with("scheduled_posts.db"));
        assert!(PathBuf::from(default_image_dir()).starts_with(&root));
    }
}
