// ~/nickel-screensaver/src/paths.rs

use std::path::{Path, PathBuf};

pub const KOBO_ASSET_ROOT: &str = "/mnt/onboard/.adds/screensaver";
pub const KOBO_SCRATCH_DIR: &str = "/mnt/onboard/.kobo/screensaver";

pub const WALLPAPER_DIR_NAME: &str = "wallpaper";
pub const OVERLAY_DIR_NAME: &str = "overlay";
/// Extension-less sentinel inside the wallpaper folder selecting cover mode.
pub const COVER_SENTINEL: &str = "cover";

pub const SETTINGS_FILE_NAME: &str = "_settings.yaml";
pub const LEGACY_SETTINGS_FILE_NAME: &str = "_settings.ini";
pub const LOG_FILE_NAME: &str = "nickel-screensaver.log";
pub const OUTPUT_BASE_NAME: &str = "nickel-screensaver";

/// Files in the scratch folder that are never migrated into the asset root.
pub const MIGRATION_EXCLUDES: [&str; 4] = [
    SETTINGS_FILE_NAME,
    LEGACY_SETTINGS_FILE_NAME,
    "nickel-screensaver.png",
    "nickel-screensaver.jpg",
];

/// The two folders the engine works with: the user's asset root and the
/// host-owned scratch folder the host reads its screensaver from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreensaverPaths {
    asset_root: PathBuf,
    scratch: PathBuf,
}

impl ScreensaverPaths {
    pub fn new(asset_root: impl Into<PathBuf>, scratch: impl Into<PathBuf>) -> Self {
        Self {
            asset_root: asset_root.into(),
            scratch: scratch.into(),
        }
    }

    pub fn kobo() -> Self {
        Self::new(KOBO_ASSET_ROOT, KOBO_SCRATCH_DIR)
    }

    pub fn asset_root(&self) -> &Path {
        &self.asset_root
    }

    pub fn scratch(&self) -> &Path {
        &self.scratch
    }

    pub fn wallpaper_dir(&self) -> PathBuf {
        self.asset_root.join(WALLPAPER_DIR_NAME)
    }

    pub fn overlay_dir(&self) -> PathBuf {
        self.wallpaper_dir().join(OVERLAY_DIR_NAME)
    }

    pub fn cover_sentinel(&self) -> PathBuf {
        self.wallpaper_dir().join(COVER_SENTINEL)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.asset_root.join(SETTINGS_FILE_NAME)
    }

    pub fn log_file(&self) -> PathBuf {
        self.asset_root.join(LOG_FILE_NAME)
    }

    /// 1x1 image written so the host finds *some* screensaver file.
    pub fn placeholder_file(&self) -> PathBuf {
        self.direct_copy_target("png")
    }

    pub fn direct_copy_target(&self, extension: &str) -> PathBuf {
        self.scratch
            .join(format!("{OUTPUT_BASE_NAME}.{}", extension.to_ascii_lowercase()))
    }
}

pub fn is_migration_excluded(file_name: &str) -> bool {
    MIGRATION_EXCLUDES.contains(&file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_hangs_off_the_asset_root() {
        let paths = ScreensaverPaths::new("/a", "/s");
        assert_eq!(paths.overlay_dir(), PathBuf::from("/a/wallpaper/overlay"));
        assert_eq!(paths.cover_sentinel(), PathBuf::from("/a/wallpaper/cover"));
        assert_eq!(paths.settings_file(), PathBuf::from("/a/_settings.yaml"));
        assert_eq!(paths.placeholder_file(), PathBuf::from("/s/nickel-screensaver.png"));
        assert_eq!(paths.direct_copy_target("JPG"), PathBuf::from("/s/nickel-screensaver.jpg"));
    }

    #[test]
    fn generated_outputs_are_not_migrated() {
        assert!(is_migration_excluded("nickel-screensaver.jpg"));
        assert!(is_migration_excluded("_settings.ini"));
        assert!(!is_migration_excluded("holiday.png"));
    }
}
