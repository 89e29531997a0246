// ~/nickel-screensaver/src/bootstrap.rs

use std::fs;

use crate::data_loaders::settings::{Settings, SettingsStore};
use crate::logging;
use crate::paths::ScreensaverPaths;
use crate::{error, info, warn, NAME};

/// One-time setup when the host loads the screensaver: folder layout, the
/// cover sentinel on fresh installs, a self-healed settings file and logging.
pub fn bootstrap(paths: &ScreensaverPaths) -> Settings {
    let had_wallpaper_dir = paths.wallpaper_dir().is_dir();

    // Create directory structure
    let overlay_dir = paths.overlay_dir();
    let dirs_ok = fs::create_dir_all(&overlay_dir).is_ok();

    logging::init(false, &paths.log_file());
    info!("[{}] === Bootstrap starting ===", NAME);
    if !dirs_ok {
        warn!("[{}] Failed to create {}", NAME, overlay_dir.display());
    }

    // Fresh installs default to cover mode
    if !had_wallpaper_dir {
        scaffold_cover_sentinel(paths);
    }

    let store = SettingsStore::new(paths.settings_file());
    let settings = match store.heal() {
        Ok(settings) => settings,
        Err(e) => {
            error!("[{}] Failed to save settings: {e}", NAME);
            store.load()
        }
    };
    logging::set_debug(settings.debug);

    info!("[{}] Bootstrap complete, settings at {}", NAME, store.path().display());
    settings
}

fn scaffold_cover_sentinel(paths: &ScreensaverPaths) {
    let path = paths.cover_sentinel();
    if path.exists() {
        return;
    }

    match fs::write(&path, b"") {
        Ok(_) => info!("[{}] Created wallpaper/cover", NAME),
        Err(e) => warn!("[{}] Failed to create wallpaper/cover: {e}", NAME),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_install_gets_folders_sentinel_and_settings() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ScreensaverPaths::new(dir.path().join("adds"), dir.path().join("kobo"));

        let settings = bootstrap(&paths);

        assert_eq!(settings, Settings::default());
        assert!(paths.overlay_dir().is_dir());
        assert!(paths.cover_sentinel().is_file());
        let saved = fs::read_to_string(paths.settings_file()).unwrap();
        assert!(saved.contains("ColorOverlayAlpha"));
    }

    #[test]
    fn existing_wallpaper_folder_gets_no_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ScreensaverPaths::new(dir.path(), dir.path().join("kobo"));
        fs::create_dir_all(paths.wallpaper_dir()).unwrap();
        fs::write(
            paths.settings_file(),
            "Wallpaper:\n  ColorOverlay: '000000'\n  ColorOverlayAlpha: 130\n",
        )
        .unwrap();

        let settings = bootstrap(&paths);

        assert!(!paths.cover_sentinel().exists());
        assert!(paths.overlay_dir().is_dir());
        assert_eq!(settings.wallpaper.color, "000000");
        assert_eq!(settings.wallpaper.alpha, 100);
        assert_eq!(SettingsStore::new(paths.settings_file()).load().wallpaper.alpha, 100);
    }

    #[test]
    fn unwritable_settings_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ScreensaverPaths::new(dir.path(), dir.path().join("kobo"));
        fs::create_dir_all(paths.settings_file()).unwrap();

        let settings = bootstrap(&paths);

        assert_eq!(settings, Settings::default());
        assert!(paths.settings_file().is_dir());
        assert!(paths.overlay_dir().is_dir());
    }
}
