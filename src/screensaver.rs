use std::{
    fs, io, mem,
    path::{Path, PathBuf},
};

use image::{DynamicImage, ImageFormat, ImageReader, Rgb, RgbImage};
use rand::{rngs::StdRng, Rng};

use crate::{
    compositor::{compose, Layers},
    data_loaders::settings::{Settings, SettingsStore},
    error::{Error, Result},
    host::{Host, Rect, ViewContext},
    info, logging,
    mode::{resolve, ModeFlag, Plan, Resolution},
    paths::{is_migration_excluded, ScreensaverPaths},
    picker::AssetPicker,
    warn, DEBUG_NAME,
};

/// State handed from a sleep-enter event to the following wake.
///
/// Every sleep-enter replaces it wholesale; the wake event takes it.
#[derive(Debug, Default)]
struct SleepCycle {
    image: Option<DynamicImage>,
    cover: bool,
    placeholder: Option<PathBuf>,
}

/// Builds the screensaver when the device goes to sleep and presents it when
/// the host shows its sleep view.
pub struct ScreensaverRuntime<R = StdRng> {
    paths: ScreensaverPaths,
    picker: AssetPicker<R>,
    settings: SettingsStore,
    cycle: SleepCycle,
}

impl ScreensaverRuntime<StdRng> {
    pub fn new(paths: ScreensaverPaths) -> Self {
        let settings = SettingsStore::new(paths.settings_file());
        Self {
            picker: AssetPicker::from_time(paths.clone()),
            paths,
            settings,
            cycle: SleepCycle::default(),
        }
    }
}

impl<R: Rng> ScreensaverRuntime<R> {
    pub fn with_rng(paths: ScreensaverPaths, rng: R) -> Self {
        let settings = SettingsStore::new(paths.settings_file());
        Self {
            picker: AssetPicker::new(paths.clone(), rng),
            paths,
            settings,
            cycle: SleepCycle::default(),
        }
    }

    /// The image waiting for the next wake event, if any.
    pub fn pending_image(&self) -> Option<&DynamicImage> {
        self.cycle.image.as_ref()
    }

    pub fn pending_cover(&self) -> bool {
        self.cycle.cover
    }

    /// Sleep-enter entry point. The host's own handler runs exactly once,
    /// after the screensaver has been prepared or abandoned.
    pub fn on_sleep_enter<H: Host + ?Sized>(&mut self, host: &mut H) {
        self.cycle = SleepCycle::default();
        self.prepare(host);
        host.forward_sleep();
    }

    /// Show-sleep-view entry point.
    pub fn on_show_sleep_view<H: Host + ?Sized>(&mut self, host: &mut H) {
        host.forward_show_sleep_view();

        let cycle = mem::take(&mut self.cycle);
        if let Some(placeholder) = &cycle.placeholder {
            remove_placeholder(placeholder);
        }

        let Some(image) = cycle.image else {
            return;
        };

        if cycle.cover {
            let bounds = host
                .current_view()
                .map(|view| Rect::from_size(view.bounds.size()))
                .unwrap_or_else(|| Rect::from_size(host.screen_size()));
            info!(
                "[{}][SHOW] Cover panel {}x{} at ({}, {})",
                DEBUG_NAME, bounds.width, bounds.height, bounds.x, bounds.y
            );
            host.show_foreground_panel(&image, bounds);
        } else {
            info!("[{}][SHOW] Replacing sleep image", DEBUG_NAME);
            host.replace_displayed_image(&image);
        }
    }

    fn prepare<H: Host + ?Sized>(&mut self, host: &H) {
        if !self.paths.scratch().is_dir() {
            info!(
                "[{}][SLEEP] {} missing, leaving sleep untouched",
                DEBUG_NAME,
                self.paths.scratch().display()
            );
            return;
        }

        let Some(view) = host.current_view() else {
            warn!("[{}][SLEEP] Current view unavailable", DEBUG_NAME);
            return;
        };

        self.ensure_folders();
        let migrated = self.migrate_scratch();
        if migrated > 0 {
            info!("[{}][SLEEP] Migrated {} file(s) into asset root", DEBUG_NAME, migrated);
        }
        self.reset_scratch();

        let settings = self.settings.load();
        logging::set_debug(settings.debug);

        let resolution = resolve(view.is_reading(), &mut self.picker, &settings);
        info!(
            "[{}][SLEEP] view='{}' mode={:?} cover={} overlay={:?} wallpaper={:?}",
            DEBUG_NAME,
            view.name,
            resolution.mode.flags(),
            resolution.cover,
            resolution.overlay,
            resolution.wallpaper
        );
        self.cycle.cover = resolution.cover;

        match resolution.plan() {
            Plan::Skip => {
                info!("[{}][SLEEP] Nothing to show", DEBUG_NAME);
            }
            Plan::DirectCopy(source) => match self.copy_direct(source) {
                Ok(target) => info!("[{}][SLEEP] Copied {}", DEBUG_NAME, target.display()),
                Err(e) => warn!("[{}][SLEEP] Direct copy failed: {e}", DEBUG_NAME),
            },
            Plan::Compose => {
                if !resolution.cover {
                    let placeholder = self.paths.placeholder_file();
                    match write_placeholder(&placeholder) {
                        Ok(()) => self.cycle.placeholder = Some(placeholder),
                        Err(e) => warn!("[{}][SLEEP] {e}", DEBUG_NAME),
                    }
                }
                self.cycle.image = self.render(host, &view, &resolution, &settings);
            }
        }
    }

    fn render<H: Host + ?Sized>(
        &self,
        host: &H,
        view: &ViewContext,
        resolution: &Resolution,
        settings: &Settings,
    ) -> Option<DynamicImage> {
        let capture = if resolution.mode.contains(ModeFlag::Book) {
            let capture = host.capture_region(view.bounds);
            if capture.is_none() {
                warn!("[{}][SLEEP] Page capture failed", DEBUG_NAME);
            }
            capture
        } else {
            None
        };
        let wallpaper = resolution.wallpaper.as_deref().and_then(decode_or_warn);
        let overlay = resolution.overlay.as_deref().and_then(decode_or_warn);

        let layers = Layers {
            capture: capture.as_ref(),
            wallpaper: wallpaper.as_ref(),
            overlay: overlay.as_ref(),
        };
        compose(resolution, &layers, host.screen_size(), settings)
    }

    fn ensure_folders(&self) {
        let overlay_dir = self.paths.overlay_dir();
        if let Err(e) = fs::create_dir_all(&overlay_dir) {
            warn!(
                "[{}][SLEEP] Failed to create {}: {e}",
                DEBUG_NAME,
                overlay_dir.display()
            );
        }
    }

    /// Moves loose files the user dropped into the scratch folder over to the
    /// asset root. Existing names in the asset root win.
    fn migrate_scratch(&self) -> usize {
        let Ok(entries) = fs::read_dir(self.paths.scratch()) else {
            return 0;
        };

        let mut moved = 0;
        for entry in entries.flatten() {
            if !entry.file_type().is_ok_and(|t| t.is_file()) {
                continue;
            }

            let name = entry.file_name();
            if name.to_str().is_some_and(is_migration_excluded) {
                continue;
            }

            let dest = self.paths.asset_root().join(&name);
            if dest.exists() {
                continue;
            }

            match fs::rename(entry.path(), &dest) {
                Ok(()) => moved += 1,
                Err(e) => warn!(
                    "[{}][SLEEP] Failed to move {}: {e}",
                    DEBUG_NAME,
                    entry.path().display()
                ),
            }
        }
        moved
    }

    fn reset_scratch(&self) {
        let scratch = self.paths.scratch();
        if let Err(e) = fs::remove_dir_all(scratch) {
            warn!("[{}][SLEEP] Failed to empty {}: {e}", DEBUG_NAME, scratch.display());
        }
        if let Err(e) = fs::create_dir_all(scratch) {
            warn!("[{}][SLEEP] Failed to recreate {}: {e}", DEBUG_NAME, scratch.display());
        }
    }

    fn copy_direct(&self, source: &Path) -> Result<PathBuf> {
        let extension = source
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("png");
        let target = self.paths.direct_copy_target(extension);
        fs::copy(source, &target).map_err(|e| Error::io(source, e))?;
        Ok(target)
    }
}

pub fn decode_asset(path: &Path) -> Result<DynamicImage> {
    ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| Error::io(path, e))?
        .decode()
        .map_err(|e| Error::image(path, e))
}

fn decode_or_warn(path: &Path) -> Option<DynamicImage> {
    match decode_asset(path) {
        Ok(image) => Some(image),
        Err(e) => {
            warn!("[{}][SLEEP] Skipping layer: {e}", DEBUG_NAME);
            None
        }
    }
}

/// Writes a 1x1 black PNG.
pub fn write_placeholder(path: &Path) -> Result<()> {
    RgbImage::from_pixel(1, 1, Rgb([0, 0, 0]))
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| Error::image(path, e))
}

fn remove_placeholder(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("[{}][SHOW] Failed to remove {}: {e}", DEBUG_NAME, path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_a_decodable_one_pixel_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.png");
        write_placeholder(&path).unwrap();

        let image = decode_asset(&path).unwrap();
        assert_eq!((image.width(), image.height()), (1, 1));
    }

    #[test]
    fn undecodable_assets_report_an_image_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        fs::write(&path, b"definitely not a png").unwrap();
        assert!(matches!(decode_asset(&path), Err(Error::Image { .. })));
        assert!(matches!(
            decode_asset(&dir.path().join("absent.png")),
            Err(Error::Io { .. })
        ));
    }

    #[test]
    fn removing_a_missing_placeholder_is_quiet() {
        let dir = tempfile::tempdir().unwrap();
        remove_placeholder(&dir.path().join("gone.png"));
    }
}
