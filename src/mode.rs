use std::path::{Path, PathBuf};

use crate::{
    data_loaders::settings::{ColorOverlay, Settings},
    error::{Error, Result},
    paths::COVER_SENTINEL,
    picker::{has_extension, AssetFilter, AssetFolder, AssetSource},
};

const ROOT_FILTERS: [AssetFilter; 2] = [AssetFilter::Extension("png"), AssetFilter::Extension("jpg")];
const OVERLAY_FILTERS: [AssetFilter; 1] = [AssetFilter::Extension("png")];
const WALLPAPER_FILTERS: [AssetFilter; 3] = [
    AssetFilter::Extension("png"),
    AssetFilter::Extension("jpg"),
    AssetFilter::Named(COVER_SENTINEL),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeFlag {
    /// An image is painted on top.
    Overlay,
    /// The background is a capture of the reading view.
    Book,
    /// The background is an image file.
    Wallpaper,
}

/// Set of [`ModeFlag`]s. `Book` and `Wallpaper` never coexist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayMode {
    overlay: bool,
    book: bool,
    wallpaper: bool,
}

impl DisplayMode {
    pub const NONE: Self = Self {
        overlay: false,
        book: false,
        wallpaper: false,
    };

    pub fn new(flags: &[ModeFlag]) -> Result<Self> {
        let mut mode = Self::NONE;
        for flag in flags {
            mode = mode.with(*flag)?;
        }
        Ok(mode)
    }

    pub fn with(self, flag: ModeFlag) -> Result<Self> {
        let mut next = self;
        match flag {
            ModeFlag::Overlay => next.overlay = true,
            ModeFlag::Book => next.book = true,
            ModeFlag::Wallpaper => next.wallpaper = true,
        }

        if next.book && next.wallpaper {
            return Err(Error::InvalidMode);
        }
        Ok(next)
    }

    pub fn without(self, flag: ModeFlag) -> Self {
        let mut next = self;
        match flag {
            ModeFlag::Overlay => next.overlay = false,
            ModeFlag::Book => next.book = false,
            ModeFlag::Wallpaper => next.wallpaper = false,
        }
        next
    }

    pub fn contains(&self, flag: ModeFlag) -> bool {
        match flag {
            ModeFlag::Overlay => self.overlay,
            ModeFlag::Book => self.book,
            ModeFlag::Wallpaper => self.wallpaper,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }

    pub fn flags(&self) -> Vec<ModeFlag> {
        [ModeFlag::Overlay, ModeFlag::Book, ModeFlag::Wallpaper]
            .into_iter()
            .filter(|flag| self.contains(*flag))
            .collect()
    }

    fn book() -> Self {
        Self {
            book: true,
            ..Self::NONE
        }
    }

    fn wallpaper() -> Self {
        Self {
            wallpaper: true,
            ..Self::NONE
        }
    }

    fn with_overlay(self) -> Self {
        Self {
            overlay: true,
            ..self
        }
    }
}

/// What the sleep cycle should do with a [`Resolution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan<'a> {
    /// Nothing to show; the host keeps its default behaviour.
    Skip,
    /// Copy this file into the scratch folder as-is.
    DirectCopy(&'a Path),
    /// Render layers with the compositor.
    Compose,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub mode: DisplayMode,
    /// Show the result as a panel over the host's current content.
    pub cover: bool,
    pub overlay: Option<PathBuf>,
    pub wallpaper: Option<PathBuf>,
}

impl Resolution {
    pub fn none() -> Self {
        Self {
            mode: DisplayMode::NONE,
            cover: false,
            overlay: None,
            wallpaper: None,
        }
    }

    pub fn plan(&self) -> Plan<'_> {
        if self.mode.is_empty() {
            return Plan::Skip;
        }

        match &self.wallpaper {
            Some(file) if !self.mode.contains(ModeFlag::Overlay) => Plan::DirectCopy(file),
            _ => Plan::Compose,
        }
    }

    /// Book captures use the book tint, everything else the wallpaper tint.
    pub fn tint<'a>(&self, settings: &'a Settings) -> &'a ColorOverlay {
        if self.mode.contains(ModeFlag::Book) {
            &settings.book
        } else {
            &settings.wallpaper
        }
    }
}

fn is_cover_sentinel(path: &Path) -> bool {
    path.file_name().and_then(|n| n.to_str()) == Some(COVER_SENTINEL)
}

fn is_transparent(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| has_extension(name, "png"))
}

/// Decides the display mode and assets for one sleep cycle.
///
/// The overlay search always runs before the wallpaper search. When reading,
/// an overlay comes from the asset root: a PNG is painted over the captured
/// page, while a JPG replaces the screen outright. Otherwise the overlay comes
/// from the wallpaper overlay folder and a background is looked up in the
/// wallpaper folder, where the `cover` sentinel (or nothing at all, if an
/// overlay was found) selects cover mode.
pub fn resolve<A: AssetSource + ?Sized>(
    is_reading: bool,
    assets: &mut A,
    settings: &Settings,
) -> Resolution {
    let mut resolution = Resolution::none();
    let mut mode = if is_reading {
        DisplayMode::book()
    } else {
        DisplayMode::wallpaper()
    };

    let candidate = if is_reading {
        assets.pick(AssetFolder::Root, &ROOT_FILTERS)
    } else if settings.show_image_overlay {
        assets.pick(AssetFolder::Overlay, &OVERLAY_FILTERS)
    } else {
        None
    };

    if let Some(file) = candidate {
        if is_transparent(&file) {
            mode = mode.with_overlay();
            resolution.overlay = Some(file);
        } else {
            mode = DisplayMode::wallpaper();
            resolution.wallpaper = Some(file);
        }
    }

    // A bare page capture adds nothing to what the host already shows.
    if mode.contains(ModeFlag::Book) && resolution.overlay.is_none() {
        return Resolution::none();
    }

    if mode.contains(ModeFlag::Wallpaper) && resolution.wallpaper.is_none() {
        match assets.pick(AssetFolder::Wallpaper, &WALLPAPER_FILTERS) {
            Some(file) if is_cover_sentinel(&file) => {
                resolution.cover = true;
                mode = mode.without(ModeFlag::Wallpaper);
            }
            Some(file) => resolution.wallpaper = Some(file),
            None if resolution.overlay.is_some() => {
                resolution.cover = true;
                mode = mode.without(ModeFlag::Wallpaper);
            }
            None => mode = DisplayMode::NONE,
        }
    }

    resolution.mode = mode;
    resolution
}
