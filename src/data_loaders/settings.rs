use std::path::{Path, PathBuf};

use image::Rgba;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use super::yaml::{load_yaml, load_yaml_as, save_yaml};
use crate::error::Result;

pub const BOOK_GROUP: &str = "Book";
pub const WALLPAPER_GROUP: &str = "Wallpaper";
pub const DEVELOPMENT_GROUP: &str = "Development";

pub const COLOR_OVERLAY: &str = "ColorOverlay";
pub const COLOR_OVERLAY_ALPHA: &str = "ColorOverlayAlpha";
pub const SHOW_IMAGE_OVERLAY: &str = "ShowImageOverlay";
pub const DEBUG: &str = "Debug";

pub const DEFAULT_COLOR: &str = "ffffff";
pub const MAX_ALPHA: u8 = 100;

/// A flat color layer painted between background and overlay image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorOverlay {
    /// Hex digits without the leading `#`.
    pub color: String,
    /// Opacity in percent, always within `0..=100`.
    pub alpha: u8,
}

impl Default for ColorOverlay {
    fn default() -> Self {
        Self {
            color: DEFAULT_COLOR.to_string(),
            alpha: 0,
        }
    }
}

impl ColorOverlay {
    /// The pixel to blend over the canvas, or `None` when the layer is
    /// invisible or the color string does not parse.
    pub fn fill(&self) -> Option<Rgba<u8>> {
        if self.alpha == 0 || self.color.is_empty() {
            return None;
        }

        let [r, g, b] = parse_hex_color(&self.color)?;
        let alpha = u32::from(self.alpha.min(MAX_ALPHA)) * 255 / 100;
        Some(Rgba([r, g, b, alpha as u8]))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub book: ColorOverlay,
    pub wallpaper: ColorOverlay,
    /// Paint overlay-folder images over wallpapers when not reading.
    pub show_image_overlay: bool,
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            book: ColorOverlay::default(),
            wallpaper: ColorOverlay::default(),
            show_image_overlay: true,
            debug: false,
        }
    }
}

/// Color strings read with their scalar text intact. Untyped YAML would turn
/// hex digits such as `123e45` into floats.
#[derive(Debug, Default, Deserialize)]
pub struct ColorText {
    #[serde(rename = "Book")]
    book: Option<GroupColorText>,
    #[serde(rename = "Wallpaper")]
    wallpaper: Option<GroupColorText>,
}

#[derive(Debug, Default, Deserialize)]
struct GroupColorText {
    #[serde(rename = "ColorOverlay")]
    color_overlay: Option<String>,
}

impl Settings {
    pub fn from_yaml(root: &Value, colors: Option<ColorText>) -> Self {
        let mut settings = Self::default();
        let Some(map) = root.as_mapping() else {
            return settings;
        };
        let colors = colors.unwrap_or_default();

        if let Some(book) = mapping_at(map, BOOK_GROUP) {
            settings.book = parse_color_overlay(book, colors.book);
        }

        if let Some(wallpaper) = mapping_at(map, WALLPAPER_GROUP) {
            settings.wallpaper = parse_color_overlay(wallpaper, colors.wallpaper);
            settings.show_image_overlay =
                bool_at(wallpaper, SHOW_IMAGE_OVERLAY).unwrap_or(settings.show_image_overlay);
        }

        if let Some(dev) = mapping_at(map, DEVELOPMENT_GROUP) {
            settings.debug = bool_at(dev, DEBUG).unwrap_or(settings.debug);
        }

        settings
    }

    /// Writes every recognized key into `root`, keeping unknown keys and the
    /// existing key order intact.
    fn write_into(&self, root: &mut Mapping) {
        write_group(root, BOOK_GROUP, |book| write_color_overlay(book, &self.book));

        write_group(root, WALLPAPER_GROUP, |wallpaper| {
            write_color_overlay(wallpaper, &self.wallpaper);
            wallpaper.insert(key(SHOW_IMAGE_OVERLAY), Value::Bool(self.show_image_overlay));
        });

        write_group(root, DEVELOPMENT_GROUP, |dev| {
            dev.insert(key(DEBUG), Value::Bool(self.debug));
        });
    }
}

/// Key/value persistence of [`Settings`] in a grouped YAML file.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file, broken YAML and malformed entries all fall back to
    /// defaults; alpha values come back clamped.
    pub fn load(&self) -> Settings {
        load_yaml(&self.path)
            .map(|root| Settings::from_yaml(&root, load_yaml_as(&self.path)))
            .unwrap_or_default()
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        let mut root = load_yaml(&self.path)
            .and_then(|v| v.as_mapping().cloned())
            .unwrap_or_default();
        settings.write_into(&mut root);
        save_yaml(&self.path, &root)
    }

    /// Load then save, so the file on disk always holds valid values.
    pub fn heal(&self) -> Result<Settings> {
        let settings = self.load();
        self.save(&settings)?;
        Ok(settings)
    }
}

/// Parses `RGB`, `RRGGBB`, `AARRGGBB`, `RRRGGGBBB` or `RRRRGGGGBBBB` hex
/// digits, with or without a leading `#`. A leading alpha is discarded.
pub fn parse_hex_color(value: &str) -> Option<[u8; 3]> {
    let hex = value.trim().trim_start_matches('#');
    if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let channel = |digits: &str| -> Option<u8> {
        let raw = u32::from_str_radix(digits, 16).ok()?;
        let max = (1u32 << (4 * digits.len())) - 1;
        Some((raw * 255 / max) as u8)
    };

    let (start, width) = match hex.len() {
        3 => (0, 1),
        6 => (0, 2),
        8 => (2, 2),
        9 => (0, 3),
        12 => (0, 4),
        _ => return None,
    };

    let digits = &hex[start..];
    Some([
        channel(&digits[0..width])?,
        channel(&digits[width..2 * width])?,
        channel(&digits[2 * width..3 * width])?,
    ])
}

pub fn clamp_alpha(value: i64) -> u8 {
    value.clamp(0, i64::from(MAX_ALPHA)) as u8
}

fn parse_color_overlay(group: &Mapping, text: Option<GroupColorText>) -> ColorOverlay {
    let defaults = ColorOverlay::default();
    let typed = text
        .and_then(|t| t.color_overlay)
        .map(|c| normalize_color(&c));
    ColorOverlay {
        color: typed
            .or_else(|| color_at(group, COLOR_OVERLAY))
            .unwrap_or(defaults.color),
        alpha: int_at(group, COLOR_OVERLAY_ALPHA)
            .map(clamp_alpha)
            .unwrap_or(defaults.alpha),
    }
}

fn write_color_overlay(group: &mut Mapping, overlay: &ColorOverlay) {
    group.insert(key(COLOR_OVERLAY), Value::String(overlay.color.clone()));
    group.insert(
        key(COLOR_OVERLAY_ALPHA),
        Value::from(overlay.alpha.min(MAX_ALPHA)),
    );
}

/// Rewrites one group in place, replacing it if it is not a mapping.
fn write_group(root: &mut Mapping, name: &str, write: impl FnOnce(&mut Mapping)) {
    let mut group = match root.get(key(name)) {
        Some(Value::Mapping(map)) => map.clone(),
        _ => Mapping::new(),
    };
    write(&mut group);
    root.insert(key(name), Value::Mapping(group));
}

fn key(name: &str) -> Value {
    Value::String(name.to_string())
}

fn mapping_at<'a>(map: &'a Mapping, name: &str) -> Option<&'a Mapping> {
    map.get(key(name))?.as_mapping()
}

fn bool_at(map: &Mapping, name: &str) -> Option<bool> {
    map.get(key(name))?.as_bool()
}

fn normalize_color(value: &str) -> String {
    value.trim().trim_start_matches('#').to_string()
}

// Fallback when the typed pass fails on some other malformed entry.
fn color_at(map: &Mapping, name: &str) -> Option<String> {
    match map.get(key(name))? {
        Value::String(s) => Some(normalize_color(s)),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

fn int_at(map: &Mapping, name: &str) -> Option<i64> {
    match map.get(key(name))? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn store_with(contents: &str) -> (tempfile::TempDir, SettingsStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("_settings.yaml");
        fs::write(&path, contents).unwrap();
        (dir, SettingsStore::new(path))
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("_settings.yaml"));
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn alpha_is_clamped_on_load() {
        let (_dir, store) = store_with(
            "Book:\n  ColorOverlayAlpha: 250\nWallpaper:\n  ColorOverlayAlpha: -7\n",
        );
        let settings = store.load();
        assert_eq!(settings.book.alpha, 100);
        assert_eq!(settings.wallpaper.alpha, 0);
    }

    #[test]
    fn clamp_matches_min_max() {
        for v in [-1000, -1, 0, 1, 42, 99, 100, 101, 5000] {
            assert_eq!(i64::from(clamp_alpha(v)), v.clamp(0, 100));
        }
    }

    #[test]
    fn malformed_entries_fall_back_to_defaults() {
        let (_dir, store) = store_with(
            "Book: not-a-group\nWallpaper:\n  ColorOverlay: [1, 2]\n  ColorOverlayAlpha: lots\n  ShowImageOverlay: maybe\n",
        );
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn numeric_strings_and_integer_colors_are_accepted() {
        let (_dir, store) = store_with("Book:\n  ColorOverlay: 123456\n  ColorOverlayAlpha: '40'\n");
        let settings = store.load();
        assert_eq!(settings.book.color, "123456");
        assert_eq!(settings.book.alpha, 40);
    }

    #[test]
    fn exponent_like_hex_colors_keep_their_text() {
        let (_dir, store) = store_with(
            "Book:\n  ColorOverlay: 123e45\n  ColorOverlayAlpha: 30\nWallpaper:\n  ColorOverlay: 1e5\n",
        );
        let settings = store.heal().unwrap();
        assert_eq!(settings.book.color, "123e45");
        assert_eq!(settings.wallpaper.color, "1e5");
        assert_eq!(settings.book.fill(), Some(Rgba([0x12, 0x3e, 0x45, 76])));

        let reloaded = store.load();
        assert_eq!(reloaded.book.color, "123e45");
        assert_eq!(reloaded.wallpaper.color, "1e5");
        assert!(fs::read_to_string(store.path()).unwrap().contains("123e45"));
    }

    #[test]
    fn non_mapping_groups_are_replaced_on_save() {
        let (_dir, store) = store_with("Book: 12\nDevelopment: [a]\n");
        store.heal().unwrap();
        let saved = fs::read_to_string(store.path()).unwrap();
        assert!(saved.contains(COLOR_OVERLAY_ALPHA));
        assert!(saved.contains(DEBUG));
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn heal_rewrites_every_key_and_is_byte_stable() {
        let (_dir, store) = store_with("Custom:\n  Keep: yes\nBook:\n  ColorOverlayAlpha: 900\n");
        store.heal().unwrap();
        let first = fs::read_to_string(store.path()).unwrap();

        let reloaded = store.load();
        store.save(&store.load()).unwrap();
        let second = fs::read_to_string(store.path()).unwrap();

        assert_eq!(first, second);
        assert_eq!(reloaded.book.alpha, 100);
        for k in [COLOR_OVERLAY, COLOR_OVERLAY_ALPHA, SHOW_IMAGE_OVERLAY, DEBUG, "Keep"] {
            assert!(first.contains(k), "{k} missing from\n{first}");
        }
    }

    #[test]
    fn hex_colors_parse_in_all_supported_widths() {
        assert_eq!(parse_hex_color("fff"), Some([255, 255, 255]));
        assert_eq!(parse_hex_color("#ff8000"), Some([255, 128, 0]));
        assert_eq!(parse_hex_color("80ff0000"), Some([255, 0, 0]));
        assert_eq!(parse_hex_color("fff000000"), Some([255, 0, 0]));
        assert_eq!(parse_hex_color("ffff00000000"), Some([255, 0, 0]));
        assert_eq!(parse_hex_color("zzzzzz"), None);
        assert_eq!(parse_hex_color("12345"), None);
        assert_eq!(parse_hex_color(""), None);
    }

    #[test]
    fn fill_maps_percent_to_pixel_alpha() {
        let overlay = ColorOverlay {
            color: "000000".to_string(),
            alpha: 50,
        };
        assert_eq!(overlay.fill(), Some(Rgba([0, 0, 0, 127])));

        let invisible = ColorOverlay::default();
        assert_eq!(invisible.fill(), None);

        let invalid = ColorOverlay {
            color: "nope".to_string(),
            alpha: 80,
        };
        assert_eq!(invalid.fill(), None);
    }
}
