//! Composited sleep screensaver for Kobo readers.
//!
//! On sleep the engine picks an overlay and a background from the user's
//! screensaver folder, paints them together with an optional color tint and
//! holds the result until the host shows its sleep view. The integration
//! layer implements [`Host`] and forwards the two lifecycle events to a
//! [`ScreensaverRuntime`].

pub mod bootstrap;
pub mod compositor;
pub mod data_loaders;
pub mod error;
pub mod host;
pub mod logging;
pub mod mode;
pub mod paths;
pub mod picker;
pub mod screensaver;

pub use bootstrap::bootstrap;
pub use data_loaders::settings::{ColorOverlay, Settings, SettingsStore};
pub use error::{Error, Result};
pub use host::{Host, Rect, ViewContext, READING_VIEW};
pub use mode::{DisplayMode, ModeFlag, Plan, Resolution};
pub use paths::ScreensaverPaths;
pub use picker::{AssetFilter, AssetFolder, AssetPicker, AssetSource};
pub use screensaver::ScreensaverRuntime;

pub const NAME: &str = "Nickel Screensaver";
pub const DEBUG_NAME: &str = "SCREENSAVER";
