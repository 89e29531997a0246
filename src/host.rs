use image::DynamicImage;

/// Object name of the host view shown while a book is open.
pub const READING_VIEW: &str = "ReadingView";

/// Screen-space rectangle in host pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn from_size((width, height): (u32, u32)) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewContext {
    pub name: String,
    pub bounds: Rect,
}

impl ViewContext {
    pub fn is_reading(&self) -> bool {
        self.name == READING_VIEW
    }
}

/// Everything the engine needs from the reader's UI process.
///
/// The integration layer implements this over whatever hooking mechanism the
/// platform offers and calls into [`crate::ScreensaverRuntime`] from the
/// intercepted sleep and show-sleep-view entry points.
pub trait Host {
    /// The view on screen right now, or `None` when the window controller or
    /// its current view cannot be resolved.
    fn current_view(&self) -> Option<ViewContext>;

    fn capture_region(&self, bounds: Rect) -> Option<DynamicImage>;

    fn screen_size(&self) -> (u32, u32);

    /// Swap the image the sleep view is about to display.
    fn replace_displayed_image(&mut self, image: &DynamicImage);

    /// Lay `image` over the current view, below any transient host popups.
    /// `bounds` is relative to the view, so its origin is always `(0, 0)`.
    fn show_foreground_panel(&mut self, image: &DynamicImage, bounds: Rect);

    /// Run the host's own sleep handling.
    fn forward_sleep(&mut self);

    /// Run the host's own show-sleep-view handling.
    fn forward_show_sleep_view(&mut self);
}
