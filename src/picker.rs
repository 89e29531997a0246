use std::{
    fs,
    path::{Path, PathBuf},
};

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::paths::ScreensaverPaths;

/// How a file name qualifies as a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetFilter {
    /// `*.ext`, compared ASCII case-insensitively.
    Extension(&'static str),
    /// An exact file name, used for the extension-less cover sentinel.
    Named(&'static str),
}

impl AssetFilter {
    pub fn matches(&self, file_name: &str) -> bool {
        match self {
            Self::Extension(ext) => has_extension(file_name, ext),
            Self::Named(name) => file_name == *name,
        }
    }
}

pub fn has_extension(file_name: &str, ext: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// The folders the mode resolver searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetFolder {
    Root,
    Wallpaper,
    Overlay,
}

/// Candidate lookup used by the mode resolver.
pub trait AssetSource {
    fn pick(&mut self, folder: AssetFolder, filters: &[AssetFilter]) -> Option<PathBuf>;
}

/// Lists the files directly inside `dir` whose names match any filter,
/// sorted by name. A missing directory lists as empty.
pub fn matching_files(dir: &Path, filters: &[AssetFilter]) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| filters.iter().any(|f| f.matches(name)))
        })
        .map(|entry| entry.path())
        .collect();

    files.sort();
    files
}

/// Picks assets uniformly at random from the screensaver folders.
pub struct AssetPicker<R = StdRng> {
    paths: ScreensaverPaths,
    rng: R,
}

impl AssetPicker<StdRng> {
    /// Seeded once from the wall clock, like the host's own randomizer.
    pub fn from_time(paths: ScreensaverPaths) -> Self {
        let now = chrono::Local::now();
        let seed = now.timestamp_millis() as u64;
        Self::new(paths, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> AssetPicker<R> {
    pub fn new(paths: ScreensaverPaths, rng: R) -> Self {
        Self { paths, rng }
    }

    /// One matching file from `dir`, or `None` when nothing matches.
    pub fn pick_in(&mut self, dir: &Path, filters: &[AssetFilter]) -> Option<PathBuf> {
        let mut files = matching_files(dir, filters);
        if files.is_empty() {
            return None;
        }

        let idx = self.rng.gen_range(0..files.len());
        Some(files.swap_remove(idx))
    }

    fn folder_path(&self, folder: AssetFolder) -> PathBuf {
        match folder {
            AssetFolder::Root => self.paths.asset_root().to_path_buf(),
            AssetFolder::Wallpaper => self.paths.wallpaper_dir(),
            AssetFolder::Overlay => self.paths.overlay_dir(),
        }
    }
}

impl<R: Rng> AssetSource for AssetPicker<R> {
    fn pick(&mut self, folder: AssetFolder, filters: &[AssetFilter]) -> Option<PathBuf> {
        let dir = self.folder_path(folder);
        self.pick_in(&dir, filters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const IMAGES: [AssetFilter; 2] = [AssetFilter::Extension("png"), AssetFilter::Extension("jpg")];

    fn picker(root: &Path) -> AssetPicker<StdRng> {
        let paths = ScreensaverPaths::new(root, root.join("scratch"));
        AssetPicker::new(paths, StdRng::seed_from_u64(7))
    }

    #[test]
    fn missing_directory_picks_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut picker = picker(dir.path());
        assert_eq!(picker.pick_in(&dir.path().join("nope"), &IMAGES), None);
    }

    #[test]
    fn non_matching_files_pick_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        fs::create_dir(dir.path().join("folder.png")).unwrap();
        let mut picker = picker(dir.path());
        assert_eq!(picker.pick(AssetFolder::Root, &IMAGES), None);
    }

    #[test]
    fn single_match_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("only.PNG"), b"x").unwrap();
        fs::write(dir.path().join("skip.gif"), b"x").unwrap();
        let mut picker = picker(dir.path());
        for _ in 0..10 {
            assert_eq!(
                picker.pick(AssetFolder::Root, &IMAGES),
                Some(dir.path().join("only.PNG"))
            );
        }
    }

    #[test]
    fn picks_cover_every_match() {
        let dir = tempfile::tempdir().unwrap();
        let names = ["a.png", "b.jpg", "c.png"];
        for name in names {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        let mut picker = picker(dir.path());

        let seen: HashSet<PathBuf> = (0..200)
            .filter_map(|_| picker.pick(AssetFolder::Root, &IMAGES))
            .collect();
        let expected: HashSet<PathBuf> = names.iter().map(|n| dir.path().join(n)).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn named_filter_matches_the_extensionless_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let wallpaper = dir.path().join("wallpaper");
        fs::create_dir(&wallpaper).unwrap();
        fs::write(wallpaper.join("cover"), b"").unwrap();
        fs::write(wallpaper.join("cover.txt"), b"").unwrap();

        let mut picker = picker(dir.path());
        let filters = [AssetFilter::Extension("png"), AssetFilter::Named("cover")];
        assert_eq!(
            picker.pick(AssetFolder::Wallpaper, &filters),
            Some(wallpaper.join("cover"))
        );
    }
}
