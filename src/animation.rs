use crate::config::AnimationRef;
use cairo::ImageSurface;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Time each frame of a looping animation stays on screen.
pub const LOOP_FRAME_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum AnimationError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode {}: {source}", path.display())]
    Png {
        path: PathBuf,
        #[source]
        source: cairo::IoError,
    },

    #[error("no .png frames in {}", path.display())]
    Empty { path: PathBuf },
}

/// Decoded animation frames.
pub struct Animation {
    frames: Vec<ImageSurface>,
    looping: bool,
}

impl Animation {
    /// Decode every frame up front.
    pub fn load(reference: &AnimationRef) -> Result<Self, AnimationError> {
        let paths = frame_paths(&reference.path).map_err(|source| AnimationError::Io {
            path: reference.path.clone(),
            source,
        })?;
        if paths.is_empty() {
            return Err(AnimationError::Empty {
                path: reference.path.clone(),
            });
        }

        let mut frames = Vec::with_capacity(paths.len());
        for path in paths {
            let mut file = File::open(&path).map_err(|source| AnimationError::Io {
                path: path.clone(),
                source,
            })?;
            let frame = ImageSurface::create_from_png(&mut file)
                .map_err(|source| AnimationError::Png { path, source })?;
            frames.push(frame);
        }

        log::debug!(
            "Loaded {} animation frame(s) from {}",
            frames.len(),
            reference.path.display()
        );
        Ok(Self {
            frames,
            looping: reference.looping,
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn frame(&self, index: usize) -> Option<&ImageSurface> {
        self.frames.get(index)
    }
}

/// Frame files of an animation: the file itself, or the `.png` files of a
/// directory sorted by name.
pub fn frame_paths(path: &Path) -> io::Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut frames: Vec<PathBuf> = fs::read_dir(path)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_png(p))
        .collect();
    frames.sort();
    Ok(frames)
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
}

/// Frame of a looping animation after `elapsed` time on screen.
pub fn looping_frame(elapsed: Duration, interval: Duration, frame_count: usize) -> usize {
    if frame_count == 0 || interval.is_zero() {
        return 0;
    }
    (elapsed.as_millis() / interval.as_millis().max(1)) as usize % frame_count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(path: &Path, size: i32) {
        let surface = ImageSurface::create(cairo::Format::ARgb32, size, size).unwrap();
        let mut file = File::create(path).unwrap();
        surface.write_to_png(&mut file).unwrap();
    }

    #[test]
    fn test_frame_paths_sorted_png_only() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["frame_02.png", "frame_01.PNG", "frame_10.png", "notes.txt"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("nested.png")).unwrap();

        let names: Vec<String> = frame_paths(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["frame_01.PNG", "frame_02.png", "frame_10.png"]);
    }

    #[test]
    fn test_single_file_is_one_frame() {
        let path = Path::new("/tmp/logo.png");
        assert_eq!(frame_paths(path).unwrap(), vec![path.to_path_buf()]);
    }

    #[test]
    fn test_load_directory_sequence() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..3 {
            write_png(&dir.path().join(format!("{:02}.png", i)), 8 + i);
        }

        let animation = Animation::load(&AnimationRef {
            path: dir.path().to_path_buf(),
            looping: false,
        })
        .unwrap();
        assert_eq!(animation.len(), 3);
        assert!(!animation.is_looping());
        assert_eq!(animation.frame(2).unwrap().width(), 10);
        assert!(animation.frame(3).is_none());
    }

    #[test]
    fn test_load_rejects_empty_directory_and_bad_png() {
        let dir = tempfile::tempdir().unwrap();
        let err = Animation::load(&AnimationRef {
            path: dir.path().to_path_buf(),
            looping: true,
        })
        .err()
        .unwrap();
        assert!(matches!(err, AnimationError::Empty { .. }));

        let bogus = dir.path().join("bogus.png");
        fs::write(&bogus, b"not a png").unwrap();
        let err = Animation::load(&AnimationRef {
            path: bogus,
            looping: false,
        })
        .err()
        .unwrap();
        assert!(matches!(err, AnimationError::Png { .. }));
    }

    #[test]
    fn test_looping_frame_wraps() {
        let interval = Duration::from_millis(100);
        assert_eq!(looping_frame(Duration::ZERO, interval, 4), 0);
        assert_eq!(looping_frame(Duration::from_millis(250), interval, 4), 2);
        assert_eq!(looping_frame(Duration::from_millis(450), interval, 4), 0);
        assert_eq!(looping_frame(Duration::from_secs(1), interval, 0), 0);
    }
}
