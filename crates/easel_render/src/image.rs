//! Decoded image handles.
//!
//! A handle is cheap to clone and may be created before its pixels exist:
//! `ImageHandle::load` decodes on a background thread and publishes the
//! result through a `OnceLock`. Drawing a handle that is not loaded yet is a
//! silent no-op, so entities can hold handles from construction onwards.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use easel_core::EaselError;

static NEXT_IMAGE_ID: AtomicU64 = AtomicU64::new(1);

/// RGBA8 pixels, row-major, unpremultiplied.
#[derive(Debug)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl ImageData {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, EaselError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || rgba.len() != expected {
            return Err(EaselError::invalid_input(format!(
                "image {}x{} needs {} RGBA bytes, got {}",
                width,
                height,
                expected,
                rgba.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, EaselError> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| EaselError::invalid_input(format!("image decode failed: {e}")))?
            .to_rgba8();
        let (width, height) = decoded.dimensions();
        Self::new(width, height, decoded.into_raw())
    }
}

#[derive(Debug)]
struct ImageSlot {
    id: u64,
    name: String,
    data: OnceLock<Arc<ImageData>>,
    failed: AtomicBool,
}

#[derive(Debug, Clone)]
pub struct ImageHandle {
    slot: Arc<ImageSlot>,
}

impl ImageHandle {
    /// A handle with no pixels yet. Fill it later with [`ImageHandle::fulfill`].
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(ImageSlot {
                id: NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed),
                name: name.into(),
                data: OnceLock::new(),
                failed: AtomicBool::new(false),
            }),
        }
    }

    pub fn from_data(name: impl Into<String>, data: ImageData) -> Self {
        let handle = Self::pending(name);
        handle.fulfill(data);
        handle
    }

    pub fn from_rgba(
        name: impl Into<String>,
        width: u32,
        height: u32,
        rgba: Vec<u8>,
    ) -> Result<Self, EaselError> {
        Ok(Self::from_data(name, ImageData::new(width, height, rgba)?))
    }

    /// Read and decode `path` on a background thread.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let handle = Self::pending(path.display().to_string());
        let worker = handle.clone();
        let spawned = std::thread::Builder::new()
            .name("easel-image-decode".to_string())
            .spawn(move || {
                let result = std::fs::read(&path)
                    .map_err(|e| {
                        EaselError::ResourceNotReady(format!(
                            "failed to read {}: {e}",
                            path.display()
                        ))
                    })
                    .and_then(|bytes| ImageData::decode(&bytes));
                match result {
                    Ok(data) => {
                        log::info!(
                            "Image '{}' loaded ({}x{})",
                            path.display(),
                            data.width,
                            data.height
                        );
                        worker.fulfill(data);
                    }
                    Err(err) => {
                        log::error!("Image '{}' failed to load: {err}", path.display());
                        worker.slot.failed.store(true, Ordering::Release);
                    }
                }
            });
        if let Err(err) = spawned {
            log::error!("Could not spawn image decode thread: {err}");
            handle.slot.failed.store(true, Ordering::Release);
        }
        handle
    }

    /// Publish pixels. Returns false if the handle was already filled.
    pub fn fulfill(&self, data: ImageData) -> bool {
        self.slot.data.set(Arc::new(data)).is_ok()
    }

    pub fn id(&self) -> u64 {
        self.slot.id
    }

    pub fn name(&self) -> &str {
        &self.slot.name
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.data.get().is_some()
    }

    /// True once a background load has given up. The handle stays unloaded.
    pub fn has_failed(&self) -> bool {
        self.slot.failed.load(Ordering::Acquire)
    }

    pub fn data(&self) -> Option<&Arc<ImageData>> {
        self.slot.data.get()
    }

    pub fn width(&self) -> Option<u32> {
        self.data().map(|d| d.width)
    }

    pub fn height(&self) -> Option<u32> {
        self.data().map(|d| d.height)
    }

    pub fn require_loaded(&self) -> Result<&Arc<ImageData>, EaselError> {
        self.data()
            .ok_or_else(|| EaselError::ResourceNotReady(format!("image '{}'", self.name())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "easel_image_test_{}_{}_{}.png",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn wait_until(mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if done() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn pending_handle_reports_not_ready() {
        let handle = ImageHandle::pending("later");
        assert!(!handle.is_loaded());
        assert_eq!(handle.width(), None);
        assert!(matches!(
            handle.require_loaded(),
            Err(EaselError::ResourceNotReady(_))
        ));
        assert!(handle.fulfill(ImageData::new(1, 1, vec![0; 4]).unwrap()));
        assert!(handle.is_loaded());
        assert!(!handle.fulfill(ImageData::new(1, 1, vec![0; 4]).unwrap()));
    }

    #[test]
    fn from_rgba_validates_length() {
        assert!(ImageHandle::from_rgba("bad", 2, 2, vec![0; 15]).is_err());
        let ok = ImageHandle::from_rgba("ok", 2, 2, vec![0; 16]).expect("valid");
        assert_eq!(ok.width(), Some(2));
        assert_eq!(ok.height(), Some(2));
    }

    #[test]
    fn clones_share_the_same_slot() {
        let a = ImageHandle::pending("shared");
        let b = a.clone();
        a.fulfill(ImageData::new(3, 1, vec![255; 12]).unwrap());
        assert!(b.is_loaded());
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn load_decodes_png_in_background() {
        let path = temp_file_path("bg");
        let img = image::RgbaImage::from_pixel(4, 3, image::Rgba([10, 20, 30, 255]));
        img.save(&path).expect("write png");

        let handle = ImageHandle::load(&path);
        assert!(wait_until(|| handle.is_loaded()), "png should decode");
        assert_eq!(handle.width(), Some(4));
        assert_eq!(handle.height(), Some(3));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn load_of_missing_file_marks_failed() {
        let path = temp_file_path("missing");
        let handle = ImageHandle::load(&path);
        assert!(wait_until(|| handle.has_failed()));
        assert!(!handle.is_loaded());
    }
}
