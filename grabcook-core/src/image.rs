//! Recipe photo validation and local previews.
//!
//! Cheap checks (declared type, file size) run first and synchronously. The
//! format sniff and dimension read need the file contents and run on a
//! blocking worker. A successfully attached image gets a preview file that is
//! removed again when the image is dropped or replaced.

use std::fmt;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{ImageFormat, ImageReader};
use tempfile::NamedTempFile;

use crate::error::ImageError;

/// Allowed image formats for recipe photos.
pub const ALLOWED_FORMATS: &[ImageFormat] = &[ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::WebP];

/// Maximum file size for images (1MB).
pub const MAX_FILE_SIZE: usize = 1024 * 1024;

/// Maximum width and height in pixels.
pub const MAX_DIMENSION: u32 = 2048;

/// Format and size read from image bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl ImageInfo {
    pub fn content_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

/// MIME type implied by a file name, if it is one we accept.
pub fn declared_mime_type(file_name: &str) -> Option<&'static str> {
    let extension = Path::new(file_name).extension()?;
    let format = ImageFormat::from_extension(extension)?;
    ALLOWED_FORMATS
        .contains(&format)
        .then(|| format.to_mime_type())
}

/// Type and size checks that need no file contents.
pub fn check_type_and_size(file_name: &str, size: usize) -> Result<&'static str, ImageError> {
    let mime = declared_mime_type(file_name).ok_or(ImageError::UnsupportedType)?;
    if size > MAX_FILE_SIZE {
        return Err(ImageError::TooLarge { size });
    }
    Ok(mime)
}

/// Sniff the real format and read dimensions without decoding pixels.
pub fn inspect_image(data: &[u8]) -> Result<ImageInfo, ImageError> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ImageError::Unreadable(e.to_string()))?;

    let format = reader.format().ok_or(ImageError::UnsupportedType)?;
    if !ALLOWED_FORMATS.contains(&format) {
        return Err(ImageError::UnsupportedType);
    }

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| ImageError::Unreadable(e.to_string()))?;

    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(ImageError::DimensionsTooLarge { width, height });
    }

    Ok(ImageInfo {
        format,
        width,
        height,
    })
}

/// Local copy of the image for display; deleted on drop.
pub struct ImagePreview {
    file: NamedTempFile,
}

impl ImagePreview {
    fn create(data: &[u8], format: ImageFormat) -> Result<Self, ImageError> {
        let extension = format.extensions_str().first().copied().unwrap_or("img");
        let mut file = tempfile::Builder::new()
            .prefix("grabcook-preview-")
            .suffix(&format!(".{}", extension))
            .tempfile()
            .map_err(|e| ImageError::Unreadable(e.to_string()))?;
        file.write_all(data)
            .map_err(|e| ImageError::Unreadable(e.to_string()))?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl fmt::Debug for ImagePreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePreview")
            .field("path", &self.path())
            .finish()
    }
}

/// An image that passed every check and is ready to upload.
#[derive(Debug)]
pub struct AttachedImage {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub preview: ImagePreview,
}

impl AttachedImage {
    /// Validate in-memory bytes. Runs the sniff on the current thread.
    pub fn from_bytes(file_name: &str, data: Vec<u8>) -> Result<Self, ImageError> {
        check_type_and_size(file_name, data.len())?;
        let info = inspect_image(&data)?;
        let preview = ImagePreview::create(&data, info.format)?;
        Ok(Self {
            file_name: file_name.to_string(),
            content_type: info.content_type().to_string(),
            data,
            width: info.width,
            height: info.height,
            preview,
        })
    }

    /// Validate an image file. Size and type come from metadata; the content
    /// checks run on a blocking worker.
    pub async fn load(path: &Path) -> Result<Self, ImageError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let size = tokio::fs::metadata(path)
            .await
            .map_err(|e| ImageError::Unreadable(e.to_string()))?
            .len();
        check_type_and_size(&file_name, usize::try_from(size).unwrap_or(usize::MAX))?;

        let path: PathBuf = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let data = std::fs::read(&path).map_err(|e| ImageError::Unreadable(e.to_string()))?;
            Self::from_bytes(&file_name, data)
        })
        .await
        .map_err(|e| ImageError::Unreadable(e.to_string()))?
    }
}

/// Image slot of the form: holds at most one attached image.
#[derive(Debug, Default)]
pub struct ImageUpload {
    current: Option<Arc<AttachedImage>>,
    error: Option<ImageError>,
}

impl ImageUpload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and attach a new image. On failure the previous image stays.
    pub async fn select(&mut self, path: &Path) -> Result<Arc<AttachedImage>, ImageError> {
        match AttachedImage::load(path).await {
            Ok(image) => {
                // Release the old preview before holding the new one
                self.current = None;
                let image = Arc::new(image);
                tracing::debug!(
                    file = %image.file_name,
                    width = image.width,
                    height = image.height,
                    "image attached"
                );
                self.current = Some(image.clone());
                self.error = None;
                Ok(image)
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "image rejected");
                self.error = Some(e.clone());
                Err(e)
            }
        }
    }

    pub fn clear(&mut self) {
        self.current = None;
        self.error = None;
    }

    pub fn current(&self) -> Option<&Arc<AttachedImage>> {
        self.current.as_ref()
    }

    pub fn error(&self) -> Option<&ImageError> {
        self.error.as_ref()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::new_rgb8(width, height);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_declared_mime_type() {
        assert_eq!(declared_mime_type("photo.JPG"), Some("image/jpeg"));
        assert_eq!(declared_mime_type("photo.png"), Some("image/png"));
        assert_eq!(declared_mime_type("photo.webp"), Some("image/webp"));
        assert_eq!(declared_mime_type("photo.gif"), None);
        assert_eq!(declared_mime_type("photo"), None);
    }

    #[test]
    fn test_size_limit() {
        assert!(check_type_and_size("a.png", MAX_FILE_SIZE).is_ok());
        assert_eq!(
            check_type_and_size("a.png", MAX_FILE_SIZE + 1),
            Err(ImageError::TooLarge {
                size: MAX_FILE_SIZE + 1
            })
        );
    }

    #[test]
    fn test_validate_invalid_format() {
        let result = inspect_image(b"not an image");
        assert!(result.is_err());
    }

    #[test]
    fn test_inspect_reads_dimensions() {
        let info = inspect_image(&png_bytes(40, 30)).unwrap();
        assert_eq!(info.format, ImageFormat::Png);
        assert_eq!((info.width, info.height), (40, 30));
        assert_eq!(info.content_type(), "image/png");
    }

    #[test]
    fn test_dimension_limit() {
        assert!(inspect_image(&png_bytes(MAX_DIMENSION, 1)).is_ok());
        assert_eq!(
            inspect_image(&png_bytes(MAX_DIMENSION + 1, 1)),
            Err(ImageError::DimensionsTooLarge {
                width: MAX_DIMENSION + 1,
                height: 1
            })
        );
    }

    #[test]
    fn test_preview_removed_on_drop() {
        let image = AttachedImage::from_bytes("dish.png", png_bytes(8, 8)).unwrap();
        let path = image.preview.path().to_path_buf();
        assert!(path.exists());
        drop(image);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_replacing_image_releases_previous_preview() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.png");
        let second = dir.path().join("second.png");
        std::fs::write(&first, png_bytes(4, 4)).unwrap();
        std::fs::write(&second, png_bytes(6, 6)).unwrap();

        let mut upload = ImageUpload::new();
        let old_preview = upload
            .select(&first)
            .await
            .unwrap()
            .preview
            .path()
            .to_path_buf();
        assert!(old_preview.exists());

        upload.select(&second).await.unwrap();
        assert!(!old_preview.exists());
        assert_eq!(upload.current().unwrap().width, 6);
    }

    #[tokio::test]
    async fn test_rejected_image_keeps_previous() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.png");
        let bad = dir.path().join("notes.txt");
        std::fs::write(&good, png_bytes(4, 4)).unwrap();
        std::fs::write(&bad, b"hello").unwrap();

        let mut upload = ImageUpload::new();
        upload.select(&good).await.unwrap();
        let err = upload.select(&bad).await.unwrap_err();
        assert_eq!(err, ImageError::UnsupportedType);
        assert_eq!(upload.current().unwrap().file_name, "good.png");
        assert_eq!(upload.error(), Some(&ImageError::UnsupportedType));
    }

    #[tokio::test]
    async fn test_missing_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let err = AttachedImage::load(&dir.path().join("gone.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, ImageError::Unreadable(_)));
    }
}
