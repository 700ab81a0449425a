/*!
Photo ingestion for admin uploads.

A photo must carry an allowed extension (`png`, `jpg`, `jpeg`) and decode as
an image. It is resized to the profile type's fixed square and stored as
`<upload_root>/<type dir>/<name>`. Nothing prevents two records from ending up
with the same filename; the later upload wins.
*/
use std::io::Cursor;
use std::path::{Path, PathBuf};

use axum::body::Bytes;
use image::{imageops::FilterType, DynamicImage, ImageFormat};

use crate::profile::ProfileType;

pub static ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// A file field pulled out of a multipart form.
#[derive(Clone, Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

#[derive(Debug)]
pub enum UploadError {
    /// Extension not in `ALLOWED_EXTENSIONS` (carries the offending name).
    BadExtension(String),
    /// Written file couldn't be decoded or re-encoded as an image.
    NotAnImage(String),
    Io(std::io::Error),
}

impl UploadError {
    /// Rejections are the uploader's fault and fall through quietly;
    /// anything else is ours.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, UploadError::Io(_))
    }
}

impl std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            UploadError::BadExtension(name) => write!(
                f, "{:?} does not have an allowed extension ({}).",
                name, ALLOWED_EXTENSIONS.join(", ")
            ),
            UploadError::NotAnImage(e) => write!(f, "Unable to process image: {}", e),
            UploadError::Io(e) => write!(f, "Error writing photo: {}", e),
        }
    }
}

impl From<std::io::Error> for UploadError {
    fn from(e: std::io::Error) -> UploadError { UploadError::Io(e) }
}

/// The lowercased extension of `file_name`, if it's one we accept.
pub fn allowed_extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    let ext = ext.to_ascii_lowercase();
    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Some(ext)
    } else {
        None
    }
}

/**
Reduce `s` to something safe to use as a filename: runs of whitespace become
a single `_`, anything but ASCII alphanumerics, `_`, `-`, and `.` is dropped,
and leading/trailing `.` and `_` are trimmed.
*/
pub fn sanitize_filename(s: &str) -> String {
    let joined = s.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect();
    kept.trim_matches(|c| c == '.' || c == '_').to_owned()
}

/// Name the photo after the person when possible, otherwise after the
/// uploaded file. Always ends in `.<ext>`.
pub fn target_file_name(display_name: &str, original: &str, ext: &str) -> String {
    let from_name = sanitize_filename(display_name);
    if !from_name.is_empty() {
        return format!("{}.{}", from_name, ext);
    }

    let from_original = sanitize_filename(original);
    match from_original.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => format!("{}.{}", stem, ext),
        _ if !from_original.is_empty() => format!("{}.{}", from_original, ext),
        _ => format!("photo.{}", ext),
    }
}

pub fn type_dir(upload_root: &Path, ptype: ProfileType) -> PathBuf {
    upload_root.join(ptype.image_dir())
}

/// Create the per-type photo directories under `upload_root`.
pub fn ensure_upload_dirs(upload_root: &Path) -> std::io::Result<()> {
    for ptype in ProfileType::all() {
        std::fs::create_dir_all(type_dir(upload_root, ptype))?;
    }
    Ok(())
}

/// Decode `bytes`, squash to `side`×`side`, and re-encode in the format
/// `ext` names.
fn resize_to_square(bytes: &[u8], ext: &str, side: u32) -> Result<Vec<u8>, UploadError> {
    let format = ImageFormat::from_extension(ext)
        .ok_or_else(|| UploadError::NotAnImage(format!("no encoder for .{}", ext)))?;
    let img = image::load_from_memory(bytes)
        .map_err(|e| UploadError::NotAnImage(e.to_string()))?;
    let resized = img.resize_exact(side, side, FilterType::Lanczos3);

    // JPEG has no alpha channel.
    let resized = match format {
        ImageFormat::Png => resized,
        _ => DynamicImage::ImageRgb8(resized.to_rgb8()),
    };

    let mut out: Vec<u8> = Vec::new();
    resized.write_to(&mut Cursor::new(&mut out), format)
        .map_err(|e| UploadError::NotAnImage(e.to_string()))?;
    Ok(out)
}

/**
Store an uploaded photo for a `ptype` profile named `display_name`.

Returns the filename (relative to the type's directory) to record in the
database. The photo is decoded and resized in memory, written beside its
final name, and renamed into place only once complete. A rejected upload
never touches an existing file of the same name.
*/
pub async fn ingest_photo(
    upload_root: &Path,
    ptype: ProfileType,
    display_name: &str,
    file: &UploadedFile,
) -> Result<String, UploadError> {
    log::trace!(
        "ingest_photo( {}, {}, {:?}, [ {:?}, {} bytes ] ) called.",
        upload_root.display(), &ptype, display_name, &file.file_name, file.bytes.len()
    );

    let ext = allowed_extension(&file.file_name)
        .ok_or_else(|| UploadError::BadExtension(file.file_name.clone()))?;

    let side = ptype.photo_side();
    let bytes = file.bytes.clone();
    let resize_ext = ext.clone();
    let resized = tokio::task::spawn_blocking(move || resize_to_square(&bytes, &resize_ext, side))
        .await
        .map_err(|e| UploadError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))??;

    let dir = type_dir(upload_root, ptype);
    tokio::fs::create_dir_all(&dir).await?;

    let file_name = target_file_name(display_name, &file.file_name, &ext);
    let path = dir.join(&file_name);
    let partial = dir.join(format!(".{}.part", &file_name));

    if let Err(e) = write_then_rename(&partial, &path, &resized).await {
        if let Err(rm_e) = tokio::fs::remove_file(&partial).await {
            log::trace!("No partial upload {} to remove: {}", partial.display(), &rm_e);
        }
        return Err(e.into());
    }

    log::info!("Stored {} photo {}.", &ptype, path.display());
    Ok(file_name)
}

async fn write_then_rename(partial: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    tokio::fs::write(partial, bytes).await?;
    tokio::fs::rename(partial, path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::ensure_logging;

    use image::{Rgb, RgbImage};

    fn png_bytes(w: u32, h: u32) -> Bytes {
        let img = RgbImage::from_pixel(w, h, Rgb([200, 40, 40]));
        let mut buff: Vec<u8> = Vec::new();
        img.write_to(&mut Cursor::new(&mut buff), ImageFormat::Png).unwrap();
        Bytes::from(buff)
    }

    #[test]
    fn extension_check() {
        assert_eq!(allowed_extension("me.png").as_deref(), Some("png"));
        assert_eq!(allowed_extension("me.jpg").as_deref(), Some("jpg"));
        assert_eq!(allowed_extension("ME.JPEG").as_deref(), Some("jpeg"));
        assert_eq!(allowed_extension("me.gif"), None);
        assert_eq!(allowed_extension("me.png.exe"), None);
        assert_eq!(allowed_extension("png"), None);
        assert_eq!(allowed_extension(".png"), None);
        assert_eq!(allowed_extension(""), None);
    }

    #[test]
    fn filenames() {
        assert_eq!(sanitize_filename("Jane  Q. Doe"), "Jane_Q._Doe");
        assert_eq!(sanitize_filename("../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_filename("José Ñúñez"), "Jos_ez");

        assert_eq!(target_file_name("Jane Doe", "IMG_0001.JPG", "jpg"), "Jane_Doe.jpg");
        assert_eq!(target_file_name("", "my photo.PNG", "png"), "my_photo.png");
        assert_eq!(target_file_name("   ", "../", "png"), "photo.png");
    }

    #[tokio::test]
    async fn ingest_resizes_to_square() {
        ensure_logging();
        let dir = tempfile::tempdir().unwrap();

        let file = UploadedFile {
            file_name: "upload.PNG".to_owned(),
            bytes: png_bytes(64, 32),
        };
        let name = ingest_photo(dir.path(), ProfileType::Faculty, "Ada Lovelace", &file)
            .await.unwrap();
        assert_eq!(name, "Ada_Lovelace.png");

        let stored = image::open(dir.path().join("Faculty").join(&name)).unwrap();
        assert_eq!((stored.width(), stored.height()), (500, 500));

        // PNG content under a .jpg name is still decodable.
        let file = UploadedFile {
            file_name: "kid.jpg".to_owned(),
            bytes: png_bytes(10, 10),
        };
        let name = ingest_photo(dir.path(), ProfileType::Student, "Kid", &file)
            .await.unwrap();
        let stored = image::open(dir.path().join("Students").join(&name)).unwrap();
        assert_eq!((stored.width(), stored.height()), (300, 300));
    }

    #[tokio::test]
    async fn ingest_rejections() {
        ensure_logging();
        let dir = tempfile::tempdir().unwrap();

        let gif = UploadedFile {
            file_name: "animated.gif".to_owned(),
            bytes: png_bytes(4, 4),
        };
        let e = ingest_photo(dir.path(), ProfileType::Researcher, "Hal", &gif)
            .await.unwrap_err();
        assert!(matches!(e, UploadError::BadExtension(_)));
        assert!(e.is_rejection());

        let junk = UploadedFile {
            file_name: "notreally.jpeg".to_owned(),
            bytes: Bytes::from_static(b"this is not an image"),
        };
        let e = ingest_photo(dir.path(), ProfileType::Researcher, "Hal", &junk)
            .await.unwrap_err();
        assert!(matches!(e, UploadError::NotAnImage(_)));
        assert!(!dir.path().join("JPL").join("Hal.jpeg").exists());
    }

    #[tokio::test]
    async fn rejected_reupload_keeps_existing_photo() {
        ensure_logging();
        let dir = tempfile::tempdir().unwrap();
        let stored = dir.path().join("Faculty").join("Ada.png");

        let good = UploadedFile {
            file_name: "a.png".to_owned(),
            bytes: png_bytes(20, 20),
        };
        ingest_photo(dir.path(), ProfileType::Faculty, "Ada", &good).await.unwrap();
        let before = std::fs::read(&stored).unwrap();

        let junk = UploadedFile {
            file_name: "b.png".to_owned(),
            bytes: Bytes::from_static(b"junk"),
        };
        let e = ingest_photo(dir.path(), ProfileType::Faculty, "Ada", &junk)
            .await.unwrap_err();
        assert!(e.is_rejection());

        assert_eq!(std::fs::read(&stored).unwrap(), before);
        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("Faculty")).unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("Ada.png")]);
    }
}
