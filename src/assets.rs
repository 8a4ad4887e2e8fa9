use crate::error::StampError;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Icon image formats the template can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconFormat {
    Png,
    Svg,
    Jpeg,
}

impl IconFormat {
    /// Detect the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, StampError> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "png" => Ok(IconFormat::Png),
            "svg" => Ok(IconFormat::Svg),
            "jpg" | "jpeg" => Ok(IconFormat::Jpeg),
            _ => Err(StampError::UnsupportedAssetFormat {
                path: path.to_path_buf(),
                extension,
            }),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            IconFormat::Png => "png",
            IconFormat::Svg => "svg",
            IconFormat::Jpeg => "jpg",
        }
    }

    /// Packaging tools only take raster PNG icons.
    pub fn usable_for_packaging(self) -> bool {
        self == IconFormat::Png
    }
}

/// An icon copied into the template's assets directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopiedIcon {
    pub format: IconFormat,
    /// Absolute destination path.
    pub destination: PathBuf,
    /// Destination relative to the template root, always with `/` separators.
    pub relative: String,
}

/// Copy `source` to `<root>/<assets_dir>/<stem>.<ext>`, creating the assets
/// directory on demand. The format is validated before anything is touched.
pub fn copy_icon(
    source: &Path,
    root: &Path,
    assets_dir: &str,
    stem: &str,
    dry_run: bool,
) -> Result<CopiedIcon, StampError> {
    let format = IconFormat::from_path(source)?;
    if !source.is_file() {
        return Err(StampError::MissingFile {
            names: vec![source.display().to_string()],
        });
    }

    let file_name = format!("{stem}.{}", format.extension());
    let relative = format!("{}/{}", assets_dir.trim_end_matches('/'), file_name);
    let destination = root.join(assets_dir).join(&file_name);

    if !dry_run {
        let dir = root.join(assets_dir);
        fs::create_dir_all(&dir).map_err(|e| StampError::io(&dir, e))?;
        fs::copy(source, &destination).map_err(|e| StampError::io(&destination, e))?;
        debug!("copied {} -> {}", source.display(), destination.display());
    }

    Ok(CopiedIcon {
        format,
        destination,
        relative,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection_is_case_insensitive() {
        assert_eq!(IconFormat::from_path(Path::new("a.PNG")).unwrap(), IconFormat::Png);
        assert_eq!(IconFormat::from_path(Path::new("a.jpeg")).unwrap(), IconFormat::Jpeg);
        assert_eq!(IconFormat::from_path(Path::new("a.svg")).unwrap(), IconFormat::Svg);
    }

    #[test]
    fn test_gif_unsupported() {
        let err = IconFormat::from_path(Path::new("logo.gif")).unwrap_err();
        assert!(matches!(
            err,
            StampError::UnsupportedAssetFormat { ref extension, .. } if extension == "gif"
        ));
    }

    #[test]
    fn test_copy_creates_assets_dir() {
        let src_dir = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let source = src_dir.path().join("logo.png");
        fs::write(&source, b"\x89PNG").unwrap();

        let copied = copy_icon(&source, root.path(), "assets", "icon", false).unwrap();
        assert_eq!(copied.relative, "assets/icon.png");
        assert_eq!(fs::read(root.path().join("assets/icon.png")).unwrap(), b"\x89PNG");
    }

    #[test]
    fn test_copy_rejects_gif_before_touching_disk() {
        let src_dir = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let source = src_dir.path().join("logo.gif");
        fs::write(&source, b"GIF89a").unwrap();

        assert!(copy_icon(&source, root.path(), "assets", "icon", false).is_err());
        assert!(!root.path().join("assets").exists());
    }
}
