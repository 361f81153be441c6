use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SupportedFormat {
    PlainText,
    Json,
    Pdf,
}

impl SupportedFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "txt" | "md" => Some(Self::PlainText),
            "json" => Some(Self::Json),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

pub fn walk_directory(dir: &Path) -> Vec<(PathBuf, SupportedFormat)> {
    WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let path = entry.into_path();
            let ext = path.extension()?.to_str()?;
            let format = SupportedFormat::from_extension(ext)?;
            Some((path, format))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_supported_extensions() {
        assert_eq!(
            SupportedFormat::from_extension("TXT"),
            Some(SupportedFormat::PlainText)
        );
        assert_eq!(
            SupportedFormat::from_extension("json"),
            Some(SupportedFormat::Json)
        );
        assert_eq!(
            SupportedFormat::from_extension("pdf"),
            Some(SupportedFormat::Pdf)
        );
        assert_eq!(SupportedFormat::from_extension("exe"), None);
    }

    #[test]
    fn walks_only_supported_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("obra.txt"), "texto").unwrap();
        std::fs::write(dir.path().join("proyectos.json"), "{}").unwrap();
        std::fs::write(dir.path().join("foto.png"), [0u8; 4]).unwrap();
        let files = walk_directory(dir.path());
        assert_eq!(files.len(), 2);
    }
}
