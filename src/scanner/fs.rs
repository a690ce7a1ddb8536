use async_trait::async_trait;
use std::io;
use std::path::Path;

/// The file operations the batch scanner needs.
///
/// Production code uses [`TokioFs`]; tests substitute instrumented fakes.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Size of the file in bytes, without reading it.
    async fn file_size(&self, path: &Path) -> io::Result<u64>;

    /// Reads the whole file as UTF-8 text.
    async fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// [`FileSystem`] backed by `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFs;

#[async_trait]
impl FileSystem for TokioFs {
    async fn file_size(&self, path: &Path) -> io::Result<u64> {
        Ok(tokio::fs::metadata(path).await?.len())
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_tokio_fs_reads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.css");
        std::fs::write(&path, "a { display: grid; }").unwrap();

        assert_eq!(TokioFs.file_size(&path).await.unwrap(), 20);
        assert_eq!(TokioFs.read_to_string(&path).await.unwrap(), "a { display: grid; }");
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bin.js");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

        let err = TokioFs.read_to_string(&path).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
