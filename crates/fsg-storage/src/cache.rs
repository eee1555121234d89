//! Local on-disk file cache
//!
//! Files live at `<base_dir>/data/<bucket>/<file_name>`. There is no
//! in-memory index: presence is decided by probing the filesystem on every
//! request, and nothing is ever evicted.

use crate::{Result, StorageError};
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, instrument, warn};

/// Name of the cache directory under the base directory
pub const DATA_DIR: &str = "data";

/// Read buffer size used when streaming cached files
pub const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Stream of file content chunks
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Local file cache rooted at `<base_dir>/data`
#[derive(Clone, Debug)]
pub struct LocalCache {
    root: PathBuf,
}

impl LocalCache {
    /// Create a cache under `base_dir`
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            root: base_dir.as_ref().join(DATA_DIR),
        }
    }

    /// The cache root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve the on-disk path for a file
    ///
    /// Rejects segments that would leave the cache root.
    pub fn path_for(&self, bucket: &str, file_name: &str) -> Result<PathBuf> {
        if file_name.is_empty() {
            return Err(StorageError::IllegalPath("empty file name".to_string()));
        }
        let relative = Path::new(bucket).join(file_name);
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => {
                    return Err(StorageError::IllegalPath(format!(
                        "{}/{}",
                        bucket, file_name
                    )))
                }
            }
        }
        Ok(self.root.join(relative))
    }

    /// Check whether a file is cached
    ///
    /// Any probe failure counts as absent.
    pub async fn exists(&self, bucket: &str, file_name: &str) -> bool {
        match self.path_for(bucket, file_name) {
            Ok(path) => tokio::fs::metadata(&path).await.is_ok(),
            Err(_) => false,
        }
    }

    /// Open a cached file as a chunked byte stream
    #[instrument(skip(self))]
    pub async fn open(&self, bucket: &str, file_name: &str) -> Result<ByteStream> {
        let path = self.path_for(bucket, file_name)?;
        let file = tokio::fs::File::open(&path)
            .await
            .map_err(|source| StorageError::FileOpen {
                path: path.display().to_string(),
                source,
            })?;

        let shown = path.display().to_string();
        let stream = ReaderStream::with_capacity(file, STREAM_CHUNK_SIZE).map(move |chunk| {
            chunk.map_err(|source| {
                warn!(path = %shown, error = %source, "Cached file read failed mid-stream");
                StorageError::FileRead {
                    path: shown.clone(),
                    source,
                }
            })
        });

        Ok(stream.boxed())
    }

    /// Read a whole cached file into memory
    pub async fn read(&self, bucket: &str, file_name: &str) -> Result<Bytes> {
        let mut stream = self.open(bucket, file_name).await?;
        let mut buf = Vec::new();
        while let Some(chunk) = stream.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(Bytes::from(buf))
    }

    /// Persist content for a file, replacing any previous copy
    ///
    /// Content goes to a temp file in the bucket directory which is renamed
    /// over the target once fully written, so the target never holds a
    /// partial copy. The temp file is removed on error or cancellation.
    /// Directory creation is best effort; a failure there surfaces as a
    /// create error.
    #[instrument(skip(self, content), fields(size = content.len()))]
    pub async fn write(&self, bucket: &str, file_name: &str, content: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(bucket, file_name)?;
        let dir = path.parent().unwrap_or(self.root.as_path());

        if let Err(e) = create_dir_all(dir).await {
            debug!(dir = %dir.display(), error = %e, "Could not create bucket directory");
        }

        let create_error = |source: std::io::Error| StorageError::FileCreate {
            path: path.display().to_string(),
            source,
        };
        let (file, temp_path) = temp_builder()
            .tempfile_in(dir)
            .map_err(create_error)?
            .into_parts();

        let write_error = |source: std::io::Error| StorageError::FileWrite {
            path: path.display().to_string(),
            source,
        };
        let mut file = tokio::fs::File::from_std(file);
        file.write_all(content).await.map_err(write_error)?;
        file.flush().await.map_err(write_error)?;
        drop(file);

        temp_path
            .persist(&path)
            .map_err(|e| write_error(e.error))?;

        Ok(path)
    }
}

fn temp_builder() -> tempfile::Builder<'static, 'static> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".fsg-partial-");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    builder
}

#[cfg(unix)]
async fn create_dir_all(dir: &Path) -> std::io::Result<()> {
    tokio::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o777)
        .create(dir)
        .await
}

#[cfg(not(unix))]
async fn create_dir_all(dir: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path());

        assert!(!cache.exists("photos/2024", "cat.png").await);
        let path = cache.write("photos/2024", "cat.png", b"meow").await.unwrap();

        assert_eq!(path, dir.path().join("data/photos/2024/cat.png"));
        assert!(cache.exists("photos/2024", "cat.png").await);
        assert_eq!(cache.read("photos/2024", "cat.png").await.unwrap().as_ref(), b"meow");
    }

    #[tokio::test]
    async fn test_write_truncates_existing() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path());

        cache.write("b", "f.txt", b"a much longer payload").await.unwrap();
        cache.write("b", "f.txt", b"short").await.unwrap();
        assert_eq!(cache.read("b", "f.txt").await.unwrap().as_ref(), b"short");
    }

    #[tokio::test]
    async fn test_open_streams_in_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path());
        let content = vec![7u8; STREAM_CHUNK_SIZE * 2 + 10];
        cache.write("b", "big.bin", &content).await.unwrap();

        let chunks: Vec<_> = cache.open("b", "big.bin").await.unwrap().collect().await;
        assert!(chunks.len() >= 3);
        let total: usize = chunks.iter().map(|c| c.as_ref().unwrap().len()).sum();
        assert_eq!(total, content.len());
    }

    #[tokio::test]
    async fn test_open_missing_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path());
        assert!(matches!(
            cache.open("b", "nope").await,
            Err(StorageError::FileOpen { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_failure_when_bucket_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path());
        cache.write("", "blocker", b"x").await.unwrap();

        let result = cache.write("blocker", "f.txt", b"data").await;
        assert!(matches!(result, Err(StorageError::FileCreate { .. })));
    }

    #[rstest]
    #[case("..", "secret")]
    #[case("a/../..", "secret")]
    #[case("b", "..")]
    #[case("/etc", "passwd")]
    #[case("b", "")]
    fn test_path_for_rejects_escapes(#[case] bucket: &str, #[case] file_name: &str) {
        let cache = LocalCache::new("/srv/gateway");
        assert!(matches!(
            cache.path_for(bucket, file_name),
            Err(StorageError::IllegalPath(_))
        ));
    }

    #[test]
    fn test_path_for_nested_bucket() {
        let cache = LocalCache::new("/srv/gateway");
        assert_eq!(
            cache.path_for("a/b/c", "d.pdf").unwrap(),
            PathBuf::from("/srv/gateway/data/a/b/c/d.pdf")
        );
        assert_eq!(
            cache.path_for("", "d.pdf").unwrap(),
            PathBuf::from("/srv/gateway/data/d.pdf")
        );
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path());
        // A non-empty directory at the target cannot be replaced by a file.
        std::fs::create_dir_all(dir.path().join("data/b/f.bin/inner")).unwrap();

        let result = cache.write("b", "f.bin", b"payload").await;
        assert!(matches!(result, Err(StorageError::FileWrite { .. })));

        let entries: Vec<_> = std::fs::read_dir(dir.path().join("data/b"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("f.bin")]);
    }

    #[tokio::test]
    async fn test_target_absent_until_write_completes() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path());
        let content = vec![3u8; 32 * 1024 * 1024];
        let target = dir.path().join("data/b/f.bin");

        let writer = {
            let cache = cache.clone();
            let content = content.clone();
            tokio::spawn(async move { cache.write("b", "f.bin", &content).await })
        };

        while !writer.is_finished() {
            if let Ok(meta) = std::fs::metadata(&target) {
                assert_eq!(meta.len(), content.len() as u64);
            }
            tokio::task::yield_now().await;
        }

        writer.await.unwrap().unwrap();
        assert_eq!(std::fs::metadata(&target).unwrap().len(), content.len() as u64);
        assert_eq!(std::fs::read_dir(dir.path().join("data/b")).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_write_leaves_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path());
        let content = vec![5u8; 16 * 1024 * 1024];

        let write = cache.write("b", "f.bin", &content);
        let timed_out = tokio::time::timeout(std::time::Duration::from_micros(1), write).await;

        if timed_out.is_err() {
            assert!(!cache.exists("b", "f.bin").await);
            let leftovers = std::fs::read_dir(dir.path().join("data/b"))
                .map(|entries| entries.count())
                .unwrap_or(0);
            assert_eq!(leftovers, 0);
        }
    }
}
