//! Filesystem-backed stores.
//!
//! Entries are named by the SHA-256 of their key, so arbitrary hosts, paths
//! and query strings map to safe file names. Every entry is one file, written
//! to a temp file first and renamed into place.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;

use super::{HttpMetadata, KvStore, ObjectStore, StoreError, StoredObject};

fn file_stem(key: &str) -> String {
    format!("{:x}", Sha256::digest(key.as_bytes()))
}

async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension(format!("tmp-{}", uuid::Uuid::new_v4()));
    fs::write(&tmp, contents).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Key-value store keeping one file per key under `<root>/kv`.
#[derive(Debug, Clone)]
pub struct FsKvStore {
    dir: PathBuf,
}

impl FsKvStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            dir: root.as_ref().join("kv"),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.value", file_stem(key)))
    }
}

#[async_trait]
impl KvStore for FsKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match read_optional(&self.path_for(key)).await? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|e| StoreError::Unavailable(format!("non UTF-8 value for {}: {}", key, e))),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: String) -> Result<(), StoreError> {
        write_atomic(&self.path_for(key), value.as_bytes()).await
    }
}

/// First line of an object file; the body follows it.
#[derive(Debug, Serialize, Deserialize)]
struct ObjectHeader {
    key: String,
    #[serde(flatten)]
    http_metadata: HttpMetadata,
}

/// Object store keeping one file per key under `<root>/objects`.
///
/// A file is a single-line JSON header (key and HTTP metadata), a newline,
/// then the raw body. Header and body are published by the same rename, so a
/// reader sees either the old entry or the new one, never a mix.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    dir: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            dir: root.as_ref().join("objects"),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.object", file_stem(key)))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StoreError> {
        let Some(contents) = read_optional(&self.path_for(key)).await? else {
            return Ok(None);
        };

        let Some(split) = contents.iter().position(|b| *b == b'\n') else {
            return Err(StoreError::Unavailable(format!("object entry for {} has no header", key)));
        };
        let header: ObjectHeader = serde_json::from_slice(&contents[..split])?;
        if header.key != key {
            return Err(StoreError::Unavailable(format!(
                "hash collision between {} and {}",
                key, header.key
            )));
        }

        Ok(Some(StoredObject {
            body: Bytes::from(contents).slice(split + 1..),
            http_metadata: header.http_metadata,
        }))
    }

    async fn put(&self, key: &str, body: Bytes, metadata: HttpMetadata) -> Result<(), StoreError> {
        // serde_json escapes newlines inside strings, so the header stays on one line.
        let mut contents = serde_json::to_vec(&ObjectHeader {
            key: key.to_string(),
            http_metadata: metadata,
        })?;
        contents.reserve(body.len() + 1);
        contents.push(b'\n');
        contents.extend_from_slice(&body);

        write_atomic(&self.path_for(key), &contents).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("edge-fs-store-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_kv_persists_across_instances() {
        let root = temp_root();
        FsKvStore::new(&root)
            .put("example.com/old?a=1", r#"{"target":"/new","type":301}"#.into())
            .await
            .unwrap();

        let reopened = FsKvStore::new(&root);
        let value = reopened.get("example.com/old?a=1").await.unwrap();
        assert_eq!(value.as_deref(), Some(r#"{"target":"/new","type":301}"#));
        assert!(reopened.get("example.com/other").await.unwrap().is_none());

        std::fs::remove_dir_all(&root).unwrap_or_default();
    }

    #[tokio::test]
    async fn test_objects_round_trip_with_metadata() {
        let root = temp_root();
        let store = FsObjectStore::new(&root);
        assert!(store.get("example.com/").await.unwrap().is_none());

        store
            .put(
                "example.com/",
                Bytes::from_static(b"<html></html>"),
                HttpMetadata {
                    content_type: Some("text/html".into()),
                },
            )
            .await
            .unwrap();

        let object = store.get("example.com/").await.unwrap().unwrap();
        assert_eq!(object.body, Bytes::from_static(b"<html></html>"));
        assert_eq!(object.http_metadata.content_type.as_deref(), Some("text/html"));

        std::fs::remove_dir_all(&root).unwrap_or_default();
    }

    #[tokio::test]
    async fn test_corrupt_header_is_an_error() {
        let root = temp_root();
        let store = FsObjectStore::new(&root);
        let path = store.path_for("k");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();

        std::fs::write(&path, b"{not json\nbody").unwrap();
        assert!(matches!(store.get("k").await, Err(StoreError::Decode(_))));

        std::fs::write(&path, b"no header at all").unwrap();
        assert!(matches!(store.get("k").await, Err(StoreError::Unavailable(_))));

        std::fs::remove_dir_all(&root).unwrap_or_default();
    }

    #[tokio::test]
    async fn test_replacing_entry_swaps_body_and_metadata_together() {
        let root = temp_root();
        let store = FsObjectStore::new(&root);

        store
            .put(
                "example.com/logo",
                Bytes::from_static(b"GIF89a"),
                HttpMetadata {
                    content_type: Some("image/gif".into()),
                },
            )
            .await
            .unwrap();
        store
            .put(
                "example.com/logo",
                Bytes::from_static(b"<svg/>\n<!-- two lines -->"),
                HttpMetadata {
                    content_type: Some("image/svg+xml".into()),
                },
            )
            .await
            .unwrap();

        let object = store.get("example.com/logo").await.unwrap().unwrap();
        assert_eq!(object.body, Bytes::from_static(b"<svg/>\n<!-- two lines -->"));
        assert_eq!(object.http_metadata.content_type.as_deref(), Some("image/svg+xml"));

        let files: Vec<_> = std::fs::read_dir(root.join("objects")).unwrap().collect();
        assert_eq!(files.len(), 1);

        std::fs::remove_dir_all(&root).unwrap_or_default();
    }

    #[tokio::test]
    async fn test_concurrent_writers_never_mix_entries() {
        let root = temp_root();
        let store = FsObjectStore::new(&root);

        let mut writers = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            writers.push(tokio::spawn(async move {
                store
                    .put(
                        "example.com/race",
                        Bytes::from(format!("body-{}", i)),
                        HttpMetadata {
                            content_type: Some(format!("text/x-{}", i)),
                        },
                    )
                    .await
                    .unwrap();
            }));
        }
        for writer in writers {
            writer.await.unwrap();
        }

        let object = store.get("example.com/race").await.unwrap().unwrap();
        let body = String::from_utf8(object.body.to_vec()).unwrap();
        let n = body.strip_prefix("body-").unwrap();
        assert_eq!(object.http_metadata.content_type, Some(format!("text/x-{}", n)));

        std::fs::remove_dir_all(&root).unwrap_or_default();
    }
}
