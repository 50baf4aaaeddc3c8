use reelvault_core::{
    ContentIndex, DeleteTarget, FsBlobStore, IndexOptions, Reconciler, StoreError, TtlSpec,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

struct Scratch {
    root: PathBuf,
}

impl Scratch {
    fn new() -> Self {
        Self {
            root: std::env::temp_dir().join(format!("reelvault_it_{}", uuid::Uuid::new_v4())),
        }
    }

    fn storage(&self) -> PathBuf {
        self.root.join("videos")
    }

    fn index_path(&self) -> PathBuf {
        self.root.join("file-hash-map.json")
    }

    async fn open(&self) -> ContentIndex<FsBlobStore> {
        let blobs = Arc::new(FsBlobStore::create(self.storage()).await.unwrap());
        ContentIndex::open(blobs, self.index_path(), IndexOptions::default())
            .await
            .unwrap()
    }

    async fn files(&self) -> Vec<String> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(self.storage()).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        names
    }

    async fn cleanup(self) {
        fs::remove_dir_all(&self.root).await.ok();
    }
}

async fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_slice(&fs::read(path).await.unwrap()).unwrap()
}

#[tokio::test]
async fn test_upload_scenario_on_disk() {
    let scratch = Scratch::new();
    let index = scratch.open().await;

    let first = index.put(b"b1 bytes", "MP4", None, TtlSpec::parse(None)).await.unwrap();
    assert!(!first.is_duplicate);
    assert!(!first.entry.is_permanent);

    let second = index
        .put(b"b1 bytes", ".mp4", None, TtlSpec::parse(Some("0")))
        .await
        .unwrap();
    assert!(second.is_duplicate);
    assert_eq!(second.filename, first.filename);
    assert!(second.entry.is_permanent);

    let third = index
        .put(b"b1 bytes", ".mp4", None, TtlSpec::parse(Some("5")))
        .await
        .unwrap();
    assert!(third.entry.is_permanent);
    assert_eq!(third.entry.expires_at, None);

    assert_eq!(scratch.files().await, vec![first.filename.clone()]);
    assert_eq!(
        fs::read(scratch.storage().join(&first.filename)).await.unwrap(),
        b"b1 bytes"
    );

    let on_disk = read_json(&scratch.index_path()).await;
    assert_eq!(
        on_disk[first.digest.as_str()],
        json!({
            "filename": first.filename,
            "title": null,
            "expiresAt": null,
            "isPermanent": true,
            "likes": 0,
            "comments": []
        })
    );

    scratch.cleanup().await;
}

#[tokio::test]
async fn test_externally_deleted_file_is_healed_on_list() {
    let scratch = Scratch::new();
    let index = scratch.open().await;

    let kept = index.put(b"kept", ".mp4", None, TtlSpec::Default).await.unwrap();
    let lost = index.put(b"lost", ".mkv", None, TtlSpec::Default).await.unwrap();
    fs::remove_file(scratch.storage().join(&lost.filename)).await.unwrap();

    let listed = index.list().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].filename, kept.filename);
    assert_eq!(listed[0].size, 4);

    assert!(matches!(index.like(&lost.filename).await, Err(StoreError::NotFound(_))));

    scratch.cleanup().await;
}

#[tokio::test]
async fn test_restart_heals_dangling_entries_and_sweeps_orphans() {
    let scratch = Scratch::new();
    fs::create_dir_all(scratch.storage()).await.unwrap();
    fs::write(scratch.storage().join("present.webm"), b"present").await.unwrap();
    fs::write(scratch.storage().join("orphan.mp4"), b"orphan").await.unwrap();
    fs::write(
        scratch.index_path(),
        serde_json::to_vec(&json!({
            "video123": {
                "filename": "video123.mp4",
                "title": "missing",
                "expiresAt": null,
                "isPermanent": true,
                "likes": 1,
                "comments": []
            },
            "present": {
                "filename": "present.webm",
                "title": ["wrapped title"],
                "expiresAt": null,
                "isPermanent": true,
                "likes": "7",
                "comments": null
            }
        }))
        .unwrap(),
    )
    .await
    .unwrap();

    let index = Arc::new(scratch.open().await);

    assert!(index.get("video123.mp4").await.is_none());
    let (_, present) = index.get("present.webm").await.unwrap();
    assert_eq!(present.title.as_deref(), Some("wrapped title"));
    assert_eq!(present.likes, 0);
    assert!(present.comments.is_empty());

    let on_disk = read_json(&scratch.index_path()).await;
    assert!(on_disk.get("video123").is_none());
    assert_eq!(on_disk["present"]["title"], json!("wrapped title"));

    let summary = Reconciler::new(Arc::clone(&index)).sweep().await;
    assert_eq!(summary.orphans, 1);
    assert_eq!(scratch.files().await, vec!["present.webm".to_string()]);

    scratch.cleanup().await;
}

#[tokio::test]
async fn test_corrupt_index_starts_empty() {
    let scratch = Scratch::new();
    fs::create_dir_all(&scratch.root).await.unwrap();
    fs::write(scratch.index_path(), b"{\"truncated\": {\"filename\": ").await.unwrap();

    let index = scratch.open().await;
    assert!(index.is_empty().await);
    assert_eq!(read_json(&scratch.index_path()).await, json!({}));

    scratch.cleanup().await;
}

#[tokio::test]
async fn test_delete_all_wipes_directory() {
    let scratch = Scratch::new();
    let index = scratch.open().await;

    index.put(b"one", ".mp4", None, TtlSpec::Default).await.unwrap();
    index.put(b"two", ".webm", None, TtlSpec::Permanent).await.unwrap();
    fs::write(scratch.storage().join("stray.bin"), b"?").await.unwrap();

    let outcome = index.delete(&DeleteTarget::parse("all")).await.unwrap();
    assert_eq!(outcome.files_removed, 3);
    assert_eq!(outcome.entries_removed, 2);
    assert!(scratch.files().await.is_empty());

    scratch.cleanup().await;
}

#[tokio::test]
async fn test_open_index_owner_excludes_other_openers() {
    let scratch = Scratch::new();
    let owner = Arc::new(scratch.open().await);
    let stored = owner.put(b"video", ".mp4", None, TtlSpec::Permanent).await.unwrap();

    let blobs = Arc::new(FsBlobStore::create(scratch.storage()).await.unwrap());
    let second = ContentIndex::open(blobs, scratch.index_path(), IndexOptions::default()).await;
    assert!(matches!(second, Err(StoreError::IndexInUse { .. })));

    // The owner's view is still complete, so its sweep keeps the upload
    let summary = Reconciler::new(Arc::clone(&owner)).sweep().await;
    assert_eq!(summary.orphans, 0);
    assert_eq!(scratch.files().await, vec![stored.filename.clone()]);
    assert!(read_json(&scratch.index_path()).await.get(stored.digest.as_str()).is_some());

    scratch.cleanup().await;
}
