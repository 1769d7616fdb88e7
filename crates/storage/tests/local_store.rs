use creaition_storage::{
    upload_character_image, upload_scene_image, upload_story_cover, BlobStore, LocalStore,
    StorageError, MAX_FETCH_BYTES,
};

#[tokio::test]
async fn upload_then_fetch_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path(), "/assets");

    let url = store
        .upload("assets", "char_0.png", vec![1, 2, 3], "image/png")
        .await
        .unwrap();

    assert_eq!(url, "/assets/assets/char_0.png");
    assert!(dir.path().join("assets/char_0.png").exists());
    assert_eq!(store.fetch(&url).await.unwrap(), vec![1, 2, 3]);
}

#[tokio::test]
async fn upload_overwrites_existing_object() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path(), "/assets");

    store.upload("output", "a.png", vec![1], "image/png").await.unwrap();
    let url = store.upload("output", "a.png", vec![2], "image/png").await.unwrap();

    assert_eq!(store.fetch(&url).await.unwrap(), vec![2]);
}

#[tokio::test]
async fn scene_image_named_after_story_and_number() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path(), "/assets");

    let url = upload_scene_image(&store, "Night in Muar", 3, vec![9], "image/jpeg")
        .await
        .unwrap();

    assert_eq!(url, "/assets/output/Night_in_Muar_3.jpg");
}

#[tokio::test]
async fn cover_and_character_land_in_assets() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path(), "/assets");

    let (url, name) = upload_story_cover(&store, "Cats/Dogs", ".webp", vec![1], "image/webp")
        .await
        .unwrap();
    assert_eq!(name, "Cats_Dogs.webp");
    assert_eq!(url, "/assets/assets/Cats_Dogs.webp");

    let url = upload_character_image(&store, "char_1.png", vec![1], "image/png")
        .await
        .unwrap();
    assert_eq!(url, "/assets/assets/char_1.png");
}

#[tokio::test]
async fn fetch_missing_object_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path(), "/assets");

    let err = store.fetch("/assets/output/nope.png").await.unwrap_err();
    assert!(matches!(err, StorageError::Io(_)));
}

#[tokio::test]
async fn fetch_rejects_unknown_relative_url() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path(), "/assets");

    let err = store.fetch("relative/thing.png").await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidLocation(_)));
}

#[tokio::test]
async fn fetch_rejects_remote_urls() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path(), "/assets");

    for url in ["http://169.254.169.254/latest/meta-data/", "https://example.com/a.png"] {
        let err = store.fetch(url).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidLocation(_)), "{url}");
    }
}

#[tokio::test]
async fn fetch_rejects_oversized_objects() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path(), "/assets");
    std::fs::create_dir_all(dir.path().join("assets")).unwrap();
    std::fs::File::create(dir.path().join("assets").join("huge.png"))
        .unwrap()
        .set_len(MAX_FETCH_BYTES as u64 + 1)
        .unwrap();

    let err = store.fetch("/assets/assets/huge.png").await.unwrap_err();
    assert!(matches!(err, StorageError::TooLarge { limit } if limit == MAX_FETCH_BYTES));
}
