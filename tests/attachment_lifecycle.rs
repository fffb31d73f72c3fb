use attachment_meta::{
    Attachment, AttachmentPipeline, DiskFile, MetaConfig, MetaError, MetaField, MetaService,
    VariantMetadata, decode, encode,
    models::{metadata::MetadataSet, record::AttachmentKey},
    services::{
        attachment_store::{AttachmentStore, run_migrations},
        codec::encoded_empty,
    },
};
use pretty_assertions::assert_eq;
use sqlx::sqlite::SqlitePoolOptions;
use std::{fs, path::Path, sync::Arc};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

type Host = Attachment<DiskFile>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> DiskFile {
    let mut data = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    data.extend_from_slice(&13u32.to_be_bytes());
    data.extend_from_slice(b"IHDR");
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&[8, 6, 0, 0, 0, 0, 0, 0, 0]);
    let path = dir.join(name);
    fs::write(&path, data).unwrap();
    DiskFile::new(path)
}

fn write_file(dir: &Path, name: &str, data: &[u8]) -> DiskFile {
    let path = dir.join(name);
    fs::write(&path, data).unwrap();
    DiskFile::new(path)
}

fn service() -> MetaService {
    MetaService::new(MetaConfig::for_attachment("avatar"))
}

fn pipeline() -> AttachmentPipeline<Host> {
    AttachmentPipeline::new().register(service())
}

async fn store() -> AttachmentStore {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    run_migrations(&pool).await.unwrap();
    AttachmentStore::new(Arc::new(pool))
}

#[tokio::test]
async fn reprocessing_one_style_keeps_the_others() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = store().await;
    let key = AttachmentKey::new("user", Uuid::new_v4(), "avatar");
    let pipeline = pipeline();

    // First upload: every style is rendered.
    let mut host: Host = Attachment::new("avatar", ["medium", "thumb"]);
    pipeline
        .post_process(&mut host, |host| {
            host.queue_write("original", write_png(dir.path(), "o.png", 1200, 800));
            host.queue_write("medium", write_png(dir.path(), "m.png", 600, 400));
            host.queue_write("thumb", write_png(dir.path(), "t.png", 120, 80));
            Ok::<_, MetaError>(())
        })
        .unwrap();
    pipeline
        .save(&mut host, |host| {
            host.flush_queues();
            Ok::<_, MetaError>(())
        })
        .unwrap();
    store.save_meta(&key, host.meta()).await.unwrap();

    // Later: only the thumbnail is regenerated, on a freshly loaded record.
    let loaded = store.load_meta(&key).await.unwrap();
    let mut host: Host = Attachment::new("avatar", ["medium", "thumb"]).with_meta(loaded);
    pipeline
        .post_process(&mut host, |host| {
            host.queue_write("thumb", write_png(dir.path(), "t2.png", 90, 60));
            Ok::<_, MetaError>(())
        })
        .unwrap();
    store.save_meta(&key, host.meta()).await.unwrap();

    let stored = store.load_metadata(&key).await.unwrap().unwrap();
    assert_eq!(stored.get("thumb").map(|m| (m.width, m.height)), Some((Some(90), Some(60))));
    assert_eq!(stored.get("medium").and_then(|m| m.width), Some(600));
    assert_eq!(stored.get("original").and_then(|m| m.height), Some(800));

    let svc = service();
    assert_eq!(svc.image_size(&host, Some("medium")).unwrap(), "600x400");
    assert_eq!(svc.image_size(&host, None).unwrap(), "1200x800");
    assert_eq!(svc.size(&host, Some("thumb")).unwrap(), Some(33));
}

#[tokio::test]
async fn deleting_content_resets_stored_metadata() {
    init_tracing();
    let store = store().await;
    let key = AttachmentKey::new("user", Uuid::new_v4(), "avatar");
    let existing: MetadataSet = [("original", VariantMetadata::new(10, 10, 100))]
        .into_iter()
        .collect();
    store.save_meta(&key, Some(&encode(&existing))).await.unwrap();

    let loaded = store.load_meta(&key).await.unwrap();
    let mut host: Host = Attachment::new("avatar", ["thumb"]).with_meta(loaded);
    host.clear();
    pipeline()
        .save(&mut host, |host| {
            host.flush_queues();
            Ok::<_, MetaError>(())
        })
        .unwrap();
    store.save_meta(&key, host.meta()).await.unwrap();

    assert_eq!(store.load_meta(&key).await.unwrap(), Some(encoded_empty()));
    assert_eq!(
        store.load_metadata(&key).await.unwrap(),
        Some(MetadataSet::new())
    );
}

#[test]
fn documents_get_empty_metadata_but_unreadable_variants_fail_the_batch() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let pdf = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n";

    let mut host: Host = Attachment::new("avatar", ["thumb"]);
    pipeline()
        .post_process(&mut host, |host| {
            host.queue_write("original", write_file(dir.path(), "doc.pdf", pdf));
            Ok::<_, MetaError>(())
        })
        .unwrap();
    let stored = decode(host.meta().unwrap()).unwrap();
    assert_eq!(stored.get("original"), Some(&VariantMetadata::empty()));
    assert_eq!(service().image_size(&host, None).unwrap(), "nullxnull");

    let mut host: Host = Attachment::new("avatar", ["thumb"]);
    let result = pipeline().post_process(&mut host, |host| {
        host.queue_write("original", write_file(dir.path(), "doc2.pdf", pdf));
        host.queue_write("thumb", DiskFile::new(dir.path().join("never-written.png")));
        Ok::<_, MetaError>(())
    });
    match result {
        Err(MetaError::Extraction(err)) => assert_eq!(err.style, "thumb"),
        other => panic!("expected extraction error, got {other:?}"),
    }
    assert_eq!(host.meta(), None);
}

#[test]
fn corrupt_column_fails_reads_and_processing() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let svc = service();
    let mut host: Host =
        Attachment::new("avatar", ["thumb"]).with_meta(Some("corrupted==".to_string()));

    assert!(svc.read_field(&host, "thumb", MetaField::Width).is_err());

    let result = pipeline().post_process(&mut host, |host| {
        host.queue_write("thumb", write_png(dir.path(), "t.png", 4, 4));
        Ok::<_, MetaError>(())
    });
    assert!(matches!(result, Err(MetaError::Decode(_))));
    assert_eq!(host.meta(), Some("corrupted=="));
}
