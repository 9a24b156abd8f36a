// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Metadata store integration tests.
//!
//! These need a disposable PostgreSQL pointed at by `DATABASE_URL` and
//! are `#[ignore]`d so the default test run stays hermetic:
//!
//! ```text
//! DATABASE_URL=postgres://localhost/thumbforge_test cargo test -p thumbforge-db -- --ignored
//! ```
//!
//! Each test tags its rows with a unique `generated_by` marker and
//! scopes every listing to it, so runs are isolated even on a shared
//! database.

use thumbforge_core::NewThumbnail;
use thumbforge_db::{MetadataStore, NewVersion, ThumbnailFilter, ThumbnailUpdate};
use uuid::Uuid;

async fn store() -> MetadataStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for db tests");
    let store = MetadataStore::connect(&url).await.expect("connect");
    store.ensure_schema().await.expect("schema");
    store
}

fn marker() -> String {
    format!("test-{}", Uuid::new_v4())
}

fn record(marker: &str, preset: Option<&str>, model: &str) -> NewThumbnail {
    NewThumbnail {
        prompt: format!("prompt for {marker}"),
        preset: preset.map(String::from),
        width: 1280,
        height: 720,
        model: model.to_string(),
        s3_bucket: Some("thumbnails".into()),
        s3_key: Some(format!("thumbnails/custom/2026/02/{marker}-v1.png")),
        file_size_bytes: 1000,
        cost_cents: 5,
        generated_by: marker.to_string(),
        ..Default::default()
    }
}

fn scoped(marker: &str) -> ThumbnailFilter {
    ThumbnailFilter {
        generated_by: Some(marker.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn create_assigns_identity_and_version_one() {
    let store = store().await;
    let marker = marker();

    let created = store.create(&record(&marker, None, "flux-2-pro")).await.unwrap();
    assert_eq!(created.version, 1);
    assert!(created.readable_id.starts_with("TH-"));
    assert_eq!(created.readable_id.len(), 9);
    assert!(created.deleted_at.is_none());
    assert_eq!(created.generated_by, marker);

    let fetched = store.get_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(fetched.id, created.id);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn deleted_rows_disappear_from_reads() {
    let store = store().await;
    let marker = marker();
    let created = store.create(&record(&marker, None, "flux-2-pro")).await.unwrap();

    assert!(store.delete(created.id).await.unwrap());
    assert!(store.get_by_id(created.id).await.unwrap().is_none());
    assert!(store.get_with_versions(created.id).await.unwrap().is_none());

    // Second delete affects nothing.
    assert!(!store.delete(created.id).await.unwrap());

    // Tombstoned rows reject updates.
    let update = ThumbnailUpdate {
        feedback: Some("too dark".into()),
        metadata: None,
    };
    assert!(store.update(created.id, &update).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn update_is_partial_and_refreshes_updated_at() {
    let store = store().await;
    let marker = marker();
    let created = store.create(&record(&marker, None, "flux-2-pro")).await.unwrap();

    let updated = store
        .update(
            created.id,
            &ThumbnailUpdate {
                feedback: Some("great".into()),
                metadata: None,
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.feedback.as_deref(), Some("great"));
    assert_eq!(updated.metadata, created.metadata);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn version_bump_archives_previous_artifact() {
    let store = store().await;
    let marker = marker();
    let created = store.create(&record(&marker, None, "flux-2-pro")).await.unwrap();
    let old_key = created.s3_key.clone();

    let bump = NewVersion {
        new_s3_key: format!("thumbnails/custom/2026/02/{marker}-v2.png"),
        new_s3_bucket: "thumbnails".into(),
        new_file_size_bytes: 2000,
        new_prompt: None,
        feedback: Some("retry with more contrast".into()),
        generation_time_ms: None,
        cost_cents: None,
        seed: None,
    };
    let (updated, archived) = store.create_version(created.id, &bump).await.unwrap();

    assert_eq!(updated.version, 2);
    assert_eq!(updated.s3_key.as_deref(), Some(bump.new_s3_key.as_str()));
    assert!(updated.updated_at > created.created_at);

    assert_eq!(archived.version, 1);
    assert_eq!(archived.s3_key, old_key);
    assert_eq!(archived.file_size_bytes, 1000);
    assert_eq!(archived.feedback.as_deref(), Some("retry with more contrast"));

    let (_, versions) = store.get_with_versions(created.id).await.unwrap().unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].version, 1);

    // version == 1 + count(version rows) after every bump.
    let (after_second, _) = store.create_version(created.id, &bump).await.unwrap();
    let (_, versions) = store.get_with_versions(created.id).await.unwrap().unwrap();
    assert_eq!(after_second.version, 3);
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0].version, 2);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn version_bump_on_missing_row_fails() {
    let store = store().await;
    let bump = NewVersion {
        new_s3_key: "k".into(),
        new_s3_bucket: "b".into(),
        new_file_size_bytes: 0,
        new_prompt: None,
        feedback: None,
        generation_time_ms: None,
        cost_cents: None,
        seed: None,
    };
    let err = store.create_version(Uuid::new_v4(), &bump).await.unwrap_err();
    assert!(matches!(err, thumbforge_db::StoreError::NotFound));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn list_filters_and_paginates() {
    let store = store().await;
    let marker = marker();

    for _ in 0..3 {
        store
            .create(&record(&marker, Some("og-image"), "reve-create"))
            .await
            .unwrap();
    }
    for _ in 0..2 {
        store
            .create(&record(&marker, Some("youtube"), "flux-2-pro"))
            .await
            .unwrap();
    }
    store.create(&record(&marker, None, "flux-2-pro")).await.unwrap();

    let og = store
        .list(
            &ThumbnailFilter {
                preset: Some("og-image".into()),
                ..scoped(&marker)
            },
            1,
            10,
        )
        .await
        .unwrap();
    assert_eq!(og.total, 3);
    assert_eq!(og.items.len(), 3);

    let page2 = store.list(&scoped(&marker), 2, 2).await.unwrap();
    assert_eq!(page2.total, 6);
    assert_eq!(page2.items.len(), 2);

    // Beyond the last page: empty items, correct total.
    let beyond = store.list(&scoped(&marker), 9, 10).await.unwrap();
    assert_eq!(beyond.total, 6);
    assert!(beyond.items.is_empty());

    // Newest first.
    let all = store.list(&scoped(&marker), 1, 10).await.unwrap();
    for pair in all.items.windows(2) {
        assert!(pair[0].created_at >= pair[1].created_at);
    }

    let searched = store
        .list(
            &ThumbnailFilter {
                search: Some(marker.to_uppercase()),
                ..scoped(&marker)
            },
            1,
            10,
        )
        .await
        .unwrap();
    assert_eq!(searched.total, 6);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn stats_aggregate_live_rows_only() {
    let store = store().await;
    let marker = marker();

    store
        .create(&record(&marker, Some("og-image"), "reve-create"))
        .await
        .unwrap();
    store.create(&record(&marker, None, "flux-2-pro")).await.unwrap();
    let doomed = store.create(&record(&marker, None, "flux-2-pro")).await.unwrap();
    store.delete(doomed.id).await.unwrap();

    let stats = store.stats().await.unwrap();
    assert!(stats.total >= 2);
    assert!(*stats.by_preset.get("og-image").unwrap_or(&0) >= 1);
    // NULL presets report under "custom".
    assert!(*stats.by_preset.get("custom").unwrap_or(&0) >= 1);
    assert!(*stats.by_model.get("reve-create").unwrap_or(&0) >= 1);
    assert!(stats.total_size_bytes >= 2000);
    assert!(stats.total_cost_cents >= 10);
}
