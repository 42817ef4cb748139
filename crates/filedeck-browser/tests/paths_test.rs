//! Path resolution and directory inference across backend layouts.
//!
//! Run with: `cargo test -p filedeck-browser --test paths_test`

mod helpers;

use filedeck_browser::{BrowserContext, DirectoryClassifier, PathResolver};
use filedeck_core::ItemIdentity;
use filedeck_storage::{DirectoryOptions, MemoryStorage, Storage};
use helpers::{setup_browser_with, test_config, USER};
use std::sync::Arc;

fn resolver(storage: MemoryStorage) -> PathResolver {
    let config = Arc::new(test_config());
    let context = BrowserContext::new(&config, Some("images"), USER);
    PathResolver::new(config, Arc::new(storage), context)
}

#[test]
fn test_trailing_separator_does_not_change_backend_key() {
    for storage in [
        MemoryStorage::new(),
        MemoryStorage::with_layout('\\', "D:\\files\\", "http://localhost/storage"),
    ] {
        let resolver = resolver(storage);
        for dir in ["/", "/alice", "/alice/sub", "/shares/team/2024"] {
            for name in ["", "a.jpg", "Résumé final.pdf"] {
                let plain = ItemIdentity::new().in_directory(dir).with_name(name);
                let slashed = ItemIdentity::new()
                    .in_directory(format!("{}/", dir))
                    .with_name(name);
                assert_eq!(
                    resolver.backend_key(&plain),
                    resolver.backend_key(&slashed),
                    "dir {:?} name {:?}",
                    dir,
                    name
                );
            }
        }
    }
}

#[test]
fn test_backend_key_round_trips_to_url_key() {
    let resolver = resolver(MemoryStorage::with_layout(
        '\\',
        "D:\\files\\",
        "http://localhost/storage",
    ));

    for (dir, name) in [
        ("/alice", "a.jpg"),
        ("/alice/deep/nested", "日本語.png"),
        ("/shares", "notes"),
    ] {
        let identity = ItemIdentity::new().in_directory(dir).with_name(name);
        let backend_key = resolver.backend_key(&identity);
        assert!(!backend_key.contains('/'));
        assert_eq!(
            resolver.translate_to_logical(&backend_key),
            resolver.url_key(&identity)
        );
    }
}

#[test]
fn test_thumbnail_and_source_share_name() {
    let resolver = resolver(MemoryStorage::new());
    let source = ItemIdentity::new().in_directory("/alice/trip").with_name("beach.jpg");

    let repr = resolver.resolve(&source.as_thumbnail());
    assert_eq!(repr.working_dir_path, "/alice/trip/thumbs/beach.jpg");
    assert_eq!(repr.url_key, "photos/alice/trip/thumbs/beach.jpg");
    assert_eq!(repr.absolute_path, "memory://photos/alice/trip/thumbs/beach.jpg");
    assert_eq!(resolver.resolve(&source).url_key, "photos/alice/trip/beach.jpg");
}

#[test]
fn test_resolution_leaves_identity_untouched() {
    let resolver = resolver(MemoryStorage::new());
    let source = ItemIdentity::new().in_directory("/alice").with_name("a.jpg");
    let before = resolver.resolve(&source);

    let _renamed = source.with_name("b.jpg");
    let _thumb = source.as_thumbnail();

    assert_eq!(resolver.resolve(&source), before);
}

#[tokio::test]
async fn test_is_directory_matches_parent_listing() {
    let storage = MemoryStorage::new();
    storage
        .make_directory("photos/alice/docs", DirectoryOptions::default())
        .await
        .unwrap();
    storage
        .put(
            "photos/alice/readme.txt",
            b"hi".to_vec(),
            filedeck_storage::Visibility::Public,
        )
        .await
        .unwrap();

    let resolver = resolver(storage.clone());
    let classifier = DirectoryClassifier::new(resolver.clone());
    let alice = ItemIdentity::new().in_directory("/alice");

    let listing = storage.directories("photos/alice").await.unwrap();
    for name in ["docs", "readme.txt", "missing"] {
        let identity = alice.with_name(name);
        let expected = listing.contains(&resolver.backend_key(&identity));
        assert_eq!(
            classifier.is_directory(&identity).await.unwrap(),
            expected,
            "{}",
            name
        );
    }
    assert!(classifier.is_directory(&alice.with_name("docs")).await.unwrap());
    assert!(!classifier
        .is_directory(&alice.with_name("readme.txt"))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_root_folder_is_a_directory_of_the_category_root() {
    let app = setup_browser_with(test_config(), Arc::new(MemoryStorage::new()), Some("image"));
    app.browser.ensure_default_folders().await.unwrap();

    let classifier = app.browser.classifier();
    assert!(classifier
        .is_directory(&ItemIdentity::new().in_directory("/alice"))
        .await
        .unwrap());
    assert!(classifier
        .is_directory(&ItemIdentity::new().in_directory("/shares"))
        .await
        .unwrap());
}
