use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration;
use futures::future::join_all;
use portfolio::core::models::{Collection, NewContact, NewProjectView, Record};
use portfolio::infrastructure::persistence::{
    InMemoryStore, SqliteStore, Storage, StorageMode, Store,
};
use serde_json::{Map, json};

fn stores() -> Vec<Storage> {
    let sqlite: Arc<dyn Store> = Arc::new(SqliteStore::open_url("sqlite::memory:").unwrap());
    vec![Storage::new(Arc::new(InMemoryStore::new())), Storage::new(sqlite)]
}

fn contact(n: usize) -> NewContact {
    NewContact {
        name: format!("Visitor {n}"),
        email: format!("visitor{n}@example.com"),
        message: "hello".to_string(),
    }
}

#[tokio::test]
async fn concurrent_creates_get_distinct_ids() {
    for storage in stores() {
        let ids = join_all((0..20).map(|n| storage.record_contact(contact(n))))
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 20, "{}", storage.mode());
        assert_eq!(storage.contacts().await.unwrap().len(), 20);
    }
}

#[tokio::test]
async fn recent_is_a_subset_of_all() {
    let memory = InMemoryStore::new();
    let mut fields = Map::new();
    fields.insert("project_name".into(), json!("Market Days"));
    fields.insert("user_ip".into(), json!(null));
    memory.insert_record(
        Collection::ProjectViews,
        Record {
            id: "old".into(),
            timestamp: chrono::Utc::now() - Duration::days(30),
            fields,
        },
    );
    let storage = Storage::new(Arc::new(memory));

    storage
        .record_view(NewProjectView {
            project_name: "Market Days".into(),
            user_ip: Some("10.0.0.1".into()),
        })
        .await
        .unwrap();

    let all = storage.project_views().await.unwrap();
    let recent = storage.recent_project_views(Duration::days(7)).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(recent.len(), 1);
    assert!(recent.iter().all(|view| all.contains(view)));
    assert_eq!(recent[0].user_ip.as_deref(), Some("10.0.0.1"));
}

#[tokio::test]
async fn records_decode_the_same_from_every_store() {
    for storage in stores() {
        let id = storage.record_contact(contact(1)).await.unwrap();
        storage
            .record_view(NewProjectView {
                project_name: "Book a Stay".into(),
                user_ip: None,
            })
            .await
            .unwrap();

        let contacts = storage.contacts().await.unwrap();
        assert_eq!(contacts[0].id, id);
        assert_eq!(contacts[0].email, "visitor1@example.com");
        assert!(!contacts[0].is_read);

        let views = storage.recent_project_views(Duration::days(7)).await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].project_name, "Book a Stay");
        assert_eq!(views[0].user_ip, None);
    }
}

#[tokio::test]
async fn stores_report_their_mode() {
    let modes: Vec<StorageMode> = stores().iter().map(Storage::mode).collect();
    assert_eq!(modes, vec![StorageMode::Memory, StorageMode::Sqlite]);
    assert!(modes[0].is_fallback());
    assert!(!modes[1].is_fallback());
}
