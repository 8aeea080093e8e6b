use std::sync::Arc;

use psync_conf::Settings;
use psync_server::SyncService;
use psync_workspace::DocumentDescriptor;
use psync_workspace::DocumentPath;
use psync_workspace::InMemoryProjectModel;
use psync_workspace::ProjectKey;
use psync_workspace::ProjectModel;

fn start() -> SyncService<InMemoryProjectModel> {
    let (model, events) = InMemoryProjectModel::new();
    SyncService::start(model, events, &Settings::default())
}

#[tokio::test]
async fn editor_session_moves_documents_between_projects() {
    let service = start();
    let page = DocumentPath::new("/w/src/page.html");
    let app = DocumentPath::new("/w/app.proj");

    service
        .open_document(page.clone(), Arc::from("<p>draft</p>"), 1)
        .await
        .unwrap();
    assert_eq!(
        service.owner_of(page.clone()).await.unwrap(),
        Some(ProjectKey::Miscellaneous)
    );

    service
        .configure_project(
            app.clone(),
            vec![DocumentDescriptor::new(page.clone(), "page.html", None)],
        )
        .await
        .unwrap();
    assert_eq!(
        service.owner_of(page.clone()).await.unwrap(),
        Some(ProjectKey::Configured(app.clone()))
    );

    service
        .change_document(page.clone(), Arc::from("<p>final</p>"), 2)
        .await
        .unwrap();
    service.remove_project(app).await.unwrap();

    let current = service
        .with_coordinator({
            let page = page.clone();
            move |coordinator| {
                coordinator
                    .model()
                    .get_document(&ProjectKey::Miscellaneous, &page)
            }
        })
        .await
        .unwrap()
        .expect("document migrated to the miscellaneous project");

    assert_eq!(current.text(), "<p>final</p>");
    assert_eq!(service.version_cache().try_get_version(&current), Some(2));
}

#[tokio::test]
async fn version_cache_is_shared_with_callers() {
    let service = start();
    let page = DocumentPath::new("/w/page.html");

    service
        .open_document(page.clone(), Arc::from("one"), 10)
        .await
        .unwrap();
    assert_eq!(service.version_cache().latest_version(&page), Some(10));

    service.close_document(page.clone()).await.unwrap();
    assert_eq!(service.version_cache().latest_version(&page), None);
    assert_eq!(service.owner_of(page).await.unwrap(), None);
}

#[tokio::test]
async fn clones_share_one_coordinator() {
    let service = start();
    let other = service.clone();
    let page = DocumentPath::new("/w/page.html");

    other
        .open_document(page.clone(), Arc::from("text"), 1)
        .await
        .unwrap();
    assert_eq!(
        service.owner_of(page).await.unwrap(),
        Some(ProjectKey::Miscellaneous)
    );
}

#[tokio::test]
async fn settings_capacity_reaches_version_cache() {
    let (model, events) = InMemoryProjectModel::new();
    let settings = Settings {
        version_cache_capacity: 3,
        ..Settings::default()
    };
    let service = SyncService::start(model, events, &settings);
    let page = DocumentPath::new("/w/page.html");

    service
        .open_document(page.clone(), Arc::from("0"), 0)
        .await
        .unwrap();
    for version in 1..=5 {
        service
            .change_document(page.clone(), Arc::from(version.to_string()), version)
            .await
            .unwrap();
    }

    assert_eq!(service.version_cache().capacity(), 3);
    assert_eq!(service.version_cache().versions(&page), vec![3, 4, 5]);
}
