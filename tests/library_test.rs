use shadow_studio::annotations::{AnnotationStore, Note};
use shadow_studio::library::Library;
use shadow_studio::media::PlayableRef;
use shadow_studio::store::{FsStore, LibraryStore};
use shadow_studio::utils::scan::scan_directory;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_course(root: &Path) {
    let course = root.join("course");
    fs::create_dir_all(course.join("unit1")).unwrap();
    fs::create_dir_all(course.join("unit2")).unwrap();
    fs::create_dir_all(course.join(".cache")).unwrap();
    fs::write(course.join("unit1/lesson10.mp3"), b"ten").unwrap();
    fs::write(course.join("unit1/lesson2.mp3"), b"two").unwrap();
    fs::write(course.join("unit2/dialog.wav"), b"wave").unwrap();
    fs::write(course.join("unit2/transcript.txt"), b"not audio").unwrap();
    fs::write(course.join(".cache/hidden.mp3"), b"skip").unwrap();
}

async fn import(source: &Path, library_root: &Path) -> Library<FsStore> {
    let descriptors = scan_directory(&source.join("course")).unwrap();
    let store = FsStore::open(library_root).await.unwrap();
    let mut library = Library::new(store);
    library.ingest(descriptors, false, |_| {}).await.unwrap();
    library
}

fn paths<S: LibraryStore>(library: &Library<S>) -> Vec<String> {
    library
        .catalog()
        .tracks()
        .iter()
        .map(|t| t.path.clone())
        .collect()
}

#[tokio::test]
async fn test_import_survives_restart() {
    let source = TempDir::new().unwrap();
    let library_dir = TempDir::new().unwrap();
    write_course(source.path());

    let library = import(source.path(), library_dir.path()).await;
    assert_eq!(
        paths(&library),
        vec![
            "course/unit1/lesson2.mp3",
            "course/unit1/lesson10.mp3",
            "course/unit2/dialog.wav",
        ]
    );
    drop(library);

    // The original files can go away; the library keeps its own copies
    fs::remove_dir_all(source.path().join("course")).unwrap();

    let store = FsStore::open(library_dir.path()).await.unwrap();
    let mut restored = Library::new(store);
    let report = restored.restore(|_| {}).await;
    assert_eq!(report.restored, 3);
    assert_eq!(report.unplayable, 0);
    assert!(report.error.is_none());
    assert_eq!(
        paths(&restored),
        vec![
            "course/unit1/lesson2.mp3",
            "course/unit1/lesson10.mp3",
            "course/unit2/dialog.wav",
        ]
    );

    let id = restored.catalog().tracks()[0].id.clone();
    match restored.playable(&id) {
        Some(PlayableRef::File(path)) => assert_eq!(fs::read(path).unwrap(), b"two"),
        Some(PlayableRef::Memory(bytes)) => assert_eq!(&bytes[..], b"two"),
        None => panic!("restored track has no playable reference"),
    }
}

#[tokio::test]
async fn test_reimport_keeps_one_copy() {
    let source = TempDir::new().unwrap();
    let library_dir = TempDir::new().unwrap();
    write_course(source.path());

    let mut library = import(source.path(), library_dir.path()).await;
    let descriptors = scan_directory(&source.path().join("course")).unwrap();
    let report = library.ingest(descriptors, false, |_| {}).await.unwrap();

    assert_eq!(report.total_tracks, 3);
    assert_eq!(library.catalog().len(), 3);
    assert_eq!(library.store().get_all_tracks().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_annotations_persist_and_cascade() {
    let source = TempDir::new().unwrap();
    let library_dir = TempDir::new().unwrap();
    write_course(source.path());

    let mut library = import(source.path(), library_dir.path()).await;
    let lesson = library
        .catalog()
        .track_by_path("course/unit1/lesson2.mp3")
        .unwrap()
        .id
        .clone();
    let dialog = library
        .catalog()
        .track_by_path("course/unit2/dialog.wav")
        .unwrap()
        .id
        .clone();

    let mut annotations = AnnotationStore::new();
    assert!(annotations.load(library.store(), Some(lesson.clone())).await);
    annotations
        .add_note(library.store(), Note::new(1.5, "rising tone"))
        .await
        .unwrap();
    let imported = annotations
        .import_srt(
            library.store(),
            "1\n00:00:00,000 --> 00:00:01,200\nHello\n\n2\n00:00:01,500 --> 00:00:03,000\nGood morning\n",
        )
        .await
        .unwrap();
    assert_eq!(imported, Some(2));

    // A fresh store over the same directory sees the saved collections
    let reopened = FsStore::open(library_dir.path()).await.unwrap();
    let loaded = AnnotationStore::fetch(&reopened, lesson.clone()).await;
    assert_eq!(loaded.notes.len(), 1);
    assert_eq!(loaded.notes[0].content, "rising tone");
    assert_eq!(loaded.subtitles.len(), 2);
    assert_eq!(loaded.subtitles[1].text, "Good morning");

    let removal = library.delete_node("course/unit1").await.unwrap();
    assert!(removal.store_error.is_none());
    assert_eq!(removal.removed.len(), 2);
    assert!(removal.removed.contains(&lesson));
    assert_eq!(paths(&library), vec!["course/unit2/dialog.wav"]);
    assert!(library.playable(&lesson).is_none());
    assert!(library.playable(&dialog).is_some());

    let loaded = AnnotationStore::fetch(&reopened, lesson).await;
    assert!(loaded.notes.is_empty());
    assert!(loaded.subtitles.is_empty());
    assert_eq!(reopened.get_all_tracks().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_srt_export_renumbers() {
    let source = TempDir::new().unwrap();
    let library_dir = TempDir::new().unwrap();
    write_course(source.path());

    let library = import(source.path(), library_dir.path()).await;
    let id = library.catalog().tracks()[0].id.clone();

    let mut annotations = AnnotationStore::new();
    annotations.load(library.store(), Some(id)).await;
    annotations
        .import_srt(
            library.store(),
            "7\r\n00:00:05,000 --> 00:00:06,000\r\nSecond\r\n\r\n3\r\n00:00:01,000 --> 00:00:02,500\r\nFirst\r\n",
        )
        .await
        .unwrap();

    let exported = annotations.export_srt();
    assert!(exported.starts_with("1\n00:00:01,000 --> 00:00:02,500\nFirst\n"));
    assert!(exported.contains("2\n00:00:05,000 --> 00:00:06,000\nSecond"));
}
