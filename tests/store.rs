//! Persistence through the directory-backed store.

use telecue::{
    EngineError, Session, SessionSettings, StoreError,
    automation::{AutomationTrack, Keyframe},
    model::{GeneratedLine, Script, Segment},
    store::{FileStore, KeyValueStore, ScriptStore, TrackStore},
};

fn track() -> AutomationTrack {
    AutomationTrack::from_keyframes([
        Keyframe::new(0.0, 0.0),
        Keyframe::new(1000.0, 100.0),
        Keyframe::new(2000.0, 50.0),
    ])
}

mod file_store {
    use super::*;

    #[test]
    fn test_track_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let mut tracks = TrackStore::new(Box::new(FileStore::open(dir.path()).unwrap()));
        tracks.save("talk-1", &track()).unwrap();
        assert!(dir.path().join("automation%3Atalk-1.json").exists());

        let reopened = TrackStore::new(Box::new(FileStore::open(dir.path()).unwrap()));
        let loaded = reopened.load("talk-1").unwrap().unwrap();
        assert_eq!(loaded, track());
        assert_eq!(loaded.offset_at(1500.0), Some(75.0));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();
        store.set("script:x", "{}".to_string()).unwrap();
        store.remove("script:x").unwrap();
        store.remove("script:x").unwrap();
        assert_eq!(store.get("script:x").unwrap(), None);
    }

    #[test]
    fn test_only_the_empty_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.set("", "1".to_string()),
            Err(StoreError::InvalidKey(_))
        ));
        for key in [".hidden", "a/b", "script:My Talk", "automation:ümlaut"] {
            store.set(key, key.to_string()).unwrap();
        }
        for key in [".hidden", "a/b", "script:My Talk", "automation:ümlaut"] {
            assert_eq!(store.get(key).unwrap().as_deref(), Some(key));
        }
    }

    #[test]
    fn test_similar_keys_map_to_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();
        store.set("automation:x:y", "colon".to_string()).unwrap();
        assert_eq!(store.get("automation:x__y").unwrap(), None);

        store.set("automation:x__y", "underscores".to_string()).unwrap();
        assert_eq!(store.get("automation:x:y").unwrap().as_deref(), Some("colon"));
        assert_eq!(
            store.get("automation:x__y").unwrap().as_deref(),
            Some("underscores")
        );
    }

    #[test]
    fn test_ids_with_spaces_persist() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracks = TrackStore::new(Box::new(FileStore::open(dir.path()).unwrap()));
        tracks.save("My Talk", &track()).unwrap();

        let reopened = TrackStore::new(Box::new(FileStore::open(dir.path()).unwrap()));
        assert_eq!(reopened.load("My Talk").unwrap(), Some(track()));
        assert_eq!(reopened.load("My_Talk").unwrap(), None);
    }

    #[test]
    fn test_script_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut scripts = ScriptStore::new(Box::new(FileStore::open(dir.path()).unwrap()));

        let mut script = Script::from_generated(vec![
            GeneratedLine {
                text: "Hello there".to_string(),
                duration_ms: 1200,
            },
            GeneratedLine {
                text: "and goodbye".to_string(),
                duration_ms: 900,
            },
        ]);
        script.title = Some("Demo".to_string());
        scripts.save(&script).unwrap();

        let loaded = scripts.load(&script.id).unwrap().unwrap();
        assert_eq!(loaded.title.as_deref(), Some("Demo"));
        assert_eq!(loaded.segments.len(), 2);
        assert_eq!(loaded.segments[1].text(), "and goodbye");
        assert_eq!(loaded.duration_ms(), 2100);

        scripts.delete(&script.id).unwrap();
        assert!(scripts.load(&script.id).unwrap().is_none());
    }
}

mod session_tracks {
    use super::*;

    fn script() -> Script {
        Script {
            id: "talk-1".to_string(),
            title: None,
            segments: vec![Segment::from_text("one", 1000), Segment::from_text("two", 1000)],
        }
    }

    #[test]
    fn test_session_sees_and_deletes_stored_track() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracks = TrackStore::new(Box::new(FileStore::open(dir.path()).unwrap()));
        tracks.save("talk-1", &track()).unwrap();

        let mut s = Session::new(script(), SessionSettings::default(), tracks).unwrap();
        assert!(s.has_automation_track().unwrap());

        s.delete_automation_track().unwrap();
        assert!(!s.has_automation_track().unwrap());
        assert!(s.start_automation().is_err());
    }

    #[test]
    fn test_missing_track_for_spaced_id_is_reported_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let tracks = TrackStore::new(Box::new(FileStore::open(dir.path()).unwrap()));
        let mut named = script();
        named.id = "My Talk".to_string();

        let mut s = Session::new(named, SessionSettings::default(), tracks).unwrap();
        assert!(matches!(
            s.start_automation(),
            Err(EngineError::NoAutomationTrack { script_id }) if script_id == "My Talk"
        ));
    }

    #[test]
    fn test_empty_stored_track_does_not_count() {
        let mut tracks = TrackStore::in_memory();
        tracks.save("talk-1", &AutomationTrack::default()).unwrap();
        let mut s = Session::new(script(), SessionSettings::default(), tracks).unwrap();
        assert!(!s.has_automation_track().unwrap());
        assert!(s.start_automation().is_err());
    }

    #[test]
    fn test_runtime_settings_are_validated() {
        let mut s = Session::new(script(), SessionSettings::default(), TrackStore::in_memory())
            .unwrap();
        assert!(s.set_speed(0.0).is_err());
        assert!(s.set_focal_position(1.0).is_err());
        assert!(s.set_focal_position(0.3).is_ok());

        assert!(!s.video_sync_enabled());
        s.set_video_sync(true);
        assert!(s.video_sync_enabled());
    }
}
