use std::{fs, path::Path, sync::Arc, time::Duration};

use rigstage::{AssetError, FsAssetSource, ModelCache};

fn write(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn robot_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "bot/bot.json",
        r#"{
            "name": "bot",
            "joints": [
                { "name": "base" },
                { "name": "head_pan_joint", "parent": "base", "origin": [0, 1, 0], "limit": { "lower": -1, "upper": 1 } }
            ],
            "visuals": [ { "joint": "base", "mesh": "meshes/body.json" } ]
        }"#,
    );
    write(dir.path(), "bot/meshes/body.json", r#"{ "positions": [[-0.5, 0, -0.5], [0.5, 1.5, 0.5]] }"#);
    dir
}

#[test]
fn same_asset_resolves_to_one_template() {
    let dir = robot_dir();
    let mut cache = ModelCache::new(Arc::new(FsAssetSource::new(dir.path())));

    let ids: Vec<_> = (0..4).map(|_| cache.request("bot/bot.json")).collect();
    assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));
    let template = cache.wait_for(ids[0], Duration::from_secs(5)).unwrap();
    assert_eq!(cache.entry(ids[0]).unwrap().requests, 4);
    assert_eq!(template.joints.names(), vec!["base".to_string(), "head_pan_joint".to_string()]);

    let status = cache.status(ids[0]);
    assert!(!status.loading);
    assert!(status.error.is_none());
}

#[test]
fn instances_share_geometry_not_joint_state() {
    let dir = robot_dir();
    let mut cache = ModelCache::new(Arc::new(FsAssetSource::new(dir.path())));
    let id = cache.request("bot/bot.json");
    let template = cache.wait_for(id, Duration::from_secs(5)).unwrap();

    let mut first = ModelCache::instantiate(&template);
    let second = ModelCache::instantiate(&template);
    assert!(first.joints.set_joint_value("head_pan_joint", 3.0));
    assert_eq!(first.joints.get_joint_value("head_pan_joint"), Some(1.0));
    assert_eq!(second.joints.get_joint_value("head_pan_joint"), Some(0.0));
    assert!(Arc::ptr_eq(&first.visuals[0].positions, &second.visuals[0].positions));
}

#[test]
fn missing_description_fails_softly() {
    let dir = robot_dir();
    let mut cache = ModelCache::new(Arc::new(FsAssetSource::new(dir.path())));
    let id = cache.request("nothing/here.json");

    match cache.wait_for(id, Duration::from_secs(5)) {
        Err(AssetError::Failed { asset_id, message }) => {
            assert_eq!(asset_id, "nothing/here.json");
            assert!(message.contains("not found"));
        }
        other => panic!("expected a failed load, got {other:?}"),
    }
    let status = cache.status(id);
    assert!(!status.loading);
    assert!(status.error.is_some());
    // a failed entry is not retried
    assert_eq!(cache.request("nothing/here.json"), id);
    assert_eq!(cache.in_flight(), 0);
}

#[test]
fn broken_mesh_is_reported_but_model_loads() {
    let dir = robot_dir();
    write(dir.path(), "bot/meshes/body.json", "{ not json");
    let mut cache = ModelCache::new(Arc::new(FsAssetSource::new(dir.path())));
    let id = cache.request("bot/bot.json");

    let template = cache.wait_for(id, Duration::from_secs(5)).unwrap();
    assert!(template.visuals.is_empty());
    let status = cache.status(id);
    assert!(!status.loading);
    assert!(status.error.unwrap().contains("body.json"));
}
