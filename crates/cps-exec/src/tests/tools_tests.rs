use super::*;
use std::fs;

fn touch(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, "#!/bin/sh\n").unwrap();
    path
}

#[test]
fn explicit_path_is_used_when_it_exists() {
    let tmp = tempfile::tempdir().unwrap();
    let tool = touch(tmp.path(), "dispwin");
    let found = locate_tool(tool.to_str().unwrap(), &[]);
    assert_eq!(found, Some(tool));
}

#[test]
fn explicit_missing_path_is_none() {
    assert_eq!(locate_tool("/nonexistent/dir/dispwin", &[]), None);
}

#[test]
fn bare_name_found_in_search_paths() {
    let tmp = tempfile::tempdir().unwrap();
    let tool = touch(tmp.path(), "cps-test-tool-search");
    let search = vec![
        "/nonexistent/first".to_string(),
        tmp.path().to_string_lossy().into_owned(),
    ];
    assert_eq!(locate_tool("cps-test-tool-search", &search), Some(tool));
}

#[test]
fn bare_name_missing_everywhere_is_none() {
    assert_eq!(locate_tool("cps-surely-not-installed-anywhere", &[]), None);
}

#[test]
fn directories_are_not_tools() {
    let tmp = tempfile::tempdir().unwrap();
    fs::create_dir(tmp.path().join("dispwin-dir")).unwrap();
    let search = vec![tmp.path().to_string_lossy().into_owned()];
    assert_eq!(locate_tool("dispwin-dir", &search), None);
}

#[test]
fn resolve_falls_back_to_command_as_given() {
    assert_eq!(
        resolve_tool("cps-surely-not-installed-anywhere", &[]),
        PathBuf::from("cps-surely-not-installed-anywhere")
    );
}

#[test]
fn tools_from_config_uses_configured_paths() {
    let tmp = tempfile::tempdir().unwrap();
    let colormgr = touch(tmp.path(), "colormgr");
    let dispwin = touch(tmp.path(), "dispwin");
    let cfg = Config {
        colormgr_command: colormgr.to_string_lossy().into_owned(),
        dispwin_command: dispwin.to_string_lossy().into_owned(),
        device_kind: "display".to_string(),
        ..Config::default()
    };
    let tools = Tools::from_config(&cfg);
    assert_eq!(tools.colormgr, colormgr);
    assert_eq!(tools.dispwin, dispwin);
    assert_eq!(tools.device_kind, "display");
}

#[test]
fn tools_new_defaults_to_display_kind() {
    let tools = Tools::new("colormgr", "dispwin");
    assert_eq!(tools.device_kind, "display");
    assert_eq!(tools.dispwin, PathBuf::from("dispwin"));
}
