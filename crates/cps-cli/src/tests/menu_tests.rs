use super::*;
use cps_core::Profile;
use cps_exec::{Reply, ScriptedRunner};
use cps_profile::{LoaderStatus, ProfileApplier};
use std::sync::Arc;

const HELP: &str = "    1 = 'Monitor 1, Output eDP-1'\n    2 = 'Monitor 2, Output HDMI-1'\n";

fn device(path: &str, enabled: bool, output: &str, profiles: &[(&str, &str)]) -> Device {
    let mut d = Device::new(path);
    d.enabled = enabled;
    d.xrandr_name = output.to_string();
    d.device_id = format!("xrandr-{}", output);
    d.profiles = profiles.iter().map(|(id, p)| Profile::new(*id, *p)).collect();
    d
}

fn worker_with(runner: &Arc<ScriptedRunner>) -> ApplyWorker {
    let applier = ProfileApplier::new(runner.clone(), Tools::new("colormgr", "dispwin"));
    ApplyWorker::spawn(Arc::new(applier))
}

// ── build_menu ───────────────────────────────────────────────────

#[test]
fn enabled_device_greys_out_first_profile_only() {
    let menu = build_menu(&[device(
        "/org/x/1",
        true,
        "DP-1",
        &[("p1", "/icc/a.icc"), ("p2", "/icc/b.icc")],
    )]);
    let items = &menu.submenus[0].items;

    assert_eq!(items.len(), 3);
    assert_eq!(items[0].label, "* a.icc");
    assert!(!items[0].enabled);
    assert_eq!(items[1].label, "b.icc");
    assert!(items[1].enabled);
    assert_eq!(items[2].label, "Disable");
    assert!(items[2].enabled);
}

#[test]
fn disabled_device_greys_out_disable_entry() {
    let menu = build_menu(&[device(
        "/org/x/1",
        false,
        "eDP-1",
        &[("p1", "/icc/a.icc"), ("p2", "/icc/b.icc")],
    )]);
    let items = &menu.submenus[0].items;

    assert!(items[0].enabled);
    assert!(items[1].enabled);
    assert_eq!(items[2].label, "* Disable");
    assert!(!items[2].enabled);
}

#[test]
fn device_without_profiles_only_offers_disable() {
    let menu = build_menu(&[device("/org/x/1", true, "DP-1", &[])]);
    let items = &menu.submenus[0].items;
    assert_eq!(items.len(), 1);
    assert_eq!(
        items[0].command,
        MenuCommand::Disable {
            device_path: "/org/x/1".to_string(),
            output_name: "DP-1".to_string(),
        }
    );
}

#[test]
fn submenus_follow_inventory_order_and_display_names() {
    let mut unnamed = Device::new("/org/x/3");
    unnamed.model = "Generic Panel".to_string();
    let menu = build_menu(&[
        device("/org/x/1", true, "DP-1", &[]),
        device("/org/x/2", true, "HDMI-1", &[]),
        unnamed,
    ]);

    let labels: Vec<&str> = menu.submenus.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["DP-1", "HDMI-1", "Generic Panel"]);
    assert!(menu.status.is_none());
}

#[test]
fn empty_inventory_builds_empty_menu() {
    let menu = build_menu(&[]);
    assert!(menu.submenus.is_empty());
    assert!(menu.status.is_none());
    assert_eq!(menu.exit.label, EXIT_LABEL);
}

#[test]
fn every_menu_ends_with_exit_entry() {
    let built = build_menu(&[device("/org/x/1", true, "eDP-1", &[("p1", "/icc/a.icc")])]);
    let failed = Menu::unavailable(&Error::NotFound {
        output: "eDP-1".to_string(),
    });
    for menu in [built, failed, Menu::default()] {
        assert_eq!(menu.exit.label, "Exit");
        assert!(menu.exit.enabled);
        assert_eq!(menu.exit.command, MenuCommand::Exit);
    }
}

#[test]
fn unavailable_menu_carries_reason() {
    let menu = Menu::unavailable(&Error::Spawn {
        program: "colormgr".to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
    });
    assert!(menu.submenus.is_empty());
    let status = menu.status.unwrap();
    assert!(status.contains("colormgr"), "status was: {}", status);
}

// ── MenuCommand ──────────────────────────────────────────────────

#[test]
fn apply_command_maps_to_profile_request() {
    let cmd = MenuCommand::ApplyProfile {
        device_path: "/org/x/1".to_string(),
        output_name: "eDP-1".to_string(),
        profile_id: "p1".to_string(),
        profile_path: "/icc/a.icc".to_string(),
    };
    let req = cmd.to_request().unwrap();
    assert_eq!(req.device_path, "/org/x/1");
    assert_eq!(req.output_name, "eDP-1");
    assert_eq!(
        req.selection,
        ProfileSelection::Profile {
            id: "p1".to_string(),
            path: "/icc/a.icc".to_string()
        }
    );
}

#[test]
fn disable_command_maps_to_disable_request() {
    let cmd = MenuCommand::Disable {
        device_path: "/org/x/1".to_string(),
        output_name: "eDP-1".to_string(),
    };
    assert_eq!(cmd.to_request().unwrap().selection, ProfileSelection::Disable);
}

#[test]
fn exit_command_has_no_request() {
    assert!(MenuCommand::Exit.to_request().is_none());
}

// ── load_menu ────────────────────────────────────────────────────

#[test]
fn load_menu_reads_fresh_inventory() {
    let runner = ScriptedRunner::new().on(
        "colormgr",
        &["get-devices-by-kind"],
        Reply::ok(
            "Object Path:   /org/x/1\nEnabled:       Yes\nDevice ID:     xrandr-DP-1\n\
             Profile 1:     p1\n               /icc/a.icc\nMetadata:      XRANDR_name=DP-1\n",
        ),
    );
    let menu = load_menu(&runner, &Tools::new("colormgr", "dispwin"));

    assert_eq!(menu.submenus.len(), 1);
    assert_eq!(menu.submenus[0].output_name, "DP-1");
    assert_eq!(
        runner.calls(),
        vec![vec!["colormgr", "get-devices-by-kind", "display"]]
    );
}

#[test]
fn load_menu_reports_inventory_failure() {
    let runner = ScriptedRunner::new().on("colormgr", &[], Reply::SpawnError);
    let menu = load_menu(&runner, &Tools::new("colormgr", "dispwin"));
    assert!(menu.submenus.is_empty());
    assert!(menu.status.is_some());
}

// ── dispatch ─────────────────────────────────────────────────────

#[test]
fn selecting_profile_of_disabled_device_applies_it() {
    let runner = Arc::new(ScriptedRunner::new().on("dispwin", &["-h"], Reply::stderr(1, HELP)));
    let worker = worker_with(&runner);
    let menu = build_menu(&[device(
        "/org/x/1",
        false,
        "eDP-1",
        &[("p1", "/usr/share/icc/a.icc")],
    )]);
    let items = &menu.submenus[0].items;

    assert!(items[0].enabled);
    assert!(!items[1].enabled, "Disable is greyed for a disabled device");

    let outcome = match dispatch(&items[0], &worker) {
        Dispatch::Queued(ticket) => ticket.wait().unwrap(),
        _ => panic!("profile entry should be queued"),
    };
    assert_eq!(outcome.monitor_index, 1);
    assert_eq!(outcome.loader, LoaderStatus::Applied);
    assert_eq!(
        runner.calls(),
        vec![
            vec!["dispwin", "-h"],
            vec!["dispwin", "-d", "1", "-v", "-c", "-I", "/usr/share/icc/a.icc"],
            vec!["colormgr", "device-set-enabled", "/org/x/1", "True"],
            vec!["colormgr", "device-make-profile-default", "/org/x/1", "p1"],
        ]
    );
}

#[test]
fn selecting_disable_unloads_and_disables() {
    let runner = Arc::new(ScriptedRunner::new().on("dispwin", &["-h"], Reply::stderr(1, HELP)));
    let worker = worker_with(&runner);
    let menu = build_menu(&[device("/org/x/2", true, "HDMI-1", &[("p1", "/icc/a.icc")])]);

    match dispatch(&menu.submenus[0].items[1], &worker) {
        Dispatch::Queued(ticket) => {
            ticket.wait().unwrap();
        }
        _ => panic!("disable entry should be queued"),
    }
    assert_eq!(
        runner.calls(),
        vec![
            vec!["dispwin", "-h"],
            vec!["dispwin", "-d", "2", "-U"],
            vec!["colormgr", "device-set-enabled", "/org/x/2", "False"],
        ]
    );
}

#[test]
fn greyed_out_entry_is_ignored() {
    let runner = Arc::new(ScriptedRunner::new());
    let worker = worker_with(&runner);
    let menu = build_menu(&[device("/org/x/1", true, "DP-1", &[("p1", "/icc/a.icc")])]);

    assert!(matches!(
        dispatch(&menu.submenus[0].items[0], &worker),
        Dispatch::Ignored
    ));
    worker.shutdown();
    assert!(runner.calls().is_empty());
}

#[test]
fn selecting_exit_entry_leaves_without_running_tools() {
    let runner = Arc::new(ScriptedRunner::new());
    let worker = worker_with(&runner);
    let menu = build_menu(&[device("/org/x/1", false, "eDP-1", &[])]);
    assert!(matches!(dispatch(&menu.exit, &worker), Dispatch::Exit));
    worker.shutdown();
    assert!(runner.calls().is_empty());
}

#[test]
fn exit_command_is_not_queued() {
    let runner = Arc::new(ScriptedRunner::new());
    let worker = worker_with(&runner);
    assert!(matches!(
        dispatch_command(&MenuCommand::Exit, &worker),
        Dispatch::Exit
    ));
}

// ── describe_outcome ─────────────────────────────────────────────

fn outcome(selection: ProfileSelection, loader: LoaderStatus) -> cps_profile::ApplyOutcome {
    cps_profile::ApplyOutcome {
        device_path: "/org/x/1".to_string(),
        output_name: "eDP-1".to_string(),
        monitor_index: 1,
        selection,
        loader,
    }
}

#[test]
fn outcome_names_profile_file_and_monitor() {
    let (summary, warning) = describe_outcome(&outcome(
        ProfileSelection::from_id("p1", "/usr/share/icc/a.icc"),
        LoaderStatus::Applied,
    ));
    assert_eq!(summary, "Applied a.icc to eDP-1 (monitor 1)");
    assert!(warning.is_none());
}

#[test]
fn outcome_reports_loader_warning() {
    let (summary, warning) = describe_outcome(&outcome(
        ProfileSelection::Disable,
        LoaderStatus::Warning {
            code: Some(1),
            stderr: "no such display\n".to_string(),
        },
    ));
    assert_eq!(summary, "Disabled color management on eDP-1 (monitor 1)");
    assert_eq!(
        warning.as_deref(),
        Some("dispwin exited with status 1: no such display")
    );
}

#[test]
fn dry_run_outcome_says_would_apply() {
    let (summary, _) = describe_outcome(&outcome(
        ProfileSelection::from_id("p1", "/icc/a.icc"),
        LoaderStatus::Skipped,
    ));
    assert!(summary.starts_with("Would apply a.icc"));
}
