use super::*;
use std::path::PathBuf;

fn sh() -> PathBuf {
    PathBuf::from("sh")
}

fn runner() -> SystemRunner {
    SystemRunner::new(Duration::from_secs(10))
}

// ── ToolOutput ───────────────────────────────────────────────────

fn output(code: Option<i32>) -> ToolOutput {
    ToolOutput {
        program: "colormgr".to_string(),
        args: vec!["device-set-enabled".to_string()],
        code,
        stdout: String::new(),
        stderr: "boom".to_string(),
    }
}

#[test]
fn success_only_for_exit_zero() {
    assert!(output(Some(0)).success());
    assert!(!output(Some(1)).success());
    assert!(!output(None).success());
}

#[test]
fn checked_passes_success_through() {
    assert!(output(Some(0)).checked().is_ok());
}

#[test]
fn checked_maps_failure_to_external_tool() {
    match output(Some(4)).checked() {
        Err(Error::ExternalTool {
            program,
            code,
            stderr,
            ..
        }) => {
            assert_eq!(program, "colormgr");
            assert_eq!(code, Some(4));
            assert_eq!(stderr, "boom");
        }
        other => panic!("expected ExternalTool, got {:?}", other),
    }
}

// ── SystemRunner (real processes) ────────────────────────────────

#[cfg(unix)]
#[test]
fn captures_stdout() {
    let out = runner().run(&sh(), &["-c", "echo hello"]).unwrap();
    assert!(out.success());
    assert_eq!(out.stdout, "hello\n");
    assert!(out.stderr.is_empty());
}

#[cfg(unix)]
#[test]
fn captures_stderr_and_exit_code() {
    let out = runner()
        .run(&sh(), &["-c", "echo oops >&2; exit 3"])
        .unwrap();
    assert_eq!(out.code, Some(3));
    assert_eq!(out.stderr, "oops\n");
}

#[cfg(unix)]
#[test]
fn records_program_and_args() {
    let out = runner().run(&sh(), &["-c", "true"]).unwrap();
    assert_eq!(out.program, "sh");
    assert_eq!(out.args, vec!["-c", "true"]);
}

#[cfg(unix)]
#[test]
fn large_output_does_not_deadlock() {
    let out = runner()
        .run(
            &sh(),
            &["-c", "i=0; while [ $i -lt 20000 ]; do echo 0123456789; echo x >&2; i=$((i+1)); done"],
        )
        .unwrap();
    assert!(out.success());
    assert_eq!(out.stdout.len(), 20000 * 11);
    assert_eq!(out.stderr.len(), 20000 * 2);
}

#[cfg(unix)]
#[test]
fn invalid_utf8_is_decoded_lossily() {
    let out = runner().run(&sh(), &["-c", "printf 'a\\377b'"]).unwrap();
    assert!(out.stdout.starts_with('a'));
    assert!(out.stdout.ends_with('b'));
    assert!(out.stdout.contains('\u{FFFD}'));
}

#[cfg(unix)]
#[test]
fn slow_command_times_out() {
    let started = Instant::now();
    let result = SystemRunner::new(Duration::from_millis(200)).run(&sh(), &["-c", "exec sleep 5"]);
    match result {
        Err(Error::Timeout { program, timeout }) => {
            assert_eq!(program, "sh");
            assert_eq!(timeout, Duration::from_millis(200));
        }
        other => panic!("expected Timeout, got {:?}", other),
    }
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[cfg(unix)]
#[test]
fn background_process_holding_output_open_times_out() {
    let started = Instant::now();
    let result =
        SystemRunner::new(Duration::from_millis(300)).run(&sh(), &["-c", "sleep 5 & echo hi"]);
    match result {
        Err(Error::Timeout { program, timeout }) => {
            assert_eq!(program, "sh");
            assert_eq!(timeout, Duration::from_millis(300));
        }
        other => panic!("expected Timeout, got {:?}", other),
    }
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[cfg(unix)]
#[test]
fn background_process_with_closed_output_is_not_waited_for() {
    let started = Instant::now();
    let out = SystemRunner::new(Duration::from_secs(2))
        .run(&sh(), &["-c", "sleep 5 >/dev/null 2>&1 & echo hi"])
        .unwrap();
    assert!(out.success());
    assert_eq!(out.stdout, "hi\n");
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn missing_program_is_spawn_error() {
    let result = runner().run(Path::new("/nonexistent/definitely-not-a-tool"), &[]);
    assert!(matches!(result, Err(Error::Spawn { .. })));
}

// ── ScriptedRunner ───────────────────────────────────────────────

#[test]
fn scripted_runner_matches_by_program_and_prefix() {
    let runner = ScriptedRunner::new()
        .on("colormgr", &["get-devices-by-kind"], Reply::ok("listing"))
        .on("dispwin", &["-h"], Reply::stderr(1, "usage"));

    let out = runner
        .run(Path::new("/usr/bin/colormgr"), &["get-devices-by-kind", "display"])
        .unwrap();
    assert_eq!(out.stdout, "listing");

    let out = runner.run(Path::new("dispwin"), &["-h"]).unwrap();
    assert_eq!(out.code, Some(1));
    assert_eq!(out.stderr, "usage");
}

#[test]
fn scripted_runner_defaults_to_success() {
    let runner = ScriptedRunner::new();
    let out = runner.run(Path::new("anything"), &["x"]).unwrap();
    assert!(out.success());
    assert!(out.stdout.is_empty());
}

#[test]
fn scripted_runner_records_calls_in_order() {
    let runner = ScriptedRunner::new();
    runner.run(Path::new("/opt/bin/dispwin"), &["-d", "1", "-U"]).unwrap();
    runner.run(Path::new("colormgr"), &["device-set-enabled", "/p", "False"]).unwrap();

    assert_eq!(
        runner.calls(),
        vec![
            vec!["dispwin", "-d", "1", "-U"],
            vec!["colormgr", "device-set-enabled", "/p", "False"],
        ]
    );
    assert_eq!(runner.calls_to("colormgr"), vec![vec!["device-set-enabled", "/p", "False"]]);
}

#[test]
fn scripted_runner_simulates_failures() {
    let runner = ScriptedRunner::new()
        .on("dispwin", &[], Reply::Timeout)
        .on("colormgr", &[], Reply::SpawnError);
    assert!(matches!(
        runner.run(Path::new("dispwin"), &["-h"]),
        Err(Error::Timeout { .. })
    ));
    assert!(matches!(
        runner.run(Path::new("colormgr"), &[]),
        Err(Error::Spawn { .. })
    ));
}
