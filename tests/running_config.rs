//! Running-configuration dump and configuration replay
//!
//! A saved dump replayed into a fresh application must reproduce the same
//! dump.

mod common;

use std::fs;

use common::{run, Router};
use opshell::replay::replay_str;
use opshell::{load_config, CliError, Session};

const CONFIGURED: &str = "! system configuration\n\
                          hostname r1\n\
                          ! end system\n\
                          ! interface configuration\n\
                          interface mtu 9000\n\
                          ! end interface\n\
                          ! end\n";

fn configured_session(router: &Router) -> Session {
    let mut session = router.session();
    run(&mut session, "hostname r1");
    run(&mut session, "interface");
    run(&mut session, "mtu 9000");
    run(&mut session, "end");
    session
}

#[test]
fn test_default_state_dumps_only_markers() {
    let router = Router::default();
    let mut session = router.session();

    let out = run(&mut session, "show running-config");
    assert_eq!(
        out,
        "! system configuration\n! end system\n! interface configuration\n! end interface\n! end\ncli> "
    );
}

#[test]
fn test_dump_groups_by_priority() {
    let router = Router::default();
    let mut session = configured_session(&router);

    assert_eq!(run(&mut session, "show running-config"), format!("{CONFIGURED}cli> "));
    assert_eq!(run(&mut session, "show run"), format!("{CONFIGURED}cli> "));
    assert_eq!(run(&mut session, "write terminal"), format!("{CONFIGURED}cli> "));
}

#[test]
fn test_saved_config_replays_to_same_dump() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("startup.cfg");

    let first = Router::default();
    let mut session = configured_session(&first);
    let out = run(&mut session, &format!("write file {}", path.display()));
    assert_eq!(out, format!("Configuration saved to {}\ncli> ", path.display()));
    assert_eq!(fs::read_to_string(&path).unwrap(), CONFIGURED);

    let second = Router::default();
    let cli = second.build();
    let mut replayed = Session::local(cli.clone());
    let report = load_config(&mut replayed, &path).unwrap();
    assert_eq!(report.commands, 2);
    assert!(report.is_clean());
    assert_eq!(second.state().hostname, "r1");
    assert_eq!(second.state().mtu, 9000);

    let mut dump = String::new();
    cli.dump_running_config(&mut dump).unwrap();
    assert_eq!(dump, CONFIGURED);
}

#[test]
fn test_replay_reports_failures_and_continues() {
    let router = Router::default();
    let mut session = router.session();

    let text = "# startup\n\
                hostname r9\n\
                \n\
                bogus command\n\
                interface\n\
                interface mtu 2000\n\
                ! end\n";
    let report = replay_str(&mut session, text);

    assert_eq!(report.commands, 4);
    assert_eq!(report.failed(), 2);
    assert_eq!(report.failures[0].line_no, 4);
    assert!(matches!(report.failures[0].error, CliError::NoMatch { .. }));
    // Context keywords are not navigation during replay
    assert_eq!(report.failures[1].text, "interface");
    assert_eq!(session.context().depth(), 0);

    assert_eq!(router.state().hostname, "r9");
    assert_eq!(router.state().mtu, 2000);
}

#[test]
fn test_missing_config_file() {
    let router = Router::default();
    let mut session = router.session();
    let dir = tempfile::tempdir().unwrap();

    let err = load_config(&mut session, dir.path().join("absent.cfg")).unwrap_err();
    assert!(matches!(err, CliError::FileIo { .. }));
    assert!(err.to_string().starts_with("Cannot open file: "));
}
