use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn my_reviews(args: &[&str], arc: Option<&Path>) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_my-reviews"));
    cmd.args(args)
        .env_remove("GITHUB_TOKEN")
        .env_remove("GH_TOKEN")
        .env_remove("RUST_LOG");
    match arc {
        Some(path) => cmd.env("MY_REVIEWS_ARC_PATH", path),
        None => cmd.env_remove("MY_REVIEWS_ARC_PATH"),
    };
    cmd.output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[cfg(unix)]
fn fake_arc(dir: &Path, whoami: &str, search: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let marker = dir.join("spawned");
    let script = format!(
        "#!/bin/sh\n\
         touch '{marker}'\n\
         if [ \"$1\" = help ]; then exit 0; fi\n\
         cat > /dev/null\n\
         case \"$3\" in\n\
         user.whoami) echo '{whoami}' ;;\n\
         differential.revision.search) echo '{search}' ;;\n\
         *) echo \"unexpected method $3\" >&2; exit 1 ;;\n\
         esac\n",
        marker = marker.display(),
    );
    let path = dir.join("arc");
    std::fs::write(&path, script).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

const WHOAMI: &str =
    r#"{"error":null,"errorMessage":null,"response":{"phid":"PHID-USER-me","userName":"me"}}"#;

const SEARCH: &str = r#"{"error":null,"errorMessage":null,"response":{"data":[
{"id":3,"fields":{"title":"Second fix","authorPHID":"PHID-USER-me","status":{"value":"accepted","name":"Accepted","closed":false},"bugzilla.bug-id":"200"}},
{"id":1,"fields":{"title":"First fix","authorPHID":"PHID-USER-me","status":{"value":"needs-review","name":"Needs Review","closed":false},"bugzilla.bug-id":"100"}},
{"id":2,"fields":{"title":"WIP idea","authorPHID":"PHID-USER-me","status":{"value":"needs-review","name":"Needs Review","closed":false}}},
{"id":4,"fields":{"title":"Their change","authorPHID":"PHID-USER-other","status":{"value":"needs-review","name":"Needs Review","closed":false},"bugzilla.bug-id":"100"}},
{"id":5,"fields":{"title":"Their accepted change","authorPHID":"PHID-USER-other","status":{"value":"accepted","name":"Accepted","closed":false}}}
],"cursor":{"after":null}}}"#;

#[test]
fn no_command_prints_usage_and_fails() {
    let output = my_reviews(&[], None);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("Usage:"));
}

#[test]
fn unknown_command_prints_usage_and_fails() {
    let output = my_reviews(&["foo"], None);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("Usage:"));
    assert!(stderr(&output).contains("foo"));
}

#[test]
fn help_succeeds() {
    let output = my_reviews(&["--help"], None);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("phabricator-user"));
    assert!(text.contains("github"));
}

#[test]
fn github_requires_all_arguments() {
    let output = my_reviews(&["github", "mozilla", "pdf.js"], None);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("GitHub reviews requires"));
}

#[cfg(unix)]
#[test]
fn missing_directory_fails_before_spawning_arc() {
    let dir = tempfile::tempdir().unwrap();
    let arc = fake_arc(dir.path(), WHOAMI, SEARCH);

    let output = my_reviews(&["phabricator-user"], Some(&arc));

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("arcanist"));
    assert!(!dir.path().join("spawned").exists(), "arc must not run");
}

#[test]
fn missing_arc_binary_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let arc = dir.path().join("no-such-arc");
    let gecko = dir.path().to_str().unwrap();

    let output = my_reviews(&["phabricator", gecko, "PHID-USER-me"], Some(&arc));

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Could not find"));
}

#[cfg(unix)]
#[test]
fn phabricator_user_prints_identity() {
    let dir = tempfile::tempdir().unwrap();
    let arc = fake_arc(dir.path(), WHOAMI, SEARCH);
    let gecko = dir.path().to_str().unwrap();

    let output = my_reviews(&["phabricator-user", gecko], Some(&arc));

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "Phabricator username: me\nPhabricator PHID: PHID-USER-me\n"
    );
}

#[cfg(unix)]
#[test]
fn phabricator_report_groups_by_bug() {
    let dir = tempfile::tempdir().unwrap();
    let arc = fake_arc(dir.path(), WHOAMI, SEARCH);
    let gecko = dir.path().to_str().unwrap();

    let output = my_reviews(
        &["phabricator", gecko, "PHID-USER-me", "--color", "never"],
        Some(&arc),
    );

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    let mine = text.find("Phabricator Mine").unwrap();
    let others = text.find("Phabricator Others").unwrap();
    let first = text.find("First fix").unwrap();
    let second = text.find("Second fix").unwrap();
    assert!(mine < first && first < second && second < others);
    assert!(text.contains("Bug 100 - https://bugzilla.mozilla.org/show_bug.cgi?id=100"));
    assert!(text.contains("https://phabricator.services.mozilla.com/D4"));
    assert!(!text.contains("WIP idea"));
    assert!(!text.contains("Their accepted change"));
    assert!(!text.contains('\x1b'));
}

#[cfg(unix)]
#[test]
fn phabricator_json_returns_partitions() {
    let dir = tempfile::tempdir().unwrap();
    let arc = fake_arc(dir.path(), WHOAMI, SEARCH);
    let gecko = dir.path().to_str().unwrap();

    let output = my_reviews(
        &["--format", "json", "phabricator", gecko, "PHID-USER-me"],
        Some(&arc),
    );

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids = |key: &str| -> Vec<u64> {
        value[key]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_u64().unwrap())
            .collect()
    };
    assert_eq!(ids("mine"), vec![1, 3]);
    assert_eq!(ids("others"), vec![4]);
}

#[cfg(unix)]
#[test]
fn remote_error_message_is_shown() {
    let dir = tempfile::tempdir().unwrap();
    let failing = r#"{"error":"ERR-INVALID-AUTH","errorMessage":"Session token expired","response":null}"#;
    let arc = fake_arc(dir.path(), failing, failing);
    let gecko = dir.path().to_str().unwrap();

    let output = my_reviews(&["phabricator-user", gecko], Some(&arc));

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Session token expired"));
}
