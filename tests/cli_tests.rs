#![cfg(unix)]


use predicates::prelude::*;
use serial_test::serial;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};
use test_helpers::{
    base_ejflow_command, decrypted_document, encrypted_document, install_fake_ejson,
    write_script, TEST_PUBLIC_KEY,
};

/// A temp dir holding the fake binary and an empty keystore.
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        install_fake_ejson(dir.path());
        fs::create_dir(dir.path().join("keys")).unwrap();
        Sandbox { dir }
    }

    fn binary(&self) -> String {
        self.dir.path().join("fake-ejson").display().to_string()
    }

    fn keydir(&self) -> std::path::PathBuf {
        self.dir.path().join("keys")
    }

    fn install_private_key(&self) {
        fs::write(self.keydir().join(TEST_PUBLIC_KEY), "private").unwrap();
    }

    fn file(&self, name: &str, contents: &str) -> std::path::PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn command(&self) -> assert_cmd::Command {
        let mut cmd = base_ejflow_command();
        cmd.arg("--binary")
            .arg(self.binary())
            .arg("--keydir")
            .arg(self.keydir());
        cmd
    }
}

fn keystore_is_empty(dir: &Path) -> bool {
    fs::read_dir(dir).unwrap().next().is_none()
}

#[test]
#[serial]
fn test_cli_requires_subcommand() {
    base_ejflow_command()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
#[serial]
fn test_keygen_prints_key_and_writes_keystore() {
    let sandbox = Sandbox::new();

    sandbox
        .command()
        .arg("keygen")
        .assert()
        .success()
        .stdout(format!("{}\n", TEST_PUBLIC_KEY));

    assert!(sandbox.keydir().join(TEST_PUBLIC_KEY).exists());
}

#[test]
#[serial]
fn test_decrypt_prints_plaintext_without_touching_file() {
    let sandbox = Sandbox::new();
    sandbox.install_private_key();
    let path = sandbox.file("secrets.json", &encrypted_document());

    sandbox
        .command()
        .arg("decrypt")
        .arg(&path)
        .assert()
        .success()
        .stdout(decrypted_document())
        .stderr(predicate::str::contains("Buffer now holds decrypted content"));

    assert_eq!(fs::read_to_string(&path).unwrap(), encrypted_document());
}

#[test]
#[serial]
fn test_editor_with_arguments_only_matters_for_edit() {
    let sandbox = Sandbox::new();
    sandbox.install_private_key();
    let path = sandbox.file("secrets.json", &encrypted_document());

    sandbox
        .command()
        .env("EDITOR", "code --wait")
        .arg("decrypt")
        .arg(&path)
        .assert()
        .success()
        .stdout(decrypted_document());

    sandbox
        .command()
        .env("EDITOR", "code --wait")
        .arg("edit")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Editor command cannot contain spaces"));

    assert_eq!(fs::read_to_string(&path).unwrap(), encrypted_document());
}

#[test]
#[serial]
fn test_decrypt_failure_surfaces_binary_output() {
    let sandbox = Sandbox::new();
    let path = sandbox.file("secrets.json", &encrypted_document());

    sandbox
        .command()
        .arg("decrypt")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("couldn't read key file"))
        .stderr(predicate::str::contains("decrypt"));

    assert_eq!(fs::read_to_string(&path).unwrap(), encrypted_document());
}

#[test]
#[serial]
fn test_decrypt_keyless_file_fails_before_running_binary() {
    let sandbox = Sandbox::new();
    let path = sandbox.file("secrets.json", "{\"password\": \"hunter2\"}\n");

    sandbox
        .command()
        .arg("decrypt")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no _public_key"));
}

#[test]
#[serial]
fn test_malformed_document_is_reported() {
    let sandbox = Sandbox::new();
    let path = sandbox.file("secrets.json", "{ not json");

    sandbox
        .command()
        .arg("encrypt")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed document"));

    assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
}

#[test]
#[serial]
fn test_encrypt_rewrites_file_and_prints_it() {
    let sandbox = Sandbox::new();
    let plaintext = format!(
        "{{\n  \"_public_key\": \"{}\",\n  \"password\": \"hunter2\"\n}}\n",
        TEST_PUBLIC_KEY
    );
    let path = sandbox.file("secrets.json", &plaintext);

    sandbox
        .command()
        .arg("encrypt")
        .arg(&path)
        .assert()
        .success()
        .stdout(encrypted_document());

    assert_eq!(fs::read_to_string(&path).unwrap(), encrypted_document());
}

#[test]
#[serial]
fn test_encrypt_quiet_prints_nothing() {
    let sandbox = Sandbox::new();
    let path = sandbox.file("secrets.json", &decrypted_document());

    sandbox
        .command()
        .arg("encrypt")
        .arg("-q")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert_eq!(fs::read_to_string(&path).unwrap(), encrypted_document());
}

#[test]
#[serial]
fn test_ensure_key_yes_inserts_key_first() {
    let sandbox = Sandbox::new();
    let path = sandbox.file("secrets.json", "{\"password\": \"hunter2\", \"api\": \"x\"}");

    sandbox
        .command()
        .arg("ensure-key")
        .arg("--yes")
        .arg(&path)
        .assert()
        .success()
        .stdout(format!("{}\n", TEST_PUBLIC_KEY));

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        format!(
            "{{\n  \"_public_key\": \"{}\",\n  \"password\": \"hunter2\",\n  \"api\": \"x\"\n}}\n",
            TEST_PUBLIC_KEY
        )
    );
}

#[test]
#[serial]
fn test_ensure_key_no_leaves_file_alone() {
    let sandbox = Sandbox::new();
    let path = sandbox.file("secrets.json", "{\"password\": \"hunter2\"}");

    sandbox
        .command()
        .arg("ensure-key")
        .arg("--no")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "{\"password\": \"hunter2\"}"
    );
    assert!(keystore_is_empty(&sandbox.keydir()));
}

#[test]
#[serial]
fn test_ensure_key_noninteractive_stdin_declines() {
    let sandbox = Sandbox::new();
    let path = sandbox.file("secrets.json", "{\"password\": \"hunter2\"}");

    sandbox
        .command()
        .arg("ensure-key")
        .arg(&path)
        .write_stdin("")
        .assert()
        .success()
        .stderr(predicate::str::contains("[y/N]"));

    assert!(keystore_is_empty(&sandbox.keydir()));
}

#[test]
#[serial]
fn test_ensure_key_existing_key_never_runs_keygen() {
    let sandbox = Sandbox::new();
    let path = sandbox.file("secrets.json", &encrypted_document());

    sandbox
        .command()
        .arg("ensure-key")
        .arg("--yes")
        .arg(&path)
        .assert()
        .success()
        .stdout(format!("{}\n", TEST_PUBLIC_KEY));

    assert!(keystore_is_empty(&sandbox.keydir()));
    assert_eq!(fs::read_to_string(&path).unwrap(), encrypted_document());
}

#[test]
#[serial]
fn test_status_json_report() {
    let sandbox = Sandbox::new();
    let path = sandbox.file(
        "secrets.json",
        &format!(
            "{{\"_public_key\": \"{}\", \"a\": \"EJ[1:x]\", \"b\": \"plain\", \"_note\": \"skip\"}}",
            TEST_PUBLIC_KEY
        ),
    );

    let output = sandbox
        .command()
        .arg("status")
        .arg("--json")
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["public_key"], TEST_PUBLIC_KEY);
    assert_eq!(report["key_well_formed"], true);
    assert_eq!(report["encrypted_values"], 1);
    assert_eq!(report["plaintext_values"], 1);
}

#[test]
#[serial]
fn test_status_text_report_without_key() {
    let sandbox = Sandbox::new();
    let path = sandbox.file("secrets.json", "{\"a\": \"plain\"}");

    sandbox
        .command()
        .arg("status")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("public key: none"))
        .stdout(predicate::str::contains("plaintext values: 1"));
}

#[test]
#[serial]
fn test_edit_saves_and_encrypts() {
    let sandbox = Sandbox::new();
    sandbox.install_private_key();
    let path = sandbox.file("secrets.json", &encrypted_document());
    let editor = write_script(
        sandbox.dir.path(),
        "editor",
        &format!(
            "printf '{{\"_public_key\": \"{}\", \"password\": \"rotated\"}}\\n' > \"$1\"\n",
            TEST_PUBLIC_KEY
        ),
    );

    sandbox
        .command()
        .env("EJFLOW_EDITOR", &editor)
        .arg("edit")
        .arg(&path)
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&path).unwrap(), encrypted_document());
}

#[test]
#[serial]
fn test_edit_without_auto_encrypt_leaves_plaintext() {
    let sandbox = Sandbox::new();
    sandbox.install_private_key();
    let path = sandbox.file("secrets.json", &encrypted_document());
    let editor = write_script(
        sandbox.dir.path(),
        "editor",
        &format!(
            "printf '{{\"_public_key\": \"{}\", \"password\": \"rotated\"}}\\n' > \"$1\"\n",
            TEST_PUBLIC_KEY
        ),
    );

    sandbox
        .command()
        .env("EJFLOW_EDITOR", &editor)
        .arg("--no-auto-encrypt")
        .arg("edit")
        .arg(&path)
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        format!(
            "{{\"_public_key\": \"{}\", \"password\": \"rotated\"}}\n",
            TEST_PUBLIC_KEY
        )
    );
}

#[test]
#[serial]
fn test_edit_abort_policy_keeps_file() {
    let sandbox = Sandbox::new();
    let path = sandbox.file("secrets.json", "{\"password\": \"hunter2\"}\n");
    let editor = write_script(
        sandbox.dir.path(),
        "editor",
        "printf '{\"password\": \"rotated\"}\\n' > \"$1\"\n",
    );

    sandbox
        .command()
        .env("EJFLOW_EDITOR", &editor)
        .arg("--no")
        .arg("--on-decline")
        .arg("abort")
        .arg("edit")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("key generation was declined"));

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "{\"password\": \"hunter2\"}\n"
    );
}

#[test]
#[serial]
fn test_missing_binary_is_reported() {
    let temp_dir = tempdir().unwrap();
    let missing = temp_dir.path().join("no-such-ejson");

    base_ejflow_command()
        .arg("--binary")
        .arg(&missing)
        .arg("keygen")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
#[serial]
fn test_binary_with_metacharacters_is_rejected() {
    base_ejflow_command()
        .arg("--binary")
        .arg("ejson;rm")
        .arg("keygen")
        .assert()
        .failure()
        .stderr(predicate::str::contains("shell metacharacters"));
}

#[test]
#[serial]
fn test_invalid_auto_encrypt_env_is_rejected() {
    let sandbox = Sandbox::new();

    sandbox
        .command()
        .env("EJFLOW_AUTO_ENCRYPT", "maybe")
        .arg("keygen")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid boolean"));
}

#[test]
#[serial]
fn test_json_logs_carry_correlation_id() {
    let sandbox = Sandbox::new();

    sandbox
        .command()
        .env("RUST_LOG", "debug")
        .arg("--log-format")
        .arg("json")
        .arg("keygen")
        .assert()
        .success()
        .stderr(predicate::str::contains("correlation_id"))
        .stderr(predicate::str::contains("app_invocation"));
}
