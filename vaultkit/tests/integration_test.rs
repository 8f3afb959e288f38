//! Integration tests for the vaultkit CLI using temporary vaults.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Two vaults plus a config file pointing vaultkit's state into the sandbox.
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Local/.obsidian")).unwrap();
        fs::create_dir_all(dir.path().join("Work/.obsidian")).unwrap();

        let sandbox = Self { dir };
        let config = format!(
            "settings_path = {:?}\nobsidian_config = {:?}\nreload_delay_ms = 0\n",
            sandbox.path("state/settings.json").display().to_string(),
            sandbox.path("obsidian.json").display().to_string(),
        );
        fs::write(sandbox.path("config.toml"), config).unwrap();
        sandbox
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    fn write(&self, rel: &str, content: &str) {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn read_json(&self, rel: &str) -> Value {
        serde_json::from_str(&fs::read_to_string(self.path(rel)).unwrap()).unwrap()
    }

    fn work(&self) -> String {
        self.path("Work").display().to_string()
    }
}

/// Run vaultkit against the sandbox's local vault and return stdout, stderr, code.
fn run_vaultkit(sandbox: &Sandbox, args: &[&str]) -> (String, String, i32) {
    run_vaultkit_in(sandbox, &sandbox.path("Local"), args)
}

fn run_vaultkit_in(sandbox: &Sandbox, vault: &Path, args: &[&str]) -> (String, String, i32) {
    let binary = env!("CARGO_BIN_EXE_vaultkit");

    let output = Command::new(binary)
        .arg("--vault")
        .arg(vault)
        .arg("--config")
        .arg(sandbox.path("config.toml"))
        .args(args)
        .output()
        .expect("Failed to execute vaultkit");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn parse(stdout: &str) -> Value {
    serde_json::from_str(stdout).expect("stdout is JSON")
}

fn item<'a>(response: &'a Value, group: &str, name: &str) -> &'a Value {
    response[group]
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["name"] == name)
        .unwrap_or_else(|| panic!("no {} item {}", group, name))
}

mod profile_command {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn scan_applies_defaults() {
        let sandbox = Sandbox::new();
        sandbox.write("Work/.obsidian/plugins/dataview/main.js", "");
        sandbox.write("Work/.obsidian/themes/Minimal/theme.css", "");
        sandbox.write("Work/.obsidian/app.json", "{}");
        sandbox.write("Work/.obsidian/workspace.json", "{}");

        let (stdout, _, code) =
            run_vaultkit(&sandbox, &["profile", "scan", "--from", &sandbox.work()]);
        assert_eq!(code, 0);

        let response = parse(&stdout);
        assert_eq!(response["direction"], "import");
        assert_eq!(item(&response, "directories", "plugins")["enabled"], false);
        assert_eq!(item(&response, "directories", "themes")["enabled"], true);
        assert_eq!(item(&response, "directories", "themes")["description"], "1 theme");
        assert_eq!(item(&response, "files", "app")["label"], "Import app (General settings)");
        assert_eq!(response["plugin_selection_available"], false);
        assert!(sandbox.path("state/settings.json").is_file());
    }

    #[test]
    fn set_persists_between_runs() {
        let sandbox = Sandbox::new();
        sandbox.write("Work/.obsidian/plugins/dataview/main.js", "");
        sandbox.write("Work/.obsidian/hotkeys.json", "{}");

        let (_, _, code) = run_vaultkit(
            &sandbox,
            &[
                "profile", "set", "--from", &sandbox.work(), "--dir", "plugins=on", "--file",
                "hotkeys=off",
            ],
        );
        assert_eq!(code, 0);

        let (stdout, _, _) = run_vaultkit(&sandbox, &["profile", "scan", "--from", &sandbox.work()]);
        let response = parse(&stdout);
        assert_eq!(item(&response, "directories", "plugins")["enabled"], true);
        assert_eq!(item(&response, "files", "hotkeys")["enabled"], false);
    }

    #[test]
    fn set_unknown_name_warns() {
        let sandbox = Sandbox::new();
        sandbox.write("Work/.obsidian/app.json", "{}");

        let (_, stderr, code) = run_vaultkit(
            &sandbox,
            &["profile", "set", "--from", &sandbox.work(), "--dir", "icons=on"],
        );
        assert_eq!(code, 0);
        assert!(stderr.contains("no directory named 'icons'"));
    }

    #[test]
    fn import_merges_settings() {
        let sandbox = Sandbox::new();
        sandbox.write("Work/.obsidian/app.json", r#"{"a": 1}"#);
        sandbox.write("Work/.obsidian/community-plugins.json", r#"["x", "y"]"#);
        sandbox.write("Work/.obsidian/snippets/wide.css", "body {}");
        sandbox.write("Local/.obsidian/app.json", r#"{"a": 2, "b": 3}"#);
        sandbox.write("Local/.obsidian/community-plugins.json", r#"["y", "z"]"#);

        let (stdout, stderr, code) =
            run_vaultkit(&sandbox, &["profile", "import", &sandbox.work()]);
        assert_eq!(code, 0, "stderr: {}", stderr);
        assert!(stderr.contains("Restart Obsidian"));

        let report = parse(&stdout);
        assert_eq!(report["copied_dirs"], json!(["snippets"]));
        assert_eq!(report["failures"], json!([]));

        assert_eq!(sandbox.read_json("Local/.obsidian/app.json"), json!({"a": 1, "b": 3}));
        assert_eq!(
            sandbox.read_json("Local/.obsidian/community-plugins.json"),
            json!(["y", "z", "x"])
        );
        assert!(sandbox.path("Local/.obsidian/snippets/wide.css").is_file());
    }

    #[test]
    fn import_with_bad_json_is_partial() {
        let sandbox = Sandbox::new();
        sandbox.write("Work/.obsidian/app.json", r#"{"a": 1}"#);
        sandbox.write("Work/.obsidian/graph.json", "{ broken");

        let (stdout, stderr, code) =
            run_vaultkit(&sandbox, &["profile", "import", &sandbox.work()]);
        assert_eq!(code, 5);
        let failures: Vec<&str> = stderr
            .lines()
            .filter(|l| l.contains("ERROR") && l.contains("failed to migrate entry"))
            .collect();
        assert_eq!(failures.len(), 1, "{}", stderr);
        assert!(failures[0].contains("entry=graph"));
        assert!(stderr.contains("1 of 2 entries failed"));

        let report = parse(&stdout);
        assert_eq!(report["merged_files"], json!(["app"]));
        assert!(sandbox.path("Local/.obsidian/app.json").is_file());
    }

    #[test]
    fn export_dry_run_changes_nothing() {
        let sandbox = Sandbox::new();
        sandbox.write("Local/.obsidian/themes/Minimal/theme.css", "");
        sandbox.write("Local/.obsidian/appearance.json", r#"{"theme": "obsidian"}"#);

        let (stdout, _, code) = run_vaultkit(
            &sandbox,
            &["profile", "export", &sandbox.work(), "--dry-run"],
        );
        assert_eq!(code, 0);

        let response = parse(&stdout);
        assert_eq!(response["action"], "export");
        assert_eq!(
            response["changes"],
            json!(["Copy directory themes", "Merge appearance.json"])
        );
        assert!(!sandbox.path("Work/.obsidian/themes").exists());
        assert!(!sandbox.path("Work/.obsidian/appearance.json").exists());
    }

    #[test]
    fn plugins_lists_conflicts() {
        let sandbox = Sandbox::new();
        sandbox.write(
            "Work/.obsidian/plugins/dataview/manifest.json",
            r#"{"id": "dataview", "name": "Dataview", "version": "0.5.0"}"#,
        );
        sandbox.write(
            "Local/.obsidian/plugins/dataview/manifest.json",
            r#"{"id": "dataview", "name": "Dataview", "version": "0.5.64"}"#,
        );
        sandbox.write(
            "Work/.obsidian/plugins/calendar/manifest.json",
            r#"{"id": "calendar", "name": "Calendar", "version": "1.0.0"}"#,
        );

        let (stdout, stderr, code) =
            run_vaultkit(&sandbox, &["profile", "plugins", "--from", &sandbox.work()]);
        assert_eq!(code, 0);
        assert!(stderr.contains("plugins directory is disabled"));

        let response = parse(&stdout);
        assert_eq!(response["conflict_count"], 1);
        let dataview = item(&response, "plugins", "Dataview");
        assert_eq!(dataview["conflict_reason"], "Lower version");
        assert_eq!(dataview["selected"], false);
        assert_eq!(item(&response, "plugins", "Calendar")["selected"], true);
    }

    #[test]
    fn missing_config_root_exits_3() {
        let sandbox = Sandbox::new();
        fs::create_dir_all(sandbox.path("Bare")).unwrap();
        let bare = sandbox.path("Bare").display().to_string();

        let (_, stderr, code) = run_vaultkit(&sandbox, &["profile", "import", &bare]);
        assert_eq!(code, 3);
        assert!(stderr.contains("Select a valid vault folder"));
        assert!(stderr.contains("Error during import"));
    }

    #[test]
    fn unknown_vault_name_exits_2() {
        let sandbox = Sandbox::new();
        let (_, _, code) = run_vaultkit(&sandbox, &["profile", "scan", "--from", "Nowhere"]);
        assert_eq!(code, 2);
    }

    #[test]
    fn target_by_registered_name() {
        let sandbox = Sandbox::new();
        sandbox.write("Work/.obsidian/app.json", "{}");
        let registry = json!({
            "vaults": {
                "a1": {"path": sandbox.path("Work"), "ts": 1},
                "b2": {"path": sandbox.path("Local"), "ts": 2, "open": true}
            }
        });
        sandbox.write("obsidian.json", &registry.to_string());

        let (stdout, _, code) = run_vaultkit(&sandbox, &["profile", "scan", "--from", "Work"]);
        assert_eq!(code, 0);
        assert!(item(&parse(&stdout), "files", "app")["enabled"].as_bool().unwrap());
    }
}

mod vaults_command {
    use super::*;
    use serde_json::json;

    #[test]
    fn lists_other_vaults() {
        let sandbox = Sandbox::new();
        let registry = json!({
            "vaults": {
                "a1": {"path": sandbox.path("Work"), "ts": 1},
                "b2": {"path": sandbox.path("Local"), "ts": 2, "open": true}
            }
        });
        sandbox.write("obsidian.json", &registry.to_string());

        let (stdout, _, code) = run_vaultkit(&sandbox, &["vaults"]);
        assert_eq!(code, 0);
        let vaults = parse(&stdout)["vaults"].as_array().unwrap().clone();
        assert_eq!(vaults.len(), 1);
        assert_eq!(vaults[0]["name"], "Work");

        let (stdout, _, _) = run_vaultkit(&sandbox, &["vaults", "--all"]);
        assert_eq!(parse(&stdout)["vaults"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn missing_registry_is_empty() {
        let sandbox = Sandbox::new();
        let (stdout, _, code) = run_vaultkit(&sandbox, &["vaults"]);
        assert_eq!(code, 0);
        assert_eq!(parse(&stdout)["vaults"], json!([]));
    }
}

mod folders_command {
    use super::*;

    fn notes_vault(sandbox: &Sandbox) -> PathBuf {
        sandbox.write("Notes/Projects/plan.md", "# Plan");
        sandbox.write("Notes/Projects/Old/.keep", "");
        fs::create_dir_all(sandbox.path("Notes/Archive/2020/Jan")).unwrap();
        fs::create_dir_all(sandbox.path("Notes/Inbox/attachments")).unwrap();
        sandbox.write("Notes/Daily/attachments/img.png", "png");
        sandbox.path("Notes")
    }

    #[test]
    fn search_groups_by_name() {
        let sandbox = Sandbox::new();
        let vault = notes_vault(&sandbox);

        let (stdout, _, code) = run_vaultkit_in(&sandbox, &vault, &["folders", "search", "ATTACH"]);
        assert_eq!(code, 0);
        let response = parse(&stdout);
        assert_eq!(response["total"], 2);
        assert_eq!(response["groups"][0]["name"], "attachments");
        assert_eq!(response["groups"][0]["count"], 2);
    }

    #[test]
    fn empty_lists_then_deletes() {
        let sandbox = Sandbox::new();
        let vault = notes_vault(&sandbox);

        let (stdout, _, code) = run_vaultkit_in(&sandbox, &vault, &["folders", "empty"]);
        assert_eq!(code, 0);
        let folders = parse(&stdout)["folders"].clone();
        let folders: Vec<&str> = folders
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f.as_str().unwrap())
            .collect();
        assert_eq!(
            folders,
            vec!["Archive", "Archive/2020", "Archive/2020/Jan", "Inbox", "Inbox/attachments"]
        );
        assert!(vault.join("Archive/2020/Jan").is_dir());

        let (_, stderr, code) =
            run_vaultkit_in(&sandbox, &vault, &["folders", "empty", "--delete"]);
        assert_eq!(code, 0);
        assert!(stderr.contains("Deleted 5 empty folders."));
        assert!(!vault.join("Archive").exists());
        assert!(!vault.join("Inbox").exists());
        assert!(vault.join("Projects/Old/.keep").is_file());
    }

    #[test]
    fn empty_with_missing_start_fails() {
        let sandbox = Sandbox::new();
        let vault = notes_vault(&sandbox);
        let (_, _, code) =
            run_vaultkit_in(&sandbox, &vault, &["folders", "empty", "--path", "Nope"]);
        assert_eq!(code, 1);
    }

    #[test]
    fn empty_outside_vault_is_rejected() {
        let sandbox = Sandbox::new();
        let vault = notes_vault(&sandbox);
        fs::create_dir_all(sandbox.path("Sibling/empty")).unwrap();
        let absolute = sandbox.path("Sibling").display().to_string();

        for start in ["../Sibling", absolute.as_str()] {
            let (_, stderr, code) = run_vaultkit_in(
                &sandbox,
                &vault,
                &["folders", "empty", "--path", start, "--delete"],
            );
            assert_eq!(code, 1);
            assert!(stderr.contains("Folder not found"), "{}", stderr);
        }
        assert!(sandbox.path("Sibling/empty").is_dir());
    }

    #[test]
    fn delete_by_name_dry_run_then_delete() {
        let sandbox = Sandbox::new();
        let vault = notes_vault(&sandbox);

        let (stdout, _, code) = run_vaultkit_in(
            &sandbox,
            &vault,
            &["folders", "delete-by-name", "attachments", "--dry-run"],
        );
        assert_eq!(code, 0);
        assert_eq!(parse(&stdout)["changes"].as_array().unwrap().len(), 2);
        assert!(vault.join("Daily/attachments/img.png").is_file());

        let (stdout, _, code) =
            run_vaultkit_in(&sandbox, &vault, &["folders", "delete-by-name", "attachments"]);
        assert_eq!(code, 0);
        assert_eq!(parse(&stdout)["deleted"].as_array().unwrap().len(), 2);
        assert!(!vault.join("Daily/attachments").exists());
        assert!(vault.join("Daily").is_dir());
    }
}

mod files_command {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn import_copies_into_folder() {
        let sandbox = Sandbox::new();
        sandbox.write("Downloads/paper.pdf", "pdf");
        sandbox.write("Downloads/Scans/page1.png", "png");
        fs::create_dir_all(sandbox.path("Local/Inbox")).unwrap();
        let paper = sandbox.path("Downloads/paper.pdf").display().to_string();
        let scans = sandbox.path("Downloads/Scans").display().to_string();

        let (stdout, stderr, code) = run_vaultkit(
            &sandbox,
            &["files", "import", &paper, &scans, "--into", "Inbox"],
        );
        assert_eq!(code, 0, "{}", stderr);
        assert!(stderr.contains("2 items copied to vault."));
        assert_eq!(parse(&stdout)["mode"], "copy");
        assert!(sandbox.path("Local/Inbox/paper.pdf").is_file());
        assert!(sandbox.path("Local/Inbox/Scans/page1.png").is_file());
        assert!(sandbox.path("Downloads/paper.pdf").is_file());
    }

    #[test]
    fn import_move_with_increment() {
        let sandbox = Sandbox::new();
        sandbox.write("Downloads/note.md", "new");
        sandbox.write("Local/note.md", "old");
        let note = sandbox.path("Downloads/note.md").display().to_string();

        let (stdout, _, code) = run_vaultkit(
            &sandbox,
            &["files", "import", &note, "--move", "--on-conflict", "increment"],
        );
        assert_eq!(code, 0);
        let report = parse(&stdout);
        assert_eq!(report["items"][0]["status"], "done");
        assert_eq!(fs::read_to_string(sandbox.path("Local/note (1).md")).unwrap(), "new");
        assert_eq!(fs::read_to_string(sandbox.path("Local/note.md")).unwrap(), "old");
        assert!(!sandbox.path("Downloads/note.md").exists());
    }

    #[test]
    fn import_skips_existing_by_default() {
        let sandbox = Sandbox::new();
        sandbox.write("Downloads/note.md", "new");
        sandbox.write("Local/note.md", "old");
        let note = sandbox.path("Downloads/note.md").display().to_string();

        let (stdout, stderr, code) = run_vaultkit(&sandbox, &["files", "import", &note]);
        assert_eq!(code, 0);
        assert!(stderr.contains("Skipped 1 item"));
        assert_eq!(parse(&stdout)["items"][0]["status"], "skipped");
        assert_eq!(fs::read_to_string(sandbox.path("Local/note.md")).unwrap(), "old");
    }

    #[test]
    fn export_out_moves_and_reports_failures() {
        let sandbox = Sandbox::new();
        sandbox.write("Local/Projects/plan.md", "plan");
        fs::create_dir_all(sandbox.path("Out")).unwrap();
        let out = sandbox.path("Out").display().to_string();

        let (stdout, stderr, code) = run_vaultkit(
            &sandbox,
            &["files", "export-out", "Projects", "missing.md", "--to", &out, "--move"],
        );
        assert_eq!(code, 1);
        assert!(stderr.contains("could not transfer 1 item"));
        let report = parse(&stdout);
        assert_eq!(report["items"][0]["status"], "done");
        assert_eq!(report["items"][1]["status"], "failed");
        assert!(sandbox.path("Out/Projects/plan.md").is_file());
        assert!(!sandbox.path("Local/Projects").exists());
    }

    #[test]
    fn export_out_rejects_paths_outside_vault() {
        let sandbox = Sandbox::new();
        sandbox.write("Secret/key.txt", "k");
        fs::create_dir_all(sandbox.path("Out")).unwrap();
        let out = sandbox.path("Out").display().to_string();

        let (_, _, code) = run_vaultkit(
            &sandbox,
            &["files", "export-out", "../Secret", "--to", &out, "--move"],
        );
        assert_eq!(code, 1);
        assert!(sandbox.path("Secret/key.txt").is_file());
        assert!(!sandbox.path("Out/Secret").exists());
    }
}

mod errors {
    use super::*;

    #[test]
    fn missing_vault_exits_2() {
        let sandbox = Sandbox::new();
        let (_, stderr, code) =
            run_vaultkit_in(&sandbox, &sandbox.path("Missing"), &["folders", "search"]);
        assert_eq!(code, 2);
        assert!(stderr.contains("Vault not found"));
    }

    #[test]
    fn quiet_suppresses_error_message() {
        let sandbox = Sandbox::new();
        let (_, stderr, code) = run_vaultkit_in(
            &sandbox,
            &sandbox.path("Missing"),
            &["-q", "folders", "search"],
        );
        assert_eq!(code, 2);
        assert!(stderr.is_empty());
    }
}
