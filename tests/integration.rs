use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Temp repository with a tool page, its script, a caller, and a guide.
fn sample_repo() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    let files = [
        (
            "json-tool.html",
            "<html><head><title>JSON Formatter - Text Utilities</title></head>\n<body>\n<h2>JSON Formatter</h2>\n<script src=\"json-tool.js\"></script>\n<script src=\"https://cdn.example.com/lib.js\"></script>\n<script src=\"missing.js\"></script>\n</body></html>\n",
        ),
        ("json-tool.js", "export function format(s) { return s; }\n"),
        ("index.js", "const tools = [{ id: 'json-tool', page: 'json-tool.html' }];\n"),
        ("docs/overview.md", "# Overview\n\nIntro text.\n\n## JSON Formatter\n\nPaste JSON and press format.\n\n## Other\n\nUnrelated.\n"),
        ("node_modules/pkg/index.js", "json-tool.html\n"),
    ];
    for (rel, content) in files {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    (dir, root)
}

fn toolctx(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_toolctx"))
        .arg("--repo-root")
        .arg(root)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn tool_id_writes_default_artifact() {
    let (_dir, root) = sample_repo();
    let out = toolctx(&root, &["--tool", "json-tool"]);
    assert!(out.status.success(), "run failed: {}", String::from_utf8_lossy(&out.stderr));

    let artifact = root.join("context/code-dump-json-tool.txt");
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains(&format!("Tool context dump complete: {}", artifact.display())));
    assert!(stdout.contains("Target page: json-tool.html"));
    assert!(stdout.contains("Files included (full): 3"));

    let text = fs::read_to_string(&artifact).unwrap();
    assert!(text.starts_with("# LLM Context Pack: JSON Formatter\n"));
    assert!(text.contains("- `https://cdn.example.com/lib.js`"));
    assert!(text.contains("----- BEGIN FILE: json-tool.js -----"));
    assert!(text.contains("----- BEGIN FILE: index.js -----"));
    assert!(text.contains("docs/overview.md | Section: JSON Formatter"));
    assert!(!text.contains("node_modules"));
    assert!(text.ends_with("\n") && !text.ends_with("\n\n"));
}

#[test]
fn rerun_does_not_pick_up_previous_artifact() {
    let (_dir, root) = sample_repo();
    let first = toolctx(&root, &["--tool", "json-tool", "-o", "out/pack.txt"]);
    assert!(first.status.success());
    let second = toolctx(&root, &["--tool", "json-tool", "-o", "out/pack.txt", "--format", "json"]);
    assert!(second.status.success(), "rerun failed: {}", String::from_utf8_lossy(&second.stderr));

    let summary: serde_json::Value = serde_json::from_slice(&second.stdout).unwrap();
    assert_eq!(summary["target"], "json-tool.html");
    assert_eq!(summary["full_files"], 3);
    assert_eq!(summary["local_dependencies"], 1);
    assert_eq!(summary["external_dependencies"], 1);
    assert_eq!(summary["excerpts"], 1);

    let text = fs::read_to_string(root.join("out/pack.txt")).unwrap();
    assert!(!text.contains("BEGIN FILE: out/pack.txt"));
    assert!(!root.join("out/pack.txt.tmp").exists());
}

#[test]
fn missing_page_fails_with_single_error_line() {
    let (_dir, root) = sample_repo();
    let out = toolctx(&root, &["--tool", "nope"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.starts_with("error: unable to find target tool page"), "{stderr}");
    assert_eq!(stderr.lines().count(), 1);
    assert!(!root.join("context").exists());
}

#[test]
fn no_tool_and_no_default_is_an_error() {
    let (_dir, root) = sample_repo();
    let out = toolctx(&root, &[]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("missing tool id"));
}

#[test]
fn config_file_supplies_default_tool() {
    let (_dir, root) = sample_repo();
    fs::write(root.join(".toolctx.toml"), "default_tool = \"json-tool\"\ndump_dir = \"packs\"\n").unwrap();
    let out = toolctx(&root, &[]);
    assert!(out.status.success(), "run failed: {}", String::from_utf8_lossy(&out.stderr));
    assert!(root.join("packs/code-dump-json-tool.txt").is_file());
}

#[test]
fn zero_tunables_are_clamped() {
    let (_dir, root) = sample_repo();
    let out = toolctx(&root, &["--tool", "json-tool.html", "--max-sections-per-file", "0", "--context-lines", "0"]);
    assert!(out.status.success(), "run failed: {}", String::from_utf8_lossy(&out.stderr));
    let text = fs::read_to_string(root.join("context/code-dump-json-tool.txt")).unwrap();
    assert_eq!(text.matches("----- BEGIN EXCERPT:").count(), 1);
}
