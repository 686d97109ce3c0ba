use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    assert_cmd::Command::from(Command::new(env!("CARGO_BIN_EXE_compdoc")))
}

fn fixture_path(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn copy_dir(from: &Path, to: &Path) {
    fs::create_dir_all(to).unwrap();
    for entry in fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let target = to.join(entry.file_name());
        if entry.path().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), target).unwrap();
        }
    }
}

/// A scratch copy of the fixture project.
fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    copy_dir(Path::new(&fixture_path("project")), dir.path());
    dir
}

// -- compile --

#[test]
fn compile_writes_markdown_next_to_template() {
    let dir = project();
    let template = dir.path().join("README.md.j2");

    cmd()
        .args(["compile", template.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("README.md"));

    let output = fs::read_to_string(dir.path().join("README.md")).unwrap();
    assert!(output.starts_with("# Vectors"));
    assert!(output.contains("## Vec2"));
    assert!(output.contains("2-dimensional vector as a named tuple."));
    assert!(output.contains("### `scale(k: float) -> Vec2`"));
    assert!(output.contains("### `from_list(xs: list[float]) -> VecN`"));
    assert!(output.contains("- `xs` (list[float]): components of the vector"));
    assert!(output.contains("### `flatten_vecs(vecs: list[VecN]) -> VecN`"));
}

#[test]
fn compile_with_out_path() {
    let dir = project();
    let template = dir.path().join("README.md.j2");
    let out = dir.path().join("docs.md");

    cmd()
        .args([
            "compile",
            template.to_str().unwrap(),
            "--out-path",
            out.to_str().unwrap(),
        ])
        .assert()
        .success();

    assert!(out.is_file());
    assert!(!dir.path().join("README.md").exists());
}

#[test]
fn compile_with_explicit_config_path() {
    let dir = project();
    let docs = dir.path().join("docs");
    fs::create_dir(&docs).unwrap();
    fs::write(
        docs.join("API.md.j2"),
        "{{ compdoc.module('vec').VecN.from_list.doc.signature.returns }}",
    )
    .unwrap();
    fs::write(
        docs.join("api.yml"),
        "modules:\n  vec: ../vec.py\nformatters: {}\n",
    )
    .unwrap();

    cmd()
        .current_dir(&docs)
        .args(["compile", "API.md.j2", "--config-path", "api.yml"])
        .assert()
        .success();

    assert_eq!(fs::read_to_string(docs.join("API.md")).unwrap(), "VecN");
}

#[test]
fn compile_without_config_fails() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("README.md.j2");
    fs::write(&template, "hello").unwrap();

    cmd()
        .args(["compile", template.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("couldn't find compdoc configuration"));
}

#[test]
fn compile_missing_template_fails() {
    let dir = project();

    cmd()
        .args(["compile", dir.path().join("NOPE.md.j2").to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("couldn't find template"));
}

#[test]
fn compile_unknown_module_reports_name() {
    let dir = project();
    let template = dir.path().join("BROKEN.md.j2");
    fs::write(&template, "{{ compdoc.module('geometry').doc.name }}").unwrap();

    cmd()
        .args(["compile", template.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("did not recognize module \"geometry\""));

    assert!(!dir.path().join("BROKEN.md").exists());
}

#[test]
fn compile_unknown_method_reports_class() {
    let dir = project();
    let template = dir.path().join("BROKEN.md.j2");
    fs::write(&template, "{{ compdoc.module('vec').Vec2.length.doc }}").unwrap();

    cmd()
        .args(["compile", template.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not find function length in class Vec2"));
}

// -- check --

#[test]
fn check_reports_mismatched_docstring() {
    let dir = project();

    cmd()
        .args(["check", dir.path().join("vec.py").to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("FAIL"))
        .stdout(predicate::str::contains("@ from_components"))
        .stdout(predicate::str::contains("Signature: [*components: float]"))
        .stdout(predicate::str::contains("Documentation: []"))
        .stdout(predicate::str::contains("ok   "))
        .stdout(predicate::str::contains("5 checked, 1 failed, 0 skipped"));
}

#[test]
fn check_clean_module_succeeds() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("clean.py");
    fs::write(
        &source,
        "def add(a: int, b: int) -> int:\n    \"\"\"Add two numbers.\n\n    Args:\n        a (int): left\n        b (int): right\n    \"\"\"\n    return a + b\n",
    )
    .unwrap();

    cmd()
        .args(["check", source.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 checked, 0 failed, 0 skipped"));
}

#[test]
fn check_reports_missing_docstring() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("bare.py");
    fs::write(&source, "def bare(x):\n    return x\n").unwrap();

    cmd()
        .args(["check", source.to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Documentation is missing."));
}

#[test]
fn check_reports_rejected_declarations() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("union.py");
    fs::write(
        &source,
        "def maybe(x: int | None) -> int:\n    \"\"\"Maybe.\"\"\"\n\ndef fine():\n    \"\"\"Fine.\"\"\"\n",
    )
    .unwrap();

    cmd()
        .args(["check", source.to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("SKIP"))
        .stdout(predicate::str::contains("@ maybe"))
        .stdout(predicate::str::contains("int | None"))
        .stdout(predicate::str::contains("1 checked, 0 failed, 1 skipped"));
}

#[test]
fn check_uses_configured_modules() {
    let dir = project();

    cmd()
        .current_dir(dir.path())
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("@ from_components"));
}

#[test]
fn check_scans_directories() {
    let dir = project();

    cmd()
        .args(["check", dir.path().to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("5 checked"));
}

#[test]
fn check_invalid_python_fails() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("broken.py");
    fs::write(&source, "def broken(x y):\n    pass\n").unwrap();

    cmd()
        .args(["check", source.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse"));
}

// -- init --

fn python_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("pkg/geometry")).unwrap();
    fs::write(dir.path().join("pkg/__init__.py"), "").unwrap();
    fs::write(dir.path().join("pkg/geometry/shapes.py"), "def area(): pass\n").unwrap();
    fs::write(dir.path().join("setup.py"), "").unwrap();
    fs::create_dir_all(dir.path().join("compdoc-formatters")).unwrap();
    fs::copy(
        fixture_path("project/compdoc-formatters/markdown.md.j2"),
        dir.path().join("compdoc-formatters/markdown.md.j2"),
    )
    .unwrap();
    dir
}

#[test]
fn init_indexes_modules_and_formatters() {
    let dir = python_project();

    cmd()
        .args(["init", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("pkg.geometry.shapes"))
        .stdout(predicate::str::contains("compdoc initialized in"));

    let config = fs::read_to_string(dir.path().join(".compdoc.yml")).unwrap();
    assert!(config.contains("pkg.geometry.shapes: pkg/geometry/shapes.py"));
    assert!(config.contains("setup: setup.py"));
    assert!(config.contains("markdown: compdoc-formatters/markdown.md.j2"));
    assert!(!config.contains("__init__"));
}

#[test]
fn init_formatter_pattern_filters() {
    let dir = python_project();
    fs::write(dir.path().join("compdoc-formatters/html.html.j2"), "").unwrap();

    cmd()
        .args(["init", dir.path().to_str().unwrap(), "-f", "html*"])
        .assert()
        .success();

    let config = fs::read_to_string(dir.path().join(".compdoc.yml")).unwrap();
    assert!(config.contains("html: compdoc-formatters/html.html.j2"));
    assert!(!config.contains("markdown"));
}

#[test]
fn init_keeps_existing_config_unless_confirmed() {
    let dir = python_project();
    let config_path = dir.path().join(".compdoc.yml");
    fs::write(&config_path, "modules: {}\nformatters: {}\n").unwrap();

    cmd()
        .args(["init", dir.path().to_str().unwrap()])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Overwrite existing"));
    assert_eq!(
        fs::read_to_string(&config_path).unwrap(),
        "modules: {}\nformatters: {}\n"
    );

    cmd()
        .args(["init", dir.path().to_str().unwrap()])
        .write_stdin("y\n")
        .assert()
        .success();
    assert!(fs::read_to_string(&config_path)
        .unwrap()
        .contains("pkg.geometry.shapes"));
}

#[test]
fn init_force_overwrites() {
    let dir = python_project();
    let config_path = dir.path().join(".compdoc.yml");
    fs::write(&config_path, "stale").unwrap();

    cmd()
        .args(["init", dir.path().to_str().unwrap(), "--force"])
        .assert()
        .success();
    assert!(fs::read_to_string(&config_path)
        .unwrap()
        .contains("setup: setup.py"));
}

#[test]
fn init_then_compile_round_trip() {
    let dir = python_project();
    cmd()
        .args(["init", dir.path().to_str().unwrap()])
        .assert()
        .success();

    let template = dir.path().join("API.md.j2");
    fs::write(
        &template,
        "{% import compdoc.formatter('markdown') as fmt %}{{ fmt.function_doc(compdoc.module('pkg.geometry.shapes').area.doc) }}",
    )
    .unwrap();

    cmd()
        .args(["compile", template.to_str().unwrap()])
        .assert()
        .success();
    let output = fs::read_to_string(dir.path().join("API.md")).unwrap();
    assert!(output.contains("### `area() -> None`"));
}

#[test]
fn no_subcommand_shows_usage() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn check_accepts_modern_declarations() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("modern.py");
    fs::write(
        &source,
        r#"def first[T](xs: list[T], key=lambda a, b: a) -> T:
    """First element.

    Args:
        xs (list[T]): items
        key: ordering

    Usage:
        first([1, 2])
    """
    return xs[0]


class Box[T]:
    def get(self) -> T:
        """Contents."""
"#,
    )
    .unwrap();

    cmd()
        .args(["check", source.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 checked, 0 failed, 0 skipped"));
}
