use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const HOST_TEMPLATE: &str = "\
Value IP (\\d+\\.\\d+\\.\\d+\\.\\d+)
Value HOST (\\S+)

Start
  ^ip ${IP}
  ^host ${HOST}
";

const IFACE_TEMPLATE: &str = "\
Value IFACE (eth\\d+)
Value STATE (up|down)

Start
  ^Interface ${IFACE} is ${STATE} -> Record
";

fn logtab_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_logtab"))
}

struct Fixture {
    root: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let templates = root.path().join("templates");
        fs::create_dir_all(&templates).unwrap();
        fs::write(templates.join("host.template"), HOST_TEMPLATE).unwrap();
        fs::write(templates.join("iface.template"), IFACE_TEMPLATE).unwrap();
        fs::write(
            templates.join("list.txt"),
            "# device identity first\nhost.template\niface.template\n",
        )
        .unwrap();

        let captures = root.path().join("captures");
        fs::create_dir_all(&captures).unwrap();
        fs::write(
            captures.join("a.log"),
            "ip 10.0.0.1\nhost r1\nInterface eth0 is up\nInterface eth1 is down\n",
        )
        .unwrap();
        fs::write(captures.join("b.log"), "ip 10.0.0.2\nhost r2\n").unwrap();

        Self { root }
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.root.path().join(relative)
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(logtab_bin())
            .args(args)
            .current_dir(self.root.path())
            .env(logtab::defaults::ENV_LOG_DIR, self.path("logs"))
            .env_remove("RUST_LOG")
            .output()
            .expect("failed to execute logtab CLI")
    }
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "command failed\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|err| panic!("cannot read {}: {}", path.display(), err))
}

#[test]
fn test_directory_report_pads_missing_columns() {
    let fixture = Fixture::new();
    let report = fixture.path("out/report.csv");

    let output = fixture.run(&[
        "-D",
        "captures",
        "-l",
        "templates/list.txt",
        "-R",
        report.to_str().unwrap(),
    ]);
    assert_success(&output);

    assert_eq!(
        read(&report),
        "\"FILENAME\",\"IP\",\"HOST\",\"IFACE\",\"STATE\"\n\
         \"a.log\",\"10.0.0.1\",\"r1\",\"eth0\",\"up\"\n\
         \"a.log\",\"10.0.0.1\",\"r1\",\"eth1\",\"down\"\n\
         \"b.log\",\"10.0.0.2\",\"r2\",\"\",\"\"\n"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Report filename:"), "stderr:\n{}", stderr);
    assert!(fixture.path("logs/logtab.log").exists());
}

#[test]
fn test_directory_report_narrow_rows() {
    let fixture = Fixture::new();
    let report = fixture.path("narrow.csv");

    let output = fixture.run(&[
        "-D",
        "captures",
        "-l",
        "templates/list.txt",
        "-R",
        report.to_str().unwrap(),
        "--narrow-rows",
    ]);
    assert_success(&output);

    let content = read(&report);
    let last = content.lines().last().unwrap();
    assert_eq!(last, "\"b.log\",\"10.0.0.2\",\"r2\"");
}

#[test]
fn test_directory_report_default_name() {
    let fixture = Fixture::new();

    let output = fixture.run(&["-D", "captures", "-t", "templates/host.template"]);
    assert_success(&output);

    let reports: Vec<String> = fs::read_dir(fixture.root.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("report_") && name.ends_with(".csv"))
        .collect();
    assert_eq!(reports.len(), 1, "reports: {:?}", reports);

    let content = read(&fixture.path(&reports[0]));
    assert_eq!(
        content.lines().collect::<Vec<_>>(),
        vec![
            "\"FILENAME\",\"IP\",\"HOST\"",
            "\"a.log\",\"10.0.0.1\",\"r1\"",
            "\"b.log\",\"10.0.0.2\",\"r2\"",
        ]
    );
}

#[test]
fn test_single_file_with_template_prints_table() {
    let fixture = Fixture::new();

    let output = fixture.run(&["-f", "captures/a.log", "-t", "templates/iface.template"]);
    assert_success(&output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("IFACE"));
    assert!(stdout.contains("eth0"));
    assert!(stdout.contains("down"));
    assert!(!stdout.contains("FILENAME"));
}

#[test]
fn test_single_file_with_list_prints_combined_rows() {
    let fixture = Fixture::new();

    let output = fixture.run(&["-f", "captures/a.log", "-l", "templates/list.txt"]);
    assert_success(&output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    for column in ["IP", "HOST", "IFACE", "STATE"] {
        assert!(stdout.contains(column), "missing {} in\n{}", column, stdout);
    }
    assert_eq!(stdout.matches("10.0.0.1").count(), 2);
}

#[test]
fn test_missing_inputs_fail_with_suggestions() {
    let fixture = Fixture::new();

    let output = fixture.run(&["-t", "templates/host.template"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR:"), "stderr:\n{}", stderr);
    assert!(stderr.contains("TRY:"), "stderr:\n{}", stderr);
}

#[test]
fn test_empty_template_list_is_fatal() {
    let fixture = Fixture::new();
    fs::write(fixture.path("templates/empty.txt"), "# nothing\n\n").unwrap();

    let output = fixture.run(&["-D", "captures", "-l", "templates/empty.txt", "-R", "r.csv"]);
    assert!(!output.status.success());
    assert!(!fixture.path("r.csv").exists());
}

#[test]
fn test_template_and_list_conflict() {
    let fixture = Fixture::new();

    let output = fixture.run(&[
        "-f",
        "captures/a.log",
        "-t",
        "templates/host.template",
        "-l",
        "templates/list.txt",
    ]);
    assert!(!output.status.success());
}

#[test]
fn test_templates_list_accepts_legacy_spellings() {
    let fixture = Fixture::new();

    for flag in ["--tl", "--templates_list", "--templates-list"] {
        let output = fixture.run(&["-f", "captures/a.log", flag, "templates/list.txt"]);
        assert_success(&output);

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("IFACE"), "{} output:\n{}", flag, stdout);
    }
}
