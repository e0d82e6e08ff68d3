//! CLI integration tests
use predicates::prelude::*;
use tempfile::TempDir;

const PAGE_URL: &str = "https://news.example.com/2024/05/seals";

fn cmd() -> assert_cmd::Command {
    assert_cmd::cargo::cargo_bin_cmd!("lectern")
}

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

fn article_fixture() -> String {
    get_fixture_path("article.html")
}

#[test]
fn test_cli_file_input() {
    cmd()
        .args(["--no-image-fetch", &article_fixture()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Harbor Seals Return to the Estuary"))
        .stdout(predicate::str::contains("<script").not());
}

#[test]
fn test_cli_file_input_resolves_against_file_url() {
    cmd()
        .args(["--no-image-fetch", &article_fixture()])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"href="file:///"#));
}

#[test]
fn test_cli_url_override() {
    cmd()
        .args(["--no-image-fetch", "--url", PAGE_URL, &article_fixture()])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"href="https://news.example.com/coast/report.pdf""#));
}

#[test]
fn test_cli_stdin_input() {
    let html = std::fs::read_to_string(article_fixture()).unwrap();
    cmd()
        .args(["--no-image-fetch", "--url", PAGE_URL, "-"])
        .write_stdin(html)
        .assert()
        .success()
        .stdout(predicate::str::contains("harbor seals have been spotted"));
}

#[test]
fn test_cli_stdin_requires_url() {
    cmd()
        .arg("-")
        .write_stdin("<p>hello</p>")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--url"));
}

#[test]
fn test_cli_markdown_format() {
    cmd()
        .args(["--no-image-fetch", "-f", "markdown", &article_fixture()])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# Harbor Seals Return to the Estuary"));
}

#[test]
fn test_cli_text_format() {
    cmd()
        .args(["--no-image-fetch", "-f", "text", &article_fixture()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Volunteers will continue weekly surveys"))
        .stdout(predicate::str::contains("<p>").not());
}

#[test]
fn test_cli_json_format() {
    let output = cmd()
        .args(["--no-image-fetch", "-f", "json", "--url", PAGE_URL, &article_fixture()])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["title"], "Harbor Seals Return to the Estuary");
    assert_eq!(json["source_url"], PAGE_URL);
    assert!(json["word_count"].as_u64().unwrap() > 50);
}

#[test]
fn test_cli_invalid_format() {
    cmd().args(["-f", "pdf", &article_fixture()]).assert().failure();
}

#[test]
fn test_cli_output_file() {
    let tmp = TempDir::new().unwrap();
    let output = tmp.path().join("output.html");

    cmd()
        .args(["--no-image-fetch", "-o", output.to_str().unwrap()])
        .arg(article_fixture())
        .assert()
        .success()
        .stderr(predicate::str::contains("Output written to"));

    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.contains("Counts were highest at low tide"));
}

#[test]
fn test_cli_options_file() {
    let tmp = TempDir::new().unwrap();
    let options = tmp.path().join("options.json");
    std::fs::write(&options, r#"{ "attribute_whitelist": { "a": ["title"] } }"#).unwrap();

    cmd()
        .args(["--no-image-fetch", "--options", options.to_str().unwrap(), &article_fixture()])
        .assert()
        .success()
        .stdout(predicate::str::contains("src=").not())
        .stdout(predicate::str::contains("href=").not());
}

#[test]
fn test_cli_invalid_options_file() {
    let tmp = TempDir::new().unwrap();
    let options = tmp.path().join("options.json");
    std::fs::write(&options, "{ not json").unwrap();

    cmd()
        .args(["--options", options.to_str().unwrap(), &article_fixture()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load options"));
}

#[test]
fn test_cli_preserve_embeds() {
    cmd()
        .args(["--no-image-fetch", "--preserve-embeds", &article_fixture()])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"<iframe src="https://video.example.org/embed/seals"></iframe>"#));
}

#[test]
fn test_cli_invalid_file() {
    cmd().arg("nonexistent.html").assert().failure();
}

#[test]
fn test_cli_empty_input() {
    cmd().args(["--url", PAGE_URL, "-"]).write_stdin("   ").assert().failure();
}

#[test]
fn test_cli_verbose() {
    cmd()
        .args(["-v", "--no-image-fetch", &article_fixture()])
        .assert()
        .success()
        .stderr(predicate::str::contains("Lectern"))
        .stderr(predicate::str::contains("Timing Summary"));
}
