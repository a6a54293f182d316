use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn catalog() -> Command {
    let mut cmd = Command::cargo_bin("farmacia-catalog").unwrap();
    cmd.env_remove("FARMACIA_API_URL")
        .env_remove("FARMACIA_TIMEOUT_SECS")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn slug_sanitizes_display_names() {
    catalog()
        .args(["slug", "  Crema Solar SPF 50+  "])
        .assert()
        .success()
        .stdout("crema-solar-spf-50\n");
}

#[test]
fn url_builds_canonical_path() {
    catalog()
        .args(["url", "producto", "123", "--name", "Ibuprofeno 400mg"])
        .assert()
        .success()
        .stdout("/producto/ibuprofeno-400mg-123\n");
}

#[test]
fn url_without_name_is_id_only() {
    catalog()
        .args(["url", "categoria", "7"])
        .assert()
        .success()
        .stdout("/categoria/7\n");
}

#[test]
fn url_rejects_unknown_kind() {
    catalog()
        .args(["url", "pedido", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown entity kind"));
}

#[test]
fn extract_id_reports_json() {
    catalog()
        .args(["--format", "json", "extract-id", "/product/42"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""id":"42""#))
        .stdout(predicate::str::contains(r#""legacy":true"#));
}

#[test]
fn extract_id_echoes_input_without_id() {
    catalog()
        .args(["extract-id", "sin-identificador"])
        .assert()
        .success()
        .stdout("sin-identificador\n");
}

#[test]
fn missing_config_file_fails() {
    catalog()
        .args(["--config", "/nonexistent/farmacia.toml", "slug", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn json_format_reports_errors_as_json() {
    catalog()
        .args(["--format", "json", "--config", "/nonexistent/farmacia.toml", "slug", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(r#""code_str":"#))
        .stderr(predicate::str::contains(r#""session_id":"#))
        .stderr(predicate::str::contains("Error:").not());
}

#[test]
fn zero_cache_ttl_in_config_fails() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[cache]\nttl_secs = 0").unwrap();

    catalog()
        .args(["--config", file.path().to_str().unwrap(), "slug", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ttl_secs"));
}

#[test]
fn invalid_base_url_in_config_fails() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[api]\nbase_url = \"ftp://example.com\"").unwrap();

    catalog()
        .args(["--config", file.path().to_str().unwrap(), "slug", "x"])
        .assert()
        .failure();
}
