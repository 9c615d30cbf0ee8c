mod test_support;

use serde_json::json;
use test_support::{error_code, request_err, request_ok, spawn_sidecar, spawn_sidecar_with_args, temp_dir};

#[test]
fn protected_methods_require_login() {
    let workspace = temp_dir("schoold-auth-gate");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["authenticated"], json!(false));

    let e = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(error_code(&e), "unauthenticated");
    let e = request_err(&mut stdin, &mut reader, "3", "students.list", json!({}));
    assert_eq!(error_code(&e), "unauthenticated");

    let status = request_ok(&mut stdin, &mut reader, "4", "auth.status", json!({}));
    assert_eq!(status["authenticated"], json!(false));
    assert_eq!(status["views"], json!([]));

    let e = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "auth.login",
        json!({ "username": "admin", "password": "nope" }),
    );
    assert_eq!(error_code(&e), "bad_credentials");
    assert_eq!(
        e.get("message").and_then(|v| v.as_str()),
        Some("Invalid credentials. Please try again.")
    );

    let login = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "auth.login",
        json!({ "username": "admin", "password": "admin123" }),
    );
    assert_eq!(login["authenticated"], json!(true));
    assert_eq!(login["username"], json!("admin"));
    assert_eq!(
        login["views"],
        json!(["dashboard", "addStudent", "studentDashboard", "editStudent"])
    );

    let e = request_err(&mut stdin, &mut reader, "7", "students.list", json!({}));
    assert_eq!(error_code(&e), "no_workspace");
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let listed = request_ok(&mut stdin, &mut reader, "9", "students.list", json!({}));
    assert_eq!(listed["students"], json!([]));

    let out = request_ok(&mut stdin, &mut reader, "10", "auth.logout", json!({}));
    assert_eq!(out["authenticated"], json!(false));
    let e = request_err(&mut stdin, &mut reader, "11", "students.list", json!({}));
    assert_eq!(error_code(&e), "unauthenticated");

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn configured_credentials_and_school_name_apply() {
    let (_child, mut stdin, mut reader) = spawn_sidecar_with_args(&[
        "--admin-username",
        "office",
        "--admin-password",
        "s3cret",
        "--school-name",
        "Green Valley School",
    ]);

    let info = request_ok(&mut stdin, &mut reader, "1", "app.info", json!({}));
    assert_eq!(info["schoolName"], json!("Green Valley School"));
    assert_eq!(info["logo"]["available"], json!(false));
    assert_eq!(info["academicYears"][0], json!("2020"));

    let e = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "auth.login",
        json!({ "username": "admin", "password": "admin123" }),
    );
    assert_eq!(error_code(&e), "bad_credentials");
    let login = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "auth.login",
        json!({ "username": "office", "password": "s3cret" }),
    );
    assert_eq!(login["authenticated"], json!(true));
}
