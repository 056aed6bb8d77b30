use std::path::PathBuf;

use serde_json::json;
use tempfile::TempDir;

use crate::constants::{EXIT_INIT_FAILED, EXIT_MOUNT_MISSING, EXIT_USAGE};
use crate::error::BootError;
use crate::file_utils::{dir_exists, dir_is_empty, file_exists, replace_symlink};
use crate::schemas::ProcedureResponse;
use crate::url_utils::{system_information_url, trim_root_dot};

#[test]
fn test_system_information_url() {
    let url =
        system_information_url("db-0.db.default.svc.cluster.local.", 8080, "OVERVIEW").unwrap();
    assert_eq!(url.host_str(), Some("db-0.db.default.svc.cluster.local"));
    assert_eq!(url.port(), Some(8080));
    assert_eq!(url.path(), "/api/1.0/");

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("Procedure".to_string(), "@SystemInformation".to_string()),
            ("Parameters".to_string(), "[\"OVERVIEW\"]".to_string()),
            ("admin".to_string(), "true".to_string()),
        ]
    );

    assert!(system_information_url("  ", 8080, "OVERVIEW").is_err());
}

#[test]
fn test_trim_root_dot() {
    assert_eq!(trim_root_dot("db-0.svc."), "db-0.svc");
    assert_eq!(trim_root_dot("db-0.svc"), "db-0.svc");
    assert_eq!(trim_root_dot(""), "");
}

#[test]
fn test_overview_rows() {
    let body = json!({
        "status": 1,
        "appstatus": -128,
        "statusstring": null,
        "results": [{
            "status": -128,
            "schema": [
                {"name": "HOST_ID", "type": 5},
                {"name": "KEY", "type": 9},
                {"name": "VALUE", "type": 9}
            ],
            "data": [
                [0, "CLUSTERSTATE", "RUNNING"],
                [0, "VERSION", "8.3"],
                [1, "CLUSTERSTATE", "RUNNING"],
                ["bad row"]
            ]
        }]
    });

    let resp: ProcedureResponse = serde_json::from_value(body).unwrap();
    assert!(resp.is_success());

    let info = resp.into_system_info();
    assert_eq!(info.rows.len(), 3);
    assert_eq!(info.get("CLUSTERSTATE"), Some("RUNNING"));
    assert_eq!(info.get("VERSION"), Some("8.3"));
    assert_eq!(info.get("UPTIME"), None);
    assert_eq!(info.host_count(), 2);
}

#[test]
fn test_failed_procedure_has_no_rows() {
    let body = json!({"status": -3, "statusstring": "Procedure not found"});
    let resp: ProcedureResponse = serde_json::from_value(body).unwrap();
    assert!(!resp.is_success());
    assert!(resp.into_system_info().rows.is_empty());
}

#[test]
fn test_exit_codes() {
    let usage = BootError::Usage {
        found: vec!["foo".into(), "bar".into()],
    };
    assert_eq!(usage.exit_code(), EXIT_USAGE);
    assert_eq!(
        BootError::MountMissing(PathBuf::from("/voltdbroot")).exit_code(),
        EXIT_MOUNT_MISSING
    );
    let init = BootError::InitFailed {
        dir: PathBuf::from("/voltdbroot/db-0"),
        reason: "boom".into(),
    };
    assert_eq!(init.exit_code(), EXIT_INIT_FAILED);
    assert_ne!(EXIT_MOUNT_MISSING, EXIT_INIT_FAILED);
}

#[tokio::test]
async fn test_dir_is_empty() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("node");

    // Missing counts as empty
    assert!(dir_is_empty(&dir).await.unwrap());
    assert!(!dir_exists(&dir).await);

    std::fs::create_dir(&dir).unwrap();
    assert!(dir_is_empty(&dir).await.unwrap());
    assert!(dir_exists(&dir).await);

    std::fs::write(dir.join("marker"), b"x").unwrap();
    assert!(!dir_is_empty(&dir).await.unwrap());
    assert!(file_exists(&dir.join("marker")).await);
    assert!(!file_exists(&dir).await);
}

#[tokio::test]
async fn test_replace_symlink() {
    let tmp = TempDir::new().unwrap();
    let link = tmp.path().join("db");

    std::fs::create_dir(tmp.path().join("db-0.svc")).unwrap();
    std::fs::create_dir(tmp.path().join("db-1.svc")).unwrap();

    replace_symlink(&PathBuf::from("db-0.svc"), &link).await.unwrap();
    assert_eq!(std::fs::read_link(&link).unwrap(), PathBuf::from("db-0.svc"));

    // Re-pointing replaces the previous link
    replace_symlink(&PathBuf::from("db-1.svc"), &link).await.unwrap();
    assert_eq!(std::fs::read_link(&link).unwrap(), PathBuf::from("db-1.svc"));

    // A real directory is left alone
    let real = tmp.path().join("real");
    std::fs::create_dir(&real).unwrap();
    replace_symlink(&PathBuf::from("db-0.svc"), &real).await.unwrap();
    assert!(std::fs::symlink_metadata(&real).unwrap().is_dir());
}
