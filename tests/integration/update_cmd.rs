//! `switch-up update` against a local stand-in for the GitHub releases API.

use predicates::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use switch_up::test_utils::{USER_MOD_PATH, ZipFixture};

use crate::common::{TestEnv, read};

const AMS_LATEST: &str = "/repos/Atmosphere-NX/Atmosphere/releases/latest";
const HEKATE_LATEST: &str = "/repos/CTCaer/hekate/releases/latest";
const AMS_ZIP: &str = "/download/atmosphere-1.8.0-master.zip";
const HEKATE_ZIP: &str = "/download/hekate_ctcaer_6.2.0.zip";

/// One request per connection, canned bodies keyed by path, 404 otherwise.
/// Every requested path is recorded.
struct ReleaseServer {
    base: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl ReleaseServer {
    fn start(env: &TestEnv, ams_zip: Vec<u8>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let hekate_zip = fs::read(env.write_zip(
            "hekate.zip",
            ZipFixture::new().file("bootloader/payloads/hekate.bin", b"hekate_payload"),
        ))
        .unwrap();

        let mut routes: HashMap<String, Vec<u8>> = HashMap::new();
        routes.insert(AMS_LATEST.to_string(), release_json(&base, "1.8.0", AMS_ZIP));
        routes.insert(HEKATE_LATEST.to_string(), release_json(&base, "v6.2.0", HEKATE_ZIP));
        routes.insert(AMS_ZIP.to_string(), ams_zip);
        routes.insert(HEKATE_ZIP.to_string(), hekate_zip);

        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else {
                    continue;
                };
                let Some(path) = read_request_path(&stream) else {
                    continue;
                };
                seen.lock().unwrap().push(path.clone());

                let (status, body) = match routes.get(&path) {
                    Some(body) => ("200 OK", body.clone()),
                    None => ("404 Not Found", br#"{"message":"Not Found"}"#.to_vec()),
                };
                let head = format!(
                    "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = stream.write_all(head.as_bytes());
                let _ = stream.write_all(&body);
                let _ = stream.flush();
            }
        });

        Self {
            base,
            requests,
        }
    }

    fn requested(&self, path: &str) -> bool {
        self.requests.lock().unwrap().iter().any(|p| p == path)
    }
}

/// Request path from the request line; headers are drained up to the blank line.
fn read_request_path(stream: &std::net::TcpStream) -> Option<String> {
    let mut reader = BufReader::new(stream.try_clone().ok()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;

    let mut header = String::new();
    while reader.read_line(&mut header).ok()? > 0 {
        if header.trim_end().is_empty() {
            break;
        }
        header.clear();
    }

    request_line.split_whitespace().nth(1).map(str::to_string)
}

/// A release listing a checksum file before the zip, as Atmosphere does.
fn release_json(base: &str, tag: &str, zip_path: &str) -> Vec<u8> {
    let zip_name = zip_path.rsplit('/').next().unwrap_or(zip_path);
    serde_json::json!({
        "tag_name": tag,
        "assets": [
            { "name": "SHA256SUMS.txt", "browser_download_url": format!("{base}/download/SHA256SUMS.txt") },
            { "name": zip_name, "browser_download_url": format!("{base}{zip_path}") }
        ]
    })
    .to_string()
    .into_bytes()
}

/// Points the releases API at `server` and returns the private temp dir the
/// command will use for downloads and extraction.
fn prepare(env: &TestEnv, server: &ReleaseServer) -> PathBuf {
    let base = server.base.clone();
    env.edit_config(|config| config.releases.api_base = base);
    let tmp = env.temp.path().join("tmp");
    fs::create_dir_all(&tmp).unwrap();
    tmp
}

fn update_cmd(env: &TestEnv, tmp: &Path) -> assert_cmd::Command {
    let mut cmd = env.cmd();
    cmd.arg("update")
        .env("TMPDIR", tmp)
        .env("NO_PROXY", "127.0.0.1")
        .env("no_proxy", "127.0.0.1");
    for var in ["HTTP_PROXY", "http_proxy", "HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"] {
        cmd.env_remove(var);
    }
    cmd
}

/// Names of anything switch-up left in the temp dir.
fn leftovers(tmp: &Path) -> Vec<String> {
    fs::read_dir(tmp)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("switch_up_"))
        .collect()
}

fn atmosphere_zip(env: &TestEnv) -> Vec<u8> {
    fs::read(env.write_zip("ams.zip", ZipFixture::atmosphere_release())).unwrap()
}

#[test]
fn test_update_installs_atmosphere_and_hekate() {
    let env = TestEnv::new();
    let server = ReleaseServer::start(&env, atmosphere_zip(&env));
    let tmp = prepare(&env, &server);

    update_cmd(&env, &tmp)
        .assert()
        .success()
        .stdout(predicate::str::contains("Atmosphere 1.8.0 (atmosphere-1.8.0-master.zip)"))
        .stdout(predicate::str::contains("Hekate v6.2.0 (hekate_ctcaer_6.2.0.zip)"))
        .stdout(predicate::str::contains("SD card is up to date"));

    assert_eq!(read(&env.sd.path().join("atmosphere/package3")), "new_package3_data");
    assert_eq!(read(&env.sd.path().join("bootloader/payloads/hekate.bin")), "hekate_payload");
    assert_eq!(read(&env.sd.path().join(USER_MOD_PATH)), "mi mod custom\n");
    assert_eq!(env.backups().len(), 2);
    assert!(leftovers(&tmp).is_empty(), "left behind: {:?}", leftovers(&tmp));
}

#[test]
fn test_update_ams_only_skips_hekate() {
    let env = TestEnv::new();
    let server = ReleaseServer::start(&env, atmosphere_zip(&env));
    let tmp = prepare(&env, &server);

    update_cmd(&env, &tmp).arg("--ams-only").assert().success();

    assert!(server.requested(AMS_ZIP));
    assert!(!server.requested(HEKATE_LATEST));
    assert!(!server.requested(HEKATE_ZIP));
    assert!(!env.sd.path().join("bootloader/payloads/hekate.bin").exists());
    assert_eq!(env.backups().len(), 1);
    assert!(leftovers(&tmp).is_empty());
}

#[test]
fn test_update_failed_install_removes_downloads() {
    let env = TestEnv::new();
    let server = ReleaseServer::start(&env, b"not a zip".to_vec());
    let tmp = prepare(&env, &server);
    let before = env.sd.snapshot().unwrap();

    update_cmd(&env, &tmp)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Failed while extracting archive"))
        .stderr(predicate::str::contains("Invalid archive"));

    // Hekate is never attempted after Atmosphere fails
    assert!(!server.requested(HEKATE_LATEST));
    assert_eq!(env.sd.snapshot().unwrap(), before);
    assert!(leftovers(&tmp).is_empty(), "left behind: {:?}", leftovers(&tmp));
}

#[test]
fn test_update_reports_missing_release() {
    let env = TestEnv::new();
    let server = ReleaseServer::start(&env, atmosphere_zip(&env));
    let tmp = prepare(&env, &server);
    env.edit_config(|config| config.releases.atmosphere_repo = "nobody/nothing".to_string());

    update_cmd(&env, &tmp).assert().failure().stderr(predicate::str::contains("404"));

    assert!(env.backups().is_empty());
    assert!(leftovers(&tmp).is_empty());
}
