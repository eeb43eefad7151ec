use std::ffi::OsString;
use std::fs;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::{Arc, Mutex};
use std::thread;

use tempfile::TempDir;

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
    photos: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");
        let photos = base.join("photos");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");
        fs::create_dir_all(&photos).expect("failed to create photo dir");

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_config,
            xdg_state,
            photos,
        }
    }

    fn write_config(&self, base_url: &str) {
        let dir = self.xdg_config.join("facelens");
        fs::create_dir_all(&dir).expect("failed to create config dir");
        fs::write(
            dir.join("config.toml"),
            format!("[service]\nbase_url = \"{base_url}\"\ntimeout_secs = 5\n"),
        )
        .expect("failed to write config");
    }

    fn photo(&self, name: &str) -> PathBuf {
        let path = self.photos.join(name);
        fs::write(&path, b"\xff\xd8\xff\xe0 fake jpeg").expect("failed to write photo");
        path
    }
}

fn run_bin(env: &CliTestEnv, args: &[&str]) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("facelens"));

    Command::new(bin_path)
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .output()
        .unwrap_or_else(|e| panic!("failed to execute facelens: {e}"))
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "facelens {rendered_args} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status, stdout, stderr
    );
}

// ============================================
// Fake service
// ============================================

const SUMMARY: &str = r#"{"summary":{"totalAnalyses":42,"todayAnalyses":3,"avgAccuracy":91.5,"activeUsers":7,"trends":{"totalTrend":"+5%","todayTrend":"+1","accuracyTrend":"+0.2%","usersTrend":"+2"}}}"#;
const UPLOADED: &str = r#"{"url":"https://cdn.test/photo.jpg"}"#;
const ANALYZED: &str = r#"{"gender":"female","eyeColor":"brown","hairColor":"black","confidence":0.87}"#;

/// Serves canned responses per path on a background thread and counts hits.
struct FakeService {
    base_url: String,
    hits: Arc<Mutex<Vec<String>>>,
}

impl FakeService {
    fn start(routes: Vec<(&'static str, u16, &'static str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind");
        let base_url = format!("http://{}", listener.local_addr().expect("no local addr"));
        let hits = Arc::new(Mutex::new(Vec::new()));

        let recorded = hits.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { return };
                serve(stream, &routes, &recorded);
            }
        });

        Self { base_url, hits }
    }

    fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().iter().filter(|p| *p == path).count()
    }
}

fn serve(
    mut stream: TcpStream,
    routes: &[(&'static str, u16, &'static str)],
    hits: &Mutex<Vec<String>>,
) -> Option<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];

    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let path = head.lines().next()?.split_whitespace().nth(1)?.to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok());
    let chunked = head.to_ascii_lowercase().contains("transfer-encoding: chunked");

    loop {
        let body = &buf[header_end..];
        let done = match content_length {
            Some(len) => body.len() >= len,
            None if chunked => body.windows(5).any(|w| w == b"0\r\n\r\n"),
            None => true,
        };
        if done {
            break;
        }
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let (status, body) = routes
        .iter()
        .find(|(route, _, _)| *route == path)
        .map(|(_, status, body)| (*status, *body))
        .unwrap_or((404, r#"{"error":"not found"}"#));
    hits.lock().unwrap().push(path);

    let response = format!(
        "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).ok()?;
    stream.flush().ok()
}

// ============================================
// Tests
// ============================================

#[test]
fn status_without_config_explains_setup() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, &["status"]);
    assert_success(&["status"], &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Service is not configured"),
        "expected setup hint, got:\n{stdout}"
    );
    assert!(stdout.contains("[service]"));
}

#[test]
fn status_reports_configured_endpoints() {
    let env = CliTestEnv::new();
    env.write_config("https://faces.example.com/");

    let output = run_bin(&env, &["status"]);
    assert_success(&["status"], &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("https://faces.example.com/"));
    assert!(stdout.contains("/api/analyze-photo"));
    assert!(stdout.contains("Status: Ready"), "got:\n{stdout}");
}

#[test]
fn analyze_without_service_fails_with_hint() {
    let env = CliTestEnv::new();
    let photo = env.photo("me.jpg");
    let photo = photo.to_str().unwrap();

    let output = run_bin(&env, &["analyze", photo]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("facelens status"),
        "expected configuration hint, got:\n{stderr}"
    );
}

#[test]
fn analyze_missing_file_fails_before_contacting_service() {
    let env = CliTestEnv::new();
    let service = FakeService::start(vec![("/api/analytics", 200, SUMMARY)]);
    env.write_config(&service.base_url);

    let missing = env.photos.join("nope.jpg");
    let output = run_bin(&env, &["analyze", missing.to_str().unwrap()]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("nope.jpg"), "got:\n{stderr}");
    assert_eq!(service.hits("/api/analytics"), 0);
}

#[test]
fn analytics_prints_dashboard_as_json() {
    let env = CliTestEnv::new();
    let service = FakeService::start(vec![("/api/analytics", 200, SUMMARY)]);
    env.write_config(&service.base_url);

    let args = ["analytics", "--format", "json"];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let summary: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(summary["totalAnalyses"], 42);
    assert_eq!(summary["trends"]["usersTrend"], "+2");
}

#[test]
fn analyze_runs_full_workflow() {
    let env = CliTestEnv::new();
    let service = FakeService::start(vec![
        ("/api/analytics", 200, SUMMARY),
        ("/api/upload", 200, UPLOADED),
        ("/api/analyze-photo", 200, ANALYZED),
    ]);
    env.write_config(&service.base_url);
    let photo = env.photo("me.jpg");
    let photo = photo.to_str().unwrap();

    let args = ["analyze", photo];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Analysis Results"), "got:\n{stdout}");
    assert!(stdout.contains("female"));
    assert!(stdout.contains("87%"));
    assert!(stdout.contains("Unknown"), "missing attributes show Unknown");

    assert_eq!(service.hits("/api/upload"), 1);
    assert_eq!(service.hits("/api/analyze-photo"), 1);
    // Once at mount, once after success
    assert_eq!(service.hits("/api/analytics"), 2);
}

#[test]
fn analyze_retries_reuse_the_upload() {
    let env = CliTestEnv::new();
    let service = FakeService::start(vec![
        ("/api/analytics", 200, SUMMARY),
        ("/api/upload", 200, UPLOADED),
        ("/api/analyze-photo", 500, r#"{"error":"model offline"}"#),
    ]);
    env.write_config(&service.base_url);
    let photo = env.photo("me.jpg");
    let photo = photo.to_str().unwrap();

    let output = run_bin(&env, &["analyze", photo, "--retries", "2", "--format", "json"]);
    assert!(!output.status.success());

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(report["phase"], "failed");
    assert_eq!(report["asset_url"], "https://cdn.test/photo.jpg");
    assert!(report["error"].as_str().unwrap().contains("500"));

    assert_eq!(service.hits("/api/upload"), 1);
    assert_eq!(service.hits("/api/analyze-photo"), 3);
    // No refresh after a failure
    assert_eq!(service.hits("/api/analytics"), 1);
}
