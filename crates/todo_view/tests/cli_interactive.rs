use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("todo_view-{nanos}-{file_name}"))
}

fn run_interactive(api_url: String, config_path: PathBuf, input: String) -> Output {
    let exe = env!("CARGO_BIN_EXE_todo_view");

    let mut child = Command::new(exe)
        .arg("--json")
        .env("TODOVIEW_API_URL", api_url)
        .env("TODOVIEW_CONFIG_PATH", config_path)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn interactive session");

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        stdin
            .write_all(input.as_bytes())
            .expect("failed to write to stdin");
    }

    child
        .wait_with_output()
        .expect("failed to read interactive output")
}

async fn session(server: &MockServer, input: &str) -> Output {
    let api_url = server.uri();
    let config_path = temp_path("absent-config.json");
    let input = input.to_string();
    tokio::task::spawn_blocking(move || run_interactive(api_url, config_path, input))
        .await
        .unwrap()
}

/// Each line of JSON output is one render of the view.
fn renders(output: &Output) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect()
}

async fn serve_single_task(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([{"id": 1, "name": "Buy milk"}])),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn interactive_type_then_save_renames_and_exits_edit_mode() {
    let server = MockServer::start().await;
    serve_single_task(&server).await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([{"id": 1, "name": "Buy oat milk"}])),
        )
        .with_priority(2)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/tasks/1"))
        .and(body_json(serde_json::json!({"name": "Buy oat milk"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let output = session(&server, "type 1 \"Buy oat milk\"\nsave 1\nexit\n").await;

    assert!(output.status.success());
    let renders = renders(&output);
    assert_eq!(renders.len(), 3);

    assert_eq!(renders[0][0]["text"], "Buy milk");
    assert_eq!(renders[1][0]["text"], "Buy oat milk");
    assert_eq!(renders[1][0]["editing"], true);
    assert_eq!(renders[1][0]["save_enabled"], true);
    assert_eq!(renders[2][0]["text"], "Buy oat milk");
    assert_eq!(renders[2][0]["editing"], false);

    let requests = server.received_requests().await.unwrap_or_default();
    let log: Vec<String> = requests
        .iter()
        .map(|request| format!("{} {}", request.method.as_str(), request.url.path()))
        .collect();
    assert_eq!(log, vec!["GET /tasks", "PUT /tasks/1", "GET /tasks"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn interactive_typing_alone_sends_nothing() {
    let server = MockServer::start().await;
    serve_single_task(&server).await;

    let input = "type 1 \"Buy milk\"\nsave 1\ntype 1 \"\"\nsave 1\nexit\n";
    let output = session(&server, input).await;

    assert!(output.status.success());
    let renders = renders(&output);
    assert_eq!(renders[1][0]["save_enabled"], false);
    assert_eq!(renders[3][0]["text"], "");
    assert_eq!(renders[3][0]["save_enabled"], false);
    assert_eq!(renders[4][0]["editing"], true);

    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn interactive_failed_save_keeps_edit_mode() {
    let server = MockServer::start().await;
    serve_single_task(&server).await;
    Mock::given(method("PUT"))
        .and(path("/tasks/1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let output = session(&server, "type 1 \"Buy oat milk\"\nsave 1\ncancel\nexit\n").await;

    assert!(output.status.success());
    let renders = renders(&output);
    assert_eq!(renders[2][0]["text"], "Buy oat milk");
    assert_eq!(renders[2][0]["editing"], true);
    assert_eq!(renders[3][0]["text"], "Buy milk");
    assert_eq!(renders[3][0]["editing"], false);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to save task"));
}

#[tokio::test(flavor = "multi_thread")]
async fn interactive_add_is_acknowledged_without_requests() {
    let server = MockServer::start().await;
    serve_single_task(&server).await;

    let output = session(&server, "add\nexit\n").await;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Adding tasks is not available yet."));
    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn interactive_rejects_startup_only_flags() {
    let server = MockServer::start().await;
    serve_single_task(&server).await;

    let output = session(
        &server,
        "list --api-url http://127.0.0.1:9\ndelete 1 --config-override timeout=1\nexit\n",
    )
    .await;

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input - --api-url can only be set at startup"));
    assert!(
        stderr.contains("ERROR: invalid_input - --config-override can only be set at startup")
    );
    assert_eq!(renders(&output).len(), 1);
    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn interactive_help_and_invalid_commands() {
    let server = MockServer::start().await;
    serve_single_task(&server).await;

    let output = session(&server, "help\n?\nnope\ntype 1 \"unterminated\nquit\n").await;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.matches("Usage").count(), 2);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input"));
    assert!(stderr.contains("unterminated quote in command"));
}

#[tokio::test(flavor = "multi_thread")]
async fn interactive_aliases_expand_from_config() {
    let server = MockServer::start().await;
    serve_single_task(&server).await;
    Mock::given(method("DELETE"))
        .and(path("/tasks/1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .with_priority(2)
        .mount(&server)
        .await;

    let config_path = temp_path("alias-config.json");
    let content = serde_json::json!({ "aliases": { "rm": "delete" } });
    std::fs::write(&config_path, serde_json::to_string(&content).unwrap()).unwrap();

    let api_url = server.uri();
    let path_for_child = config_path.clone();
    let output = tokio::task::spawn_blocking(move || {
        run_interactive(api_url, path_for_child, "rm 1\nexit\n".to_string())
    })
    .await
    .unwrap();
    std::fs::remove_file(&config_path).ok();

    assert!(output.status.success());
    let renders = renders(&output);
    let last = renders.last().and_then(|rows| rows.as_array()).map(Vec::len);
    assert_eq!(last, Some(0));
}
