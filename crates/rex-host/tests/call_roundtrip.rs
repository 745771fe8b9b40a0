//! End-to-end calls through the HTTP/2 transport with the real client.

use std::net::SocketAddr;
use std::path::PathBuf;

use rex_client::{CommandClient, Reply};
use rex_host::{Dispatcher, ServerHandle, handler_fn, spawn_dispatcher};
use serde_json::{Value, json};
use tempfile::TempDir;

struct Harness {
    _tmp: TempDir,
    root: PathBuf,
    dispatcher: Dispatcher,
    server: ServerHandle,
    client: CommandClient,
}

impl Harness {
    async fn start() -> Self {
        let tmp = TempDir::new().expect("tempdir");
        let root = std::fs::canonicalize(tmp.path()).expect("canonical root");
        let dispatcher = Dispatcher::with_builtins(root.clone());
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let server = spawn_dispatcher(addr, dispatcher.clone())
            .await
            .expect("spawn server");
        let client = CommandClient::new(server.url());
        Self {
            _tmp: tmp,
            root,
            dispatcher,
            server,
            client,
        }
    }

    async fn call(&self, method: &str, args: &[&str]) -> Reply {
        let args = args.iter().map(|a| a.to_string()).collect::<Vec<_>>();
        self.client.call(method, &args).await.expect("call completes")
    }

    async fn value(&self, method: &str, args: &[&str]) -> Value {
        let reply = self.call(method, args).await;
        assert_eq!(reply.status, 200, "{method} {args:?} -> {reply:?}");
        reply.json().expect("json body").unwrap_or(Value::Null)
    }
}

#[tokio::test]
async fn add_sums_numbers_and_ignores_junk() {
    let h = Harness::start().await;
    let reply = h.call("add", &["2", "3.5", "foo"]).await;
    assert_eq!(reply, Reply { status: 200, body: "5.5".into() });
    h.server.shutdown().await.unwrap();
}

#[tokio::test]
async fn unknown_method_is_500_false() {
    let h = Harness::start().await;
    for method in ["cat", "", "LS"] {
        let reply = h.call(method, &[]).await;
        assert_eq!(reply, Reply { status: 500, body: "false".into() }, "method {method:?}");
    }
    // Still serving afterwards.
    assert_eq!(h.value("add", &["1"]).await, json!(1));
    h.server.shutdown().await.unwrap();
}

#[tokio::test]
async fn handler_failure_matches_not_found() {
    let h = Harness::start().await;
    let failed = h.call("ls", &["no-such-dir"]).await;
    let missing = h.call("no-such-command", &[]).await;
    assert_eq!(failed, missing);
    h.server.shutdown().await.unwrap();
}

#[tokio::test]
async fn touch_then_ls_lists_new_files() {
    let h = Harness::start().await;
    assert_eq!(h.value("touch", &["a", "b", "c"]).await, json!(true));
    let listing = h.value("ls", &[]).await;
    for name in ["a", "b", "c"] {
        assert!(listing.as_array().unwrap().contains(&json!(name)), "{listing}");
    }
    assert!(h.root.join("b").is_file());
    h.server.shutdown().await.unwrap();
}

#[tokio::test]
async fn rm_of_missing_path_is_true() {
    let h = Harness::start().await;
    assert_eq!(h.value("rm", &["ghost"]).await, json!(true));
    h.server.shutdown().await.unwrap();
}

#[tokio::test]
async fn duplicate_mkdir_reports_false_with_status_200() {
    let h = Harness::start().await;
    assert_eq!(h.value("mkdir", &["dir"]).await, json!(true));
    let again = h.call("mkdir", &["dir"]).await;
    assert_eq!(again, Reply { status: 200, body: "false".into() });
    assert_eq!(h.value("ls", &[]).await, json!(["dir"]));
    h.server.shutdown().await.unwrap();
}

#[tokio::test]
async fn cd_persists_across_calls() {
    let h = Harness::start().await;
    std::fs::create_dir(h.root.join("inner")).unwrap();
    std::fs::write(h.root.join("inner/one"), b"").unwrap();
    std::fs::write(h.root.join("inner/two"), b"").unwrap();

    assert_eq!(h.value("cd", &["inner"]).await, json!(true));
    assert_eq!(h.value("ls", &[]).await, json!(["one", "two"]));
    assert_eq!(
        h.value("pwd", &[]).await,
        json!(h.root.join("inner").to_string_lossy())
    );
    assert_eq!(h.value("cd", &["missing"]).await, json!(false));
    assert_eq!(h.value("ls", &[]).await, json!(["one", "two"]));
    h.server.shutdown().await.unwrap();
}

#[tokio::test]
async fn alias_matches_target_results_and_side_effects() {
    let h = Harness::start().await;
    assert_eq!(h.value("alias", &["plus", "add"]).await, json!(true));
    assert_eq!(
        h.call("plus", &["4", "x", "0.25"]).await,
        h.call("add", &["4", "x", "0.25"]).await
    );

    assert_eq!(h.value("alias", &["md", "mkdir"]).await, json!(true));
    assert_eq!(h.value("md", &["made"]).await, json!(true));
    assert!(h.root.join("made").is_dir());
    assert_eq!(h.value("md", &["made"]).await, h.value("mkdir", &["made"]).await);

    let names = h.value("commands", &[]).await;
    let names = names.as_array().unwrap();
    for name in ["plus", "md", "add", "mkdir"] {
        assert_eq!(names.iter().filter(|n| **n == json!(name)).count(), 1);
    }
    h.server.shutdown().await.unwrap();
}

#[tokio::test]
async fn alias_of_unknown_command_is_protocol_failure() {
    let h = Harness::start().await;
    let reply = h.call("alias", &["x", "nothing"]).await;
    assert_eq!(reply, Reply { status: 500, body: "false".into() });
    let reply = h.call("x", &[]).await;
    assert_eq!(reply.status, 500);
    h.server.shutdown().await.unwrap();
}

#[tokio::test]
async fn pipe_returns_empty_body() {
    let h = Harness::start().await;
    let reply = h.call("pipe", &["anything"]).await;
    assert_eq!(reply, Reply { status: 200, body: String::new() });
    assert_eq!(reply.json().unwrap(), None);
    h.server.shutdown().await.unwrap();
}

#[tokio::test]
async fn non_ascii_arguments_survive_the_header() {
    let h = Harness::start().await;
    h.dispatcher
        .registry()
        .register(
            "echo",
            handler_fn("echo", |_ctx, args| async move { Ok(Some(json!(args))) }),
        )
        .await;
    assert_eq!(h.value("echo", &["héllo", "日本"]).await, json!(["héllo", "日本"]));
    assert_eq!(h.value("touch", &["naïve.txt"]).await, json!(true));
    assert!(h.root.join("naïve.txt").exists());
    h.server.shutdown().await.unwrap();
}

#[tokio::test]
async fn concurrent_calls_are_independent() {
    let h = Harness::start().await;
    let mut tasks = Vec::new();
    for i in 0..16 {
        let client = h.client.clone();
        tasks.push(tokio::spawn(async move {
            let arg = i.to_string();
            client.call("add", &[arg.clone(), arg]).await
        }));
    }
    for (i, task) in tasks.into_iter().enumerate() {
        let reply = task.await.unwrap().unwrap();
        assert_eq!(reply.body, (i * 2).to_string());
    }
    h.server.shutdown().await.unwrap();
}
