//! Runs the `rpctest` binary and checks exit codes and output streams.

use std::net::SocketAddr;

use assert_cmd::Command;
use predicates::str::contains;
use serde_json::{json, Value};

fn rpctest() -> Command {
    let mut cmd = Command::cargo_bin("rpctest").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

#[test]
fn malformed_param_exits_1() {
    rpctest()
        .args(["http://127.0.0.1:1/", "echo", "novalue"])
        .assert()
        .failure()
        .code(1)
        .stdout("")
        .stderr(contains("Parameters must be in the form <name>=<value>"));
}

#[test]
fn malformed_header_exits_1() {
    rpctest()
        .args(["http://127.0.0.1:1/", "echo", "-e", "X-Trace", "a=b"])
        .assert()
        .code(1)
        .stderr(contains("Parameters must be in the form <name>=<value>"));
}

#[test]
fn unsupported_scheme_exits_1() {
    rpctest()
        .args(["ftp://127.0.0.1/", "echo"])
        .assert()
        .code(1)
        .stderr(contains("Error: cannot use ftp://127.0.0.1/"));
}

#[test]
fn status_error_prints_body() {
    let addr = start_server();
    rpctest()
        .args([format!("http://{addr}/rpc").as_str(), "nope"])
        .assert()
        .code(1)
        .stdout("")
        .stderr(contains("invalid response status 404"))
        .stderr(contains("missing"));
}

#[test]
fn echo_prints_pretty_json() {
    let addr = start_server();
    let url = format!("http://{addr}/rpc");
    let output = rpctest()
        .args([
            url.as_str(),
            "echo",
            "-a",
            "alice",
            "secret",
            "-g",
            "-c",
            "deflate",
            "name=widget",
            "ids=[1,2,3]",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("\n  \"name\": \"widget\""));
    let value: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value, json!({"name": "widget", "ids": [1, 2, 3]}));
}
