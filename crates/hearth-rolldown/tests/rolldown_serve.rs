use std::fs;

use hearth::{BuildContext, ServeOptions};
use hearth_rolldown::RolldownEngine;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

fn create_project() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    let src = dir.path().join("src");
    fs::create_dir(&src).expect("create src");

    fs::write(
        src.join("greet.ts"),
        r#"
export function greet(name: string): string {
    return `hello ${name}`;
}
"#,
    )
    .expect("write greet");
    fs::write(src.join("message.txt"), "from a text file").expect("write text");
    fs::write(
        src.join("main.ts"),
        r#"
import { greet } from './greet.ts';
import message from './message.txt';

document.body.textContent = greet('hearth') + ' ' + message;
"#,
    )
    .expect("write main");

    dir
}

fn options(project: &TempDir) -> ServeOptions {
    ServeOptions::new()
        .working_dir(project.path())
        .host("127.0.0.1")
        .port(0)
        .loader(".txt", hearth::Loader::Text)
}

#[tokio::test(flavor = "multi_thread")]
async fn serve_writes_bundle_and_shell() {
    let project = create_project();
    let session = hearth::serve(&RolldownEngine::new(), "src/main.ts", options(&project))
        .await
        .expect("serve");

    let dist = project.path().join("dist");
    let bundle = fs::read_to_string(dist.join("main.js")).expect("bundle written");
    assert!(bundle.contains("hello"));
    assert!(bundle.contains("from a text file"));

    let shell = fs::read_to_string(dist.join("index.html")).expect("shell written");
    assert!(shell.contains(r#"<script type="module" src="main.js"></script>"#));
    assert!(shell.contains("new EventSource('/esbuild')"));

    let mut stream = TcpStream::connect(("127.0.0.1", session.info().port))
        .await
        .expect("connect");
    stream
        .write_all(b"GET /index.html HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains("main.js"));

    session.dispose().await.expect("dispose");
}

#[tokio::test(flavor = "multi_thread")]
async fn broken_import_keeps_previous_shell() {
    let project = create_project();
    let session = hearth::serve(&RolldownEngine::new(), "src/main.ts", options(&project))
        .await
        .expect("serve");
    let shell_path = project.path().join("dist/index.html");
    let before = fs::read_to_string(&shell_path).expect("shell");

    fs::write(
        project.path().join("src/main.ts"),
        "import { missing } from './does-not-exist.ts';\nmissing();\n",
    )
    .unwrap();
    let result = session.context().rebuild().await.expect("end hooks ran");
    assert!(!result.is_success());
    assert!(!result.errors.is_empty());

    assert_eq!(fs::read_to_string(&shell_path).unwrap(), before);
    session.dispose().await.expect("dispose");
}

#[tokio::test(flavor = "multi_thread")]
async fn stylesheets_are_linked_and_scoped() {
    let project = create_project();
    let src = project.path().join("src");
    fs::write(src.join("styles.css"), "body { margin: 0; }\n").expect("write styles");
    fs::write(src.join("card.module.css"), ".card { color: red; }\n").expect("write module");
    fs::write(
        src.join("main.ts"),
        r#"
import './styles.css';
import classes from './card.module.css';

document.body.className = classes.card;
"#,
    )
    .expect("write main");

    let session = hearth::serve(&RolldownEngine::new(), "src/main.ts", options(&project))
        .await
        .expect("serve");

    let dist = project.path().join("dist");
    let css = fs::read_to_string(dist.join("main.css")).expect("stylesheet written");
    assert!(css.contains("margin"));
    assert!(css.contains("_card"));
    assert!(css.contains("color: red"));
    assert!(!css.contains(".card {"));

    let bundle = fs::read_to_string(dist.join("main.js")).expect("bundle written");
    assert!(bundle.contains("_card"));

    let shell = fs::read_to_string(dist.join("index.html")).expect("shell written");
    let link = shell
        .find(r#"<link rel="stylesheet" href="main.css">"#)
        .expect("stylesheet linked");
    let script = shell
        .find(r#"<script type="module" src="main.js"></script>"#)
        .expect("script tag");
    assert!(link < script);

    session.dispose().await.expect("dispose");
}
