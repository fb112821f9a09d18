//! Integration tests for the full download pipeline.
//!
//! These tests serve a stylesheet and its fonts from a mock HTTP server and
//! check what ends up on disk.

use std::path::Path;

use fontgrab_core::download::DownloadError;
use fontgrab_core::{AssetOutcome, Config, Error, FontDownloader, FontInput, WriteOutcome};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FONT_BYTES: &[u8] = b"wOF2 fake font payload";

fn config(output_dir: &Path) -> Config {
    Config {
        output_dir: output_dir.to_path_buf(),
        retries: 0,
        timeout_secs: 5,
        ..Config::default()
    }
}

async fn mount_css(server: &MockServer, css: String) {
    Mock::given(method("GET"))
        .and(path("/css"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/css; charset=utf-8")
                .set_body_string(css),
        )
        .mount(server)
        .await;
}

async fn mount_font(server: &MockServer, font_path: &str, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(font_path))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "font/woff2")
                .set_body_bytes(FONT_BYTES.to_vec()),
        )
        .expect(expected_hits)
        .mount(server)
        .await;
}

async fn run(config: Config, server: &MockServer) -> Result<fontgrab_core::DownloadReport, Error> {
    let downloader = FontDownloader::new(config).expect("client should build");
    downloader
        .download(&FontInput::Url(format!("{}/css", server.uri())))
        .await
}

fn example_css(server: &MockServer) -> String {
    format!(
        "/* Comment */@font-face{{font-family:'Test';font-weight:400;src:url({}/f.woff2);}}",
        server.uri()
    )
}

#[tokio::test]
async fn test_pipeline_saves_font_and_rewrites_css() {
    let server = MockServer::start().await;
    mount_css(&server, example_css(&server)).await;
    mount_font(&server, "/f.woff2", 1).await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let out = temp_dir.path().join("fonts");

    let report = run(config(&out), &server).await.expect("run should succeed");

    let font = std::fs::read(out.join("Test-400-Comment1.woff2")).expect("font file should exist");
    assert_eq!(font, FONT_BYTES);

    let css = std::fs::read_to_string(out.join("fonts.css")).expect("css should exist");
    assert_eq!(
        css,
        "/* Comment */@font-face{font-family:'Test';font-weight:400;src:url('./Test-400-Comment1.woff2');}"
    );
    assert_eq!(report.css, css);
    assert_eq!(report.css_outcome, WriteOutcome::Written);
    assert_eq!(report.fonts.len(), 1);
    assert_eq!(report.files_written(), 1);
}

#[tokio::test]
async fn test_pipeline_base64_inlines_without_font_files() {
    let server = MockServer::start().await;
    mount_css(&server, example_css(&server)).await;
    mount_font(&server, "/f.woff2", 1).await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let out = temp_dir.path().join("fonts");

    let report = run(
        Config {
            base64: true,
            ..config(&out)
        },
        &server,
    )
    .await
    .expect("run should succeed");

    let css = std::fs::read_to_string(out.join("fonts.css")).expect("css should exist");
    assert!(
        css.contains("url('data:font/woff2;base64,d09GMiBmYWtlIGZvbnQgcGF5bG9hZA==')"),
        "Expected data URI in: {css}"
    );
    let files: Vec<_> = std::fs::read_dir(&out)
        .expect("output dir should exist")
        .map(|e| e.expect("dir entry").file_name())
        .collect();
    assert_eq!(files, vec!["fonts.css"]);
    assert!(matches!(
        report.fonts[0].outcome,
        AssetOutcome::Inlined { ref mime, bytes } if mime == "font/woff2" && bytes == FONT_BYTES.len()
    ));
}

#[tokio::test]
async fn test_pipeline_base64_allows_shared_names_for_different_fonts() {
    let server = MockServer::start().await;
    let css = format!(
        "@font-face{{font-family:R;font-weight:400;src:url({uri}/a.woff2)}}\
         @font-face{{font-family:R;font-weight:400;src:url({uri}/b.woff2)}}",
        uri = server.uri()
    );
    mount_css(&server, css).await;
    mount_font(&server, "/a.woff2", 1).await;
    Mock::given(method("GET"))
        .and(path("/b.woff2"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "font/woff2")
                .set_body_bytes(b"abc".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let report = run(
        Config {
            base64: true,
            template: "{_family}-{weight}.{ext}".to_string(),
            ..config(temp_dir.path())
        },
        &server,
    )
    .await
    .expect("run should succeed");

    assert_eq!(report.fonts.len(), 2);
    assert!(report.css.contains("url('data:font/woff2;base64,d09GMiBmYWtlIGZvbnQgcGF5bG9hZA==')"));
    assert!(report.css.contains("url('data:font/woff2;base64,YWJj')"));
    assert!(!temp_dir.path().join("R-400.woff2").exists());
}

#[tokio::test]
async fn test_pipeline_stylesheet_error_status_aborts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/css"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let out = temp_dir.path().join("fonts");

    let error = run(config(&out), &server).await.unwrap_err();

    match error {
        Error::Download(DownloadError::HttpStatus { status, .. }) => assert_eq!(status, 400),
        other => panic!("Expected HttpStatus error, got: {other:?}"),
    }
    assert!(!out.exists(), "nothing should be written");
}

#[tokio::test]
async fn test_pipeline_font_failure_aborts_before_writing() {
    let server = MockServer::start().await;
    let css = format!(
        "@font-face{{font-family:A;src:url({uri}/ok.woff2)}}@font-face{{font-family:B;src:url({uri}/gone.woff2)}}",
        uri = server.uri()
    );
    mount_css(&server, css).await;
    Mock::given(method("GET"))
        .and(path("/ok.woff2"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(FONT_BYTES.to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone.woff2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let out = temp_dir.path().join("fonts");

    let error = run(config(&out), &server).await.unwrap_err();

    assert!(
        matches!(error, Error::Download(DownloadError::HttpStatus { status: 404, .. })),
        "Expected 404, got: {error:?}"
    );
    assert!(!out.exists(), "no file should be written on failure");
}

#[tokio::test]
async fn test_pipeline_simulate_writes_nothing() {
    let server = MockServer::start().await;
    mount_css(&server, example_css(&server)).await;
    mount_font(&server, "/f.woff2", 1).await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let out = temp_dir.path().join("fonts");

    let report = run(
        Config {
            simulate: true,
            verbose: true,
            ..config(&out)
        },
        &server,
    )
    .await
    .expect("run should succeed");

    assert!(!out.exists(), "simulate must not create the output dir");
    assert_eq!(report.css_outcome, WriteOutcome::Simulated);
    assert_eq!(report.fonts[0].outcome, AssetOutcome::File(WriteOutcome::Simulated));
    assert!(report.css.contains("url('./Test-400-Comment1.woff2')"));
}

#[tokio::test]
async fn test_pipeline_simulate_still_fails_on_missing_font() {
    let server = MockServer::start().await;
    let css = format!(
        "@font-face{{font-family:A;src:url({}/gone.woff2)}}",
        server.uri()
    );
    mount_css(&server, css).await;
    Mock::given(method("GET"))
        .and(path("/gone.woff2"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let out = temp_dir.path().join("fonts");

    let error = run(
        Config {
            simulate: true,
            ..config(&out)
        },
        &server,
    )
    .await
    .unwrap_err();

    assert!(
        matches!(error, Error::Download(DownloadError::HttpStatus { status: 404, .. })),
        "Expected 404, got: {error:?}"
    );
    assert!(!out.exists());
}

#[tokio::test]
async fn test_pipeline_existing_files_left_untouched_without_overwrite() {
    let server = MockServer::start().await;
    mount_css(&server, example_css(&server)).await;
    mount_font(&server, "/f.woff2", 0).await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let out = temp_dir.path();
    std::fs::write(out.join("Test-400-Comment1.woff2"), "old font").expect("seed font");
    std::fs::write(out.join("fonts.css"), "old css").expect("seed css");

    let report = run(config(out), &server).await.expect("run should succeed");

    assert_eq!(
        std::fs::read_to_string(out.join("Test-400-Comment1.woff2")).expect("font"),
        "old font"
    );
    assert_eq!(std::fs::read_to_string(out.join("fonts.css")).expect("css"), "old css");
    assert_eq!(report.css_outcome, WriteOutcome::SkippedExisting);
    assert_eq!(
        report.fonts[0].outcome,
        AssetOutcome::File(WriteOutcome::SkippedExisting)
    );
}

#[tokio::test]
async fn test_pipeline_overwrite_replaces_existing_files() {
    let server = MockServer::start().await;
    mount_css(&server, example_css(&server)).await;
    mount_font(&server, "/f.woff2", 1).await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let out = temp_dir.path();
    std::fs::write(out.join("Test-400-Comment1.woff2"), "old font").expect("seed font");

    run(
        Config {
            overwrite: true,
            ..config(out)
        },
        &server,
    )
    .await
    .expect("run should succeed");

    assert_eq!(
        std::fs::read(out.join("Test-400-Comment1.woff2")).expect("font"),
        FONT_BYTES
    );
}

#[tokio::test]
async fn test_pipeline_resolves_relative_font_urls() {
    let server = MockServer::start().await;
    mount_css(
        &server,
        "@font-face{font-family:'Open Sans';font-weight:300;src:url('/static/os.woff')}".to_string(),
    )
    .await;
    mount_font(&server, "/static/os.woff", 1).await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let report = run(
        Config {
            template: "{_family}-{weight}.{ext}".to_string(),
            path_prefix: "/assets/".to_string(),
            ..config(temp_dir.path())
        },
        &server,
    )
    .await
    .expect("run should succeed");

    assert!(temp_dir.path().join("Open_Sans-300.woff").exists());
    assert_eq!(
        report.css,
        "@font-face{font-family:'Open Sans';font-weight:300;src:url('/assets/Open_Sans-300.woff')}"
    );
}

#[tokio::test]
async fn test_pipeline_duplicate_names_without_counter_fail() {
    let server = MockServer::start().await;
    let css = format!(
        "@font-face{{font-family:Roboto;font-weight:400;src:url({uri}/a.woff2)}}\
         @font-face{{font-family:Roboto;font-weight:400;src:url({uri}/b.woff2)}}",
        uri = server.uri()
    );
    mount_css(&server, css).await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let out = temp_dir.path().join("fonts");

    let error = run(
        Config {
            template: "{_family}-{weight}.{ext}".to_string(),
            ..config(&out)
        },
        &server,
    )
    .await
    .unwrap_err();

    assert!(matches!(error, Error::DuplicateFilename { .. }));
    assert!(error.to_string().contains("{i}"));
    assert!(!out.exists());
}

#[tokio::test]
async fn test_pipeline_reused_url_downloads_once_and_rewrites_each_reference() {
    let server = MockServer::start().await;
    let css = format!(
        "/* latin */@font-face{{font-family:X;src:url({uri}/f.woff2)}}\
         /* latin-ext */@font-face{{font-family:X;src:url({uri}/f.woff2)}}",
        uri = server.uri()
    );
    mount_css(&server, css).await;
    mount_font(&server, "/f.woff2", 1).await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let report = run(
        Config {
            template: "{filename}.{ext}".to_string(),
            ..config(temp_dir.path())
        },
        &server,
    )
    .await
    .expect("run should succeed");

    assert_eq!(report.css.matches("url('./f.woff2')").count(), 2);
    assert_eq!(report.fonts.len(), 1);
    assert_eq!(report.references(), 2);
}

#[tokio::test]
async fn test_pipeline_without_fonts_still_saves_css() {
    let server = MockServer::start().await;
    mount_css(&server, "body { color: red; }".to_string()).await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let report = run(config(temp_dir.path()), &server)
        .await
        .expect("run should succeed");

    assert!(report.fonts.is_empty());
    assert_eq!(
        std::fs::read_to_string(temp_dir.path().join("fonts.css")).expect("css"),
        "body { color: red; }"
    );
}

#[tokio::test]
async fn test_pipeline_rejects_unsupported_protocol_before_io() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let out = temp_dir.path().join("fonts");
    let downloader = FontDownloader::new(config(&out)).expect("client should build");

    let error = downloader
        .download(&FontInput::Url("ftp://fonts.example.com/css".to_string()))
        .await
        .unwrap_err();

    assert!(matches!(error, Error::UnsupportedProtocol { .. }));
    assert!(!out.exists());
}
