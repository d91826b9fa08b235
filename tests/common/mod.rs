//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which writes fake `identify`/`convert` scripts
//! into a temp directory and points a [`Config`] at them. The
//! [`TestHarness::start`] method runs Axum on a random port for HTTP-level
//! testing.
#![cfg(unix)]
#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use firesize::server::{create_router, AppContext};
use firesize_core::config::{CleanupPolicy, Config};
use firesize_magick::ToolRegistry;
use tempfile::TempDir;

/// A `convert` body that logs its arguments and copies the first argument
/// to the last.
pub fn copying_convert(calls: &Path) -> String {
    format!(
        "printf '%s\\n' \"$*\" >> '{}'\n\
         first=\"$1\"\nfor last; do :; done\ncp \"$first\" \"$last\"",
        calls.display()
    )
}

/// Fake tools plus a config pointing at them and at a private temp root.
pub struct TestHarness {
    pub dir: TempDir,
    pub config: Config,
    pub calls: PathBuf,
}

impl TestHarness {
    /// `identify` reports `frames`; `convert` copies its input.
    pub fn new(frames: u32) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let calls = dir.path().join("convert.calls");
        std::fs::write(&calls, b"").expect("failed to create calls log");

        let mut harness = Self {
            config: Config::default(),
            calls,
            dir,
        };
        harness.set_identify(&format!("printf '{frames}\\n'"));
        let body = copying_convert(&harness.calls);
        harness.set_convert(&body);

        let temp_root = harness.dir.path().join("work");
        std::fs::create_dir(&temp_root).expect("failed to create temp root");
        harness.config.pipeline.temp_root = Some(temp_root);
        harness.config.pipeline.cleanup = CleanupPolicy::Always;
        harness
    }

    /// Replace the `identify` script body.
    pub fn set_identify(&mut self, body: &str) {
        self.config.tools.identify_path = Some(self.write_script("identify", body));
    }

    /// Replace the `convert` script body.
    pub fn set_convert(&mut self, body: &str) {
        self.config.tools.convert_path = Some(self.write_script("convert", body));
    }

    pub fn with_cleanup(mut self, cleanup: CleanupPolicy) -> Self {
        self.config.pipeline.cleanup = cleanup;
        self
    }

    pub fn with_transform_timeout(mut self, timeout: Duration) -> Self {
        self.config.pipeline.transform_timeout = timeout;
        self
    }

    /// Workspace directories currently under the temp root.
    pub fn workspaces(&self) -> Vec<PathBuf> {
        let root = self.config.pipeline.temp_root.as_ref().expect("temp root set");
        std::fs::read_dir(root)
            .expect("failed to read temp root")
            .map(|e| e.expect("bad dir entry").path())
            .collect()
    }

    /// Argument lines logged by the copying `convert`.
    pub fn convert_calls(&self) -> Vec<String> {
        std::fs::read_to_string(&self.calls)
            .expect("failed to read calls log")
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Start an Axum server on a random port and return its address.
    pub async fn start(&self) -> SocketAddr {
        let tools = ToolRegistry::discover(&self.config.tools);
        let app = create_router(AppContext::new(&self.config, tools));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        addr
    }

    fn write_script(&self, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.dir.path().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("failed to write script");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("failed to chmod script");
        path
    }
}
