//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p depot-api --test upload_test`.

pub mod fixtures;

use axum_test::TestServer;
use depot_api::constants;
use depot_api::setup::routes;
use depot_api::state::AppState;
use depot_core::Config;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Upload cap used by every test app, for both endpoints.
pub const TEST_MAX_BYTES: u64 = 1024 * 1024;

/// API path prefix for tests (e.g. `/api/v0`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server plus the storage directory it writes into.
pub struct TestApp {
    pub server: TestServer,
    pub storage_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn storage_path(&self) -> &Path {
        self.storage_dir.path()
    }

    /// Names of every file currently in the storage directory.
    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.storage_path())
            .expect("Failed to read storage dir")
            .map(|entry| {
                entry
                    .expect("Failed to read dir entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        names
    }
}

pub fn test_config(storage_dir: &Path) -> Config {
    Config {
        server_port: 0,
        environment: "test".to_string(),
        storage_dir: storage_dir.to_path_buf(),
        image_max_bytes: TEST_MAX_BYTES,
        file_max_bytes: TEST_MAX_BYTES,
        http_concurrency_limit: 64,
        cors_origins: vec!["*".to_string()],
    }
}

pub fn setup_test_app() -> TestApp {
    let storage_dir = TempDir::new().expect("Failed to create temp storage dir");
    let config = test_config(storage_dir.path());

    let state = Arc::new(AppState::new(config.clone()));
    let app = routes::setup_routes(&config, state).expect("Failed to build routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        storage_dir,
    }
}
