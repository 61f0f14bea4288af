//! Shared E2E test helpers for `regcap` binary tests.

use assert_cmd::cargo::cargo_bin_cmd;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Default timeout for CLI tests.
pub const TIMEOUT_BASIC: Duration = Duration::from_secs(10);

/// Variables that would leak host configuration into a test run.
const REGCAP_ENV_VARS: &[&str] = &[
    "REGCAP_HOST_NAMES",
    "REGCAP_DEFAULT_TIMEOUT",
    "REGCAP_DEFAULT_REGION_THREAT_LEVEL",
    "REGCAP_STORE_PATH",
    "RUST_LOG",
];

/// Grid configuration shared by the E2E tests.
pub const GRID_TOML: &str = r#"
[Configuration]
HostNames = "http://a,http://b"

[RegionPermissions]
Threat_Level_Low = "GetFolder GetItem"
Threat_Level_High = "GetFolder GetItem DeleteFolder"
AddItem = "High"

[[Modules]]
Name = "inventory"
Port = 8003

[[Modules]]
Name = "asset"
Port = 8004

[[Regions]]
Handle = 1000
Name = "Sandbox"
ThreatLevel = "Low"
"#;

/// Isolated home, config file and store for one test.
pub struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    pub fn new(config: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir for sandbox");
        std::fs::write(dir.path().join("grid.toml"), config).expect("write grid config");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn store_path(&self) -> PathBuf {
        self.dir.path().join("store")
    }

    /// Builds a `regcap` command bound to this sandbox's config and store.
    pub fn cmd(&self) -> assert_cmd::Command {
        self.cmd_with_config(&self.path().join("grid.toml"))
    }

    /// Builds a `regcap` command using `config` and this sandbox's store.
    pub fn cmd_with_config(&self, config: &Path) -> assert_cmd::Command {
        let mut cmd: assert_cmd::Command = cargo_bin_cmd!("regcap");
        cmd.timeout(TIMEOUT_BASIC);
        for var in REGCAP_ENV_VARS {
            cmd.env_remove(var);
        }
        // Keeps ~/.regcap/config.toml of the host out of the test.
        cmd.env("HOME", self.path());
        cmd.args([
            "--config",
            config.to_str().expect("valid utf8"),
            "--store",
            self.store_path().to_str().expect("valid utf8"),
        ]);
        cmd
    }
}
