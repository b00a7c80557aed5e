//! Integration tests for aspnet-layer

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn aspnet_layer() -> Command {
        let mut cmd = cargo_bin_cmd!("aspnet-layer");
        cmd.env_remove("BP_DOTNET_FRAMEWORK_VERSION")
            .env_remove("CNB_LAYERS_DIR")
            .env_remove("CNB_BUILDPACK_DIR")
            .env_remove("CNB_PLATFORM_DIR")
            .env_remove("CNB_BP_PLAN_PATH")
            .env_remove("CNB_STACK_ID")
            .env("ASPNET_LAYER_CONFIG", "/nonexistent/aspnet-layer.toml");
        cmd
    }

    #[test]
    fn help_displays() {
        aspnet_layer()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("ASP.NET Core framework layer builder"));
    }

    #[test]
    fn version_displays() {
        aspnet_layer()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("aspnet-layer"));
    }

    #[test]
    fn detect_without_buildpack_yml() {
        let app = TempDir::new().unwrap();
        aspnet_layer()
            .args(["detect", "--working-dir"])
            .arg(app.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("name = \"dotnet-aspnetcore\""))
            .stdout(predicate::str::contains("requires").not());
    }

    #[test]
    fn detect_with_buildpack_yml() {
        let app = TempDir::new().unwrap();
        std::fs::write(
            app.path().join("buildpack.yml"),
            "dotnet-framework:\n  version: 6.0.5\n",
        )
        .unwrap();

        aspnet_layer()
            .args(["detect", "--working-dir"])
            .arg(app.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("version = \"6.0.5\""))
            .stdout(predicate::str::contains("version-source = \"buildpack.yml\""));
    }

    fn build_without_catalog(temp: &TempDir) -> Command {
        let mut cmd = aspnet_layer();
        cmd.args(["build", "--cnb"])
            .arg(temp.path())
            .arg("--layers")
            .arg(temp.path().join("layers"))
            .arg("--working-dir")
            .arg(temp.path());
        cmd
    }

    #[test]
    fn missing_catalog_fails_when_version_requested() {
        let temp = TempDir::new().unwrap();
        build_without_catalog(&temp)
            .env("BP_DOTNET_FRAMEWORK_VERSION", "6.0.*")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"))
            .stderr(predicate::str::contains("buildpack.toml"));
    }

    #[test]
    fn missing_catalog_skips_when_nothing_requested() {
        let temp = TempDir::new().unwrap();
        build_without_catalog(&temp)
            .args(["--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"skipped\": true"));
    }
}

mod build_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use predicates::prelude::*;
    use sha2::{Digest, Sha256};
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const STACK: &str = "io.buildpacks.stacks.jammy";

    struct Workspace {
        temp: TempDir,
    }

    impl Workspace {
        fn new() -> Self {
            let ws = Self {
                temp: TempDir::new().unwrap(),
            };
            for dir in ["app", "cnb", "layers"] {
                std::fs::create_dir_all(ws.path(dir)).unwrap();
            }
            ws
        }

        fn path(&self, name: &str) -> PathBuf {
            self.temp.path().join(name)
        }

        /// Write a framework archive and a catalog pointing at it
        fn catalog(&self, version: &str) {
            let archive = self.path(&format!("aspnetcore-{}.tgz", version));
            let bytes = framework_archive(version);
            std::fs::write(&archive, &bytes).unwrap();

            let catalog = format!(
                r#"
[buildpack]
id = "paketo-buildpacks/dotnet-core-aspnet"
name = "Dotnet Core ASPNet"
version = "1.0.0"

[metadata.default-versions]
dotnet-aspnetcore = "6.0.*"

[[metadata.dependencies]]
id = "dotnet-aspnetcore"
name = "ASP.NET Core"
version = "{version}"
sha256 = "{sha}"
stacks = ["{STACK}"]
uri = "file://{uri}"
licenses = ["MIT"]
"#,
                version = version,
                sha = hex::encode(Sha256::digest(&bytes)),
                uri = archive.display(),
            );
            std::fs::write(self.path("cnb").join("buildpack.toml"), catalog).unwrap();
        }

        fn build(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("aspnet-layer");
            cmd.env_remove("BP_DOTNET_FRAMEWORK_VERSION")
                .env_remove("CNB_PLATFORM_DIR")
                .env_remove("CNB_BP_PLAN_PATH")
                .env("ASPNET_LAYER_CONFIG", self.path("missing-config.toml"))
                .arg("build")
                .arg("--working-dir")
                .arg(self.path("app"))
                .arg("--cnb")
                .arg(self.path("cnb"))
                .arg("--layers")
                .arg(self.path("layers"))
                .args(["--stack", STACK]);
            cmd
        }

        fn plan(&self, content: &str) -> PathBuf {
            let path = self.path("plan.toml");
            std::fs::write(&path, content).unwrap();
            path
        }
    }

    fn framework_archive(version: &str) -> Vec<u8> {
        let content = version.as_bytes();
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);

        let mut builder = tar::Builder::new(Vec::new());
        builder
            .append_data(
                &mut header,
                format!("shared/Microsoft.AspNetCore.App/{}/version.txt", version),
                content,
            )
            .unwrap();
        let tar = builder.into_inner().unwrap();

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&tar).unwrap();
        encoder.finish().unwrap()
    }

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    const LAUNCH_PLAN: &str = r#"
[[entries]]
name = "dotnet-aspnetcore"
version-source = "app.csproj"
version = "6.0.*"
launch = true
"#;

    #[test]
    fn installs_then_reuses_layer() {
        let ws = Workspace::new();
        ws.catalog("6.0.5");
        let plan = ws.plan(LAUNCH_PLAN);

        ws.build()
            .arg("--plan")
            .arg(&plan)
            .assert()
            .success()
            .stdout(predicate::str::contains("Candidate version sources (in priority order):"))
            .stdout(predicate::str::contains("Selected ASP.NET Core version (using app.csproj): 6.0.5"))
            .stdout(predicate::str::contains("Executing build process"));

        let layer = ws.path("layers/dotnet-core-aspnet");
        assert_eq!(
            read(&layer.join("shared/Microsoft.AspNetCore.App/6.0.5/version.txt")),
            "6.0.5"
        );
        let state = read(&ws.path("layers/dotnet-core-aspnet.toml"));
        assert!(state.contains("launch = true"));
        assert!(state.contains("dependency-sha"));
        assert!(read(&ws.path("layers/launch.toml")).contains("[[bom]]"));
        assert!(!ws.path("layers/build.toml").exists());

        #[cfg(unix)]
        assert_eq!(
            std::fs::read_link(ws.path("app/.dotnet_root/shared/Microsoft.AspNetCore.App")).unwrap(),
            layer.join("shared/Microsoft.AspNetCore.App")
        );

        ws.build()
            .arg("--plan")
            .arg(&plan)
            .assert()
            .success()
            .stdout(predicate::str::contains("Reusing cached layer"))
            .stdout(predicate::str::contains("Executing build process").not());
    }

    #[test]
    fn new_catalog_entry_reinstalls() {
        let ws = Workspace::new();
        ws.catalog("6.0.5");
        let plan = ws.plan(LAUNCH_PLAN);
        ws.build().arg("--plan").arg(&plan).assert().success();

        ws.catalog("6.0.8");
        ws.build()
            .arg("--plan")
            .arg(&plan)
            .assert()
            .success()
            .stdout(predicate::str::contains("Executing build process"))
            .stdout(predicate::str::contains("Installing Dotnet Core ASPNet 6.0.8"));

        let layer = ws.path("layers/dotnet-core-aspnet/shared/Microsoft.AspNetCore.App");
        assert!(layer.join("6.0.8").is_dir());
        assert!(!layer.join("6.0.5").exists());
    }

    #[test]
    fn runtimeconfig_drives_version() {
        let ws = Workspace::new();
        ws.catalog("6.0.5");
        std::fs::write(
            ws.path("app").join("app.runtimeconfig.json"),
            r#"{
  // generated by the SDK
  "runtimeOptions": {
    "framework": { "name": "Microsoft.AspNetCore.App", "version": "6.0.5" }
  }
}"#,
        )
        .unwrap();

        ws.build()
            .assert()
            .success()
            .stdout(predicate::str::contains("runtimeconfig.json ASP.NET"))
            .stdout(predicate::str::contains("Selected ASP.NET Core version (using runtimeconfig.json ASP.NET): 6.0.5"));
    }

    #[test]
    fn environment_variable_wins() {
        let ws = Workspace::new();
        ws.catalog("6.0.5");
        let plan = ws.plan(LAUNCH_PLAN);

        ws.build()
            .env("BP_DOTNET_FRAMEWORK_VERSION", "6.0.5")
            .arg("--plan")
            .arg(&plan)
            .assert()
            .success()
            .stdout(predicate::str::contains("(using BP_DOTNET_FRAMEWORK_VERSION): 6.0.5"));
    }

    #[test]
    fn buildpack_yml_version_warns() {
        let ws = Workspace::new();
        ws.catalog("6.0.5");
        std::fs::write(
            ws.path("app").join("buildpack.yml"),
            "dotnet-framework:\n  version: 6.0.5\n",
        )
        .unwrap();

        ws.build()
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "WARNING: Setting the .NET Framework version through buildpack.yml will be deprecated soon in Dotnet Core ASPNet Buildpack v2.0.0.",
            ))
            .stdout(predicate::str::contains("$BP_DOTNET_FRAMEWORK_VERSION"))
            .stdout(predicate::str::contains("(using buildpack.yml): 6.0.5"));
    }

    #[test]
    fn unsatisfiable_version_fails_with_hint() {
        let ws = Workspace::new();
        ws.catalog("6.0.5");

        ws.build()
            .env("BP_DOTNET_FRAMEWORK_VERSION", "9.0.*")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Supported versions are: [6.0.5]"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn duplicate_framework_fails() {
        let ws = Workspace::new();
        ws.catalog("6.0.5");
        std::fs::write(
            ws.path("app").join("app.runtimeconfig.json"),
            r#"{ "runtimeOptions": {
  "framework": { "name": "Microsoft.AspNetCore.App", "version": "6.0.5" },
  "frameworks": [ { "name": "Microsoft.AspNetCore.App", "version": "6.0.5" } ]
} }"#,
        )
        .unwrap();

        ws.build()
            .assert()
            .failure()
            .stderr(predicate::str::contains(
                "multiple 'Microsoft.AspNetCore.App' frameworks specified",
            ));
    }

    #[test]
    fn nothing_requested_skips() {
        let ws = Workspace::new();
        ws.catalog("6.0.5");

        ws.build()
            .args(["--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"skipped\": true"));

        assert!(!ws.path("layers/dotnet-core-aspnet.toml").exists());
    }
}
