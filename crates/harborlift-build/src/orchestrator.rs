//! リモートビルド & プッシュ
//!
//! パイプライン:
//!
//! ```text
//! pack -> upload -> extract -> preflight -> login -> build -> push -> cleanup
//! ```
//!
//! push 以外のステップは失敗した時点で中断します。push の失敗は記録するだけで、
//! その後の cleanup は必ず実行されます。リモートに作業領域ができた後は、
//! どの経路で終わっても cleanup がちょうど1回走ります。

use crate::commands;
use crate::job::{BuildJob, DEFAULT_SCRATCH_ROOT, JobWorkspace};
use crate::packer;
use harborlift_config::RegistrySettings;
use harborlift_image::{Registries, Rewriter};
use harborlift_remote::{ProgressFn, RemoteHost};
use std::fmt;
use std::path::Path;

/// パイプラインのステップ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    Pack,
    Upload,
    Extract,
    Preflight,
    Login,
    Build,
    Push,
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildStep::Pack => "pack",
            BuildStep::Upload => "upload",
            BuildStep::Extract => "extract",
            BuildStep::Preflight => "preflight",
            BuildStep::Login => "login",
            BuildStep::Build => "build",
            BuildStep::Push => "push",
        };
        f.write_str(name)
    }
}

/// ビルド & プッシュの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    pub job_id: String,
    /// プライベートレジストリ上の完全なイメージ名
    pub image: String,
    /// build と push の両方が成功した場合のみ true
    pub success: bool,
    pub failed_step: Option<BuildStep>,
}

/// ビルドホスト上でプロジェクトをビルドし、プライベートレジストリへ公開する
#[derive(Debug, Clone)]
pub struct BuildOrchestrator {
    registry: RegistrySettings,
    rewriter: Rewriter,
}

impl BuildOrchestrator {
    pub fn new(registry: RegistrySettings) -> Self {
        let rewriter = Rewriter::new(Registries::new(
            registry.cache_registry.clone(),
            registry.private_registry.clone(),
        ));
        Self { registry, rewriter }
    }

    /// 新しいジョブでパイプラインを実行
    pub fn run<H: RemoteHost + ?Sized>(
        &self,
        host: &mut H,
        project_dir: &Path,
        image_tag: &str,
        on_progress: Option<&mut ProgressFn<'_>>,
    ) -> BuildOutcome {
        let job = BuildJob::new(DEFAULT_SCRATCH_ROOT);
        self.run_job(host, &job, project_dir, image_tag, on_progress)
    }

    /// 指定したジョブでパイプラインを実行
    pub fn run_job<H: RemoteHost + ?Sized>(
        &self,
        host: &mut H,
        job: &BuildJob,
        project_dir: &Path,
        image_tag: &str,
        on_progress: Option<&mut ProgressFn<'_>>,
    ) -> BuildOutcome {
        let image = self.rewriter.private_image(image_tag);
        host.log(&format!(
            "--- Remote build of {} -> {} (job {}) ---",
            project_dir.display(),
            image,
            job.id
        ));

        let failed_step = self.pipeline(host, job, project_dir, &image, on_progress);
        let success = failed_step.is_none();

        match failed_step {
            None => host.log(&format!("--- Remote build and push of {} succeeded ---", image)),
            Some(step) => host.log(&format!(
                "--- Remote build failed at the {} step; see the log above ---",
                step
            )),
        }

        BuildOutcome {
            job_id: job.id.clone(),
            image,
            success,
            failed_step,
        }
    }

    fn pipeline<H: RemoteHost + ?Sized>(
        &self,
        host: &mut H,
        job: &BuildJob,
        project_dir: &Path,
        image: &str,
        on_progress: Option<&mut ProgressFn<'_>>,
    ) -> Option<BuildStep> {
        // 1. pack
        let project = match packer::resolve_project(project_dir) {
            Ok(project) => project,
            Err(e) => {
                host.log(&e.user_message());
                return Some(BuildStep::Pack);
            }
        };
        host.log(&format!(
            "--> Packing project '{}' into '{}'...",
            project.display(),
            job.local_archive_path.display()
        ));
        match packer::pack_project(&project, &job.local_archive_path) {
            Ok(size) => host.log(&format!("--> Packed ({} bytes).", size)),
            Err(e) => {
                host.log(&e.user_message());
                remove_local_archive(host, job);
                return Some(BuildStep::Pack);
            }
        }

        // 2. upload（成否に関わらずローカルのアーカイブは削除）
        let uploaded = host.upload(&job.local_archive_path, &job.remote_archive_path, on_progress);
        remove_local_archive(host, job);
        if let Err(e) = uploaded {
            host.log(&format!("--> Upload failed ({}), aborting build.", e));
            return Some(BuildStep::Upload);
        }

        // 3-7. ここからはリモートに作業領域がある
        let folder = packer::project_folder_name(&project);
        let mut workspace = JobWorkspace::new(host, job);
        let failed = self.remote_steps(&mut workspace, job, &folder, image);
        workspace.release();
        failed
    }

    fn remote_steps<H: RemoteHost + ?Sized>(
        &self,
        ws: &mut JobWorkspace<'_, H>,
        job: &BuildJob,
        folder: &str,
        image: &str,
    ) -> Option<BuildStep> {
        let registry = self.registry.private_registry.as_str();

        // 3. extract
        let extract = commands::extract_archive(&job.remote_project_dir, &job.remote_archive_path);
        if ws.run(&extract) != 0 {
            ws.log("--> Remote extraction failed, aborting build.");
            return Some(BuildStep::Extract);
        }

        // 4. preflight
        ws.log("--> [preflight] Checking registry connectivity from the build host...");
        let probe = commands::registry_probe(registry);
        ws.log(&format!("--> [preflight] Probe: {}", probe));
        if ws.run(&probe) != 0 {
            for line in preflight_diagnostic(registry) {
                ws.log(&line);
            }
            return Some(BuildStep::Preflight);
        }
        ws.log("--> [preflight] Registry is reachable.");

        // 5. login
        match self.registry.credentials() {
            None => ws.log(
                "--> Warning: registry username/password not configured, skipping remote login.",
            ),
            Some((user, password)) => {
                ws.track_login(registry);
                let login = commands::registry_login(registry, user);
                if ws.run_with_stdin(&login, password.as_bytes()) != 0 {
                    ws.log("--> Remote docker login failed, aborting build.");
                    return Some(BuildStep::Login);
                }
            }
        }

        // 6. build
        let context = job.build_context(folder);
        ws.log(&format!("--> [diagnostic] Project folder: {}", folder));
        ws.log(&format!("--> [diagnostic] Remote build context: {}", context));
        if ws.run(&commands::build_image(image, &context)) != 0 {
            ws.log("--> Remote docker build failed, aborting build.");
            return Some(BuildStep::Build);
        }
        ws.track_image(image, registry);

        // 7. push（失敗しても cleanup は続行）
        if ws.run(&commands::push_image(image)) != 0 {
            ws.log("--> Remote docker push failed.");
            return Some(BuildStep::Push);
        }
        ws.log(&format!("--> Image '{}' pushed.", image));

        None
    }
}

fn remove_local_archive<H: RemoteHost + ?Sized>(host: &mut H, job: &BuildJob) {
    let path = &job.local_archive_path;
    if !path.exists() {
        return;
    }
    match std::fs::remove_file(path) {
        Ok(()) => host.log(&format!("--> Removed local archive '{}'.", path.display())),
        Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
    }
}

/// プリフライト失敗時の診断メッセージ
fn preflight_diagnostic(registry: &str) -> Vec<String> {
    let url = commands::registry_api_url(registry);
    vec![
        "!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!".to_string(),
        "!!! Preflight failed: the build host cannot reach the registry !!!".to_string(),
        "!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!".to_string(),
        format!("Could not connect to the registry at '{}'.", url),
        "This is the usual root cause of docker pulls retrying forever.".to_string(),
        "Run this on the build host to investigate:".to_string(),
        format!("    curl -v {}", url),
        "Common causes:".to_string(),
        "  1. Registry or reverse proxy container not running: check `docker ps -a`.".to_string(),
        format!(
            "  2. DNS: make sure the name resolves, e.g. `ping {}`.",
            registry
        ),
        "  3. Firewall: check that port 443 is allowed (ufw, security groups).".to_string(),
        "  4. Container networking: if the registry runs in a Docker network, make sure the Docker daemon can reach it.".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedHost;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::{TempDir, tempdir};

    struct Fixture {
        _dir: TempDir,
        project: PathBuf,
        job: BuildJob,
    }

    fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let project = dir.path().join("shop-api");
        fs::create_dir(&project).unwrap();
        fs::write(project.join("Dockerfile"), "FROM python:3.12\n").unwrap();
        fs::write(project.join("app.py"), "print('ok')\n").unwrap();
        let job = BuildJob::with_id("feedbeef", "/tmp", dir.path().to_path_buf());
        Fixture {
            _dir: dir,
            project,
            job,
        }
    }

    fn registry(with_credentials: bool) -> RegistrySettings {
        RegistrySettings {
            private_registry: "registry.example.com".to_string(),
            cache_registry: "cache.example.com".to_string(),
            username: with_credentials.then(|| "ci".to_string()),
            password: with_credentials.then(|| "s3cret".to_string()),
        }
    }

    fn run(host: &mut ScriptedHost, fx: &Fixture, with_credentials: bool) -> BuildOutcome {
        BuildOrchestrator::new(registry(with_credentials)).run_job(
            host,
            &fx.job,
            &fx.project,
            "shop-api:1.0",
            None,
        )
    }

    #[test]
    fn test_successful_pipeline_order() {
        let fx = fixture();
        let mut host = ScriptedHost::new();

        let outcome = run(&mut host, &fx, true);

        assert!(outcome.success);
        assert_eq!(outcome.failed_step, None);
        assert_eq!(outcome.image, "registry.example.com/shop-api:1.0");
        assert_eq!(
            host.commands,
            vec![
                "mkdir -p /tmp/build-feedbeef && tar -xzf /tmp/project-feedbeef.tar.gz -C /tmp/build-feedbeef",
                "curl -s --head --connect-timeout 10 https://registry.example.com/v2/",
                "docker login registry.example.com -u ci --password-stdin",
                "docker build -t registry.example.com/shop-api:1.0 /tmp/build-feedbeef/shop-api",
                "docker push registry.example.com/shop-api:1.0",
                "docker rmi registry.example.com/shop-api:1.0",
                "docker logout registry.example.com",
                "rm -rf /tmp/build-feedbeef /tmp/project-feedbeef.tar.gz",
            ]
        );
        assert_eq!(host.uploads[0].0, "/tmp/project-feedbeef.tar.gz");
        assert!(!fx.job.local_archive_path.exists());
    }

    #[test]
    fn test_password_only_sent_on_stdin() {
        let fx = fixture();
        let mut host = ScriptedHost::new();
        run(&mut host, &fx, true);

        assert!(host.commands.iter().all(|c| !c.contains("s3cret")));
        assert!(host.logs.iter().all(|l| !l.contains("s3cret")));

        let login = host.position("docker login").unwrap();
        assert_eq!(host.inputs[login], b"s3cret".to_vec());
        let with_input = host.inputs.iter().filter(|i| !i.is_empty()).count();
        assert_eq!(with_input, 1);
    }

    #[test]
    fn test_image_tag_published_as_given() {
        let fx = fixture();
        let mut host = ScriptedHost::new();

        let outcome = BuildOrchestrator::new(registry(false)).run_job(
            &mut host,
            &fx.job,
            &fx.project,
            "team/shop-api:1.0",
            None,
        );

        assert_eq!(outcome.image, "registry.example.com/team/shop-api:1.0");
        assert_eq!(host.count("docker push registry.example.com/team/shop-api:1.0"), 1);
    }

    #[test]
    fn test_extract_failure_cleans_up_once() {
        let fx = fixture();
        let mut host = ScriptedHost::new().fail_on("tar -xzf", 2);

        let outcome = run(&mut host, &fx, true);

        assert!(!outcome.success);
        assert_eq!(outcome.failed_step, Some(BuildStep::Extract));
        assert_eq!(host.count("rm -rf /tmp/build-feedbeef"), 1);
        assert_eq!(host.count("curl"), 0);
        assert_eq!(host.count("docker"), 0);
    }

    #[test]
    fn test_push_failure_still_runs_cleanup() {
        let fx = fixture();
        let mut host = ScriptedHost::new().fail_on("docker push", 1);

        let outcome = run(&mut host, &fx, true);

        assert!(!outcome.success);
        assert_eq!(outcome.failed_step, Some(BuildStep::Push));
        let push = host.position("docker push").unwrap();
        assert!(host.position("docker rmi").unwrap() > push);
        assert!(host.position("docker logout").unwrap() > push);
        assert!(host.position("rm -rf").unwrap() > push);
        assert_eq!(host.count("rm -rf"), 1);
    }

    #[test]
    fn test_preflight_failure_reports_diagnostic() {
        let fx = fixture();
        let mut host = ScriptedHost::new().fail_on("curl", 7);

        let outcome = run(&mut host, &fx, true);

        assert_eq!(outcome.failed_step, Some(BuildStep::Preflight));
        assert!(host.logs.iter().any(|l| l.contains("DNS")));
        assert!(host.logs.iter().any(|l| l.contains("Firewall")));
        assert_eq!(host.count("docker login"), 0);
        assert_eq!(host.count("rm -rf"), 1);
    }

    #[test]
    fn test_login_skipped_without_credentials() {
        let fx = fixture();
        let mut host = ScriptedHost::new();

        let outcome = run(&mut host, &fx, false);

        assert!(outcome.success);
        assert_eq!(host.count("docker login"), 0);
        assert!(host.logs.iter().any(|l| l.contains("skipping remote login")));
    }

    #[test]
    fn test_login_failure_aborts_and_logs_out() {
        let fx = fixture();
        let mut host = ScriptedHost::new().fail_on("docker login", 1);

        let outcome = run(&mut host, &fx, true);

        assert_eq!(outcome.failed_step, Some(BuildStep::Login));
        assert_eq!(host.count("docker build"), 0);
        assert_eq!(host.count("docker logout"), 1);
        assert_eq!(host.count("rm -rf"), 1);
    }

    #[test]
    fn test_build_failure_skips_push() {
        let fx = fixture();
        let mut host = ScriptedHost::new().fail_on("docker build", 1);

        let outcome = run(&mut host, &fx, true);

        assert_eq!(outcome.failed_step, Some(BuildStep::Build));
        assert_eq!(host.count("docker push"), 0);
        assert_eq!(host.count("docker rmi"), 0);
        assert_eq!(host.count("rm -rf"), 1);
    }

    #[test]
    fn test_upload_failure_leaves_nothing_remote() {
        let fx = fixture();
        let mut host = ScriptedHost::new().fail_upload();

        let outcome = run(&mut host, &fx, true);

        assert_eq!(outcome.failed_step, Some(BuildStep::Upload));
        assert!(host.commands.is_empty());
        assert!(!fx.job.local_archive_path.exists());
    }

    #[test]
    fn test_missing_dockerfile_fails_before_upload() {
        let fx = fixture();
        fs::remove_file(fx.project.join("Dockerfile")).unwrap();
        let mut host = ScriptedHost::new();

        let outcome = run(&mut host, &fx, true);

        assert_eq!(outcome.failed_step, Some(BuildStep::Pack));
        assert!(host.uploads.is_empty());
        assert!(host.commands.is_empty());
        assert!(host.logs.iter().any(|l| l.contains("Dockerfile not found")));
    }

    #[test]
    fn test_progress_forwarded_to_upload() {
        let fx = fixture();
        let mut host = ScriptedHost::new();
        let mut last = (0u64, 0u64);
        let mut cb = |moved: u64, total: u64| last = (moved, total);

        BuildOrchestrator::new(registry(false)).run_job(
            &mut host,
            &fx.job,
            &fx.project,
            "shop-api:1.0",
            Some(&mut cb),
        );

        assert!(last.1 > 0);
        assert_eq!(last.0, last.1);
    }
}
