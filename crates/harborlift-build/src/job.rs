//! ビルドジョブとリモート作業領域
//!
//! 1回のビルドごとにランダムな短いIDを採番し、リモートの作業ディレクトリと
//! アーカイブのパスをそこから決めます。作業領域は [`JobWorkspace`] が所有し、
//! パイプラインの成否に関わらず一度だけ片付けられます。

use crate::commands;
use harborlift_remote::RemoteHost;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;

/// リモートの一時領域のデフォルト
pub const DEFAULT_SCRATCH_ROOT: &str = "/tmp";

/// 1回のビルドで使うパス一式
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildJob {
    pub id: String,
    pub remote_project_dir: String,
    pub remote_archive_path: String,
    pub local_archive_path: PathBuf,
}

impl BuildJob {
    /// 新しいIDでジョブを作成
    pub fn new(scratch_root: &str) -> Self {
        let id = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();
        Self::with_id(id, scratch_root, std::env::temp_dir())
    }

    pub fn with_id(id: impl Into<String>, scratch_root: &str, local_tmp: PathBuf) -> Self {
        let id = id.into();
        let root = scratch_root.trim_end_matches('/');
        Self {
            remote_project_dir: format!("{}/build-{}", root, id),
            remote_archive_path: format!("{}/project-{}.tar.gz", root, id),
            local_archive_path: local_tmp.join(format!("project-{}.tar.gz", id)),
            id,
        }
    }

    /// リモートのビルドコンテキスト（展開先 + プロジェクト名）
    pub fn build_context(&self, project_folder: &str) -> String {
        format!("{}/{}", self.remote_project_dir, project_folder)
    }
}

/// リモート作業領域の所有者
///
/// アップロードが成功した時点で作成し、[`JobWorkspace::release`] で片付けます。
/// 明示的に呼ばれなかった場合は `Drop` で片付けます。
/// 片付けのコマンドは失敗してもログに残すだけです。
pub struct JobWorkspace<'a, H: RemoteHost + ?Sized> {
    host: &'a mut H,
    job: &'a BuildJob,
    image: Option<String>,
    registry: Option<String>,
    released: bool,
}

impl<'a, H: RemoteHost + ?Sized> JobWorkspace<'a, H> {
    pub fn new(host: &'a mut H, job: &'a BuildJob) -> Self {
        Self {
            host,
            job,
            image: None,
            registry: None,
            released: false,
        }
    }

    /// ビルドを開始したイメージ。片付け時にタグ削除とログアウトを行う
    pub fn track_image(&mut self, image: &str, registry: &str) {
        self.image = Some(image.to_string());
        self.registry = Some(registry.to_string());
    }

    /// ログインを試みたレジストリ。片付け時にログアウトする
    pub fn track_login(&mut self, registry: &str) {
        self.registry = Some(registry.to_string());
    }

    /// 作業領域を片付ける（2回目以降は何もしない）
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        self.host.log("--> Starting remote cleanup...");

        if let Some(image) = self.image.take() {
            best_effort(&mut *self.host, &commands::remove_image(&image));
        }
        if let Some(registry) = self.registry.take() {
            best_effort(&mut *self.host, &commands::registry_logout(&registry));
        }
        best_effort(
            &mut *self.host,
            &commands::remove_workspace(
                &self.job.remote_project_dir,
                &self.job.remote_archive_path,
            ),
        );

        self.host.log("--> Remote cleanup finished.");
    }
}

fn best_effort<H: RemoteHost + ?Sized>(host: &mut H, command: &str) {
    let status = host.run(command);
    if status != 0 {
        host.log(&format!(
            "--> Cleanup step exited with {} (ignored): {}",
            status, command
        ));
    }
}

impl<H: RemoteHost + ?Sized> Deref for JobWorkspace<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        &*self.host
    }
}

impl<H: RemoteHost + ?Sized> DerefMut for JobWorkspace<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        &mut *self.host
    }
}

impl<H: RemoteHost + ?Sized> Drop for JobWorkspace<'_, H> {
    fn drop(&mut self) {
        self.release();
    }
}
