use crate::error::{BuildError, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tar::Builder;

/// プロジェクトディレクトリを検証し、正規化したパスを返す
///
/// ルートに `Dockerfile` が無い場合はエラー
pub fn resolve_project(project_dir: &Path) -> Result<PathBuf> {
    if !project_dir.is_dir() {
        return Err(BuildError::ProjectNotFound(project_dir.to_path_buf()));
    }
    let project_dir = project_dir.canonicalize()?;

    let dockerfile = project_dir.join("Dockerfile");
    if !dockerfile.is_file() {
        return Err(BuildError::DockerfileNotFound(dockerfile));
    }

    Ok(project_dir)
}

/// アーカイブ内のルートディレクトリ名（プロジェクトディレクトリのベース名）
pub fn project_folder_name(project_dir: &Path) -> String {
    project_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string())
}

/// プロジェクトを tar.gz アーカイブとして `archive_path` に書き出す
///
/// エントリは `<ベース名>/...` の形で格納されます。戻り値はアーカイブのサイズ。
pub fn pack_project(project_dir: &Path, archive_path: &Path) -> Result<u64> {
    tracing::debug!(
        "Packing {} into {}",
        project_dir.display(),
        archive_path.display()
    );

    let pack_err = |source: std::io::Error| BuildError::Pack {
        path: project_dir.to_path_buf(),
        source,
    };

    let file = File::create(archive_path).map_err(pack_err)?;
    let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    let mut tar = Builder::new(encoder);
    tar.follow_symlinks(false);

    tar.append_dir_all(project_folder_name(project_dir), project_dir)
        .map_err(pack_err)?;

    let encoder = tar.into_inner().map_err(pack_err)?;
    encoder.finish().and_then(|mut w| w.flush()).map_err(pack_err)?;

    let size = std::fs::metadata(archive_path)?.len();
    tracing::debug!("Project archive created: {} bytes", size);

    // アーカイブサイズの警告
    check_archive_size(size);

    Ok(size)
}

/// アーカイブサイズのチェックと警告
fn check_archive_size(size: u64) {
    const MAX_ARCHIVE_SIZE: u64 = 500 * 1024 * 1024; // 500MB

    if size > MAX_ARCHIVE_SIZE {
        tracing::warn!(
            "Project archive is large ({}MB); consider moving build artifacts out of the project directory",
            size / 1024 / 1024
        );
    }
}
