use harborlift_remote::RemoteError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Dockerfile not found: {0}")]
    DockerfileNotFound(PathBuf),

    #[error("Project directory not found: {0}")]
    ProjectNotFound(PathBuf),

    #[error("No image references found in the input")]
    NoImages,

    #[error("Failed to pack {path}: {source}")]
    Pack {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Upload failed: {0}")]
    Upload(#[from] RemoteError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    /// ユーザー向けの分かりやすいエラーメッセージ
    pub fn user_message(&self) -> String {
        match self {
            BuildError::DockerfileNotFound(path) => {
                format!(
                    "Dockerfile not found: {}\n\
                     \n\
                     The project directory must contain a file named exactly\n\
                     `Dockerfile` at its root.",
                    path.display()
                )
            }
            BuildError::ProjectNotFound(path) => {
                format!(
                    "Project directory not found: {}\n\
                     \n\
                     Check the path passed to `lift build`.",
                    path.display()
                )
            }
            BuildError::Pack { path, source } => {
                format!(
                    "Failed to pack project {}: {}\n\
                     \n\
                     Check that every file in the project is readable.",
                    path.display(),
                    source
                )
            }
            BuildError::NoImages => "No image references found.\n\
                 \n\
                 Pass a `docker pull <image>` command, a `FROM <image>` line,\n\
                 or a Dockerfile with at least one `FROM` instruction."
                .to_string(),
            _ => format!("{}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
