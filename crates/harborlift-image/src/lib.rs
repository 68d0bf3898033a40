//! HarborLift イメージ参照
//!
//! コンテナイメージ参照のパースと、pull をキャッシュミラー経由に向け直す
//! 置き換えルール:
//!
//! - `python:3.9` -> `<mirror>/library/python:3.9`
//! - `bitnami/redis:7` -> `<mirror>/bitnami/redis:7`
//! - `gcr.io/distroless/base` -> 変更なし（レジストリを明示）
//!
//! Dockerfile は `FROM` 行の単位でのみ扱います。

pub mod command;
pub mod dockerfile;
pub mod freeform;
pub mod reference;
pub mod rewriter;

pub use command::{piped_build_command, pull_command};
pub use dockerfile::{FromLine, from_lines, is_scratch, list_base_images, rewrite_from_lines};
pub use freeform::extract_reference_from_freeform;
pub use reference::{ImageReference, TagOrDigest, parse_reference};
pub use rewriter::{Registries, RewriteTarget, Rewriter, rewrite};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_to_end_dockerfile_rewrite() {
        let rewriter = Rewriter::new(Registries::new(
            "cache.example.com",
            "registry.example.com",
        ));
        let input = "FROM python:3.9\nFROM bitnami/redis:7\nFROM gcr.io/distroless/base";
        assert_eq!(
            rewriter.rewrite_dockerfile(input),
            "FROM cache.example.com/library/python:3.9\n\
             FROM cache.example.com/bitnami/redis:7\n\
             FROM gcr.io/distroless/base"
        );
    }

    #[test]
    fn test_accelerate_command() {
        let rewriter = Rewriter::new(Registries::new("cache.example.com", "r.example.com"));
        assert_eq!(
            rewriter.accelerate_command("docker pull redis:7"),
            "docker pull cache.example.com/library/redis:7"
        );
        assert_eq!(
            rewriter.accelerate_command("FROM gcr.io/distroless/base AS run"),
            "FROM gcr.io/distroless/base AS run"
        );
        assert_eq!(
            rewriter.accelerate_command("node:18"),
            "cache.example.com/library/node:18"
        );
    }
}
