//! 自由入力からのイメージ参照の抽出
//!
//! パーサではなくベストエフォートのヒューリスティックです。順序付きのパターンを
//! 先頭から試し、最初に一致したものを採用します。どれにも一致しない場合は
//! 前後の空白を除いた入力そのものを参照とみなします。

use crate::dockerfile::is_scratch;
use regex::{Captures, Regex};
use std::sync::LazyLock;

static PULL_COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(docker\s+pull\s+)([\w./:@-]+)").expect("pull pattern is valid")
});

static FROM_INSTRUCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(FROM\s+(?:--platform=\S+\s+)?)([\w./:@-]+)((?:\s+AS\s+[\w.-]+)?)")
        .expect("FROM pattern is valid")
});

static BARE_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w./:@-]+$").expect("reference pattern is valid"));

/// `docker pull <ref>`、`FROM` 行、または参照単体からイメージ参照を取り出す
///
/// # Examples
/// - `docker pull redis:7` -> `redis:7`
/// - `FROM --platform=linux/amd64 node:18 AS build` -> `node:18`
/// - `  alpine:3.20 ` -> `alpine:3.20`
pub fn extract_reference_from_freeform(text: &str) -> String {
    let trimmed = text.trim();

    for pattern in [&*PULL_COMMAND, &*FROM_INSTRUCTION] {
        if let Some(caps) = pattern.captures(trimmed) {
            return caps[2].to_string();
        }
    }

    trimmed.to_string()
}

/// 入力全体が `docker pull` コマンド、`FROM` 行、または参照単体のとき、
/// 参照部分だけを `rewrite_image` で置き換える。それ以外の入力はそのまま返す。
pub(crate) fn accelerate<F>(input: &str, rewrite_image: F) -> String
where
    F: Fn(&str) -> String,
{
    let trimmed = input.trim();

    let whole = |caps: &Captures<'_>| caps.get(0).map(|m| m.len()) == Some(trimmed.len());

    if let Some(caps) = PULL_COMMAND.captures(trimmed).filter(|c| whole(c)) {
        return format!("{}{}", &caps[1], rewrite_image(&caps[2]));
    }

    if let Some(caps) = FROM_INSTRUCTION.captures(trimmed).filter(|c| whole(c)) {
        if is_scratch(&caps[2]) {
            return input.to_string();
        }
        return format!("{}{}{}", &caps[1], rewrite_image(&caps[2]), &caps[3]);
    }

    if BARE_REFERENCE.is_match(trimmed) {
        return rewrite_image(trimmed);
    }

    input.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_pull() {
        assert_eq!(extract_reference_from_freeform("docker pull redis:7"), "redis:7");
        assert_eq!(
            extract_reference_from_freeform("  DOCKER  PULL bitnami/redis  "),
            "bitnami/redis"
        );
    }

    #[test]
    fn test_extract_from_dockerfile_line() {
        assert_eq!(
            extract_reference_from_freeform("FROM --platform=linux/amd64 node:18 AS build"),
            "node:18"
        );
        assert_eq!(extract_reference_from_freeform("from python:3.9"), "python:3.9");
    }

    #[test]
    fn test_extract_fallback() {
        assert_eq!(extract_reference_from_freeform(" alpine:3.20 "), "alpine:3.20");
        assert_eq!(
            extract_reference_from_freeform("podman pull nginx"),
            "podman pull nginx"
        );
    }

    #[test]
    fn test_accelerate_pull() {
        let out = accelerate("docker pull redis:7", |i| format!("m/{}", i));
        assert_eq!(out, "docker pull m/redis:7");
    }

    #[test]
    fn test_accelerate_from_keeps_alias() {
        let out = accelerate("FROM --platform=linux/amd64 node:18 AS build", |i| {
            format!("m/{}", i)
        });
        assert_eq!(out, "FROM --platform=linux/amd64 m/node:18 AS build");
    }

    #[test]
    fn test_accelerate_other_input_unchanged() {
        let input = "docker run --rm redis:7";
        assert_eq!(accelerate(input, |i| format!("m/{}", i)), input);

        // 参照の後ろに引数が続く場合は全体一致にならない
        let input = "docker pull redis:7 --quiet";
        assert_eq!(accelerate(input, |i| format!("m/{}", i)), input);

        assert_eq!(accelerate("   ", |i| format!("m/{}", i)), "   ");
    }

    #[test]
    fn test_accelerate_bare_reference() {
        assert_eq!(accelerate(" node:18 ", |i| format!("m/{}", i)), "m/node:18");
        assert_eq!(
            accelerate("bitnami/redis@sha256:ab12", |i| format!("m/{}", i)),
            "m/bitnami/redis@sha256:ab12"
        );
    }

    #[test]
    fn test_accelerate_from_scratch_unchanged() {
        assert_eq!(accelerate("FROM scratch", |i| format!("m/{}", i)), "FROM scratch");
    }
}
