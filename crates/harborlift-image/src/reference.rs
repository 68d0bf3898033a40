//! イメージ参照のモデル
//!
//! `python:3.9`, `bitnami/redis:7`, `gcr.io/distroless/base@sha256:...` のような
//! 参照文字列をレジストリ・リポジトリ・タグ/ダイジェストに分解します。

use std::fmt;

/// タグまたはダイジェスト
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagOrDigest {
    /// `:tag`
    Tag(String),
    /// `@algo:hex`
    Digest(String),
}

impl fmt::Display for TagOrDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagOrDigest::Tag(tag) => write!(f, ":{}", tag),
            TagOrDigest::Digest(digest) => write!(f, "@{}", digest),
        }
    }
}

/// 1つのイメージ参照
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference {
    /// 明示的なレジストリホスト（先頭セグメントに `.` か `:` を含む場合のみ）
    pub registry_host: Option<String>,
    /// `/` 区切りのリポジトリパス
    pub repository_path: String,
    pub tag_or_digest: Option<TagOrDigest>,
}

impl ImageReference {
    /// 明示的なレジストリを持つ参照は書き換え対象外
    pub fn is_opaque(&self) -> bool {
        self.registry_host.is_some()
    }

    /// Docker Hub 公式イメージ（`library/` 名前空間）
    pub fn is_official(&self) -> bool {
        self.registry_host.is_none() && !self.repository_path.contains('/')
    }

    /// `library/` を補ったリポジトリパス
    pub fn normalized_path(&self) -> String {
        if self.is_official() {
            format!("library/{}", self.repository_path)
        } else {
            self.repository_path.clone()
        }
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(host) = &self.registry_host {
            write!(f, "{}/", host)?;
        }
        f.write_str(&self.repository_path)?;
        if let Some(suffix) = &self.tag_or_digest {
            write!(f, "{}", suffix)?;
        }
        Ok(())
    }
}

/// 参照文字列をパース
///
/// 検証は行いません。どんな入力でも何らかの `ImageReference` を返し、
/// 整形式の入力であれば `to_string()` で元の文字列に戻ります。
///
/// # Examples
/// - `python:3.9` -> path `python`, tag `3.9`
/// - `localhost:5000/app` -> host `localhost:5000`, path `app`
/// - `gcr.io/distroless/base` -> host `gcr.io`, path `distroless/base`
pub fn parse_reference(text: &str) -> ImageReference {
    let (name, mut tag_or_digest) = match text.split_once('@') {
        Some((name, digest)) => (name, Some(TagOrDigest::Digest(digest.to_string()))),
        None => (text, None),
    };

    // タグの `:` は最後の `/` より後ろにあるものだけ（レジストリのポートと区別）
    let mut name = name;
    if tag_or_digest.is_none()
        && let Some(pos) = name.rfind(':')
        && !name[pos + 1..].contains('/')
    {
        tag_or_digest = Some(TagOrDigest::Tag(name[pos + 1..].to_string()));
        name = &name[..pos];
    }

    let (registry_host, repository_path) = match name.split_once('/') {
        Some((first, rest)) if first.contains('.') || first.contains(':') => {
            (Some(first.to_string()), rest.to_string())
        }
        _ => (None, name.to_string()),
    };

    ImageReference {
        registry_host,
        repository_path,
        tag_or_digest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_official_with_tag() {
        let r = parse_reference("python:3.9");
        assert_eq!(r.registry_host, None);
        assert_eq!(r.repository_path, "python");
        assert_eq!(r.tag_or_digest, Some(TagOrDigest::Tag("3.9".to_string())));
        assert!(r.is_official());
        assert!(!r.is_opaque());
        assert_eq!(r.normalized_path(), "library/python");
    }

    #[test]
    fn test_parse_user_image() {
        let r = parse_reference("bitnami/redis");
        assert_eq!(r.registry_host, None);
        assert_eq!(r.repository_path, "bitnami/redis");
        assert_eq!(r.tag_or_digest, None);
        assert!(!r.is_official());
        assert_eq!(r.normalized_path(), "bitnami/redis");
    }

    #[test]
    fn test_parse_registry_with_port() {
        let r = parse_reference("localhost:5000/app");
        assert_eq!(r.registry_host.as_deref(), Some("localhost:5000"));
        assert_eq!(r.repository_path, "app");
        assert_eq!(r.tag_or_digest, None);

        let r = parse_reference("localhost:5000/app:dev");
        assert_eq!(r.registry_host.as_deref(), Some("localhost:5000"));
        assert_eq!(r.tag_or_digest, Some(TagOrDigest::Tag("dev".to_string())));
    }

    #[test]
    fn test_parse_digest() {
        let r = parse_reference("gcr.io/distroless/base@sha256:abcdef");
        assert_eq!(r.registry_host.as_deref(), Some("gcr.io"));
        assert_eq!(r.repository_path, "distroless/base");
        assert_eq!(
            r.tag_or_digest,
            Some(TagOrDigest::Digest("sha256:abcdef".to_string()))
        );
    }

    #[test]
    fn test_display_round_trip() {
        for text in [
            "nginx",
            "nginx:alpine",
            "bitnami/redis:7",
            "gcr.io/distroless/base",
            "localhost:5000/app:dev",
            "alpine@sha256:0123",
        ] {
            assert_eq!(parse_reference(text).to_string(), text);
        }
    }

    #[test]
    fn test_first_segment_without_dot_is_namespace() {
        let r = parse_reference("myuser/app:latest");
        assert!(!r.is_opaque());
        assert_eq!(r.repository_path, "myuser/app");
    }
}
