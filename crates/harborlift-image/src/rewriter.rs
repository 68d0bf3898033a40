//! レジストリの置き換えルール
//!
//! レジストリを明示していない参照はキャッシュミラーへ向け直し、
//! レジストリを明示している参照はそのまま残します。
//! 書き換えるのは元の参照だけで、書き換え済みの参照を再度渡すことはありません。

use crate::dockerfile;
use crate::freeform;
use crate::reference::{ImageReference, parse_reference};

/// 書き換え先のレジストリ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteTarget {
    /// pull と予熱
    CacheMirror,
    /// ビルドしたイメージの公開
    PrivateRegistry,
}

/// 設定された2つのレジストリ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registries {
    /// pull-through キャッシュとして動くミラー
    pub cache_mirror: String,
    /// ビルドしたイメージの公開先
    pub private_registry: String,
}

impl Registries {
    pub fn new(cache_mirror: impl Into<String>, private_registry: impl Into<String>) -> Self {
        Self {
            cache_mirror: cache_mirror.into(),
            private_registry: private_registry.into(),
        }
    }

    pub fn host(&self, target: RewriteTarget) -> &str {
        match target {
            RewriteTarget::CacheMirror => &self.cache_mirror,
            RewriteTarget::PrivateRegistry => &self.private_registry,
        }
    }
}

/// 1つの参照を `host` へ書き換える
///
/// 書き換え後の参照と、変更があったかどうかを返します。
pub fn rewrite(reference: &ImageReference, host: &str) -> (ImageReference, bool) {
    if reference.is_opaque() {
        return (reference.clone(), false);
    }

    let rewritten = ImageReference {
        registry_host: Some(host.to_string()),
        repository_path: reference.normalized_path(),
        tag_or_digest: reference.tag_or_digest.clone(),
    };
    (rewritten, true)
}

/// 固定のレジストリ設定で置き換えルールを適用する
#[derive(Debug, Clone)]
pub struct Rewriter {
    registries: Registries,
}

impl Rewriter {
    pub fn new(registries: Registries) -> Self {
        Self { registries }
    }

    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    pub fn rewrite(
        &self,
        reference: &ImageReference,
        target: RewriteTarget,
    ) -> (ImageReference, bool) {
        rewrite(reference, self.registries.host(target))
    }

    /// キャッシュミラーへ書き換える文字列版。空の入力はそのまま返す
    pub fn rewrite_str(&self, text: &str) -> (String, bool) {
        if text.trim().is_empty() {
            return (text.to_string(), false);
        }
        let reference = parse_reference(text);
        let (rewritten, changed) = self.rewrite(&reference, RewriteTarget::CacheMirror);
        if changed {
            (rewritten.to_string(), true)
        } else {
            (text.to_string(), false)
        }
    }

    /// Dockerfile のすべての `FROM` 行をキャッシュミラーへ書き換える
    pub fn rewrite_dockerfile(&self, content: &str) -> String {
        dockerfile::rewrite_from_lines(content, |image| self.rewrite_str(image).0)
    }

    /// `docker pull` コマンド、`FROM` 行、または参照単体をキャッシュミラーへ
    /// 書き換える。それ以外の入力はそのまま返す
    pub fn accelerate_command(&self, input: &str) -> String {
        freeform::accelerate(input, |image| self.rewrite_str(image).0)
    }

    /// プライベートレジストリ上の完全なイメージ名（`<registry>/<tag>`）
    ///
    /// 公開するタグはそのまま使い、`library/` は補いません。
    pub fn private_image(&self, image_tag: &str) -> String {
        format!(
            "{}/{}",
            self.registries.host(RewriteTarget::PrivateRegistry),
            image_tag
        )
    }
}
