//! キャッシュミラーの予熱
//!
//! 各イメージをビルドホストからミラー経由で pull し、成功したらすぐに削除します。
//! ミラー側にレイヤーが残ればよく、ビルドホストにイメージは残しません。
//! 1つの失敗で残りを止めることはありません。

use crate::commands;
use crate::error::{BuildError, Result};
use harborlift_image::{
    ImageReference, RewriteTarget, Rewriter, extract_reference_from_freeform, list_base_images,
    parse_reference, piped_build_command,
};
use harborlift_remote::RemoteHost;

/// 予熱対象の入力
#[derive(Debug, Clone, Copy)]
pub enum PreheatSource<'a> {
    /// `docker pull ...` や `FROM ...` を含む自由入力
    Freeform(&'a str),
    /// Dockerfile の内容
    Dockerfile(&'a str),
}

impl PreheatSource<'_> {
    /// 予熱するイメージ参照の一覧
    pub fn references(&self) -> Result<Vec<ImageReference>> {
        match self {
            PreheatSource::Freeform(text) => {
                let reference = extract_reference_from_freeform(text);
                if reference.is_empty() {
                    return Err(BuildError::NoImages);
                }
                Ok(vec![parse_reference(&reference)])
            }
            PreheatSource::Dockerfile(content) => {
                let images = list_base_images(content);
                if images.is_empty() {
                    return Err(BuildError::NoImages);
                }
                Ok(images)
            }
        }
    }

    fn document(&self) -> Option<&str> {
        match self {
            PreheatSource::Freeform(_) => None,
            PreheatSource::Dockerfile(content) => Some(*content),
        }
    }
}

/// 1イメージ分の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreheatItem {
    pub reference: String,
    /// 実際に pull した参照
    pub target: String,
    pub warmed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreheatReport {
    pub items: Vec<PreheatItem>,
    pub all_warmed: bool,
    /// 全件成功かつ文書が渡された場合のみ
    pub rewritten_document: Option<String>,
    /// `rewritten_document` をパイプで渡すビルドコマンド
    pub build_command: Option<String>,
}

impl PreheatReport {
    pub fn warmed_count(&self) -> usize {
        self.items.iter().filter(|item| item.warmed).count()
    }
}

#[derive(Debug, Clone)]
pub struct PreheatWorkflow {
    rewriter: Rewriter,
}

impl PreheatWorkflow {
    pub fn new(rewriter: Rewriter) -> Self {
        Self { rewriter }
    }

    /// 入力から参照を取り出して予熱
    pub fn run_source<H: RemoteHost + ?Sized>(
        &self,
        host: &mut H,
        source: PreheatSource<'_>,
    ) -> Result<PreheatReport> {
        let references = source.references()?;
        Ok(self.run(host, &references, source.document()))
    }

    /// 接続済みのホストで `references` を順に予熱
    pub fn run<H: RemoteHost + ?Sized>(
        &self,
        host: &mut H,
        references: &[ImageReference],
        document: Option<&str>,
    ) -> PreheatReport {
        let total = references.len();
        host.log(&format!(
            "--- Preheating {} image(s) through {} ---",
            total,
            self.rewriter.registries().cache_mirror
        ));

        let mut items = Vec::with_capacity(total);
        for (index, reference) in references.iter().enumerate() {
            host.log(&format!(
                "--> [{}/{}] Preheating {}",
                index + 1,
                total,
                reference
            ));
            items.push(self.warm(host, reference));
        }

        let all_warmed = items.iter().all(|item| item.warmed);
        let mut report = PreheatReport {
            items,
            all_warmed,
            ..Default::default()
        };

        if all_warmed {
            host.log(&format!("--- All {} image(s) preheated ---", total));
            if let Some(document) = document {
                let rewritten = self.rewriter.rewrite_dockerfile(document);
                report.build_command = Some(piped_build_command(&rewritten));
                report.rewritten_document = Some(rewritten);
            }
        } else {
            host.log(&format!(
                "--- Preheat finished with failures: {}/{} image(s) warmed ---",
                report.warmed_count(),
                total
            ));
        }

        report
    }

    fn warm<H: RemoteHost + ?Sized>(&self, host: &mut H, reference: &ImageReference) -> PreheatItem {
        let (target, changed) = self.rewriter.rewrite(reference, RewriteTarget::CacheMirror);
        if !changed {
            host.log(&format!(
                "--> {} names an explicit registry, pulling it as-is.",
                reference
            ));
        }
        let target = target.to_string();

        let warmed = host.run(&commands::pull_image(&target)) == 0;
        if warmed {
            host.log(&format!("--> Warmed {}, removing the local copy.", target));
            let status = host.run(&commands::remove_image(&target));
            if status != 0 {
                tracing::debug!("Failed to remove preheated image {}: {}", target, status);
                host.log(&format!(
                    "--> Failed to remove local copy of {} (ignored).",
                    target
                ));
            }
        } else {
            host.log(&format!("--> Pull of {} failed.", target));
        }

        PreheatItem {
            reference: reference.to_string(),
            target,
            warmed,
        }
    }
}
