//! Dockerfile `FROM` 行の走査と書き換え
//!
//! Dockerfile の文法全体は扱いません。行頭から始まる `FROM` 命令だけを対象にし、
//! `--platform=` フラグと `AS <alias>` はそのままの文字列で保持します。
//!
//! `FROM ${BASE_IMAGE}` のようなビルド引数プレースホルダはイメージ名の形に
//! 一致しないため、書き換えも列挙もされません（`ARG` のデフォルト値は解決しない）。
//!
//! `FROM scratch` と、それより前の `AS <alias>` で宣言されたステージ名を参照する
//! `FROM` 行はレジストリのイメージではないため、書き換えも列挙もされません。

use crate::reference::{ImageReference, parse_reference};
use indexmap::IndexSet;
use regex::{Captures, Regex};
use std::collections::HashSet;
use std::sync::LazyLock;

static FROM_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^([ \t]*FROM[ \t]+(?:--platform=\S+[ \t]+)?)([\w./:@-]+)((?:[ \t]+AS[ \t]+[\w.-]+)?[ \t]*\r?)$",
    )
    .expect("FROM line pattern is valid")
});

/// マッチした `FROM` 行の3要素
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FromLine {
    /// `FROM ` と `--platform=...` を含む前半部分
    pub prefix: String,
    /// イメージ参照そのもの
    pub image: String,
    /// ` AS alias` と行末の空白
    pub suffix: String,
}

impl FromLine {
    fn from_captures(caps: &Captures<'_>) -> Self {
        Self {
            prefix: caps[1].to_string(),
            image: caps[2].to_string(),
            suffix: caps[3].to_string(),
        }
    }

    /// イメージ部分だけを差し替えた行
    pub fn with_image(&self, image: &str) -> String {
        format!("{}{}{}", self.prefix, image, self.suffix)
    }

    /// `AS <alias>` で宣言されたステージ名
    pub fn alias(&self) -> Option<&str> {
        let mut words = self.suffix.split_whitespace();
        match (words.next(), words.next()) {
            (Some(keyword), Some(alias)) if keyword.eq_ignore_ascii_case("AS") => Some(alias),
            _ => None,
        }
    }
}

/// `FROM scratch`（空のベース）
pub fn is_scratch(image: &str) -> bool {
    image.eq_ignore_ascii_case("scratch")
}

/// 文書の先頭から宣言済みのステージ名を追跡する
#[derive(Debug, Default)]
struct Stages {
    aliases: HashSet<String>,
}

impl Stages {
    /// `line` がレジストリのイメージを指すか判定し、その行のステージ名を登録する
    fn is_external(&mut self, line: &FromLine) -> bool {
        let external =
            !is_scratch(&line.image) && !self.aliases.contains(&line.image.to_ascii_lowercase());
        if let Some(alias) = line.alias() {
            self.aliases.insert(alias.to_ascii_lowercase());
        }
        external
    }
}

/// 文書中の `FROM` 行を出現順に取得
pub fn from_lines(content: &str) -> Vec<FromLine> {
    FROM_LINE
        .captures_iter(content)
        .map(|caps| FromLine::from_captures(&caps))
        .collect()
}

/// すべての `FROM` 行のイメージ参照を `rewrite_image` で置き換える
///
/// `FROM` 以外の行、および `FROM` 行のイメージ以外の部分はバイト単位で保持されます。
/// `scratch` とステージ名の参照は `rewrite_image` に渡しません。
pub fn rewrite_from_lines<F>(content: &str, mut rewrite_image: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut stages = Stages::default();
    FROM_LINE
        .replace_all(content, |caps: &Captures<'_>| {
            let line = FromLine::from_captures(caps);
            if !stages.is_external(&line) {
                return caps[0].to_string();
            }
            let image = rewrite_image(&line.image);
            if image != line.image {
                tracing::debug!("FROM {} -> {}", line.image, image);
            }
            line.with_image(&image)
        })
        .into_owned()
}

/// ベースイメージの一覧（初出順、重複なし、`scratch` とステージ名を除く）
pub fn list_base_images(content: &str) -> Vec<ImageReference> {
    let mut stages = Stages::default();
    let images: IndexSet<String> = from_lines(content)
        .into_iter()
        .filter(|line| stages.is_external(line))
        .map(|line| line.image)
        .collect();
    images.iter().map(|image| parse_reference(image)).collect()
}
