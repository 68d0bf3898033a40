//! 利用者向けに生成するシェルコマンド

/// Dockerfile を `docker build -f -` にパイプで渡す1行のコマンド
///
/// ダブルクォートをエスケープし、改行をリテラルの `\n` で連結して
/// 文書全体を1つの `echo -e "..."` の引数に収めます。
/// bash / zsh / Git Bash / PowerShell 向けで、`cmd.exe` には対応しません。
pub fn piped_build_command(dockerfile: &str) -> String {
    let escaped = dockerfile.replace('"', "\\\"");
    let body = escaped.lines().collect::<Vec<_>>().join("\\n");
    format!("echo -e \"{}\" | docker build -f - .", body)
}

/// 完全なイメージ名に対する `docker pull`
pub fn pull_command(image: &str) -> String {
    format!("docker pull {}", image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piped_build_command() {
        let cmd = piped_build_command("FROM m/library/alpine\nCMD [\"sh\"]\n");
        assert_eq!(
            cmd,
            r#"echo -e "FROM m/library/alpine\nCMD [\"sh\"]" | docker build -f - ."#
        );
    }

    #[test]
    fn test_pull_command() {
        assert_eq!(
            pull_command("registry.example.com/app:1"),
            "docker pull registry.example.com/app:1"
        );
    }
}
