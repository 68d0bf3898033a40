//! ビルドホストで実行するシェルコマンド

/// 特殊な文字を含む場合のみ POSIX シェル向けにクォートする
pub fn shell_quote(value: &str) -> String {
    let safe = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:@=+,%".contains(c));
    if safe {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}

pub fn extract_archive(project_dir: &str, archive: &str) -> String {
    format!(
        "mkdir -p {dir} && tar -xzf {archive} -C {dir}",
        dir = shell_quote(project_dir),
        archive = shell_quote(archive)
    )
}

/// 事前確認で叩くレジストリ API のルート URL
pub fn registry_api_url(registry: &str) -> String {
    format!("https://{}/v2/", registry)
}

pub fn registry_probe(registry: &str) -> String {
    format!(
        "curl -s --head --connect-timeout 10 {}",
        registry_api_url(registry)
    )
}

/// パスワードは標準入力で渡す（コマンド文字列には含めない）
pub fn registry_login(registry: &str, user: &str) -> String {
    format!(
        "docker login {} -u {} --password-stdin",
        shell_quote(registry),
        shell_quote(user)
    )
}

pub fn build_image(image: &str, context: &str) -> String {
    format!(
        "docker build -t {} {}",
        shell_quote(image),
        shell_quote(context)
    )
}

pub fn push_image(image: &str) -> String {
    format!("docker push {}", shell_quote(image))
}

pub fn pull_image(image: &str) -> String {
    format!("docker pull {}", shell_quote(image))
}

pub fn remove_image(image: &str) -> String {
    format!("docker rmi {}", shell_quote(image))
}

pub fn registry_logout(registry: &str) -> String {
    format!("docker logout {}", shell_quote(registry))
}

pub fn remove_workspace(project_dir: &str, archive: &str) -> String {
    format!(
        "rm -rf {} {}",
        shell_quote(project_dir),
        shell_quote(archive)
    )
}
