mod commands;
mod output;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lift")]
#[command(about = "Build images on a remote host, pull them through your own mirror", long_about = None)]
#[command(version)]
struct Cli {
    /// 設定ファイルのパス（省略時は HARBORLIFT_CONFIG、カレントディレクトリ、グローバル設定の順に探索）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// デバッグログを有効にする
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// `docker pull` コマンドや `FROM` 行をミラー経由に書き換えて表示
    Convert {
        /// 例: "docker pull redis:7", "FROM node:18 AS build"
        input: String,
    },
    /// 1つのイメージをミラーに予熱
    Preheat {
        /// イメージ名、`docker pull` コマンド、または `FROM` 行
        input: String,
    },
    /// Dockerfile のベースイメージをすべて予熱
    #[command(name = "preheat-file")]
    PreheatFile {
        /// Dockerfile のパス
        dockerfile: PathBuf,
        /// 書き換えた Dockerfile の出力先（省略時は標準出力）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Dockerfile の FROM 行をミラー経由に書き換えて表示（リモート接続なし）
    Rewrite {
        /// Dockerfile のパス
        dockerfile: PathBuf,
    },
    /// プロジェクトをリモートでビルドし、プライベートレジストリへ push
    Build {
        /// Dockerfile を含むプロジェクトディレクトリ
        project_dir: PathBuf,
        /// イメージタグ（省略時は前回のタグ）
        #[arg(short, long)]
        tag: Option<String>,
    },
    /// リモートのファイルをダウンロード
    Download {
        /// リモートのパス
        remote: String,
        /// ローカルの保存先
        local: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = harborlift_config::load(cli.config.as_deref())
        .map_err(commands::config_error)
        .context("Failed to load configuration")?;

    match cli.command {
        Commands::Convert { input } => commands::convert::handle(&settings, &input),
        Commands::Preheat { input } => commands::preheat::handle(settings, input).await,
        Commands::PreheatFile { dockerfile, output } => {
            commands::preheat::handle_file(settings, &dockerfile, output.as_deref()).await
        }
        Commands::Rewrite { dockerfile } => commands::rewrite::handle(&settings, &dockerfile),
        Commands::Build { project_dir, tag } => {
            commands::build::handle(settings, project_dir, tag).await
        }
        Commands::Download { remote, local } => {
            commands::download::handle(settings, remote, local).await
        }
    }
}
