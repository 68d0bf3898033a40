//! ビルドホストへの SSH セッション
//!
//! セッションは `Disconnected -> Connected -> Closed` の順に遷移します。
//! SSH トランスポートを1つ所有し、最初の転送時にその上で SFTP チャネルを開きます。
//! コマンドは1つずつ実行し、stdout は実行中に1行ずつログへ流します。

use crate::error::{RemoteError, Result};
use crate::host::{EXIT_FAILURE_SENTINEL, RemoteHost};
use crate::log::LogSink;
use crate::output::{forward_output, signal_exit_status};
use crate::transfer::{self, DEFAULT_CHUNK_SIZE, ProgressFn};
use harborlift_config::SshSettings;
use ssh2::{HashType, MethodType, Session, Sftp};
use std::fmt;
use std::io::{self, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

/// セッションの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
    /// 終端状態
    Closed,
}

impl SessionState {
    fn as_str(&self) -> &'static str {
        match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connected => "connected",
            SessionState::Closed => "closed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// コマンド実行と SFTP 転送を行う SSH セッション
pub struct RemoteSession {
    settings: SshSettings,
    state: SessionState,
    session: Option<Session>,
    sftp: Option<Sftp>,
    logger: LogSink,
}

impl RemoteSession {
    pub fn new(settings: SshSettings, logger: LogSink) -> Self {
        Self {
            settings,
            state: SessionState::Disconnected,
            session: None,
            sftp: None,
            logger,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// 設定の接続タイムアウトで接続
    pub fn connect(&mut self) -> Result<()> {
        let timeout = self.settings.connect_timeout();
        self.connect_with_timeout(timeout)
    }

    /// SSH トランスポートを確立し、設定の鍵で認証する
    ///
    /// 失敗した場合は何も保持せず、`Disconnected` のままです。
    pub fn connect_with_timeout(&mut self, timeout: Duration) -> Result<()> {
        if self.state != SessionState::Disconnected {
            return Err(RemoteError::InvalidState {
                expected: SessionState::Disconnected.as_str(),
                actual: self.state.as_str(),
            });
        }

        let target = self.settings.target();
        self.logger.emit(&format!(
            "--> Connecting to {} with key {}...",
            target,
            self.settings.key_path.display()
        ));

        match open_session(&self.settings, timeout) {
            Ok(session) => {
                match session.methods(MethodType::CompCs) {
                    Some(method) if method != "none" => self
                        .logger
                        .emit(&format!("--> SSH compression enabled ({}).", method)),
                    _ => self
                        .logger
                        .emit("--> SSH compression not supported by server, continuing without it."),
                }
                self.logger.emit("--> SSH connection established.");
                self.session = Some(session);
                self.state = SessionState::Connected;
                Ok(())
            }
            Err(source) => {
                self.logger.emit(&format!("SSH connection failed: {}", source));
                Err(RemoteError::Connection { target, source })
            }
        }
    }

    /// `command` をリモートで実行して終了ステータスを返す
    ///
    /// 未接続またはトランスポートの失敗時は [`EXIT_FAILURE_SENTINEL`]。
    fn execute(&mut self, command: &str, stdin: &[u8], timeout: Duration) -> i32 {
        let session = match (&self.session, self.state) {
            (Some(session), SessionState::Connected) => session,
            _ => {
                self.logger.emit("Error: SSH session is not connected.");
                return EXIT_FAILURE_SENTINEL;
            }
        };

        self.logger.emit(&format!("--> Running remotely: {}", command));

        let logger = &mut self.logger;
        match exec(session, command, stdin, timeout, logger) {
            Ok(status) => status,
            Err(e) => {
                logger.emit(&format!("Error while running command: {}", e));
                EXIT_FAILURE_SENTINEL
            }
        }
    }

    /// SFTP チャネルとトランスポートを解放する（何度呼んでもよい）
    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }

        self.sftp = None;
        if let Some(session) = self.session.take() {
            session.disconnect(None, "closing", None).ok();
            self.logger.emit("--> SSH connection closed.");
        }
        self.state = SessionState::Closed;
    }

    fn require_connected(&mut self) -> Result<()> {
        if self.state == SessionState::Connected {
            Ok(())
        } else {
            self.logger.emit("Error: SSH session is not connected.");
            Err(RemoteError::NotConnected)
        }
    }

    /// 初回使用時に SFTP チャネルを開く
    fn sftp(&mut self) -> Result<&Sftp> {
        if self.sftp.is_none() {
            let session = self.session.as_ref().ok_or(RemoteError::NotConnected)?;
            self.sftp = Some(session.sftp()?);
        }
        self.sftp.as_ref().ok_or(RemoteError::NotConnected)
    }

    pub fn upload_file(
        &mut self,
        local: &Path,
        remote: &str,
        on_progress: Option<&mut ProgressFn<'_>>,
    ) -> Result<()> {
        self.require_connected()?;
        self.logger.emit(&format!(
            "--> Uploading {} to {} via SFTP...",
            local.display(),
            remote
        ));

        let result = self.sftp().and_then(|sftp| {
            transfer::upload(sftp, local, remote, DEFAULT_CHUNK_SIZE, on_progress)
        });

        match result {
            Ok(bytes) => {
                self.logger
                    .emit(&format!("--> SFTP upload complete ({} bytes).", bytes));
                Ok(())
            }
            Err(e) => {
                self.logger.emit(&format!("SFTP upload failed: {}", e));
                Err(e)
            }
        }
    }

    pub fn download_file(
        &mut self,
        remote: &str,
        local: &Path,
        on_progress: Option<&mut ProgressFn<'_>>,
    ) -> Result<()> {
        self.require_connected()?;
        self.logger.emit(&format!(
            "--> Downloading {} to {} via SFTP...",
            remote,
            local.display()
        ));

        let result = self.sftp().and_then(|sftp| {
            transfer::download(sftp, remote, local, DEFAULT_CHUNK_SIZE, on_progress)
        });

        match result {
            Ok(bytes) => {
                self.logger
                    .emit(&format!("--> SFTP download complete ({} bytes).", bytes));
                Ok(())
            }
            Err(e) => {
                self.logger.emit(&format!("SFTP download failed: {}", e));
                Err(e)
            }
        }
    }
}

impl Drop for RemoteSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl RemoteHost for RemoteSession {
    fn log(&mut self, line: &str) {
        self.logger.emit(line);
    }

    fn run_with_stdin(&mut self, command: &str, stdin: &[u8]) -> i32 {
        let timeout = self.settings.command_timeout();
        self.execute(command, stdin, timeout)
    }

    fn upload(
        &mut self,
        local: &Path,
        remote: &str,
        on_progress: Option<&mut ProgressFn<'_>>,
    ) -> Result<()> {
        self.upload_file(local, remote, on_progress)
    }

    fn download(
        &mut self,
        remote: &str,
        local: &Path,
        on_progress: Option<&mut ProgressFn<'_>>,
    ) -> Result<()> {
        self.download_file(remote, local, on_progress)
    }
}

fn open_session(settings: &SshSettings, timeout: Duration) -> io::Result<Session> {
    let addr = (settings.host.as_str(), settings.port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("could not resolve {}", settings.host),
            )
        })?;
    let tcp = TcpStream::connect_timeout(&addr, timeout)?;

    let mut session = Session::new()?;
    session.set_tcp_stream(tcp);
    // ハンドシェイク前に要求する必要がある。zlib 非対応のサーバーでは無視される
    session.set_compress(true);
    session.set_timeout(millis(timeout));
    session.handshake()?;

    if let Some(hash) = session.host_key_hash(HashType::Sha256) {
        let fingerprint: String = hash.iter().map(|b| format!("{:02x}", b)).collect();
        tracing::debug!("Host key SHA256 for {}: {}", settings.host, fingerprint);
    }

    session.userauth_pubkey_file(
        &settings.user,
        None,
        &settings.key_path,
        settings.key_passphrase.as_deref(),
    )?;
    if !session.authenticated() {
        return Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            format!("authentication rejected for user {}", settings.user),
        ));
    }

    session.set_keepalive(true, 30);
    Ok(session)
}

/// コマンドを1つ実行し、出力を `logger` へ流す
///
/// シグナルで終了した場合は `exit-status` が届かないため、`exit-signal` から
/// 終了ステータスを決めます。
fn exec(
    session: &Session,
    command: &str,
    stdin: &[u8],
    timeout: Duration,
    logger: &mut LogSink,
) -> io::Result<i32> {
    session.set_timeout(millis(timeout));

    let mut channel = session.channel_session()?;
    channel.exec(command)?;
    if !stdin.is_empty() {
        channel.write_all(stdin)?;
    }
    channel.send_eof()?;

    forward_output(channel.stream(0), channel.stderr(), logger)?;

    channel.wait_close()?;
    if let Some(signal) = channel.exit_signal()?.exit_signal {
        let status = signal_exit_status(&signal);
        logger.emit(&format!(
            "Remote command was killed by signal {} (status {}).",
            signal, status
        ));
        return Ok(status);
    }
    Ok(channel.exit_status()?)
}

fn millis(timeout: Duration) -> u32 {
    u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX)
}
