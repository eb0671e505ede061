use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{error, info, warn};

use pt_client::bootstrap::{parse_host_port, BootstrapFetcher, HttpBootstrapFetcher};
use pt_client::config::{AccountCache, AccountConfig};
use pt_client::engine::{self, Event};
use pt_client::net;
use pt_client::session::Session;
use pt_client::voice::{run_voice_actor, VoiceHandle};
use pt_client::xfer;
use pt_protocol::frame::{try_decode_frame, Frame};

#[derive(Parser)]
#[command(name = "pt-cli", about = "Terminal front-end for the chat/room/voice client")]
struct Args {
    /// Path to the account configuration file (TOML).
    #[arg(short, long)]
    config: PathBuf,
}

mod commands;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "pt_cli=info".into()),
        )
        .init();

    let args = Args::parse();
    let account = AccountConfig::load(&args.config).context("failed to load account config")?;

    info!(username = %account.username, "pt-cli starting");

    let fetcher = HttpBootstrapFetcher::new();
    let bootstrap_body = fetcher.fetch(&account.bootstrap_url).context("bootstrap fetch failed")?;
    let (host, port) = parse_host_port(&bootstrap_body)?;
    info!(%host, port, "resolved login server");

    let stream = net::connect(&host, port, account.proxy.as_deref()).await.context("connect failed")?;
    let (mut reader_half, mut writer_half) = stream.into_split();

    let mut session = Session::new();
    if let Some(cache) = AccountCache::load_for(&account.username) {
        session.local_uid = Some(cache.uid);
        session.local_nickname = Some(cache.nickname);
    }

    let mut buf = bytes::BytesMut::with_capacity(4096);
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            read_result = read_more(&mut reader_half, &mut buf) => {
                match read_result {
                    Ok(0) => {
                        warn!("control socket closed");
                        break;
                    }
                    Ok(_) => {
                        while let Some(frame) = try_decode_frame(&mut buf)? {
                            handle_frame(&mut session, &frame, &account, &mut writer_half).await?;
                        }
                    }
                    Err(e) => {
                        error!("transport error: {e}");
                        break;
                    }
                }
            }
            line = stdin.next_line() => {
                match line? {
                    Some(line) => commands::handle_input_line(&mut session, &line, &mut writer_half).await?,
                    None => break,
                }
            }
        }
    }

    if let Some(uid) = session.local_uid {
        let cache = AccountCache { uid, nickname: session.local_nickname.clone().unwrap_or_default() };
        let _ = cache.save_for(&account.username);
    }

    Ok(())
}

async fn read_more<R: AsyncReadExt + Unpin>(reader: &mut R, buf: &mut bytes::BytesMut) -> std::io::Result<usize> {
    let mut scratch = [0u8; 4096];
    let n = reader.read(&mut scratch).await?;
    buf.extend_from_slice(&scratch[..n]);
    Ok(n)
}

async fn handle_frame<W: AsyncWriteExt + Unpin>(
    session: &mut Session,
    frame: &Frame,
    account: &AccountConfig,
    writer: &mut W,
) -> Result<()> {
    let events = engine::dispatch_frame(session, frame);
    for event in events {
        match event {
            Event::NeedUin => {
                send_frame(writer, &engine::build_get_uin(&account.username)).await?;
            }
            Event::ReadyForLymerick => {
                send_frame(writer, &engine::build_lymerick(session)).await?;
            }
            Event::ServerKeyReceived => {
                send_frame(writer, &engine::build_login(session, &account.password, "127.0.0.1")).await?;
            }
            Event::HandshakeAdvance => {
                send_frame(writer, &engine::build_checksums(session)).await?;
                send_frame(writer, &engine::build_versions(session, "00:00:00:00:00:00")).await?;
                send_frame(writer, &engine::build_uin_fontdepth(session)).await?;
                send_frame(writer, &engine::build_version_info()).await?;
            }
            Event::LoginComplete { uid, nickname } => {
                info!(uid, %nickname, "logged in");
            }
            Event::ImReceived { from_uid, body, .. } => {
                println!("[{from_uid}] {body}");
            }
            Event::RoomJoined { room_id } => {
                info!(room_id, "joined room");
            }
            Event::RoomClosed { room_id } => {
                info!(room_id, "room closed");
            }
            Event::CategoriesReceived(n) => info!(count = n, "received categories"),
            Event::RoomListReceived(n) => info!(count = n, "received room list"),
            Event::SearchResultsReceived(n) => info!(count = n, "received search results"),
            Event::Notice(notice) => info!(?notice, "room notice"),
            Event::SendFrame(frame) => {
                send_frame(writer, &frame).await?;
            }
            Event::MediaServerReady { room_id, host, port } => {
                match open_voice_stream(session, room_id, &host, port).await {
                    Ok(()) => info!(room_id, %host, port, "voice stream connected"),
                    Err(e) => warn!(room_id, %host, port, "voice stream connect failed: {e}"),
                }
            }
            Event::FileTransferRequested { transfer_id, peer_uid, nickname, filename, size } => {
                info!(transfer_id, peer_uid, %nickname, %filename, size, "incoming file transfer request");
            }
            Event::FileTransferRefused { transfer_id } => {
                warn!(transfer_id, "file transfer refused");
            }
            Event::FileTransferAccepted { transfer_id, host, port } => {
                if let Some(transfer) = session.transfers.get(&transfer_id).cloned() {
                    let local_uid = session.local_uid.unwrap_or(0);
                    let local_nick = session.local_nickname.clone().unwrap_or_default();
                    tokio::spawn(async move {
                        if let Err(e) =
                            drive_outbound_transfer(&host, port, local_uid, &local_nick, transfer_id, &transfer).await
                        {
                            error!(transfer_id, "outbound transfer failed: {e}");
                        }
                    });
                }
            }
            Event::FileTransferError { transfer_id, message } => {
                error!(transfer_id, %message, "file transfer error");
            }
            Event::Unhandled(opcode) => {
                tracing::debug!(opcode, "unhandled opcode");
            }
        }
    }
    Ok(())
}

/// Opens the voice-stream TCP connection for a room once
/// `Event::MediaServerReady` fires, spawning the actor task that owns both
/// socket halves and the `VoiceStream` for its lifetime.
async fn open_voice_stream(session: &mut Session, room_id: u32, host: &str, port: u16) -> Result<()> {
    let stream = net::connect(host, port, None).await?;
    let (reader, writer) = stream.into_split();
    let playback = pt_audio::PlaybackDevice::open(None).context("open playback device")?;
    let local_uid = session.local_uid.unwrap_or(0);
    let voice_stream = pt_client::voice::VoiceStream::new(room_id, local_uid, playback);

    let (control_tx, control_rx) = tokio::sync::mpsc::unbounded_channel();
    let (notice_tx, mut notice_rx) = tokio::sync::mpsc::unbounded_channel();

    tokio::spawn(run_voice_actor(reader, writer, voice_stream, control_rx, notice_tx));
    tokio::spawn(async move {
        while let Some(notice) = notice_rx.recv().await {
            info!(?notice, "voice room notice");
        }
    });

    session.voice_handles.insert(room_id, VoiceHandle::new(room_id, control_tx));
    Ok(())
}

/// Dials the peer's file-transfer socket after `FILE_XFER_ACCEPTED`, runs
/// the text handshake, then streams the file's bytes. Used for transfers
/// this client initiated, mirroring the original's `pt_xfer_connect`.
async fn drive_outbound_transfer(
    host: &str,
    port: u16,
    local_uid: u32,
    local_nick: &str,
    transfer_id: u32,
    transfer: &pt_client::session::FileTransfer,
) -> Result<()> {
    let stream = net::connect(host, port, None).await?;
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    let mut handshake = xfer::TransferHandshake::new(local_uid, transfer_id);
    let banner = lines.next_line().await?.context("connection closed before banner")?;
    let intro = handshake.on_connect_banner(&format!("{banner}\n"))?;
    writer.write_all(intro.as_bytes()).await?;

    let auth = lines.next_line().await?.context("connection closed before auth")?;
    handshake.on_auth_line(&format!("{auth}\n"))?;

    let remote_name = std::path::Path::new(&transfer.filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| transfer.filename.clone());
    let send_line = xfer::build_send_line(local_uid, transfer.peer_uid, local_nick, transfer.size, &remote_name);
    writer.write_all(send_line.as_bytes()).await?;

    let mut file = tokio::fs::File::open(&transfer.filename).await?;
    tokio::io::copy(&mut file, &mut writer).await?;
    Ok(())
}

async fn send_frame<W: AsyncWriteExt + Unpin>(writer: &mut W, frame: &Frame) -> Result<()> {
    let bytes = frame.to_bytes()?;
    writer.write_all(&bytes).await?;
    Ok(())
}
