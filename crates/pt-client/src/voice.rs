//! The voice pipeline. Connection bring-up, the receive path (RTP
//! parse -> GSM decode -> speaker-state update -> device enqueue), and
//! the send path (capture thread -> GSM encode -> RTP write), plus the
//! `StreamOps` capability trait mirroring the original client's
//! function-pointer-struct interface to a media stream.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;

use pt_audio::{CaptureDevice, GsmCodec, PlaybackDevice};
use pt_protocol::rtp::RtpPacket;

use crate::room::RoomNotice;
use crate::room::SpeakerTimer;
use crate::error::{Error, Result};

/// Number of raw PCM frames the capture thread batches per RTP datagram
/// (default 4, one RTP datagram carries four 20ms GSM frames).
pub const FRAMES_PER_DATAGRAM: usize = 4;

/// Capability interface a voice stream exposes to the room/session layer,
/// mirroring the original client's `codec.h`/`device.h` function-pointer
/// structs (`init`, `start`, `end`, `read`, `write`, `ack`, cancel, mic
/// request) as a trait instead of raw function pointers.
pub trait StreamOps {
    fn init(&mut self) -> Result<()>;
    fn start(&mut self) -> Result<()>;
    fn end(&mut self) -> Result<()>;
    fn read(&mut self) -> Result<Vec<i16>>;
    fn write(&mut self, pcm: &[i16]) -> Result<()>;
    fn ack(&mut self) -> Result<()>;
    fn cancel_send(&mut self);
    fn cancel_recv(&mut self);
    fn req_mic(&mut self, requested: bool);
}

/// Local state for one room's voice stream: the GSM decoder, the
/// capture/playback audio devices, the speaker timer, and the control
/// flags the capture thread polls, since capture runs on its own OS thread
/// rather than cooperatively inside the event loop.
pub struct VoiceStream {
    pub room_id: u32,
    pub local_uid: u32,
    decoder: GsmCodec,
    playback: PlaybackDevice,
    capture: Option<Arc<CaptureDevice>>,
    capture_handle: Option<thread::JoinHandle<()>>,
    do_write: Arc<AtomicBool>,
    mic_requested: bool,
    pub speaker_timer: SpeakerTimer,
}

impl std::fmt::Debug for VoiceStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceStream")
            .field("room_id", &self.room_id)
            .field("local_uid", &self.local_uid)
            .field("transmitting", &self.is_transmitting())
            .finish()
    }
}

impl VoiceStream {
    pub fn new(room_id: u32, local_uid: u32, playback: PlaybackDevice) -> Self {
        Self {
            room_id,
            local_uid,
            decoder: GsmCodec::new(),
            playback,
            capture: None,
            capture_handle: None,
            do_write: Arc::new(AtomicBool::new(false)),
            mic_requested: false,
            speaker_timer: SpeakerTimer::new(),
        }
    }

    /// `/micon`: spawns the capture-and-encode thread. It loops reading
    /// `FRAMES_PER_DATAGRAM` PCM frames, encodes each with its own GSM
    /// encoder, and pushes the framed RTP bytes onto the returned channel
    /// for the event loop to forward to the media socket. The thread exits
    /// once `stop_transmitting` clears the write flag.
    pub fn start_transmitting(&mut self, capture: CaptureDevice) -> mpsc::UnboundedReceiver<Vec<u8>> {
        let capture = Arc::new(capture);
        self.capture = Some(Arc::clone(&capture));
        self.do_write.store(true, Ordering::SeqCst);

        let flag = Arc::clone(&self.do_write);
        let local_uid = self.local_uid;
        let (tx, rx) = mpsc::unbounded_channel();
        self.capture_handle = Some(thread::spawn(move || capture_loop(capture, local_uid, flag, tx)));
        rx
    }

    /// `/micoff`, or stream teardown: clears the write flag and joins the
    /// capture thread, which observes `do_write == false` on its next loop
    /// iteration and exits.
    pub fn stop_transmitting(&mut self) {
        self.do_write.store(false, Ordering::SeqCst);
        self.capture = None;
        if let Some(handle) = self.capture_handle.take() {
            let _ = handle.join();
        }
    }

    pub fn transmitting_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.do_write)
    }

    pub fn is_transmitting(&self) -> bool {
        self.do_write.load(Ordering::SeqCst)
    }

    /// Receive path: validates and decodes one inbound RTP datagram,
    /// updating speaker state and returning the decoded PCM unless the
    /// packet is malformed or carries the wrong payload type, in which
    /// case it is silently dropped.
    pub fn receive_packet(&mut self, packet: &RtpPacket, now: Instant) -> Result<Option<(Vec<i16>, Vec<crate::room::RoomNotice>)>> {
        if !packet.is_valid_voice_packet() {
            return Ok(None);
        }
        let frames = packet.gsm_frames().map_err(|e| Error::Media(e.to_string()))?;
        let mut pcm = Vec::with_capacity(pt_audio::FRAME_SAMPLES * 4);
        for frame in &frames {
            let decoded = self.decoder.decode(frame).map_err(|e| Error::Media(e.to_string()))?;
            pcm.extend_from_slice(&decoded);
        }
        let notices = self.speaker_timer.observe(packet.ssrc, now);
        Ok(Some((pcm, notices)))
    }

    /// Enqueues decoded PCM to the playback device. Callers skip this
    /// entirely when the room is not the UI host's focused conversation
    /// (discard-after-speaker-update).
    pub fn enqueue_playback(&self, pcm: &[i16]) -> Result<()> {
        use pt_audio::AudioDevice;
        self.playback.write(pcm).map_err(|e| Error::Media(e.to_string()))
    }

    /// `/mute`: toggles the playback device's pause flag without tearing
    /// the socket down.
    pub fn set_muted(&self, muted: bool) {
        use pt_audio::AudioDevice;
        self.playback.pause(muted);
    }

    pub fn mic_requested(&self) -> bool {
        self.mic_requested
    }

    pub fn toggle_mic_request(&mut self) -> bool {
        self.mic_requested = !self.mic_requested;
        self.mic_requested
    }
}

impl StreamOps for VoiceStream {
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        self.do_write.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.stop_transmitting();
        Ok(())
    }

    fn read(&mut self) -> Result<Vec<i16>> {
        use pt_audio::AudioDevice;
        let mut buf = vec![0i16; pt_audio::FRAME_SAMPLES];
        self.capture
            .as_ref()
            .ok_or_else(|| Error::Media("no capture device attached".to_string()))?
            .read(&mut buf)
            .map_err(|e| Error::Media(e.to_string()))?;
        Ok(buf)
    }

    fn write(&mut self, pcm: &[i16]) -> Result<()> {
        self.enqueue_playback(pcm)
    }

    fn ack(&mut self) -> Result<()> {
        Ok(())
    }

    fn cancel_send(&mut self) {
        self.stop_transmitting();
    }

    fn cancel_recv(&mut self) {
        self.speaker_timer = SpeakerTimer::new();
    }

    fn req_mic(&mut self, requested: bool) {
        self.mic_requested = requested;
    }
}

/// The capture thread's loop body: reads four PCM frames from the device,
/// encodes each to GSM, and sends the framed RTP datagram out. Runs on its
/// own OS thread so a blocking device read never stalls the event loop.
fn capture_loop(capture: Arc<CaptureDevice>, local_uid: u32, do_write: Arc<AtomicBool>, sender: mpsc::UnboundedSender<Vec<u8>>) {
    use pt_audio::AudioDevice;

    let mut encoder = GsmCodec::new();
    let mut sequence: u16 = 0;

    while do_write.load(Ordering::SeqCst) {
        let mut frames = [[0u8; 33]; FRAMES_PER_DATAGRAM];
        let mut ok = true;
        for frame in frames.iter_mut() {
            let mut pcm = vec![0i16; pt_audio::FRAME_SAMPLES];
            if capture.read(&mut pcm).is_err() {
                ok = false;
                break;
            }
            match encoder.encode(&pcm) {
                Ok(encoded) => *frame = encoded,
                Err(_) => {
                    ok = false;
                    break;
                }
            }
        }
        if !ok {
            break;
        }

        let timestamp = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as u32).unwrap_or(0);
        let packet = RtpPacket::voice(sequence, timestamp, local_uid, &frames);
        sequence = sequence.wrapping_add(1);
        if sender.send(packet.to_framed_bytes()).is_err() {
            break;
        }
    }
}

/// Builds the 136-byte payload (four encoded GSM frames + 4-byte UID
/// trailer) a capture-thread iteration hands to the RTP writer.
pub fn concatenate_encoded_frames(frames: &[[u8; 33]; FRAMES_PER_DATAGRAM]) -> Vec<u8> {
    let mut out = Vec::with_capacity(33 * FRAMES_PER_DATAGRAM);
    for frame in frames {
        out.extend_from_slice(frame);
    }
    out
}

/// Commands sent to a running voice-stream actor (see [`run_voice_actor`]).
pub enum VoiceCommand {
    StartTransmitting(CaptureDevice),
    StopTransmitting,
    SetMuted(bool),
}

/// A cheap, cloneable reference to a voice-stream actor task, held by
/// `Session` so CLI commands can control a stream without touching its
/// socket or device handles directly.
#[derive(Clone, Debug)]
pub struct VoiceHandle {
    pub room_id: u32,
    control_tx: mpsc::UnboundedSender<VoiceCommand>,
}

impl VoiceHandle {
    pub fn new(room_id: u32, control_tx: mpsc::UnboundedSender<VoiceCommand>) -> Self {
        Self { room_id, control_tx }
    }

    pub fn start_transmitting(&self, capture: CaptureDevice) {
        let _ = self.control_tx.send(VoiceCommand::StartTransmitting(capture));
    }

    pub fn stop_transmitting(&self) {
        let _ = self.control_tx.send(VoiceCommand::StopTransmitting);
    }

    pub fn set_muted(&self, muted: bool) {
        let _ = self.control_tx.send(VoiceCommand::SetMuted(muted));
    }
}

/// Runs one room's voice stream to completion: reads length-prefixed RTP
/// datagrams off `reader` and decodes them to `stream`'s playback device,
/// applies `VoiceCommand`s from `control_rx` (starting/stopping the capture
/// thread, toggling mute), and forwards the capture thread's encoded
/// outbound datagrams to `writer`. Exits when the socket closes or
/// `control_rx` is dropped. Speaker-state changes are reported on
/// `notice_tx` rather than mutating `Session` directly, since this runs on
/// its own task outside the main event loop.
pub async fn run_voice_actor<R, W>(
    mut reader: R,
    mut writer: W,
    mut stream: VoiceStream,
    mut control_rx: mpsc::UnboundedReceiver<VoiceCommand>,
    notice_tx: mpsc::UnboundedSender<RoomNotice>,
) where
    R: AsyncReadExt + Unpin,
    W: AsyncWriteExt + Unpin,
{
    let mut transmit_rx: Option<mpsc::UnboundedReceiver<Vec<u8>>> = None;

    loop {
        let mut len_buf = [0u8; 4];
        tokio::select! {
            read_result = reader.read_exact(&mut len_buf) => {
                if read_result.is_err() {
                    break;
                }
                let len = u32::from_be_bytes(len_buf) as usize;
                let mut body = vec![0u8; len];
                if reader.read_exact(&mut body).await.is_err() {
                    break;
                }
                if let Ok(packet) = RtpPacket::from_bytes(&body) {
                    if let Ok(Some((pcm, notices))) = stream.receive_packet(&packet, Instant::now()) {
                        let _ = stream.enqueue_playback(&pcm);
                        for notice in notices {
                            let _ = notice_tx.send(notice);
                        }
                    }
                }
            }
            cmd = control_rx.recv() => {
                match cmd {
                    Some(VoiceCommand::StartTransmitting(capture)) => {
                        transmit_rx = Some(stream.start_transmitting(capture));
                    }
                    Some(VoiceCommand::StopTransmitting) => {
                        stream.stop_transmitting();
                        transmit_rx = None;
                    }
                    Some(VoiceCommand::SetMuted(muted)) => stream.set_muted(muted),
                    None => break,
                }
            }
            Some(bytes) = recv_transmit(&mut transmit_rx) => {
                if writer.write_all(&bytes).await.is_err() {
                    break;
                }
            }
        }
    }
    stream.stop_transmitting();
}

/// Awaits the transmit channel when one is active, or never resolves
/// otherwise, so the `tokio::select!` branch stays idle without polling.
async fn recv_transmit(rx: &mut Option<mpsc::UnboundedReceiver<Vec<u8>>>) -> Option<Vec<u8>> {
    match rx {
        Some(r) => r.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_stream() -> VoiceStream {
        let playback = PlaybackDevice::open(None).expect("playback device");
        VoiceStream::new(1, 42, playback)
    }

    #[test]
    fn receive_packet_rejects_wrong_payload_type() {
        let mut stream = test_stream();
        let mut packet = RtpPacket::voice(0, 0, 7, &[[0u8; 33]; 4]);
        packet.payload_type = 9;
        let result = stream.receive_packet(&packet, Instant::now()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn receive_packet_updates_speaker_timer() {
        let mut stream = test_stream();
        let packet = RtpPacket::voice(0, 0, 7, &[[0u8; 33]; 4]);
        let now = Instant::now();
        let result = stream.receive_packet(&packet, now).unwrap();
        assert!(result.is_some());
        assert_eq!(stream.speaker_timer.current_speaker(), Some(7));
    }

    #[test]
    fn toggle_mic_request_flips_state() {
        let mut stream = test_stream();
        assert!(!stream.mic_requested());
        assert!(stream.toggle_mic_request());
        assert!(stream.mic_requested());
    }

    #[test]
    fn stop_transmitting_clears_capture_and_flag() {
        let mut stream = test_stream();
        stream.do_write.store(true, Ordering::SeqCst);
        stream.stop_transmitting();
        assert!(!stream.is_transmitting());
        assert!(stream.capture.is_none());
    }

    #[test]
    fn concatenated_payload_is_136_bytes_with_trailer_appended_separately() {
        let frames = [[0xAAu8; 33]; FRAMES_PER_DATAGRAM];
        let payload = concatenate_encoded_frames(&frames);
        assert_eq!(payload.len(), 33 * 4);
    }
}
