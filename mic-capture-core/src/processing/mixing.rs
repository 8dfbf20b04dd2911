//! Pure sample math for overlay mixing. Everything works on `&[f32]`
//! buffers with no platform dependencies.

/// Mix two samples without hard clipping.
///
/// Opposite signs add. Same signs add and then pull back by the product, which
/// keeps the result inside `[-1.0, 1.0]` when both inputs are.
#[inline]
pub fn mix_sample(a: f32, b: f32) -> f32 {
    let sum = a + b;
    let product = a * b;
    if product < 0.0 {
        sum
    } else if a > 0.0 {
        sum - product
    } else {
        sum + product
    }
}

/// Mix `a` and `b` sample by sample into `out`.
///
/// Only the common prefix of the three slices is touched.
pub fn mix(a: &[f32], b: &[f32], out: &mut [f32]) {
    for ((out, &a), &b) in out.iter_mut().zip(a).zip(b) {
        *out = mix_sample(a, b);
    }
}

/// Expand mono audio to `channels` interleaved channels by repeating each
/// sample, `[m0, m1]` → `[m0, m0, m1, m1]` for stereo.
///
/// `dest` is resized to `mono.len() * channels` if needed.
pub fn repeat(mono: &[f32], dest: &mut Vec<f32>, channels: usize) {
    let channels = channels.max(1);
    let len = mono.len() * channels;
    if dest.len() != len {
        dest.resize(len, 0.0);
    }
    for (frame, &sample) in dest.chunks_exact_mut(channels).zip(mono) {
        frame.fill(sample);
    }
}

/// Downmix interleaved multi-channel audio to mono by averaging channels per frame.
pub fn downmix_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let scale = 1.0 / channels as f32;
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect()
}

/// Convert one sample to 16-bit PCM as `round(sample * 32767)`.
///
/// Float-to-int casts saturate, so out-of-range input clamps to the `i16`
/// range.
#[inline]
pub fn to_pcm16(sample: f32) -> i16 {
    (sample * i16::MAX as f32).round() as i16
}

/// Convert f32 samples to 16-bit little-endian PCM bytes, appending to `out`.
pub fn convert_to_int16_pcm(samples: &[f32], out: &mut Vec<u8>) {
    out.reserve(samples.len() * 2);
    for &sample in samples {
        out.extend_from_slice(&to_pcm16(sample).to_le_bytes());
    }
}

/// RMS level of samples (0.0–1.0 for normalized audio).
pub fn rms_level(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Peak absolute level of samples.
pub fn peak_level(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max)
}
