// WAV muxer
// Canonical 44-byte RIFF header followed by interleaved 16-bit PCM

/// Size of the canonical RIFF/WAVE/fmt/data header
pub const WAV_HEADER_LEN: usize = 44;

const BITS_PER_SAMPLE: u16 = 16;
const BYTES_PER_SAMPLE: usize = 2;
const PCM_FORMAT_TAG: u16 = 1;

/// Convert a float sample to 16-bit PCM
///
/// Clipped to [-1, 1]; negative values scale by 32768, the rest by 32767.
pub fn to_pcm16(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Encode channel-separated audio as a 16-bit PCM WAV byte stream
///
/// Channels shorter than the longest are padded with silence. The header
/// declares `sample_rate` as given; no resampling happens here.
pub fn encode_wav(channels: &[Vec<f32>], sample_rate: u32) -> Vec<u8> {
    let channel_count = channels.len();
    let frames = channels.iter().map(Vec::len).max().unwrap_or(0);

    let block_align = channel_count * BYTES_PER_SAMPLE;
    let data_len = frames * block_align;
    let byte_rate = sample_rate as usize * block_align;

    let mut out = Vec::with_capacity(WAV_HEADER_LEN + data_len);

    // RIFF chunk
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&((36 + data_len) as u32).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    // fmt chunk
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&PCM_FORMAT_TAG.to_le_bytes());
    out.extend_from_slice(&(channel_count as u16).to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(byte_rate as u32).to_le_bytes());
    out.extend_from_slice(&(block_align as u16).to_le_bytes());
    out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    // data chunk
    out.extend_from_slice(b"data");
    out.extend_from_slice(&(data_len as u32).to_le_bytes());

    for frame in 0..frames {
        for channel in channels {
            let sample = channel.get(frame).copied().unwrap_or(0.0);
            out.extend_from_slice(&to_pcm16(sample).to_le_bytes());
        }
    }

    out
}
