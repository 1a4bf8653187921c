// Copyright (c) 2024-2026, Daily
// SPDX-License-Identifier: BSD-2-Clause

//! WAV container for raw PCM audio attached to a conversation.

/// Size of the canonical PCM WAV header.
pub const WAV_HEADER_LEN: usize = 44;

/// Build the 44-byte RIFF header for `data_len` bytes of PCM.
pub fn create_wav_header(
    sample_rate: u32,
    num_channels: u16,
    bits_per_sample: u16,
    data_len: usize,
) -> [u8; WAV_HEADER_LEN] {
    let byte_rate = sample_rate * u32::from(num_channels) * u32::from(bits_per_sample) / 8;
    let block_align = num_channels * bits_per_sample / 8;
    let data_size = data_len.min((u32::MAX - 36) as usize) as u32;

    let mut header = [0u8; WAV_HEADER_LEN];
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&(36 + data_size).to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    // 1 = integer PCM
    header[20..22].copy_from_slice(&1u16.to_le_bytes());
    header[22..24].copy_from_slice(&num_channels.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&bits_per_sample.to_le_bytes());
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());
    header
}

/// Wrap 16-bit little-endian PCM in a WAV container.
pub fn encode_pcm16_wav(pcm: &[u8], sample_rate: u32, num_channels: u16) -> Vec<u8> {
    let mut wav = Vec::with_capacity(WAV_HEADER_LEN + pcm.len());
    wav.extend_from_slice(&create_wav_header(sample_rate, num_channels, 16, pcm.len()));
    wav.extend_from_slice(pcm);
    wav
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ])
    }

    #[test]
    fn test_header_fields_mono_16k() {
        let header = create_wav_header(16000, 1, 16, 3200);
        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(u32_at(&header, 4), 36 + 3200);
        assert_eq!(&header[8..16], b"WAVEfmt ");
        assert_eq!(u32_at(&header, 24), 16000);
        // byte rate
        assert_eq!(u32_at(&header, 28), 32000);
        assert_eq!(u16::from_le_bytes([header[32], header[33]]), 2);
        assert_eq!(&header[36..40], b"data");
        assert_eq!(u32_at(&header, 40), 3200);
    }

    #[test]
    fn test_encode_pcm16_wav_stereo() {
        let pcm = vec![1u8; 8];
        let wav = encode_pcm16_wav(&pcm, 24000, 2);
        assert_eq!(wav.len(), WAV_HEADER_LEN + 8);
        assert_eq!(u16::from_le_bytes([wav[22], wav[23]]), 2);
        assert_eq!(u16::from_le_bytes([wav[32], wav[33]]), 4);
        assert_eq!(&wav[WAV_HEADER_LEN..], pcm.as_slice());
    }
}
