//! Audio buffers and container formats.
//!
//! A capture or synthesis response produces one immutable [`AudioBuffer`]:
//! a byte payload plus the [`AudioSpec`] describing its sample encoding and
//! an [`AudioFormat`] container tag. Conversion between containers is a pure
//! function of the already-captured data.

use crate::{AudioError, CoreResult};

use std::{io::Cursor, panic::Location};

use error_location::ErrorLocation;
use tracing::debug;

/// Sample encoding descriptor: channel count, sample rate, bit depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSpec {
    /// Interleaved channel count.
    pub channels: u16,
    /// Samples per second, per channel.
    pub sample_rate: u32,
    /// Bits per encoded sample (LINEAR16 throughout this crate).
    pub bits_per_sample: u16,
}

impl AudioSpec {
    /// Mono LINEAR16 at the given rate, the capture default.
    #[must_use]
    pub const fn mono(sample_rate: u32) -> Self {
        Self {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
        }
    }
}

/// Container format tag.
///
/// `Wav` and `Pcm` round-trip through [`encode`]/[`decode`]. `Mp3` is
/// decode-only — TTS vendors return MP3, but no encoder is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    /// RIFF waveform with header.
    Wav,
    /// Headerless little-endian LINEAR16 frames.
    Pcm,
    /// MPEG layer 3 (decode only).
    Mp3,
}

/// Immutable audio payload plus its encoding descriptor.
///
/// Produced once per successful capture or synthesis response and never
/// mutated afterwards; ownership moves to whichever component consumes it
/// next.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    bytes: Vec<u8>,
    spec: AudioSpec,
    format: AudioFormat,
}

impl AudioBuffer {
    /// Wrap already-encoded bytes.
    #[must_use]
    pub const fn new(bytes: Vec<u8>, spec: AudioSpec, format: AudioFormat) -> Self {
        Self {
            bytes,
            spec,
            format,
        }
    }

    /// Encoded payload.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the buffer, yielding the payload.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Sample encoding descriptor.
    #[must_use]
    pub const fn spec(&self) -> AudioSpec {
        self.spec
    }

    /// Container tag.
    #[must_use]
    pub const fn format(&self) -> AudioFormat {
        self.format
    }

    /// Payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Encode f32 samples in `[-1.0, 1.0]` into the requested container.
///
/// A zero-length sample slice yields a technically valid, empty buffer
/// (header only for WAV); rejecting silence is the transcriber's job.
///
/// # Errors
///
/// Returns [`AudioError::EncodingError`] if the container cannot be written,
/// or for `Mp3` (no encoder in the stack).
#[track_caller]
pub fn encode(samples: &[f32], spec: AudioSpec, format: AudioFormat) -> CoreResult<AudioBuffer> {
    let bytes = match format {
        AudioFormat::Wav => encode_wav(samples, spec)?,
        AudioFormat::Pcm => samples
            .iter()
            .flat_map(|&s| sample_to_i16(s).to_le_bytes())
            .collect(),
        AudioFormat::Mp3 => {
            return Err(AudioError::EncodingError {
                reason: "MP3 encoding is not supported".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
    };

    debug!(
        sample_count = samples.len(),
        byte_count = bytes.len(),
        format = ?format,
        "encoded audio buffer"
    );

    Ok(AudioBuffer::new(bytes, spec, format))
}

/// Decode container bytes back into f32 samples and their sample rate.
///
/// WAV and MP3 carry their own encoding; `pcm_spec` describes headerless
/// PCM payloads. Stereo MP3 is downmixed to mono by channel averaging.
///
/// # Errors
///
/// Returns [`AudioError::DecodingError`] for malformed payloads.
#[track_caller]
pub fn decode(bytes: &[u8], format: AudioFormat, pcm_spec: AudioSpec) -> CoreResult<(Vec<f32>, u32)> {
    match format {
        AudioFormat::Wav => decode_wav(bytes),
        AudioFormat::Pcm => {
            if bytes.len() % 2 != 0 {
                return Err(AudioError::DecodingError {
                    reason: "PCM payload has a trailing odd byte".to_string(),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            let samples = bytes
                .chunks_exact(2)
                .map(|pair| f32::from(i16::from_le_bytes([pair[0], pair[1]])) / 32768.0)
                .collect();
            Ok((samples, pcm_spec.sample_rate))
        }
        AudioFormat::Mp3 => decode_mp3(bytes),
    }
}

/// Re-encode a buffer into another container without re-recording.
///
/// # Errors
///
/// Returns an error if decoding the source or encoding the target fails.
#[track_caller]
pub fn transcode(buffer: &AudioBuffer, format: AudioFormat) -> CoreResult<AudioBuffer> {
    if buffer.format() == format {
        return Ok(buffer.clone());
    }

    let (samples, sample_rate) = decode(buffer.bytes(), buffer.format(), buffer.spec())?;
    let spec = AudioSpec {
        sample_rate,
        ..buffer.spec()
    };
    encode(&samples, spec, format)
}

fn encode_wav(samples: &[f32], spec: AudioSpec) -> CoreResult<Vec<u8>> {
    let wav_spec = hound::WavSpec {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, wav_spec).map_err(|e| {
            AudioError::EncodingError {
                reason: format!("failed to open WAV writer: {}", e),
                location: ErrorLocation::from(Location::caller()),
            }
        })?;

        for &sample in samples {
            writer
                .write_sample(sample_to_i16(sample))
                .map_err(|e| AudioError::EncodingError {
                    reason: format!("failed to write WAV sample: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?;
        }

        writer.finalize().map_err(|e| AudioError::EncodingError {
            reason: format!("failed to finalize WAV header: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;
    }

    Ok(cursor.into_inner())
}

fn decode_wav(bytes: &[u8]) -> CoreResult<(Vec<f32>, u32)> {
    let mut reader =
        hound::WavReader::new(Cursor::new(bytes)).map_err(|e| AudioError::DecodingError {
            reason: format!("failed to parse WAV header: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

    let sample_rate = reader.spec().sample_rate;
    let samples = reader
        .samples::<i16>()
        .map(|s| {
            s.map(|v| f32::from(v) / 32768.0)
                .map_err(|e| AudioError::DecodingError {
                    reason: format!("failed to read WAV sample: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })
        })
        .collect::<CoreResult<Vec<f32>>>()?;

    Ok((samples, sample_rate))
}

fn decode_mp3(bytes: &[u8]) -> CoreResult<(Vec<f32>, u32)> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(bytes));
    let mut samples = Vec::new();
    let mut sample_rate = 0u32;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                if sample_rate == 0 {
                    sample_rate = frame.sample_rate.unsigned_abs();
                }

                if frame.channels == 2 {
                    // Downmix by averaging the channel pair.
                    samples.extend(frame.data.chunks_exact(2).map(|pair| {
                        (f32::from(pair[0]) + f32::from(pair[1])) / 2.0 / 32768.0
                    }));
                } else {
                    samples.extend(frame.data.iter().map(|&s| f32::from(s) / 32768.0));
                }
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => {
                return Err(AudioError::DecodingError {
                    reason: format!("MP3 decode failed: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }
    }

    if sample_rate == 0 {
        return Err(AudioError::DecodingError {
            reason: "MP3 payload contained no frames".to_string(),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    Ok((samples, sample_rate))
}

pub(crate) fn sample_to_i16(sample: f32) -> i16 {
    #[allow(clippy::cast_possible_truncation)]
    let clamped = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
    clamped
}
