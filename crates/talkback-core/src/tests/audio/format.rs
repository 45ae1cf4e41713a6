use crate::{AudioError, AudioFormat, AudioSpec, decode, encode, transcode};

const SPEC: AudioSpec = AudioSpec::mono(44_100);

fn ramp(len: usize) -> Vec<f32> {
    // Values that survive the i16 round trip exactly.
    (0..len).map(|i| (i as f32 * 256.0) / 32768.0).collect()
}

/// WHAT: WAV encoding round-trips the original sample sequence
/// WHY: This is the conversion path used for non-default requested formats
#[test]
#[allow(clippy::unwrap_used)]
fn given_pcm_samples_when_wav_round_tripping_then_samples_preserved() {
    // Given: A known ramp of quantization-exact samples
    let samples = ramp(512);

    // When: Encoding to WAV and decoding back
    let buffer = encode(&samples, SPEC, AudioFormat::Wav).unwrap();
    let (decoded, sample_rate) = decode(buffer.bytes(), AudioFormat::Wav, SPEC).unwrap();

    // Then: The sequence and the header rate are preserved
    assert_eq!(sample_rate, SPEC.sample_rate);
    assert_eq!(decoded.len(), samples.len());
    for (a, b) in samples.iter().zip(&decoded) {
        assert!((a - b).abs() < 1.0 / 32768.0);
    }
}

/// WHAT: Headerless PCM round-trips through the declared spec
/// WHY: The transcription request path ships raw LINEAR16 frames
#[test]
#[allow(clippy::unwrap_used)]
fn given_pcm_samples_when_pcm_round_tripping_then_samples_preserved() {
    let samples = ramp(100);

    let buffer = encode(&samples, SPEC, AudioFormat::Pcm).unwrap();
    assert_eq!(buffer.len(), samples.len() * 2);

    let (decoded, sample_rate) = decode(buffer.bytes(), AudioFormat::Pcm, SPEC).unwrap();
    assert_eq!(sample_rate, SPEC.sample_rate);
    for (a, b) in samples.iter().zip(&decoded) {
        assert!((a - b).abs() < 1.0 / 32768.0);
    }
}

/// WHAT: Transcoding WAV to PCM drops the header, keeps the frames
/// WHY: audio() serves requested formats from the stored capture
#[test]
#[allow(clippy::unwrap_used)]
fn given_wav_buffer_when_transcoding_to_pcm_then_frames_equal() {
    let samples = ramp(256);
    let wav = encode(&samples, SPEC, AudioFormat::Wav).unwrap();

    let pcm = transcode(&wav, AudioFormat::Pcm).unwrap();

    assert_eq!(pcm.format(), AudioFormat::Pcm);
    assert_eq!(pcm.len(), samples.len() * 2);
}

/// WHAT: Encoding zero samples yields a valid, empty container
/// WHY: Stop with nothing recorded is not an error at this layer
#[test]
#[allow(clippy::unwrap_used)]
fn given_no_samples_when_encoding_wav_then_header_only_buffer() {
    let buffer = encode(&[], SPEC, AudioFormat::Wav).unwrap();

    let (decoded, _) = decode(buffer.bytes(), AudioFormat::Wav, SPEC).unwrap();
    assert!(decoded.is_empty());
}

/// WHAT: MP3 is a decode-only container
/// WHY: No MP3 encoder is carried; requesting it must fail loudly
#[test]
fn given_samples_when_encoding_mp3_then_encoding_error() {
    let result = encode(&ramp(16), SPEC, AudioFormat::Mp3);
    assert!(matches!(result, Err(AudioError::EncodingError { .. })));
}

/// WHAT: Odd-length PCM payloads are rejected
/// WHY: A truncated LINEAR16 stream indicates corruption upstream
#[test]
fn given_odd_byte_count_when_decoding_pcm_then_decoding_error() {
    let result = decode(&[0u8, 1, 2], AudioFormat::Pcm, SPEC);
    assert!(matches!(result, Err(AudioError::DecodingError { .. })));
}

/// WHAT: Garbage MP3 bytes produce a decoding error, not a panic
/// WHY: Synthesis vendors can return malformed bodies
#[test]
fn given_garbage_bytes_when_decoding_mp3_then_decoding_error() {
    let result = decode(&[0u8; 64], AudioFormat::Mp3, SPEC);
    assert!(matches!(result, Err(AudioError::DecodingError { .. })));
}
