use crate::Resampler;

/// WHAT: Halving the rate roughly halves the sample count
/// WHY: Duration must stay proportional after device-rate conversion
#[test]
#[allow(clippy::unwrap_used)]
fn given_double_rate_input_when_resampling_then_length_halves() {
    // Given: One second of a 440Hz tone at 88.2kHz
    let input_rate = 88_200u32;
    let output_rate = 44_100u32;
    let samples: Vec<f32> = (0..input_rate as usize)
        .map(|i| (i as f32 * 440.0 * std::f32::consts::TAU / input_rate as f32).sin() * 0.5)
        .collect();

    // When: Resampling down to the configured rate
    let mut resampler = Resampler::new(input_rate, output_rate).unwrap();
    let output = resampler.resample(&samples).unwrap();

    // Then: The output still spans one second at the new rate
    let expected = samples.len() / 2;
    let tolerance = expected / 100;
    assert!(output.len().abs_diff(expected) <= tolerance);
}

/// WHAT: Empty input yields empty output without touching the FFT
/// WHY: A zero-length capture must survive the conversion path
#[test]
#[allow(clippy::unwrap_used)]
fn given_no_samples_when_resampling_then_empty_output() {
    let mut resampler = Resampler::new(48_000, 44_100).unwrap();
    let output = resampler.resample(&[]).unwrap();
    assert!(output.is_empty());
}

/// WHAT: A partial trailing chunk does not inflate the output
/// WHY: Chunk padding is internal and must be trimmed from the result
#[test]
#[allow(clippy::unwrap_used)]
fn given_partial_chunk_when_resampling_then_padding_trimmed() {
    let samples = vec![0.25f32; 1500];

    let mut resampler = Resampler::new(44_100, 44_100).unwrap();
    let output = resampler.resample(&samples).unwrap();

    assert_eq!(output.len(), samples.len());
}
