//! Mono sample-rate conversion for capture and playback paths.

use crate::{AudioError, CoreResult};

use std::panic::Location;

use audioadapter_buffers::direct::InterleavedSlice;
use error_location::ErrorLocation;
use rubato::{Fft, FixedSync, Resampler as RubatoResampler};

const CHUNK_SIZE: usize = 1024;
const SUB_CHUNKS: usize = 2;

/// FFT resampler bridging a device's native rate and the configured rate.
pub struct Resampler {
    resampler: Fft<f32>,
    input_rate: u32,
    output_rate: u32,
}

impl Resampler {
    /// Build a mono resampler between two rates.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::ResamplingError`] if the rate pair is not
    /// representable.
    #[track_caller]
    pub fn new(input_rate: u32, output_rate: u32) -> CoreResult<Self> {
        let resampler = Fft::<f32>::new(
            input_rate as usize,
            output_rate as usize,
            CHUNK_SIZE,
            SUB_CHUNKS,
            1, // mono
            FixedSync::Input,
        )
        .map_err(|e| AudioError::ResamplingError {
            reason: format!("Failed to create resampler: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        Ok(Self {
            resampler,
            input_rate,
            output_rate,
        })
    }

    /// Convert a full sample sequence, padding the trailing partial chunk
    /// with silence.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::ResamplingError`] if processing fails.
    #[track_caller]
    pub fn resample(&mut self, samples: &[f32]) -> CoreResult<Vec<f32>> {
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        let estimated_len =
            (samples.len() as f64 * f64::from(self.output_rate) / f64::from(self.input_rate))
                as usize;
        let mut output = Vec::with_capacity(estimated_len);

        for chunk in samples.chunks(CHUNK_SIZE) {
            let mut padded;
            let input_chunk = if chunk.len() < CHUNK_SIZE {
                padded = chunk.to_vec();
                padded.resize(CHUNK_SIZE, 0.0);
                &padded[..]
            } else {
                chunk
            };

            let input_adapter = InterleavedSlice::new(input_chunk, 1, CHUNK_SIZE).map_err(|e| {
                AudioError::ResamplingError {
                    reason: format!("Failed to create input adapter: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                }
            })?;

            let max_frames = self.resampler.output_frames_max();
            let mut output_chunk = vec![0.0f32; max_frames];

            let mut output_adapter = InterleavedSlice::new_mut(&mut output_chunk, 1, max_frames)
                .map_err(|e| AudioError::ResamplingError {
                    reason: format!("Failed to create output adapter: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?;

            let (_consumed, written) = self
                .resampler
                .process_into_buffer(&input_adapter, &mut output_adapter, None)
                .map_err(|e| AudioError::ResamplingError {
                    reason: format!("Resampling failed: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?;

            output.extend_from_slice(&output_chunk[..written]);
        }

        // Trim the padding's contribution so duration stays proportional.
        output.truncate(estimated_len);

        Ok(output)
    }
}
