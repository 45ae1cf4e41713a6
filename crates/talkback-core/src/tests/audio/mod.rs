mod capture;
mod format;
mod playback;
mod resampler;
