/// Session tuning parameters shared by the queue, playback and clip stages.
#[derive(Clone, Debug)]
pub struct PlaybackConfig {
    /// Resampler chunk size in frames for the declaration clip.
    pub chunk_frames: usize,
    /// Max frames pulled per output callback refill.
    pub refill_max_frames: usize,
    /// Capacity of the scheduled-audio queue in seconds.
    pub buffer_seconds: f32,
}

impl Default for PlaybackConfig {
    /// Room for a long spoken clip plus a few queued bursts.
    fn default() -> Self {
        Self {
            chunk_frames: 1024,
            refill_max_frames: 4096,
            buffer_seconds: 30.0,
        }
    }
}
