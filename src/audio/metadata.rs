use std::io::Cursor;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use crate::{LibraryError, MediaInfo, Result};

/// Extensions recognized as samples, lowercase.
pub const AUDIO_EXTENSIONS: &[&str] = &[
    "aiff", "ds", "dwp", "flac", "mp3", "ogg", "sf2", "speech", "syn", "xi", "wav",
];

/// Extensions symphonia has a demuxer for. The rest are listed and imported
/// with [`MediaInfo::unknown`].
pub const DECODABLE_EXTENSIONS: &[&str] = &["aiff", "flac", "mp3", "ogg", "wav"];

/// Extension of the sidecar metadata file next to every sample.
pub const METADATA_EXTENSION: &str = "json";

pub fn is_audio_extension(extension: &str) -> bool {
    let extension = extension.to_ascii_lowercase();
    AUDIO_EXTENSIONS.contains(&extension.as_str())
}

pub fn is_decodable_extension(extension: &str) -> bool {
    let extension = extension.to_ascii_lowercase();
    DECODABLE_EXTENSIONS.contains(&extension.as_str())
}

pub fn mime_for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "flac" => "audio/flac",
        "ogg" => "audio/ogg",
        "aiff" => "audio/aiff",
        _ => "application/octet-stream",
    }
}

pub struct MetadataExtractor;

impl MetadataExtractor {
    /// Probes type, duration and sample rate from in-memory bytes.
    pub fn probe(bytes: &[u8], extension: &str) -> Result<MediaInfo> {
        let source = Cursor::new(bytes.to_vec());
        let mss = MediaSourceStream::new(Box::new(source), Default::default());

        // Create hint to help with format detection
        let mut hint = Hint::new();
        hint.with_extension(extension);

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| LibraryError::Metadata(e.to_string()))?;

        let format = probed.format;
        let track = format
            .default_track()
            .ok_or_else(|| LibraryError::Metadata("No audio track".into()))?;
        let params = &track.codec_params;

        let sample_rate = params.sample_rate.unwrap_or(0);
        let duration = match (params.time_base, params.n_frames) {
            (Some(time_base), Some(n_frames)) => {
                let time = time_base.calc_time(n_frames);
                time.seconds as f64 + time.frac
            }
            (None, Some(n_frames)) if sample_rate > 0 => n_frames as f64 / sample_rate as f64,
            _ => 0.0,
        };

        Ok(MediaInfo {
            media_type: mime_for_extension(extension).to_string(),
            duration,
            sample_rate,
            bit_rate: bit_rate_kbps(bytes.len() as u64, duration),
        })
    }

    /// Like [`probe`](Self::probe) but runs on the blocking pool.
    pub async fn probe_owned(bytes: Vec<u8>, extension: String) -> Result<MediaInfo> {
        tokio::task::spawn_blocking(move || Self::probe(&bytes, &extension))
            .await
            .map_err(|e| LibraryError::Metadata(e.to_string()))?
    }
}

/// `size_bits / duration / 1000`, zero when the duration is unknown.
pub fn bit_rate_kbps(size_bytes: u64, duration_secs: f64) -> f64 {
    if duration_secs > 0.0 {
        (size_bytes * 8) as f64 / duration_secs / 1000.0
    } else {
        0.0
    }
}
