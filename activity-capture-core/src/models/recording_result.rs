use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Kind of stream inside the encoded container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
    Video,
    Audio,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaTrack {
    #[serde(rename = "type")]
    pub track_type: TrackType,
    pub codec: String,
}

/// Result returned when a session is encoded successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    pub file_path: PathBuf,
    pub duration_secs: f64,
    pub frame_count: usize,
    pub has_audio: bool,
    pub checksum: String,
    pub metadata: RecordingMetadata,
}

/// Metadata written as a JSON sidecar next to the encoded video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub created_at: String,
    pub started_at: String,
    /// Wall-clock length of the session. Playback length is `frame_count / fps`
    /// and is not reconciled with the audio track.
    pub duration_secs: f64,
    pub file_path: String,
    pub checksum: String,
    pub frame_count: usize,
    pub fps: f64,
    pub width: u32,
    pub height: u32,
    pub tracks: Vec<MediaTrack>,
}

impl RecordingMetadata {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        started_at: &str,
        duration_secs: f64,
        file_path: &str,
        checksum: &str,
        frame_count: usize,
        fps: f64,
        dimensions: (u32, u32),
        video_codec: &str,
        audio_codec: Option<&str>,
    ) -> Self {
        let mut tracks = vec![MediaTrack {
            track_type: TrackType::Video,
            codec: video_codec.to_string(),
        }];
        if let Some(codec) = audio_codec {
            tracks.push(MediaTrack {
                track_type: TrackType::Audio,
                codec: codec.to_string(),
            });
        }

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Local::now().to_rfc3339(),
            started_at: started_at.to_string(),
            duration_secs,
            file_path: file_path.to_string(),
            checksum: checksum.to_string(),
            frame_count,
            fps,
            width: dimensions.0,
            height: dimensions.1,
            tracks,
        }
    }

    pub fn has_audio(&self) -> bool {
        self.tracks.iter().any(|t| t.track_type == TrackType::Audio)
    }
}
