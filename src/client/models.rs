//! Jukebox service request/response models.

use serde::{Deserialize, Deserializer, Serialize};

/// Response envelope shared by every endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceResponse<T> {
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(flatten)]
    pub data: Option<T>,
}

impl<T> ServiceResponse<T> {
    /// Whether the service reported success.
    pub fn is_ok(&self) -> bool {
        self.status == "OK"
    }
}

/// Body of replies that carry nothing beyond the status.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ack {}

// ============================================================================
// Library tree
// ============================================================================

/// A directory in the music library.
///
/// `rel` is the slash-joined path from the library root. The root itself has
/// no `rel`; the service sends it as an empty string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub rel: Option<String>,
    #[serde(default)]
    pub dirs: Vec<TreeNode>,
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

impl TreeNode {
    /// An empty root, used when no library could be loaded.
    #[allow(dead_code)]
    pub fn empty_root() -> Self {
        Self::default()
    }

    /// Whether this node is the library root.
    #[allow(dead_code)]
    pub fn is_root(&self) -> bool {
        self.rel.is_none()
    }

    /// Whether the node has neither files nor subdirectories.
    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty() && self.files.is_empty()
    }

    /// Total number of files beneath this node.
    pub fn file_count(&self) -> usize {
        self.files.len() + self.dirs.iter().map(TreeNode::file_count).sum::<usize>()
    }
}

/// A playable track. `rel` identifies it both in play commands and in the
/// service's now-playing report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub rel: String,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// Library payload handed to the client at startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BootData {
    #[serde(default)]
    pub tree: TreeNode,
    #[serde(rename = "musicDir", default)]
    pub music_dir: String,
}

impl BootData {
    /// Parse a boot payload, falling back to an empty library on malformed input.
    pub fn parse(text: &str) -> Self {
        match serde_json::from_str(text) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Boot data parse error, using an empty library: {}", e);
                Self::default()
            }
        }
    }
}

/// Response for the `/tree` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeResponse {
    #[serde(default)]
    pub tree: TreeNode,
}

// ============================================================================
// Playback
// ============================================================================

/// Authoritative playback state as reported by `/status`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlaybackStatus {
    #[serde(default)]
    pub playing: Option<PlayingTrack>,
    #[serde(default)]
    pub mpv: Option<MpvState>,
}

impl PlaybackStatus {
    /// The `rel` of the current track, if anything is playing.
    pub fn current_rel(&self) -> Option<&str> {
        self.playing
            .as_ref()
            .map(|p| p.rel.as_str())
            .filter(|rel| !rel.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlayingTrack {
    #[serde(default)]
    pub rel: String,
}

/// Player properties read from mpv.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MpvState {
    #[serde(default)]
    pub time: Option<f64>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub volume: Option<f64>,
}

/// Response for `/volume` without a value.
#[derive(Debug, Clone, Deserialize)]
pub struct VolumeResponse {
    pub volume: f64,
}

/// Response for `/shuffle`.
#[derive(Debug, Clone, Deserialize)]
pub struct ShuffleResponse {
    pub shuffle: bool,
}

/// Convert a service volume reading into the 0-100 range.
pub fn volume_percent(value: f64) -> u8 {
    if value.is_finite() {
        value.round().clamp(0.0, 100.0) as u8
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_rel_empty_string_is_none() {
        let json = r#"{"name":"Music","rel":"","dirs":[{"name":"A","rel":"A","dirs":[],"files":[{"name":"b.mp3","rel":"A/b.mp3"}]}],"files":[]}"#;
        let tree: TreeNode = serde_json::from_str(json).unwrap();

        assert!(tree.is_root());
        assert_eq!(tree.dirs[0].rel.as_deref(), Some("A"));
        assert_eq!(tree.file_count(), 1);
    }

    #[test]
    fn test_boot_data_parse_failure_falls_back() {
        let boot = BootData::parse("{not json");
        assert!(boot.tree.is_empty());
        assert!(boot.music_dir.is_empty());
    }

    #[test]
    fn test_boot_data_music_dir() {
        let boot = BootData::parse(r#"{"tree":{"name":"x","files":[]},"musicDir":"Z:\\"}"#);
        assert_eq!(boot.music_dir, "Z:\\");
    }

    #[test]
    fn test_status_with_track() {
        let json = r#"{"status":"OK","playing":{"rel":"A/b.mp3"},"mpv":{"time":30,"duration":120,"paused":false,"volume":50}}"#;
        let parsed: ServiceResponse<PlaybackStatus> = serde_json::from_str(json).unwrap();

        assert!(parsed.is_ok());
        let status = parsed.data.unwrap();
        assert_eq!(status.current_rel(), Some("A/b.mp3"));
        let mpv = status.mpv.unwrap();
        assert_eq!(mpv.time, Some(30.0));
        assert_eq!(mpv.volume, Some(50.0));
    }

    #[test]
    fn test_status_nothing_playing() {
        let json = r#"{"status":"OK","playing":null,"mpv":null}"#;
        let parsed: ServiceResponse<PlaybackStatus> = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.data.unwrap().current_rel(), None);

        let json = r#"{"status":"OK","playing":{"rel":""}}"#;
        let parsed: ServiceResponse<PlaybackStatus> = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.data.unwrap().current_rel(), None);
    }

    #[test]
    fn test_error_envelope() {
        let json = r#"{"status":"ERROR","error":"missing path"}"#;
        let parsed: ServiceResponse<Ack> = serde_json::from_str(json).unwrap();
        assert!(!parsed.is_ok());
        assert_eq!(parsed.error.as_deref(), Some("missing path"));
    }

    #[test]
    fn test_volume_percent_clamps() {
        assert_eq!(volume_percent(49.6), 50);
        assert_eq!(volume_percent(130.0), 100);
        assert_eq!(volume_percent(-3.0), 0);
        assert_eq!(volume_percent(f64::NAN), 0);
    }
}
