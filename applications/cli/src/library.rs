/// Turning command-line locations into catalog tracks
use anyhow::{Context, Result};
use encore_core::Track;
use std::path::Path;

/// Expand locations into tracks
///
/// `*.json` arguments are playlists in the catalog schema (an array of track
/// records); anything else is a single stream URL or path.
pub fn resolve(locations: &[String]) -> Result<Vec<Track>> {
    let mut tracks = Vec::new();
    for location in locations {
        if location.to_ascii_lowercase().ends_with(".json") {
            tracks.extend(load_playlist(Path::new(location))?);
        } else {
            tracks.push(track_from_location(location));
        }
    }
    Ok(tracks)
}

/// Read a JSON playlist; every record must be playable
pub fn load_playlist(path: &Path) -> Result<Vec<Track>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read playlist {}", path.display()))?;
    let tracks: Vec<Track> = serde_json::from_str(&json)
        .with_context(|| format!("Invalid playlist {}", path.display()))?;
    for track in &tracks {
        track
            .validate()
            .with_context(|| format!("Invalid track in {}", path.display()))?;
    }
    Ok(tracks)
}

/// Ad-hoc track for a bare location: the location doubles as its id
pub fn track_from_location(location: &str) -> Track {
    let name = location
        .split(['?', '#'])
        .next()
        .and_then(|path| path.rsplit(['/', '\\']).next())
        .filter(|name| !name.is_empty())
        .unwrap_or(location);
    let title = match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    };
    Track::new(location, title, "Unknown Artist", location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn title_comes_from_file_name() {
        let track = track_from_location("/music/Nova - Night Drive.flac");
        assert_eq!(track.title, "Nova - Night Drive");
        assert_eq!(track.id.as_str(), "/music/Nova - Night Drive.flac");
        assert_eq!(track.stream_url, "/music/Nova - Night Drive.flac");
    }

    #[test]
    fn query_string_is_not_part_of_title() {
        let track = track_from_location("https://cdn.example.com/t/42.mp3?sig=abc");
        assert_eq!(track.title, "42");
    }

    #[test]
    fn playlist_uses_catalog_schema() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"[
                {{"id": "a", "title": "A", "artist": "X", "streamUrl": "https://cdn.example.com/a.mp3"}},
                {{"id": "b", "title": "B", "artist": "Y", "streamUrl": "/music/b.flac", "durationSeconds": 200}}
            ]"#
        )
        .unwrap();

        let location = file.path().to_str().unwrap().to_string();
        let tracks = resolve(&[location, "/music/c.ogg".into()]).unwrap();
        assert_eq!(tracks.len(), 3);
        assert_eq!(tracks[1].duration_seconds, Some(200.0));
        assert_eq!(tracks[2].title, "c");
    }

    #[test]
    fn playlist_with_unplayable_track_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"[{{"id": "a", "title": "A", "artist": "X", "streamUrl": "  "}}]"#
        )
        .unwrap();
        assert!(load_playlist(file.path()).is_err());
    }
}
