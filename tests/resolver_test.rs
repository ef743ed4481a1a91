//! Media source resolver tests
//!
//! Classification of miracles and episodes into audio, video or
//! artwork-only items, and link normalization on the way.

use stillpoint::models::{EntityId, Episode, MediaType, Meditation, Miracle};
use stillpoint::playback::{
    normalize_link, youtube_embed_url, youtube_id, MediaKind, MediaSource, PlayableItem,
};

const SHARE_LINK: &str =
    "https://drive.google.com/file/d/1AbCdEfGhIjKlMnOpQrStUvWxYz012345/view?usp=sharing";
const DIRECT_LINK: &str =
    "https://docs.google.com/uc?export=download&id=1AbCdEfGhIjKlMnOpQrStUvWxYz012345";

fn miracle(audio: Option<&str>, youtube: Option<&str>) -> Miracle {
    Miracle {
        id: EntityId::Int(1),
        title: "Journey to Inner Peace".into(),
        artist: "Priya S".into(),
        quote: "Calmness in our conversations".into(),
        image: SHARE_LINK.into(),
        audio: audio.map(String::from),
        youtube_link: youtube.map(String::from),
    }
}

fn episode(media_type: MediaType, media_url: &str, image: Option<&str>) -> Episode {
    Episode {
        id: EntityId::Int(7),
        meditation_id: EntityId::Int(1),
        title: "Breath practice".into(),
        description: "Audio-only session".into(),
        image: image.map(String::from),
        media_type,
        media_url: media_url.into(),
        duration: "15:00".into(),
    }
}

fn meditation() -> Meditation {
    Meditation {
        id: EntityId::Int(1),
        title: "Chit Shakti for success".into(),
        description: String::new(),
        image: "./Meditation/meditation-1.png".into(),
        duration: "15 Mins".into(),
    }
}

// =============================================================================
// Link normalization
// =============================================================================

#[test]
fn test_share_link_becomes_direct_download() {
    assert_eq!(normalize_link(SHARE_LINK), DIRECT_LINK);
}

#[test]
fn test_direct_download_is_stable() {
    // Already-normalized links are not share links and pass through
    assert_eq!(normalize_link(DIRECT_LINK), DIRECT_LINK);
}

#[test]
fn test_unrecognized_links_pass_through() {
    for url in ["", "not a url", "https://cdn.example.com/a.png", "./Banner/Group 5.png"] {
        assert_eq!(normalize_link(url), url);
    }
}

#[test]
fn test_video_id_extraction() {
    assert_eq!(youtube_id("https://youtu.be/abcdefghijk"), Some("abcdefghijk"));
    assert_eq!(youtube_id("https://www.youtube.com/v/abcdefghijk"), Some("abcdefghijk"));
    assert_eq!(youtube_id("https://www.youtube.com/watch?v=abcdefghij"), None);
    assert_eq!(
        youtube_embed_url("abcdefghijk"),
        "https://www.youtube.com/embed/abcdefghijk?autoplay=1"
    );
}

// =============================================================================
// Miracles
// =============================================================================

#[test]
fn test_video_link_wins_over_audio() {
    let item = PlayableItem::from_miracle(&miracle(
        Some("https://cdn.example.com/a.mp3"),
        Some("https://youtu.be/dQw4w9WgXcQ"),
    ));

    match item {
        PlayableItem::Video(video) => {
            assert_eq!(video.video_id.as_deref(), Some("dQw4w9WgXcQ"));
            assert_eq!(
                video.embed_url().as_deref(),
                Some("https://www.youtube.com/embed/dQw4w9WgXcQ?autoplay=1")
            );
        }
        other => panic!("Expected video, got {:?}", other.kind()),
    }
}

#[test]
fn test_audio_only_miracle_normalizes_source() {
    let item = PlayableItem::from_miracle(&miracle(Some(SHARE_LINK), None));

    match &item {
        PlayableItem::Audio(audio) => assert_eq!(audio.src, DIRECT_LINK),
        other => panic!("Expected audio, got {:?}", other.kind()),
    }
    assert_eq!(item.info().artwork, DIRECT_LINK);
    assert_eq!(item.info().subtitle(), "Priya S");
    assert_eq!(item.media_url().as_deref(), Some(DIRECT_LINK));
}

#[test]
fn test_miracle_without_media_is_artwork_only() {
    let item = PlayableItem::from_miracle(&miracle(Some(""), Some("")));
    assert_eq!(item.kind(), MediaKind::Artwork);
    assert!(item.media_url().is_none());
    assert_eq!(item.info().title, "Journey to Inner Peace");
}

#[test]
fn test_unparseable_video_link_falls_back_to_audio() {
    let item = PlayableItem::from_miracle(&miracle(
        Some("https://cdn.example.com/a.mp3"),
        Some("https://vimeo.com/12345"),
    ));
    assert_eq!(item.kind(), MediaKind::Audio);
}

// =============================================================================
// Episodes
// =============================================================================

#[test]
fn test_audio_episode() {
    let ep = episode(MediaType::Audio, "https://example.com/audio/breath.mp3", None);
    let item = PlayableItem::from_episode(&ep, Some(&meditation()));

    assert_eq!(item.kind(), MediaKind::Audio);
    assert_eq!(
        item.media_url().as_deref(),
        Some("https://example.com/audio/breath.mp3")
    );
    assert_eq!(item.info().caption(), "15:00");
    assert_eq!(item.info().subtitle(), "Audio-only session");
}

#[test]
fn test_audio_tagged_episode_with_video_url_is_video() {
    let ep = episode(
        MediaType::Audio,
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        None,
    );
    let source = MediaSource::from_episode(&ep);
    assert_eq!(source.classify(), MediaKind::Video);
    assert_eq!(source.video_id(), Some("dQw4w9WgXcQ"));
}

#[test]
fn test_video_episode_without_id_has_no_embed() {
    let ep = episode(MediaType::Video, "https://cdn.example.com/clip.mp4", None);
    match PlayableItem::from_episode(&ep, None) {
        PlayableItem::Video(video) => {
            assert!(video.video_id.is_none());
            assert!(video.embed_url().is_none());
        }
        other => panic!("Expected video, got {:?}", other.kind()),
    }
}

#[test]
fn test_audio_episode_without_url_is_artwork_only() {
    let ep = episode(MediaType::Audio, "", None);
    assert_eq!(PlayableItem::from_episode(&ep, None).kind(), MediaKind::Artwork);
}

#[test]
fn test_episode_artwork_falls_back_to_parent() {
    let parent = meditation();

    let without = episode(MediaType::Audio, "https://example.com/a.mp3", None);
    let item = PlayableItem::from_episode(&without, Some(&parent));
    assert_eq!(item.info().artwork, "./Meditation/meditation-1.png");

    let blank = episode(MediaType::Audio, "https://example.com/a.mp3", Some(""));
    let item = PlayableItem::from_episode(&blank, Some(&parent));
    assert_eq!(item.info().artwork, "./Meditation/meditation-1.png");

    let own = episode(MediaType::Audio, "https://example.com/a.mp3", Some(SHARE_LINK));
    let item = PlayableItem::from_episode(&own, Some(&parent));
    assert_eq!(item.info().artwork, DIRECT_LINK);

    let orphan = PlayableItem::from_episode(&without, None);
    assert_eq!(orphan.info().artwork, "");
}

#[test]
fn test_playable_item_serializes_kind_tag() {
    let item = PlayableItem::from_miracle(&miracle(None, None));
    let value = serde_json::to_value(&item).unwrap();
    assert_eq!(value["kind"], "artwork");
    assert_eq!(value["title"], "Journey to Inner Peace");
}
