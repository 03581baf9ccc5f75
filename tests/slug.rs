//! Slug Integration Tests
//!
//! Pinned outputs for representative titles.

use livesync::core::build_record;
use livesync::domain::{LiveStatus, Video};
use livesync::slugify;

#[test]
fn test_pinned_titles() {
    let cases = [
        ("2024 Weekly Update #12!!", "2024-weekly-update"),
        ("Sunday Service | March 10th, 2024", "sunday-service-march-10th-2024"),
        ("LIVE: Youth Night - Worship & Word", "live-youth-night-worship-word"),
        ("Q&A with the Team", "with-team"),
        ("Café Concert Évening", "café-concert-évening"),
        ("Élan Vital Talk", "lan-vital-talk"),
    ];

    for (title, expected) in cases {
        assert_eq!(slugify(title), expected, "title: {:?}", title);
    }
}

#[test]
fn test_empty_results() {
    for title in ["", "   ", "We are on air", "#1 of 2", "!!!"] {
        assert_eq!(slugify(title), "", "title: {:?}", title);
    }
}

#[test]
fn test_same_title_same_slug() {
    let title = "Good Friday Evening Service (Full Stream)";
    let first = slugify(title);
    for _ in 0..10 {
        assert_eq!(slugify(title), first);
    }
}

#[test]
fn test_record_slug_falls_back_when_empty() {
    let video = Video::new("XyZ-9", "Go On Air", chrono::Utc::now(), LiveStatus::Live);
    let record = build_record(&video, "https://cdn.test/XyZ-9.mp4".to_string());
    assert_eq!(record.slug, "xyz-9");
}
