use super::*;
use crate::color::{ColorPalette, Rgb};

/// Red/Green/Blue profile with unit-axis centroids of magnitude 100
fn rgb_profile() -> CalibrationProfile {
    let palette = ColorPalette::new(
        vec!["Red".to_string(), "Green".to_string(), "Blue".to_string()],
        None,
    )
    .unwrap();
    let mut profile = CalibrationProfile::default_for(&palette);
    profile.set_centroid(0, Rgb::new(100.0, 0.0, 0.0)).unwrap();
    profile.set_centroid(1, Rgb::new(0.0, 100.0, 0.0)).unwrap();
    profile.set_centroid(2, Rgb::new(0.0, 0.0, 100.0)).unwrap();
    profile
}

#[test]
fn test_classify_nearest_blue() {
    let profile = rgb_profile();
    assert_eq!(classify(&Rgb::new(2.0, 1.0, 99.0), &profile), Some(2));
}

#[test]
fn test_classify_each_axis() {
    let profile = rgb_profile();
    assert_eq!(classify(&Rgb::new(90.0, 10.0, 5.0), &profile), Some(0));
    assert_eq!(classify(&Rgb::new(30.0, 70.0, 20.0), &profile), Some(1));
}

#[test]
fn test_centroid_round_trip_standard_defaults() {
    let profile = CalibrationProfile::default_for(&ColorPalette::standard());
    for centroid in &profile.centroids {
        assert_eq!(
            classify(&centroid.reference, &profile),
            Some(centroid.index),
            "centroid {} did not classify to itself",
            centroid.name
        );
    }
}

#[test]
fn test_tie_resolves_to_lowest_index() {
    let profile = rgb_profile();
    // Equidistant from all three centroids
    assert_eq!(classify(&Rgb::splat(50.0), &profile), Some(0));
    // Equidistant from Green and Blue only
    assert_eq!(classify(&Rgb::new(0.0, 50.0, 50.0), &profile), Some(1));
}

#[test]
fn test_duplicate_centroids_pick_first() {
    let mut profile = rgb_profile();
    profile.set_centroid(2, Rgb::new(0.0, 100.0, 0.0)).unwrap();
    assert_eq!(classify(&Rgb::new(0.0, 100.0, 0.0), &profile), Some(1));
}

#[test]
fn test_empty_table_is_none() {
    let mut profile = rgb_profile();
    profile.centroids.clear();
    assert_eq!(classify(&Rgb::new(1.0, 2.0, 3.0), &profile), None);
    assert_eq!(nearest_centroid(&Rgb::ZERO, &[]), None);
}

#[test]
fn test_result_always_in_range() {
    let profile = CalibrationProfile::default_for(&ColorPalette::standard());
    let n = profile.centroids.len();
    for r in (0..=65535u32).step_by(8191) {
        for g in (0..=65535u32).step_by(8191) {
            for b in (0..=65535u32).step_by(8191) {
                let sample = Rgb::new(r as f32, g as f32, b as f32);
                let slot = classify(&sample, &profile).unwrap();
                assert!(slot < n);
            }
        }
    }
}

#[test]
fn test_zero_sample_classifies() {
    // An unavailable sensor normalizes to zero; it must still classify in range
    let profile = rgb_profile();
    assert_eq!(classify(&Rgb::ZERO, &profile), Some(0));
}
