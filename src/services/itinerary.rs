// src/services/itinerary.rs
// DOCUMENTATION: Itinerary synthesis - clustering, draft validation, merge
// PURPOSE: Turn a flat list of geotagged photos plus an untrusted generative
// draft into an invariant-satisfying set of location stops

use crate::errors::TrailsError;
use crate::models::{Coordinate, LocationStop, PhotoRecord, TripAggregate, PLACEHOLDER_COVER_URL};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fallback display name for a stop whose synthesized name is empty
const FALLBACK_STOP_NAME: &str = "A memorable stop";

/// Fallback narrative for a stop whose synthesized story is empty
const FALLBACK_STOP_STORY: &str = "A memory captured at this location.";

/// Fallback trip summary
const FALLBACK_SUMMARY: &str =
    "A journey traced through the locations of my photos, automatically creating a visual travel diary.";

/// Untrusted draft returned by the generative story service
/// DOCUMENTATION: Permissive on the wire - every field defaults so a partial
/// response still deserializes; validation happens in `synthesize`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoryDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub stops: Vec<StoryStopDraft>,
}

/// One proposed stop in a draft
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoryStopDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub story: String,
    #[serde(default)]
    pub photo_indexes: Vec<usize>,
}

/// Validated synthesis output
#[derive(Debug, Clone)]
pub struct SynthesizedStory {
    pub title: String,
    pub summary: String,
    pub stops: Vec<LocationStop>,
    pub cover_image_url: String,
}

/// Great-circle distance between two coordinates in kilometers
/// Uses Haversine formula
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    EARTH_RADIUS_KM * 2.0 * h.sqrt().asin()
}

/// Greedy proximity clustering over the located photos
/// DOCUMENTATION: Deterministic and stable by input index. A photo joins the
/// first existing cluster whose representative (its lowest-index member)
/// lies within `radius_km`, otherwise it founds a new cluster. Photos
/// without coordinates are skipped entirely.
pub fn cluster_by_proximity(photos: &[PhotoRecord], radius_km: f64) -> Vec<Vec<usize>> {
    let mut clusters: Vec<Vec<usize>> = Vec::new();

    for (index, photo) in photos.iter().enumerate() {
        let coords = match photo.coords {
            Some(coords) => coords,
            None => continue,
        };

        let joined = clusters.iter_mut().find(|cluster| {
            // Cluster representatives always have coordinates
            match photos[cluster[0]].coords {
                Some(representative) => haversine_km(representative, coords) <= radius_km,
                None => false,
            }
        });

        match joined {
            Some(cluster) => cluster.push(index),
            None => clusters.push(vec![index]),
        }
    }

    clusters
}

/// Deterministic draft built from local clustering alone
/// DOCUMENTATION: Used when the story service is not configured, mirroring
/// graceful degradation instead of refusing to create trips
pub fn local_draft(photos: &[PhotoRecord], radius_km: f64) -> StoryDraft {
    let stops = cluster_by_proximity(photos, radius_km)
        .into_iter()
        .enumerate()
        .map(|(i, photo_indexes)| StoryStopDraft {
            name: format!("Stop {}", i + 1),
            story: FALLBACK_STOP_STORY.to_string(),
            photo_indexes,
        })
        .collect();

    StoryDraft {
        title: String::new(),
        summary: String::new(),
        stops,
    }
}

/// Validate a draft against the photo list and build the final stops
/// DOCUMENTATION: The draft is untrusted input. Indexes that are out of
/// bounds or reference coordinate-less photos are dropped; duplicate
/// assignments keep their first stop; stops left empty are dropped wholesale;
/// located photos the draft never mentioned are attached to the nearest
/// surviving stop so that every located photo lands in exactly one stop.
/// Zero surviving stops is a hard `NoLocatableContent` failure.
pub fn synthesize(
    photos: &[PhotoRecord],
    draft: &StoryDraft,
    now: DateTime<Utc>,
) -> Result<SynthesizedStory, TrailsError> {
    let located: Vec<usize> = photos
        .iter()
        .enumerate()
        .filter(|(_, p)| p.coords.is_some())
        .map(|(i, _)| i)
        .collect();

    if located.is_empty() {
        return Err(TrailsError::NoLocatableContent(
            "none of the photos carry GPS coordinates".to_string(),
        ));
    }

    // First pass: keep valid, first-seen photo indexes per draft stop
    let mut seen = vec![false; photos.len()];
    let mut kept: Vec<(String, String, Vec<usize>)> = Vec::new();
    for stop in &draft.stops {
        let mut indexes: Vec<usize> = Vec::new();
        for &index in &stop.photo_indexes {
            if index >= photos.len() || photos[index].coords.is_none() || seen[index] {
                continue;
            }
            seen[index] = true;
            indexes.push(index);
        }
        if !indexes.is_empty() {
            indexes.sort_unstable();
            kept.push((stop.name.clone(), stop.story.clone(), indexes));
        }
    }

    if kept.is_empty() {
        return Err(TrailsError::NoLocatableContent(
            "the story draft referenced no locatable photos".to_string(),
        ));
    }

    // Second pass: attach located photos the draft never assigned to the
    // nearest surviving stop, keyed by the stop's representative coordinate
    for &index in &located {
        if seen[index] {
            continue;
        }
        let coords = match photos[index].coords {
            Some(coords) => coords,
            None => continue,
        };
        let mut best: Option<(usize, f64)> = None;
        for (stop_index, stop) in kept.iter().enumerate() {
            let distance = photos[stop.2[0]]
                .coords
                .map_or(f64::MAX, |rep| haversine_km(rep, coords));
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((stop_index, distance));
            }
        }
        if let Some((stop_index, _)) = best {
            kept[stop_index].2.push(index);
            kept[stop_index].2.sort_unstable();
        }
    }

    let stops: Vec<LocationStop> = kept
        .into_iter()
        .filter_map(|(name, story, indexes)| {
            // Representative coordinate is the lowest-index photo's
            let coords = photos[indexes[0]].coords?;
            Some(LocationStop {
                id: Uuid::new_v4(),
                name: sanitize_or(&name, FALLBACK_STOP_NAME),
                story: sanitize_or(&story, FALLBACK_STOP_STORY),
                coords,
                photo_ids: indexes.iter().map(|&i| photos[i].id).collect(),
            })
        })
        .collect();

    let cover_image_url = stops
        .first()
        .and_then(|stop| stop.photo_ids.first())
        .and_then(|pid| photos.iter().find(|p| p.id == *pid))
        .or_else(|| photos.first())
        .map(|p| p.content_url.clone())
        .unwrap_or_else(|| PLACEHOLDER_COVER_URL.to_string());

    Ok(SynthesizedStory {
        title: sanitize_or(&draft.title, &fallback_title(now)),
        summary: sanitize_or(&draft.summary, FALLBACK_SUMMARY),
        stops,
        cover_image_url,
    })
}

/// Replacement state produced by an incremental merge
#[derive(Debug, Clone)]
pub struct TripReplacement {
    pub title: String,
    pub summary: String,
    pub stops: Vec<LocationStop>,
    pub photos: Vec<PhotoRecord>,
    pub cover_image_url: String,
}

/// Incremental merge: re-synthesize over existing-then-new photo order
/// DOCUMENTATION: Title and summary are preserved from the existing trip
/// unless the draft supplies non-empty replacements. Social state is the
/// caller's to carry over; only stops, photos and (if the previous cover
/// disappeared) the cover image are replaced.
pub fn merge_into_trip(
    existing: &TripAggregate,
    new_photos: Vec<PhotoRecord>,
    draft: &StoryDraft,
    now: DateTime<Utc>,
) -> Result<TripReplacement, TrailsError> {
    let mut merged_photos = existing.photos.clone();
    merged_photos.extend(new_photos);

    let draft_has_title = !sanitize_text(&draft.title).is_empty();
    let draft_has_summary = !sanitize_text(&draft.summary).is_empty();

    let story = synthesize(&merged_photos, draft, now)?;

    let cover_survives = merged_photos
        .iter()
        .any(|p| p.content_url == existing.cover_image_url);

    Ok(TripReplacement {
        title: if draft_has_title {
            story.title
        } else {
            existing.title.clone()
        },
        summary: if draft_has_summary {
            story.summary
        } else {
            existing.summary.clone()
        },
        stops: story.stops,
        photos: merged_photos,
        cover_image_url: if cover_survives {
            existing.cover_image_url.clone()
        } else {
            story.cover_image_url
        },
    })
}

/// Strip embedded NULs and trim whitespace
pub fn sanitize_text(raw: &str) -> String {
    raw.replace('\0', "").trim().to_string()
}

fn sanitize_or(raw: &str, fallback: &str) -> String {
    let sanitized = sanitize_text(raw);
    if sanitized.is_empty() {
        fallback.to_string()
    } else {
        sanitized
    }
}

/// Timestamp-based default title for trips the draft left unnamed
fn fallback_title(now: DateTime<Utc>) -> String {
    format!("Trip of {}", now.format("%B %e, %Y"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn photo_at(coords: Option<(f64, f64)>) -> PhotoRecord {
        PhotoRecord {
            id: Uuid::new_v4(),
            content_url: format!("https://storage.example/{}.jpg", Uuid::new_v4()),
            coords: coords.map(|(lat, lng)| Coordinate { lat, lng }),
            description: None,
            camera_details: None,
            likes: Vec::new(),
            comments: Vec::new(),
        }
    }

    fn assigned_ids(stops: &[LocationStop]) -> Vec<Uuid> {
        stops.iter().flat_map(|s| s.photo_ids.clone()).collect()
    }

    #[test]
    fn test_haversine_known_distance() {
        // Paris to London is roughly 344 km
        let paris = Coordinate {
            lat: 48.8566,
            lng: 2.3522,
        };
        let london = Coordinate {
            lat: 51.5074,
            lng: -0.1278,
        };
        let d = haversine_km(paris, london);
        assert!(d > 330.0 && d < 360.0, "unexpected distance {}", d);
    }

    #[test]
    fn test_near_pair_clusters_distant_photo_separates() {
        // (0,0) and (0,0.0001) are ~11 m apart; (10,10) is ~1500 km away
        let photos = vec![
            photo_at(Some((0.0, 0.0))),
            photo_at(Some((0.0, 0.0001))),
            photo_at(Some((10.0, 10.0))),
        ];
        let draft = local_draft(&photos, 2.0);
        let story = synthesize(&photos, &draft, Utc::now()).unwrap();

        assert_eq!(story.stops.len(), 2);
        assert_eq!(story.stops[0].photo_ids, vec![photos[0].id, photos[1].id]);
        assert_eq!(story.stops[1].photo_ids, vec![photos[2].id]);
    }

    #[test]
    fn test_clustering_skips_unlocated_photos() {
        let photos = vec![
            photo_at(Some((0.0, 0.0))),
            photo_at(None),
            photo_at(Some((0.0, 0.0002))),
        ];
        let clusters = cluster_by_proximity(&photos, 2.0);
        assert_eq!(clusters, vec![vec![0, 2]]);
    }

    #[test]
    fn test_synthesis_fails_without_coordinates() {
        let photos = vec![photo_at(None), photo_at(None)];
        let draft = local_draft(&photos, 2.0);
        let result = synthesize(&photos, &draft, Utc::now());
        assert!(matches!(result, Err(TrailsError::NoLocatableContent(_))));
    }

    #[test]
    fn test_synthesis_fails_on_all_invalid_draft_indexes() {
        let photos = vec![photo_at(Some((1.0, 1.0)))];
        let draft = StoryDraft {
            title: "Ghost trip".to_string(),
            summary: String::new(),
            stops: vec![StoryStopDraft {
                name: "Nowhere".to_string(),
                story: String::new(),
                photo_indexes: vec![7, 8, 9],
            }],
        };
        let result = synthesize(&photos, &draft, Utc::now());
        assert!(matches!(result, Err(TrailsError::NoLocatableContent(_))));
    }

    #[test]
    fn test_stop_partition_covers_located_photos_exactly_once() {
        let photos = vec![
            photo_at(Some((0.0, 0.0))),
            photo_at(None),
            photo_at(Some((0.0, 0.001))),
            photo_at(Some((45.0, 45.0))),
            photo_at(Some((45.0, 45.0001))),
        ];
        let draft = local_draft(&photos, 2.0);
        let story = synthesize(&photos, &draft, Utc::now()).unwrap();

        let located: HashSet<Uuid> = photos
            .iter()
            .filter(|p| p.coords.is_some())
            .map(|p| p.id)
            .collect();
        let assigned = assigned_ids(&story.stops);
        let assigned_set: HashSet<Uuid> = assigned.iter().copied().collect();

        assert_eq!(assigned.len(), assigned_set.len(), "duplicate assignment");
        assert_eq!(assigned_set, located, "omitted or extra photo");
    }

    #[test]
    fn test_duplicate_draft_assignment_keeps_first_stop() {
        let photos = vec![photo_at(Some((0.0, 0.0))), photo_at(Some((10.0, 10.0)))];
        let draft = StoryDraft {
            title: String::new(),
            summary: String::new(),
            stops: vec![
                StoryStopDraft {
                    name: "First".to_string(),
                    story: String::new(),
                    photo_indexes: vec![0, 1],
                },
                StoryStopDraft {
                    name: "Second".to_string(),
                    story: String::new(),
                    photo_indexes: vec![1],
                },
            ],
        };
        let story = synthesize(&photos, &draft, Utc::now()).unwrap();
        assert_eq!(story.stops.len(), 1);
        assert_eq!(story.stops[0].photo_ids.len(), 2);
    }

    #[test]
    fn test_unassigned_located_photo_attaches_to_nearest_stop() {
        let photos = vec![
            photo_at(Some((0.0, 0.0))),
            photo_at(Some((50.0, 50.0))),
            // Never mentioned by the draft; nearest to the second stop
            photo_at(Some((50.0, 50.001))),
        ];
        let draft = StoryDraft {
            title: String::new(),
            summary: String::new(),
            stops: vec![
                StoryStopDraft {
                    name: "Origin".to_string(),
                    story: String::new(),
                    photo_indexes: vec![0],
                },
                StoryStopDraft {
                    name: "Far".to_string(),
                    story: String::new(),
                    photo_indexes: vec![1],
                },
            ],
        };
        let story = synthesize(&photos, &draft, Utc::now()).unwrap();
        assert_eq!(story.stops[1].photo_ids, vec![photos[1].id, photos[2].id]);
    }

    #[test]
    fn test_representative_coordinate_is_lowest_index_member() {
        let photos = vec![photo_at(Some((5.0, 5.0))), photo_at(Some((5.0, 5.0005)))];
        let draft = local_draft(&photos, 2.0);
        let story = synthesize(&photos, &draft, Utc::now()).unwrap();
        assert_eq!(story.stops[0].coords, photos[0].coords.unwrap());
    }

    #[test]
    fn test_empty_texts_get_fallbacks() {
        let photos = vec![photo_at(Some((1.0, 1.0)))];
        let draft = StoryDraft {
            title: " \0 ".to_string(),
            summary: String::new(),
            stops: vec![StoryStopDraft {
                name: "\0".to_string(),
                story: "   ".to_string(),
                photo_indexes: vec![0],
            }],
        };
        let story = synthesize(&photos, &draft, Utc::now()).unwrap();
        assert!(story.title.starts_with("Trip of "));
        assert_eq!(story.summary, FALLBACK_SUMMARY);
        assert_eq!(story.stops[0].name, FALLBACK_STOP_NAME);
        assert_eq!(story.stops[0].story, FALLBACK_STOP_STORY);
    }

    #[test]
    fn test_cover_is_first_photo_of_first_stop() {
        let photos = vec![photo_at(Some((0.0, 0.0))), photo_at(Some((10.0, 10.0)))];
        let draft = StoryDraft {
            title: String::new(),
            summary: String::new(),
            stops: vec![
                StoryStopDraft {
                    name: "Far first".to_string(),
                    story: String::new(),
                    photo_indexes: vec![1],
                },
                StoryStopDraft {
                    name: "Origin".to_string(),
                    story: String::new(),
                    photo_indexes: vec![0],
                },
            ],
        };
        let story = synthesize(&photos, &draft, Utc::now()).unwrap();
        assert_eq!(story.cover_image_url, photos[1].content_url);
    }

    #[test]
    fn test_deterministic_grouping_on_identical_input() {
        let photos = vec![
            photo_at(Some((0.0, 0.0))),
            photo_at(Some((0.0, 0.0001))),
            photo_at(Some((10.0, 10.0))),
        ];
        let first = cluster_by_proximity(&photos, 2.0);
        let second = cluster_by_proximity(&photos, 2.0);
        assert_eq!(first, second);
    }

    fn trip_from(photos: Vec<PhotoRecord>) -> TripAggregate {
        let draft = local_draft(&photos, 2.0);
        let story = synthesize(&photos, &draft, Utc::now()).unwrap();
        TripAggregate {
            id: Uuid::new_v4(),
            user: crate::models::UserProfile {
                id: Uuid::new_v4(),
                username: "ada".to_string(),
                avatar_url: "https://picsum.photos/seed/ada/100/100".to_string(),
            },
            title: "Original title".to_string(),
            summary: "Original summary".to_string(),
            stops: story.stops,
            photos,
            cover_image_url: story.cover_image_url,
            likes: Vec::new(),
            comments: Vec::new(),
            ratings: Vec::new(),
            video_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn apply_replacement(trip: &mut TripAggregate, replacement: TripReplacement) {
        trip.title = replacement.title;
        trip.summary = replacement.summary;
        trip.stops = replacement.stops;
        trip.photos = replacement.photos;
        trip.cover_image_url = replacement.cover_image_url;
    }

    #[test]
    fn test_merge_preserves_title_unless_draft_supplies_one() {
        let trip = trip_from(vec![photo_at(Some((0.0, 0.0)))]);
        let extra = vec![photo_at(Some((0.0, 0.0001)))];
        let combined: Vec<PhotoRecord> = trip
            .photos
            .iter()
            .cloned()
            .chain(extra.iter().cloned())
            .collect();

        let silent = local_draft(&combined, 2.0);
        let replacement = merge_into_trip(&trip, extra.clone(), &silent, Utc::now()).unwrap();
        assert_eq!(replacement.title, "Original title");
        assert_eq!(replacement.summary, "Original summary");

        let mut renamed = local_draft(&combined, 2.0);
        renamed.title = "Fresh title".to_string();
        let replacement = merge_into_trip(&trip, extra, &renamed, Utc::now()).unwrap();
        assert_eq!(replacement.title, "Fresh title");
        assert_eq!(replacement.summary, "Original summary");
    }

    #[test]
    fn test_no_photo_lost_across_two_successive_merges() {
        let mut trip = trip_from(vec![photo_at(Some((0.0, 0.0)))]);
        let batch_a = vec![photo_at(Some((0.0, 0.0002))), photo_at(Some((20.0, 20.0)))];
        let batch_b = vec![photo_at(Some((20.0, 20.0001))), photo_at(None)];

        for batch in [batch_a, batch_b] {
            let combined: Vec<PhotoRecord> = trip
                .photos
                .iter()
                .cloned()
                .chain(batch.iter().cloned())
                .collect();
            let draft = local_draft(&combined, 2.0);
            let replacement = merge_into_trip(&trip, batch, &draft, Utc::now()).unwrap();
            apply_replacement(&mut trip, replacement);
        }

        assert_eq!(trip.photos.len(), 5);
        let located: HashSet<Uuid> = trip
            .photos
            .iter()
            .filter(|p| p.coords.is_some())
            .map(|p| p.id)
            .collect();
        let assigned = assigned_ids(&trip.stops);
        let assigned_set: HashSet<Uuid> = assigned.iter().copied().collect();
        assert_eq!(assigned.len(), assigned_set.len(), "duplicate assignment");
        assert_eq!(assigned_set, located, "photo lost across merges");
    }

    #[test]
    fn test_merge_keeps_cover_while_its_photo_survives() {
        let trip = trip_from(vec![photo_at(Some((0.0, 0.0)))]);
        let cover_before = trip.cover_image_url.clone();
        let extra = vec![photo_at(Some((30.0, 30.0)))];
        let combined: Vec<PhotoRecord> = trip
            .photos
            .iter()
            .cloned()
            .chain(extra.iter().cloned())
            .collect();
        let draft = local_draft(&combined, 2.0);
        let replacement = merge_into_trip(&trip, extra, &draft, Utc::now()).unwrap();
        assert_eq!(replacement.cover_image_url, cover_before);
    }
}
