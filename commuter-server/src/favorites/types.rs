//! Favorite records and partial updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{JourneyKey, TrackInfo};

/// A favorited train, keyed by train number in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteTrainData {
    pub highlighted: bool,

    /// When the sweep may delete this entry, usually departure + 10 min.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_after: Option<DateTime<Utc>>,

    /// Leg the favorite was made for.
    pub journey_key: JourneyKey,

    /// Last track seen for the leg.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_changed: Option<bool>,
}

impl FavoriteTrainData {
    /// A highlighted favorite with no expiry or track yet.
    pub fn new(journey_key: JourneyKey) -> Self {
        Self {
            highlighted: true,
            remove_after: None,
            journey_key,
            track: None,
            track_changed: None,
        }
    }

    pub fn with_remove_after(mut self, at: DateTime<Utc>) -> Self {
        self.remove_after = Some(at);
        self
    }

    pub fn with_track(mut self, track: impl Into<String>) -> Self {
        self.track = Some(track.into());
        self
    }

    /// Strictly past `removeAfter`. Entries without one never expire.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.remove_after.is_some_and(|at| at < now)
    }

    /// Overwrites the fields present in `update`.
    pub fn apply(&mut self, update: FavoriteUpdate) {
        if let Some(highlighted) = update.highlighted {
            self.highlighted = highlighted;
        }
        if let Some(remove_after) = update.remove_after {
            self.remove_after = Some(remove_after);
        }
        if let Some(journey_key) = update.journey_key {
            self.journey_key = journey_key;
        }
        if let Some(track) = update.track {
            self.track = Some(track);
        }
        if let Some(track_changed) = update.track_changed {
            self.track_changed = Some(track_changed);
        }
    }

    /// Whether `key` names the leg this favorite refers to.
    ///
    /// Migrated entries carry the bare train number as their key and match
    /// any leg of that train.
    pub fn refers_to(&self, key: &JourneyKey) -> bool {
        if self.journey_key == *key {
            return true;
        }
        let own = self.journey_key.as_str();
        !own.contains('-') && key.as_str().split('-').next() == Some(own)
    }

    /// The update that brings this favorite in line with a freshly
    /// resolved track, or `None` if nothing changed.
    ///
    /// The first known track is recorded silently. A different track for
    /// the same leg sets `trackChanged`. Legacy keys are upgraded to the
    /// full journey key on the way.
    pub fn track_update(&self, info: &TrackInfo) -> Option<FavoriteUpdate> {
        if !self.refers_to(&info.journey_key) {
            return None;
        }

        let journey_key = (self.journey_key != info.journey_key).then(|| info.journey_key.clone());

        match self.track.as_deref() {
            Some(known) if known == info.track => journey_key.map(|key| FavoriteUpdate {
                journey_key: Some(key),
                ..FavoriteUpdate::default()
            }),
            Some(_) => Some(FavoriteUpdate {
                journey_key,
                track: Some(info.track.clone()),
                track_changed: Some(true),
                ..FavoriteUpdate::default()
            }),
            None => Some(FavoriteUpdate {
                journey_key,
                track: Some(info.track.clone()),
                ..FavoriteUpdate::default()
            }),
        }
    }
}

/// Partial update; absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteUpdate {
    pub highlighted: Option<bool>,
    pub remove_after: Option<DateTime<Utc>>,
    pub journey_key: Option<JourneyKey>,
    pub track: Option<String>,
    pub track_changed: Option<bool>,
}

/// One persisted favorite in structured storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRecord {
    pub train_number: String,
    #[serde(flatten)]
    pub data: FavoriteTrainData,
}

/// Entry of the key-value blob. Entries written before journey keys
/// existed have none.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyFavorite {
    #[serde(default)]
    pub highlighted: bool,
    #[serde(default)]
    pub remove_after: Option<DateTime<Utc>>,
    #[serde(default)]
    pub journey_key: Option<JourneyKey>,
    #[serde(default)]
    pub track: Option<String>,
    #[serde(default)]
    pub track_changed: Option<bool>,
}

impl LegacyFavorite {
    /// Converts to current form, keying by train number when no journey
    /// key was stored.
    pub fn into_data(self, train_number: &str) -> FavoriteTrainData {
        FavoriteTrainData {
            highlighted: self.highlighted,
            remove_after: self.remove_after,
            journey_key: self
                .journey_key
                .unwrap_or_else(|| JourneyKey::from_raw(train_number)),
            track: self.track,
            track_changed: self.track_changed,
        }
    }
}

/// Change notification sent to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoritesEvent {
    Set {
        train_number: String,
        data: FavoriteTrainData,
    },
    Removed {
        train_number: String,
    },
}
