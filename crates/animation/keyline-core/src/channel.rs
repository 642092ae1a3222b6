//! Channels: typed keyframe slots on an animator.
//!
//! The channel set of each animator kind is closed and known up front; every
//! kind carries a static [`ChannelSpec`] describing what it accepts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TimelineError;
use crate::ids::KeyframeId;
use crate::keyframe::Keyframe;
use crate::value::DataPoint;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Rotation,
    Position,
    Scale,
    Particle,
    Sound,
    Timeline,
}

/// Capabilities of one channel kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChannelSpec {
    pub name: &'static str,
    /// Whether user edits may create keyframes.
    pub mutable: bool,
    /// Transform channels resolve to a 3-axis value through interpolation.
    pub transform: bool,
    /// Upper bound on data points within a single keyframe.
    pub max_data_points: usize,
    /// Upper bound on the keyframe count (transform channels are unbounded).
    pub capacity: Option<usize>,
}

const fn transform_spec(name: &'static str) -> ChannelSpec {
    ChannelSpec {
        name,
        mutable: true,
        transform: true,
        max_data_points: 2,
        capacity: None,
    }
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 6] = [
        ChannelKind::Rotation,
        ChannelKind::Position,
        ChannelKind::Scale,
        ChannelKind::Particle,
        ChannelKind::Sound,
        ChannelKind::Timeline,
    ];

    pub const fn spec(self) -> ChannelSpec {
        match self {
            ChannelKind::Rotation => transform_spec("rotation"),
            ChannelKind::Position => transform_spec("position"),
            ChannelKind::Scale => transform_spec("scale"),
            ChannelKind::Particle => ChannelSpec {
                name: "particle",
                mutable: true,
                transform: false,
                max_data_points: 1000,
                capacity: Some(1000),
            },
            ChannelKind::Sound => ChannelSpec {
                name: "sound",
                mutable: true,
                transform: false,
                max_data_points: 1000,
                capacity: Some(1000),
            },
            ChannelKind::Timeline => ChannelSpec {
                name: "timeline",
                mutable: false,
                transform: false,
                max_data_points: 1,
                capacity: Some(1),
            },
        }
    }

    #[inline]
    pub fn name(self) -> &'static str {
        self.spec().name
    }

    #[inline]
    pub fn is_transform(self) -> bool {
        self.spec().transform
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Decimal digits kept when a value is frozen from interpolation.
    #[inline]
    pub fn rounding_digits(self) -> i32 {
        match self {
            ChannelKind::Scale => 4,
            _ => 2,
        }
    }

    /// Value a freshly placed keyframe starts with.
    pub fn default_data_point(self) -> DataPoint {
        match self {
            ChannelKind::Scale => DataPoint::uniform(1.0),
            ChannelKind::Rotation | ChannelKind::Position => DataPoint::xyz(0.0, 0.0, 0.0),
            _ => DataPoint::default(),
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Keyframes of one channel in insertion order (not sorted by time).
#[derive(Clone, Debug, PartialEq)]
pub struct Channel {
    kind: ChannelKind,
    keyframes: Vec<Keyframe>,
}

impl Channel {
    pub fn new(kind: ChannelKind) -> Self {
        Self {
            kind,
            keyframes: Vec::new(),
        }
    }

    #[inline]
    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    #[inline]
    pub fn spec(&self) -> ChannelSpec {
        self.kind.spec()
    }

    #[inline]
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.spec()
            .capacity
            .is_some_and(|cap| self.keyframes.len() >= cap)
    }

    /// Append a keyframe after validating time, capacity and data point count.
    pub fn push(&mut self, keyframe: Keyframe) -> Result<KeyframeId, TimelineError> {
        self.validate(&keyframe, self.keyframes.len())?;
        Ok(self.append(keyframe))
    }

    /// Append `keyframe` and remove every other keyframe within `epsilon` of
    /// its time. Capacity is checked against the count after those removals,
    /// so a full channel still accepts a same-time replacement.
    pub fn insert_replacing(
        &mut self,
        keyframe: Keyframe,
        epsilon: f64,
    ) -> Result<(KeyframeId, Vec<Keyframe>), TimelineError> {
        let time = keyframe.time;
        let replaced = self
            .keyframes
            .iter()
            .filter(|k| (k.time - time).abs() <= epsilon)
            .count();
        self.validate(&keyframe, self.keyframes.len() - replaced)?;
        let id = self.append(keyframe);
        let removed = self.replace_others(id, epsilon);
        Ok((id, removed))
    }

    fn validate(&self, keyframe: &Keyframe, occupied: usize) -> Result<(), TimelineError> {
        if !keyframe.time.is_finite() {
            return Err(TimelineError::InvalidTime {
                time: keyframe.time,
            });
        }
        let spec = self.spec();
        if let Some(capacity) = spec.capacity {
            if occupied >= capacity {
                return Err(TimelineError::ChannelFull {
                    channel: self.kind,
                    capacity,
                });
            }
        }
        if keyframe.data_points.len() > spec.max_data_points {
            return Err(TimelineError::TooManyDataPoints {
                channel: self.kind,
                count: keyframe.data_points.len(),
                max: spec.max_data_points,
            });
        }
        Ok(())
    }

    fn append(&mut self, mut keyframe: Keyframe) -> KeyframeId {
        keyframe.channel = self.kind;
        let id = keyframe.id;
        self.keyframes.push(keyframe);
        id
    }

    #[inline]
    pub fn get(&self, id: KeyframeId) -> Option<&Keyframe> {
        self.keyframes.iter().find(|k| k.id == id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: KeyframeId) -> Option<&mut Keyframe> {
        self.keyframes.iter_mut().find(|k| k.id == id)
    }

    pub fn remove(&mut self, id: KeyframeId) -> Option<Keyframe> {
        let pos = self.keyframes.iter().position(|k| k.id == id)?;
        Some(self.keyframes.remove(pos))
    }

    /// Remove every keyframe other than `keep` lying within `epsilon` of it.
    /// The removed keyframes are returned for undo capture.
    pub fn replace_others(&mut self, keep: KeyframeId, epsilon: f64) -> Vec<Keyframe> {
        let Some(time) = self.get(keep).map(|k| k.time) else {
            return Vec::new();
        };
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.keyframes.len());
        for kf in self.keyframes.drain(..) {
            if kf.id != keep && (kf.time - time).abs() <= epsilon {
                removed.push(kf);
            } else {
                kept.push(kf);
            }
        }
        self.keyframes = kept;
        removed
    }

    /// Keyframe within `epsilon` of `time`; the last inserted one wins on ties.
    pub fn find_near(&self, time: f64, epsilon: f64) -> Option<&Keyframe> {
        self.keyframes
            .iter()
            .rev()
            .find(|k| (k.time - time).abs() <= epsilon)
    }

    /// Keyframe closest in time, if any.
    pub fn closest(&self, time: f64) -> Option<&Keyframe> {
        self.keyframes.iter().fold(None, |best: Option<&Keyframe>, kf| match best {
            Some(b) if (b.time - time).abs() <= (kf.time - time).abs() => Some(b),
            _ => Some(kf),
        })
    }

    /// Time-sorted view; ties keep insertion order.
    pub fn sorted(&self) -> Vec<&Keyframe> {
        let mut sorted: Vec<&Keyframe> = self.keyframes.iter().collect();
        sorted.sort_by(|a, b| a.time.total_cmp(&b.time));
        sorted
    }

    pub fn clear(&mut self) -> Vec<Keyframe> {
        std::mem::take(&mut self.keyframes)
    }
}
