//! Mood check-ins.
//!
//! A check-in records one of five moods on a 1-5 scale and answers with a
//! fixed recommendation for that mood. Check-ins are kept in their own
//! capped, newest-first list beside the breathing history.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{StorageError, UnknownMood};
use crate::storage::history::{load_capped, save_capped};
use crate::storage::KvBackend;

/// Storage key for mood check-ins.
pub const MOOD_KEY: &str = "mood_checkins";

/// Check-ins kept unless configured otherwise.
pub const DEFAULT_MAX_ENTRIES: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Excellent,
    Good,
    Okay,
    Poor,
    Terrible,
}

impl Mood {
    pub const ALL: [Mood; 5] = [
        Mood::Excellent,
        Mood::Good,
        Mood::Okay,
        Mood::Poor,
        Mood::Terrible,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Mood::Excellent => "excellent",
            Mood::Good => "good",
            Mood::Okay => "okay",
            Mood::Poor => "poor",
            Mood::Terrible => "terrible",
        }
    }

    /// 5 for excellent down to 1 for terrible.
    pub fn score(self) -> u8 {
        5 - self as u8
    }

    pub fn recommendation(self) -> &'static Recommendation {
        &RECOMMENDATIONS[self as usize]
    }
}

impl FromStr for Mood {
    type Err = UnknownMood;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Mood::ALL
            .into_iter()
            .find(|m| m.key() == wanted)
            .ok_or_else(|| UnknownMood(s.to_string()))
    }
}

/// Suggestions shown after a check-in.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub title: &'static str,
    pub message: &'static str,
    pub activities: [&'static str; 3],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub helpline: Option<&'static str>,
}

/// Indexed by `Mood as usize`.
static RECOMMENDATIONS: [Recommendation; 5] = [
    Recommendation {
        title: "You're shining bright!",
        message: "Your positive energy is wonderful. Consider sharing this joy with others \
                  or engaging in activities that bring you fulfillment.",
        activities: [
            "Share gratitude with someone",
            "Try a new hobby",
            "Help someone in need",
        ],
        helpline: None,
    },
    Recommendation {
        title: "Keep up the positive momentum!",
        message: "You're doing well. This is a great time to focus on maintaining your \
                  mental wellness.",
        activities: [
            "Practice gratitude journaling",
            "Take a mindful walk",
            "Connect with friends",
        ],
        helpline: None,
    },
    Recommendation {
        title: "It's okay to feel neutral",
        message: "Neutral feelings are normal. Consider small activities that might boost \
                  your mood gently.",
        activities: [
            "Light breathing exercises",
            "Listen to uplifting music",
            "Do something creative",
        ],
        helpline: None,
    },
    Recommendation {
        title: "I understand you're struggling",
        message: "It's brave of you to check in. Small steps toward self-care can help. \
                  You're not alone.",
        activities: [
            "Deep breathing exercises",
            "Reach out to a friend",
            "Practice self-compassion",
        ],
        helpline: None,
    },
    Recommendation {
        title: "I'm here for you",
        message: "Your feelings are valid. Please consider reaching out for support. \
                  You deserve care and understanding.",
        activities: [
            "Contact a mental health professional",
            "Call a support helpline",
            "Practice grounding techniques",
        ],
        helpline: Some("Indian Mental Health Helpline: 9152987821"),
    },
];

/// One stored check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodEntry {
    pub id: String,
    pub mood: Mood,
    pub score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl MoodEntry {
    pub fn new(mood: Mood, note: Option<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            mood,
            score: mood.score(),
            note: note.filter(|n| !n.trim().is_empty()),
            timestamp,
        }
    }
}

/// Result of a check-in: what was stored and what to suggest.
#[derive(Debug, Serialize)]
pub struct CheckIn {
    pub entry: MoodEntry,
    pub recommendation: &'static Recommendation,
}

/// Aggregate over a set of check-ins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodSummary {
    pub entries: usize,
    pub average_score: Option<f64>,
    /// Ties go to the mood seen most recently.
    pub most_common: Option<Mood>,
}

impl MoodSummary {
    /// `entries` must be newest first, as the log returns them.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a MoodEntry>) -> Self {
        let entries: Vec<&MoodEntry> = entries.into_iter().collect();
        if entries.is_empty() {
            return Self {
                entries: 0,
                average_score: None,
                most_common: None,
            };
        }

        let mut counts = [0usize; 5];
        let mut total = 0u64;
        for entry in &entries {
            counts[entry.mood as usize] += 1;
            total += u64::from(entry.mood.score());
        }
        let most_common = entries.iter().map(|e| e.mood).fold(None, |best, mood| match best {
            Some(b) if counts[b as usize] >= counts[mood as usize] => Some(b),
            _ => Some(mood),
        });

        Self {
            entries: entries.len(),
            average_score: Some(total as f64 / entries.len() as f64),
            most_common,
        }
    }
}

/// Capped, newest-first list of check-ins over a key-value backend.
pub struct MoodLog<B> {
    backend: B,
    max_entries: usize,
}

impl<B: KvBackend> MoodLog<B> {
    pub fn new(backend: B) -> Self {
        Self::with_capacity(backend, DEFAULT_MAX_ENTRIES)
    }

    pub fn with_capacity(backend: B, max_entries: usize) -> Self {
        Self {
            backend,
            max_entries: max_entries.max(1),
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// # Errors
    /// `Corrupt` when the stored list cannot be decoded.
    pub fn entries(&self) -> Result<Vec<MoodEntry>, StorageError> {
        load_capped(&self.backend, MOOD_KEY, self.max_entries)
    }

    /// Store a check-in for `mood` and return it with its recommendation.
    ///
    /// A corrupt stored list is replaced, as with session history.
    ///
    /// # Errors
    /// Backend failures while reading or writing.
    pub fn check_in(&self, mood: Mood, note: Option<String>) -> Result<CheckIn, StorageError> {
        let entry = MoodEntry::new(mood, note, Utc::now());
        let mut entries = match self.entries() {
            Ok(entries) => entries,
            Err(StorageError::Corrupt { message, .. }) => {
                tracing::warn!("discarding corrupt mood log: {}", message);
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        entries.insert(0, entry.clone());
        save_capped(&self.backend, MOOD_KEY, &entries, self.max_entries)?;
        tracing::info!("mood check-in: {}", mood.key());

        Ok(CheckIn {
            entry,
            recommendation: mood.recommendation(),
        })
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.backend.remove(MOOD_KEY)
    }
}
