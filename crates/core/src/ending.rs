use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Segment markers the generation prompt asks the model to emit.
pub const SEGMENT_VISUAL: &str = "Visual";
pub const SEGMENT_NARRATION: &str = "Narration";
pub const SEGMENT_DIALOGUE: &str = "Dialogue";
pub const SEGMENT_NOTES: &str = "Notes";

// Matches a segment marker like `*Visual*:` or `*Narration* :`.
static RE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([A-Za-z][A-Za-z ]*)\*\s*:").expect("marker regex"));

/// A generated alternate ending, split into its presentation segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlternateEnding {
    pub movie: String,
    /// The full model output, unmodified.
    pub alternate_ending: String,
    pub visual_description: String,
    pub narration_text: String,
    pub character_dialogue: String,
    pub production_notes: String,
}

impl AlternateEnding {
    /// Split raw model output into segments. Missing markers produce a
    /// placeholder rather than an error so a sloppy generation still returns
    /// something usable.
    pub fn from_generated(movie: &str, text: &str) -> Self {
        Self {
            movie: movie.to_string(),
            alternate_ending: text.to_string(),
            visual_description: extract_segment(text, SEGMENT_VISUAL),
            narration_text: extract_segment(text, SEGMENT_NARRATION),
            character_dialogue: extract_segment(text, SEGMENT_DIALOGUE),
            production_notes: extract_segment(text, SEGMENT_NOTES),
        }
    }
}

/// Extract the text between a named `*Marker*:` and the next marker (or end
/// of input). Marker names match case-insensitively.
pub fn extract_segment(text: &str, name: &str) -> String {
    let markers: Vec<(String, usize, usize)> = RE_MARKER
        .captures_iter(text)
        .map(|cap| {
            let whole = cap.get(0).expect("match");
            let label = cap.get(1).expect("label").as_str().trim().to_string();
            (label, whole.start(), whole.end())
        })
        .collect();

    for (i, (label, _, body_start)) in markers.iter().enumerate() {
        if !label.eq_ignore_ascii_case(name) {
            continue;
        }
        let body_end = markers
            .get(i + 1)
            .map(|(_, next_start, _)| *next_start)
            .unwrap_or(text.len());
        return text[*body_start..body_end].trim().to_string();
    }

    format!("Component '{name}' not found")
}
