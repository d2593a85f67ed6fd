use once_cell::sync::Lazy;

use crate::models::SectorType;

/// Model name recorded on generated replies.
pub const ADVISOR_MODEL: &str = "ascend-advisor-v1";

/// Keyword-triggered openers, checked in order against the lowercased input.
static OPENERS: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    vec![
        ("goal", "Setting a concrete goal is the right move."),
        ("plan", "A plan you can review weekly beats a perfect one."),
        ("stuck", "Feeling stuck usually means the next step is too big."),
        ("help", "Happy to help."),
    ]
});

fn focus_phrase(sector_type: SectorType) -> &'static str {
    match sector_type {
        SectorType::Health => "your health and wellness",
        SectorType::Finance => "your finances",
        SectorType::Career => "your career",
        SectorType::Relationships => "your relationships",
        SectorType::Learning => "your learning",
        SectorType::Creativity => "your creative work",
        SectorType::Fitness => "your fitness",
        SectorType::MentalHealth => "your mental wellness",
    }
}

/// Canned assistant reply for a sector chat message. No model call is made;
/// the response is a fixed template keyed by the sector's type.
pub fn sector_reply(sector_type: Option<SectorType>, content: &str) -> String {
    let lowered = content.to_lowercase();
    let opener = OPENERS
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, opener)| *opener);

    let context = match sector_type {
        Some(t) => focus_phrase(t),
        None => "this area of your life",
    };

    match opener {
        Some(opener) => format!(
            "{} I understand you said '{}'. Let me help you with that in the context of {}.",
            opener, content, context
        ),
        None => format!(
            "I understand you said '{}'. Let me help you with that in the context of {}.",
            content, context
        ),
    }
}
