/// Hard caption limit imposed by the platform.
pub const CAPTION_MAX_CHARS: usize = 2200;
/// Body excerpt limit before the caption is assembled.
pub const EXCERPT_MAX_CHARS: usize = 900;

const ELLIPSIS: char = '…';
const MIN_TAG_CHARS: usize = 4;

const STOPWORDS: &[&str] = &[
    "di", "a", "da", "in", "con", "su", "per", "tra", "fra", "il", "lo", "la", "i", "gli", "le",
    "un", "una", "uno", "e", "è", "del", "della", "dei", "delle", "al", "allo", "alla", "agli",
    "alle", "ai", "dal", "dallo", "dalla", "dai", "dalle", "nel", "nello", "nella", "nei", "nelle",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionSettings {
    /// Tags placed before the title-derived ones, including the `#`.
    pub fixed_tags: Vec<String>,
    pub max_title_tags: usize,
    /// Appended as a final `👉 {hub_link}` line when non-empty.
    pub hub_link: String,
    pub max_chars: usize,
}

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            fixed_tags: ["#montagneepaesi", "#news", "#notizie", "#ultimora", "#flashnews"]
                .iter()
                .map(|tag| tag.to_string())
                .collect(),
            max_title_tags: 8,
            hub_link: "www.montagneepaesi.com/instagram".to_string(),
            max_chars: CAPTION_MAX_CHARS,
        }
    }
}

/// Title, excerpt, hashtags and hub link separated by blank lines, clamped
/// to the platform limit. The excerpt keeps its slot even when empty; the
/// tag and hub lines are left out when there is nothing to show.
pub fn compose_caption(title: &str, excerpt: &str, settings: &CaptionSettings) -> String {
    let tags = hashtags_from_title(title, &settings.fixed_tags, settings.max_title_tags);
    let hub = settings.hub_link.trim();
    let hub_line = if hub.is_empty() {
        String::new()
    } else {
        format!("👉 {hub}")
    };

    let mut sections = vec![title.trim(), excerpt.trim()];
    sections.extend(
        [tags.as_str(), hub_line.as_str()]
            .into_iter()
            .filter(|section| !section.is_empty()),
    );
    clamp_caption(&sections.join("\n\n"), settings.max_chars)
}

pub fn hashtags_from_title(title: &str, fixed_tags: &[String], max_title_tags: usize) -> String {
    let lowered = title.to_lowercase();
    let mut derived: Vec<String> = Vec::new();
    for word in lowered.split(|c: char| !c.is_alphabetic()) {
        if derived.len() >= max_title_tags {
            break;
        }
        if word.chars().count() < MIN_TAG_CHARS || STOPWORDS.contains(&word) {
            continue;
        }
        let tag = format!("#{word}");
        if !derived.contains(&tag) && !fixed_tags.contains(&tag) {
            derived.push(tag);
        }
    }

    fixed_tags
        .iter()
        .cloned()
        .chain(derived)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Trims, then cuts to `max_chars` characters including a trailing ellipsis.
pub fn clamp_caption(caption: &str, max_chars: usize) -> String {
    let caption = caption.trim();
    if caption.chars().count() <= max_chars {
        return caption.to_string();
    }
    let kept: String = caption.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}{ELLIPSIS}", kept.trim_end())
}

/// Keeps the first `max_chars` characters and marks the cut with an ellipsis.
pub fn truncate_excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars).collect();
    format!("{}{ELLIPSIS}", kept.trim_end())
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
