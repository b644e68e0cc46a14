use std::collections::HashSet;

use ego_tree::NodeId;
use feedpost_core::{collapse_whitespace, truncate_excerpt, ArticleContent, EXCERPT_MAX_CHARS};
use scraper::{ElementRef, Html, Selector};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractSettings {
    /// Tried in order; the first match is the content root, `body` otherwise.
    pub content_selectors: Vec<String>,
    pub image_selectors: Vec<String>,
    /// Lowercase phrases marking newsletter/channel promo boxes.
    pub promo_phrases: Vec<String>,
    /// Lowercase link fragments marking promo boxes, matched against markup
    /// with spaces removed.
    pub promo_links: Vec<String>,
    pub min_paragraph_chars: usize,
    pub max_body_chars: usize,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self {
            content_selectors: ["div.entry-content", "div.td-post-content", "article", "main", "body"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            image_selectors: vec![
                r#"meta[property="og:image"]"#.to_string(),
                r#"meta[name="twitter:image"]"#.to_string(),
            ],
            promo_phrases: vec!["vuoi ricevere le notizie di montagne".to_string()],
            promo_links: vec!["whatsapp.com/channel/0029vb7fcht8akvfaucifm0c".to_string()],
            min_paragraph_chars: 25,
            max_body_chars: EXCERPT_MAX_CHARS,
        }
    }
}

pub trait ArticleExtractor: Send + Sync {
    /// `page_url` resolves relative image references.
    fn extract(&self, html: &str, page_url: &str) -> ArticleContent;
}

/// Lead image from social meta tags, body from the paragraphs of the main
/// content container with promo boxes left out.
#[derive(Debug, Default)]
pub struct HtmlArticleExtractor {
    settings: ExtractSettings,
}

impl HtmlArticleExtractor {
    pub fn new(settings: ExtractSettings) -> Self {
        Self { settings }
    }

    fn lead_image(&self, doc: &Html, page_url: &str) -> Option<String> {
        let raw = self
            .settings
            .image_selectors
            .iter()
            .filter_map(|sel| Selector::parse(sel).ok())
            .find_map(|sel| {
                doc.select(&sel)
                    .filter_map(|meta| meta.value().attr("content"))
                    .map(str::trim)
                    .find(|content| !content.is_empty())
                    .map(str::to_string)
            })?;

        match Url::parse(page_url).and_then(|base| base.join(&raw)) {
            Ok(resolved) => Some(resolved.to_string()),
            Err(_) => Some(raw),
        }
    }

    fn content_root<'a>(&self, doc: &'a Html) -> ElementRef<'a> {
        self.settings
            .content_selectors
            .iter()
            .filter_map(|sel| Selector::parse(sel).ok())
            .find_map(|sel| doc.select(&sel).next())
            .unwrap_or_else(|| doc.root_element())
    }

    fn body_text(&self, doc: &Html) -> String {
        let root = self.content_root(doc);
        let promo = self.promo_containers(root);

        let Ok(paragraph_sel) = Selector::parse("p, li") else {
            return String::new();
        };
        let parts: Vec<String> = root
            .select(&paragraph_sel)
            .filter(|el| !el.ancestors().any(|node| promo.contains(&node.id())))
            .map(|el| collapse_whitespace(&element_text(el)))
            .filter(|text| {
                !text.is_empty()
                    && text.chars().count() >= self.settings.min_paragraph_chars
                    && !self.mentions_promo(text)
            })
            .collect();

        let text = collapse_whitespace(&parts.join(" "));
        truncate_excerpt(&text, self.settings.max_body_chars)
    }

    /// Innermost promo containers below `root`; wrappers that merely
    /// contain a promo box are kept.
    fn promo_containers(&self, root: ElementRef<'_>) -> HashSet<NodeId> {
        let Ok(container_sel) = Selector::parse("div, section, aside") else {
            return HashSet::new();
        };
        let matching: Vec<ElementRef<'_>> = root
            .select(&container_sel)
            .filter(|el| el.id() != root.id())
            .filter(|el| self.is_promo_container(*el))
            .collect();
        let matching_ids: HashSet<NodeId> = matching.iter().map(|el| el.id()).collect();

        matching
            .iter()
            .filter(|el| {
                !el.descendants()
                    .skip(1)
                    .any(|node| matching_ids.contains(&node.id()))
            })
            .map(|el| el.id())
            .collect()
    }

    fn is_promo_container(&self, el: ElementRef<'_>) -> bool {
        let text = element_text(el).to_lowercase();
        if self
            .settings
            .promo_phrases
            .iter()
            .any(|phrase| text.contains(phrase.as_str()))
        {
            return true;
        }
        let markup = el.html().to_lowercase().replace(' ', "");
        self.settings
            .promo_links
            .iter()
            .any(|link| markup.contains(link.as_str()))
    }

    fn mentions_promo(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        let squashed = lowered.replace(' ', "");
        self.settings
            .promo_phrases
            .iter()
            .any(|phrase| lowered.contains(phrase.as_str()))
            || self
                .settings
                .promo_links
                .iter()
                .any(|link| squashed.contains(link.as_str()))
    }
}

impl ArticleExtractor for HtmlArticleExtractor {
    fn extract(&self, html: &str, page_url: &str) -> ArticleContent {
        let doc = Html::parse_document(html);
        ArticleContent {
            image_url: self.lead_image(&doc, page_url),
            body: self.body_text(&doc),
        }
    }
}

/// Markup-free text of an HTML fragment with whitespace collapsed.
pub fn clean_text(fragment: &str) -> String {
    if fragment.trim().is_empty() {
        return String::new();
    }
    let doc = Html::parse_fragment(fragment);
    collapse_whitespace(&element_text(doc.root_element()))
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ")
}
