//! Stream body blocks.
//!
//! A post body is an ordered sequence of typed blocks. In `page.toml` each
//! block is an array-of-tables entry discriminated by `type`:
//!
//! ```toml
//! [[body]]
//! type = "text"
//! value = "<p>Euler wrote \\(e^{i\\pi} + 1 = 0\\).</p>"
//!
//! [[body]]
//! type = "code"
//! language = "rust"
//! code = "fn main() {}"
//!
//! [[body]]
//! type = "image_row"
//! images = [{ src = "a.jpg", alt = "A" }, { src = "b.jpg", alt = "B" }]
//! ```
//!
//! Text blocks hold rich-text HTML and are emitted unescaped. Everything else
//! is escaped by maud.

use maud::{Markup, PreEscaped, html};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// A single block of a post's stream body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// Rich-text HTML.
    Text { value: String },
    /// Source code. Highlighting is left to the stylesheet/client.
    Code {
        code: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
    /// Display math in LaTeX notation, without delimiters.
    Math { source: String },
    /// Several images laid out side by side.
    ImageRow { images: Vec<ImageRef> },
    /// A single image spanning the full viewport width.
    FullBleedImage { image: ImageRef },
    /// Embedded media (video, audio, slides) by URL.
    Embed { url: String },
    /// Link to an attached document.
    Document { url: String, title: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageRef {
    pub src: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// How much of each post a math scan looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathScope {
    /// Every block of the body.
    FullBody,
    /// Only the first text block, as shown in summary listings.
    FirstTextBlock,
}

static MATH_DELIMITERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\\\[.*?\\\]|\\\(.*?\\\)").expect("math delimiter pattern is valid")
});

/// Whether rich-text source contains `\[...\]` or `\(...\)`.
pub fn has_math_delimiters(source: &str) -> bool {
    MATH_DELIMITERS.is_match(source)
}

impl Block {
    pub fn is_text(&self) -> bool {
        matches!(self, Block::Text { .. })
    }

    /// Whether rendering this block needs the math assets.
    pub fn needs_math(&self) -> bool {
        match self {
            Block::Text { value } => has_math_delimiters(value),
            Block::Math { .. } => true,
            _ => false,
        }
    }

    pub fn render(&self) -> Markup {
        match self {
            Block::Text { value } => html! {
                div.block-text { (PreEscaped(value)) }
            },
            Block::Code { code, language } => {
                let class = language.as_deref().map(|l| format!("language-{l}"));
                html! {
                    pre.block-code { code class=[class] { (code) } }
                }
            }
            Block::Math { source } => html! {
                div.block-math { "\\[" (source) "\\]" }
            },
            Block::ImageRow { images } => html! {
                div.block-image-row {
                    @for image in images {
                        (render_figure(image))
                    }
                }
            },
            Block::FullBleedImage { image } => html! {
                div.block-full-bleed { (render_figure(image)) }
            },
            Block::Embed { url } => html! {
                div.block-embed {
                    iframe src=(url) loading="lazy" allowfullscreen {}
                }
            },
            Block::Document { url, title } => html! {
                p.block-document { a href=(url) { (title) } }
            },
        }
    }
}

fn render_figure(image: &ImageRef) -> Markup {
    html! {
        figure {
            img src=(image.src) alt=(image.alt) loading="lazy";
            @if let Some(caption) = &image.caption {
                figcaption { (caption) }
            }
        }
    }
}

/// The blocks of `body` that fall within `scope`.
pub fn blocks_in_scope(body: &[Block], scope: MathScope) -> &[Block] {
    match scope {
        MathScope::FullBody => body,
        MathScope::FirstTextBlock => match body.iter().position(Block::is_text) {
            Some(i) => &body[i..=i],
            None => &[],
        },
    }
}

/// Whether any block of `body` within `scope` needs math assets.
pub fn body_needs_math(body: &[Block], scope: MathScope) -> bool {
    blocks_in_scope(body, scope).iter().any(Block::needs_math)
}
