use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Post, DATE_CREATED, POSTID, TITLE, WP_SLUG};
use crate::error::{Error, Result};

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<.*?>").unwrap());
static PERCENT_ESCAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"%[a-fA-F0-9]{2}").unwrap());
static ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"&.+?;").unwrap());
static NOT_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9 _-]").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static HYPHENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").unwrap());

/// Roughly WordPress' `sanitize_title_with_dashes`.
///
/// Accents are not transliterated, so titles with accented letters may not
/// match the slug the blog itself generates.
pub fn slugify(title: &str) -> String {
    let slug = TAG.replace_all(title, "");
    let slug = PERCENT_ESCAPE.replace_all(&slug, "-");
    let slug = slug.replace('%', "").to_lowercase();
    let slug = ENTITY.replace_all(&slug, "");
    let slug = NOT_SLUG.replace_all(&slug, "");
    let slug = WHITESPACE.replace_all(&slug, "-");
    let slug = HYPHENS.replace_all(&slug, "-");
    slug.trim_matches('-').to_string()
}

/// Whether a repository-relative path is shaped like a post file:
/// `draft/<slug>` or `<year>/<month>/<slug>`.
pub fn is_post_path(path: &Path) -> bool {
    fn digits(part: &str, len: usize) -> bool {
        part.len() == len && part.bytes().all(|b| b.is_ascii_digit())
    }

    let parts: Vec<String> = path
        .iter()
        .map(|part| part.to_string_lossy().into_owned())
        .collect();
    match parts.as_slice() {
        [folder, _] => folder == "draft",
        [year, month, _] => digits(year, 4) && digits(month, 2),
        _ => false,
    }
}

impl Post {
    /// Path of this post relative to the repository root.
    ///
    /// Drafts live in `draft/<slug>`, everything else in `<year>/<month>/<slug>`
    /// taken from `dateCreated`. Renaming a post does not touch the file at its
    /// old path.
    pub fn filename(&self) -> Result<PathBuf> {
        let slug = self.slug().ok_or(Error::Unnamed)?;

        if self.is_draft() {
            return Ok(PathBuf::from("draft").join(slug));
        }

        let created = self
            .text(DATE_CREATED)
            .filter(|created| !created.is_empty())
            .ok_or_else(|| Error::MissingDate(slug.clone()))?;
        let year: String = created.chars().take(4).collect();
        let month: String = created.chars().skip(4).take(2).collect();

        Ok(PathBuf::from(year).join(month).join(slug))
    }

    fn slug(&self) -> Option<String> {
        let non_empty = |s: String| (!s.is_empty()).then_some(s);

        self.text(WP_SLUG)
            .and_then(|slug| non_empty(slug.into_owned()))
            .or_else(|| self.text(TITLE).and_then(|title| non_empty(slugify(&title))))
            .or_else(|| self.text(POSTID).and_then(|id| non_empty(id.into_owned())))
    }
}
