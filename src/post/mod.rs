mod file;
mod slug;

pub use slug::is_post_path;

use std::{borrow::Cow, collections::BTreeMap};

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Raw field mapping as exchanged with the blog.
///
/// Keys stay sorted, which is also the order headers are written in.
pub type PostFields = BTreeMap<String, Value>;

pub const POSTID: &str = "postid";
pub const TITLE: &str = "title";
pub const DESCRIPTION: &str = "description";
pub const DATE_CREATED: &str = "dateCreated";
pub const POST_STATUS: &str = "post_status";
pub const WP_SLUG: &str = "wp_slug";

/// Fields that have no flat text form. Never written, never read back.
pub const IGNORE_FIELDS: [&str; 2] = ["custom_fields", "sticky"];
/// Fields owned by the blog. Never sent back to it.
pub const READ_ONLY_FIELDS: [&str; 2] = ["dateCreated", "date_created_gmt"];

/// A blog post: header fields plus a free-form `description` body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Post {
    fields: PostFields,
}

/// Digest of a serialized post. Only meaningful for equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; 32]);

impl Post {
    pub fn from_remote(fields: PostFields) -> Self {
        Self { fields }
    }

    /// Parse the on-disk form.
    ///
    /// Leading `.key value` lines are headers. The first line that is not
    /// one starts the body, and everything after it belongs to the body even
    /// if it happens to start with a dot.
    pub fn parse(contents: &str) -> Self {
        let mut fields = PostFields::new();
        let mut lines = contents.split('\n');
        let mut description = vec![];

        for line in lines.by_ref() {
            let Some(header) = line.strip_prefix('.') else {
                description.push(line);
                break;
            };
            let (key, value) = header.split_once(' ').unwrap_or((header, ""));
            if !IGNORE_FIELDS.contains(&key) {
                fields.insert(key.to_string(), Value::String(value.to_string()));
            }
        }
        description.extend(lines);

        fields.insert(
            DESCRIPTION.to_string(),
            Value::String(description.join("\n")),
        );
        Self { fields }
    }

    pub fn serialize(&self) -> Result<String> {
        let description = self
            .fields
            .get(DESCRIPTION)
            .ok_or(Error::MissingDescription)?;

        let mut lines = self
            .fields
            .iter()
            .filter(|(key, _)| {
                key.as_str() != DESCRIPTION && !IGNORE_FIELDS.contains(&key.as_str())
            })
            .map(|(key, value)| {
                let value = render(value);
                if value.contains(['\n', '\r']) {
                    return Err(Error::MultilineHeader(key.clone()));
                }
                Ok(format!(".{} {}", key, value))
            })
            .collect::<Result<Vec<_>>>()?;
        lines.push(render(description).into_owned());

        Ok(lines.join("\n"))
    }

    pub fn signature(&self) -> Result<Signature> {
        let digest = Sha256::digest(self.serialize()?.as_bytes());
        Ok(Signature(digest.into()))
    }

    /// Fields to send on create/edit, without the ones the blog owns.
    pub fn outbound(&self) -> PostFields {
        let mut fields = self.fields.clone();
        for key in READ_ONLY_FIELDS {
            fields.remove(key);
        }
        fields
    }

    /// The remote id, or `None` for a post the blog has not seen yet.
    pub fn id(&self) -> Result<Option<u64>> {
        let Some(value) = self.text(POSTID) else {
            return Ok(None);
        };
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }

        let id: u64 = value
            .parse()
            .map_err(|_| Error::InvalidPostId(value.to_string()))?;
        Ok((id != 0).then_some(id))
    }

    /// A field as it would appear in a header line.
    pub fn text(&self, key: &str) -> Option<Cow<'_, str>> {
        self.fields.get(key).map(render)
    }

    #[cfg(test)]
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn is_draft(&self) -> bool {
        self.text(POST_STATUS)
            .map_or(true, |status| status == "draft")
    }
}

fn render(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(text) => Cow::Borrowed(text),
        Value::Null => Cow::Borrowed(""),
        other => Cow::Owned(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample() -> Post {
        let mut post = Post::default();
        post.set(POSTID, "42");
        post.set(TITLE, "Launch day");
        post.set(POST_STATUS, "publish");
        post.set(WP_SLUG, "launch-day");
        post.set(DESCRIPTION, "First line\n\n.not a header\nlast");
        post
    }

    #[test]
    fn serialize_sorts_headers_and_puts_body_last() {
        let text = sample().serialize().unwrap();
        assert_eq!(
            text,
            ".post_status publish\n.postid 42\n.title Launch day\n.wp_slug launch-day\nFirst line\n\n.not a header\nlast"
        );
    }

    #[test]
    fn parse_round_trips() {
        let post = sample();
        let parsed = Post::parse(&post.serialize().unwrap());
        assert_eq!(parsed, post);
        assert_eq!(parsed.serialize().unwrap(), post.serialize().unwrap());
    }

    #[test]
    fn parse_empty_input() {
        let post = Post::parse("");
        assert_eq!(post.text(DESCRIPTION).as_deref(), Some(""));
        assert_eq!(post.serialize().unwrap(), "");
    }

    #[test]
    fn parse_header_without_value() {
        let post = Post::parse(".wp_slug\n.title Hi\nbody");
        assert_eq!(post.text(WP_SLUG).as_deref(), Some(""));
        assert_eq!(post.text(TITLE).as_deref(), Some("Hi"));
        assert_eq!(post.text(DESCRIPTION).as_deref(), Some("body"));
    }

    #[test]
    fn parse_never_reenters_header_mode() {
        let post = Post::parse(".title T\n\n.postid 7\ntext");
        assert_eq!(post.text(POSTID), None);
        assert_eq!(post.text(DESCRIPTION).as_deref(), Some("\n.postid 7\ntext"));
    }

    #[test]
    fn ignored_fields_are_dropped() {
        let mut post = sample();
        post.set("sticky", true);
        post.set("custom_fields", json!([{"key": "a", "value": "b"}]));
        let text = post.serialize().unwrap();
        assert!(!text.contains("sticky"));
        assert!(!text.contains("custom_fields"));

        let parsed = Post::parse(".sticky 1\n.custom_fields x\n.title T\nbody");
        assert_eq!(parsed.text("sticky"), None);
        assert_eq!(parsed.text("custom_fields"), None);
        assert_eq!(parsed.text(TITLE).as_deref(), Some("T"));
    }

    #[test]
    fn structured_values_render_as_json() {
        let mut post = sample();
        post.set("categories", json!(["News", "Rust"]));
        post.set(POSTID, 42);
        let text = post.serialize().unwrap();
        assert!(text.contains(".categories [\"News\",\"Rust\"]\n"));
        assert!(text.contains(".postid 42\n"));
    }

    #[test]
    fn serialize_requires_description() {
        let mut post = Post::default();
        post.set(TITLE, "no body");
        assert!(matches!(post.serialize(), Err(Error::MissingDescription)));
        assert!(post.signature().is_err());
    }

    #[test]
    fn multiline_header_is_refused() {
        let mut post = sample();
        post.set("mt_text_more", "rest of\nthe post");
        assert!(matches!(
            post.serialize(),
            Err(Error::MultilineHeader(key)) if key == "mt_text_more"
        ));

        post.set("mt_text_more", "windows\r");
        assert!(matches!(post.serialize(), Err(Error::MultilineHeader(_))));
    }

    #[test]
    fn outbound_strips_read_only_fields() {
        let mut post = sample();
        post.set(DATE_CREATED, "20230615T00:00:00");
        post.set("date_created_gmt", "20230615T04:00:00");
        let fields = post.outbound();
        assert!(!fields.contains_key(DATE_CREATED));
        assert!(!fields.contains_key("date_created_gmt"));
        assert_eq!(fields.get(TITLE), Some(&json!("Launch day")));
        assert_eq!(post.text(DATE_CREATED).as_deref(), Some("20230615T00:00:00"));
    }

    #[test]
    fn id_parsing() {
        assert_eq!(Post::parse(".postid 42\n").id().unwrap(), Some(42));
        assert_eq!(Post::parse(".postid 0\n").id().unwrap(), None);
        assert_eq!(Post::parse(".postid\n").id().unwrap(), None);
        assert_eq!(Post::parse("body").id().unwrap(), None);
        assert!(matches!(
            Post::parse(".postid abc\n").id(),
            Err(Error::InvalidPostId(id)) if id == "abc"
        ));
    }

    #[test]
    fn signature_tracks_body() {
        let post = sample();
        let mut edited = sample();
        edited.set(DESCRIPTION, "something else");
        assert_eq!(post.signature().unwrap(), sample().signature().unwrap());
        assert_ne!(post.signature().unwrap(), edited.signature().unwrap());
    }

    #[test]
    fn missing_status_is_draft() {
        let mut post = sample();
        assert!(!post.is_draft());
        post.set(POST_STATUS, "draft");
        assert!(post.is_draft());
        assert!(Post::parse("body").is_draft());
    }
}
