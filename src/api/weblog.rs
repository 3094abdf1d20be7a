use log::debug;
use serde_json::{json, Value};

use super::{Blog, RpcClient};
use crate::{
    config::Credentials,
    error::{Error, Result},
    post::{PostFields, DESCRIPTION, TITLE},
};

/// `all_posts` asks for this many posts, the largest count XML-RPC can carry.
const ALL_POSTS: i32 = i32::MAX;

/// A blog spoken to through the metaWeblog XML-RPC API.
#[derive(Debug, Clone)]
pub struct MetaWeblogClient {
    rpc: RpcClient,
    blog_id: String,
    user: String,
    password: String,
}

impl MetaWeblogClient {
    pub fn new(credentials: Credentials, blog_id: impl Into<String>) -> Self {
        Self {
            rpc: RpcClient::new(credentials.url),
            blog_id: blog_id.into(),
            user: credentials.user,
            password: credentials.password,
        }
    }

    async fn get_recent_posts(&self, count: i32) -> Result<Vec<PostFields>> {
        let params = [
            json!(self.blog_id),
            json!(self.user),
            json!(self.password),
            json!(count),
        ];
        let response = self.rpc.call("metaWeblog.getRecentPosts", &params).await?;

        let Value::Array(posts) = response else {
            return Err(Error::Malformed("getRecentPosts did not return a list".into()));
        };
        let posts = posts
            .into_iter()
            .map(into_fields)
            .collect::<Result<Vec<_>>>()?;
        debug!("{} posts listed", posts.len());
        Ok(posts)
    }
}

impl Blog for MetaWeblogClient {
    async fn recent_posts(&self, count: usize) -> Result<Vec<PostFields>> {
        self.get_recent_posts(i32::try_from(count).unwrap_or(ALL_POSTS))
            .await
    }

    async fn all_posts(&self) -> Result<Vec<PostFields>> {
        self.get_recent_posts(ALL_POSTS).await
    }

    async fn get_post(&self, id: u64) -> Result<PostFields> {
        let params = [json!(id.to_string()), json!(self.user), json!(self.password)];
        into_fields(self.rpc.call("metaWeblog.getPost", &params).await?)
    }

    async fn new_post(&self, fields: PostFields) -> Result<u64> {
        let params = [
            json!(self.blog_id),
            json!(self.user),
            json!(self.password),
            to_wire(fields),
            json!(false),
        ];
        let response = self.rpc.call("metaWeblog.newPost", &params).await?;

        let id = match &response {
            Value::String(id) => id.trim().parse().ok(),
            Value::Number(id) => id.as_u64(),
            _ => None,
        };
        id.ok_or_else(|| Error::InvalidPostId(response.to_string()))
    }

    async fn edit_post(&self, id: u64, fields: PostFields) -> Result<bool> {
        let params = [
            json!(id.to_string()),
            json!(self.user),
            json!(self.password),
            to_wire(fields),
            json!(true),
        ];
        let response = self.rpc.call("metaWeblog.editPost", &params).await?;
        Ok(matches!(response, Value::Bool(true)))
    }
}

fn into_fields(value: Value) -> Result<PostFields> {
    match value {
        Value::Object(members) => Ok(members.into_iter().collect()),
        other => Err(Error::Malformed(format!("expected a post struct, got {}", other))),
    }
}

/// Turn header text back into the structure it was rendered from, so lists
/// such as `categories` reach the blog as lists rather than JSON strings.
/// Title and body are free text and always stay strings.
fn to_wire(fields: PostFields) -> Value {
    let members = fields
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(text) if key == TITLE || key == DESCRIPTION => Value::String(text),
                Value::String(text) if text.starts_with('[') || text.starts_with('{') => {
                    serde_json::from_str(&text).unwrap_or(Value::String(text))
                }
                other => other,
            };
            (key, value)
        })
        .collect();
    Value::Object(members)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_wire_restores_structures() {
        let fields: PostFields = [
            ("categories".to_string(), json!("[\"News\",\"Rust\"]")),
            ("title".to_string(), json!("[draft] not json")),
            ("mt_keywords".to_string(), json!("rust, sync")),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            to_wire(fields),
            json!({
                "categories": ["News", "Rust"],
                "title": "[draft] not json",
                "mt_keywords": "rust, sync",
            })
        );
    }

    #[test]
    fn to_wire_keeps_free_text() {
        let fields: PostFields = [
            (TITLE.to_string(), json!("[\"a\"]")),
            (DESCRIPTION.to_string(), json!("{\"b\": 1}")),
            ("mt_excerpt".to_string(), json!("[\"c\"]")),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            to_wire(fields),
            json!({
                "title": "[\"a\"]",
                "description": "{\"b\": 1}",
                "mt_excerpt": ["c"],
            })
        );
    }

    #[test]
    fn into_fields_requires_struct() {
        assert!(into_fields(json!({"postid": "1"})).is_ok());
        assert!(matches!(into_fields(json!("1")), Err(Error::Malformed(_))));
    }
}
