use futures::{
    stream::{self, LocalBoxStream},
    StreamExt, TryStreamExt,
};

use crate::{
    api::Blog,
    error::{Error, Result},
    post::{Post, PostFields},
};

/// Size of the first, cheap listing page.
pub const RECENT_PAGE: usize = 5;

enum Page {
    Recent,
    Rest,
    Done,
}

/// Every post on the blog, most recent first.
///
/// The first few posts come from a short "recent" listing so callers that
/// stop early never pay for the full listing. The stream is forward-only;
/// to start over, build a new one, which repeats both listing calls.
pub fn remote_posts<B: Blog>(blog: &B) -> LocalBoxStream<'_, Result<Post>> {
    stream::try_unfold(Page::Recent, move |page| async move {
        let next = match page {
            Page::Recent => Some((blog.recent_posts(RECENT_PAGE).await?, Page::Rest)),
            Page::Rest => {
                let rest: Vec<PostFields> =
                    blog.all_posts().await?.into_iter().skip(RECENT_PAGE).collect();
                Some((rest, Page::Done))
            }
            Page::Done => None,
        };
        Ok::<_, Error>(next)
    })
    .map_ok(|page| {
        stream::iter(
            page.into_iter()
                .map(|fields| Ok::<_, Error>(Post::from_remote(fields))),
        )
    })
    .try_flatten()
    .boxed_local()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{post::TITLE, test::MemoryBlog};

    #[tokio::test]
    async fn recent_page_then_the_rest() {
        let blog = MemoryBlog::with_drafts(8);

        let posts: Vec<Post> = remote_posts(&blog).try_collect().await.unwrap();
        let titles: Vec<_> = posts
            .iter()
            .map(|post| post.text(TITLE).unwrap().into_owned())
            .collect();

        assert_eq!(titles, (1..=8).map(|n| format!("Post {}", n)).collect::<Vec<_>>());
        assert_eq!(blog.listings(), (1, 1));
    }

    #[tokio::test]
    async fn full_listing_is_lazy() {
        let blog = MemoryBlog::with_drafts(8);

        let mut posts = remote_posts(&blog);
        for _ in 0..RECENT_PAGE {
            posts.try_next().await.unwrap().unwrap();
        }
        assert_eq!(blog.listings(), (1, 0));

        posts.try_next().await.unwrap().unwrap();
        assert_eq!(blog.listings(), (1, 1));
    }
}
