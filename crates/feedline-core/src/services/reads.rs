//! Read-side service: feeds, profiles and post details.

use std::sync::Arc;

use serde_json::json;

use crate::authz::{self, Access, Actor};
use crate::error::DomainError;
use crate::feed::{Feed, FeedComposer, FeedRequest};
use crate::feed_cache::{GlobalFeedCache, Lookup};
use crate::forms::{BoundForm, CommentInput};
use crate::pagination::{POSTS_PER_PAGE, paginate, parse_page_number};
use crate::ports::{EntityStore, Renderer};
use crate::view::{Outcome, View, paths, templates};

/// A fully rendered page body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub body: String,
    pub from_cache: bool,
}

pub struct ReadService {
    feeds: FeedComposer,
    store: Arc<dyn EntityStore>,
    cache: GlobalFeedCache,
    renderer: Arc<dyn Renderer>,
    login_url: String,
}

impl ReadService {
    pub fn new(
        store: Arc<dyn EntityStore>,
        cache: GlobalFeedCache,
        renderer: Arc<dyn Renderer>,
        login_url: impl Into<String>,
    ) -> Self {
        Self {
            feeds: FeedComposer::new(store.clone()),
            store,
            cache,
            renderer,
            login_url: login_url.into(),
        }
    }

    /// The global feed, rendered and served through the cache.
    pub async fn index(&self, page: Option<&str>) -> Result<RenderedPage, DomainError> {
        let generation = match self.cache.lookup(parse_page_number(page)).await {
            Lookup::Hit(body) => {
                tracing::debug!(page, "Global feed served from cache");
                return Ok(RenderedPage {
                    body,
                    from_cache: true,
                });
            }
            Lookup::Miss(generation) => generation,
        };

        let feed = self.feeds.compose(&FeedRequest::Global).await?;
        let rendered = feed_view(feed, page);
        let body = self.renderer.render(&rendered.view)?;
        self.cache
            .put(&generation, rendered.number, rendered.num_pages, &body)
            .await;

        Ok(RenderedPage {
            body,
            from_cache: false,
        })
    }

    pub async fn group_posts(&self, slug: &str, page: Option<&str>) -> Result<Outcome, DomainError> {
        let request = FeedRequest::Group {
            slug: slug.to_string(),
        };
        self.feed_page(&request, page).await
    }

    pub async fn profile(
        &self,
        actor: &Actor,
        username: &str,
        page: Option<&str>,
    ) -> Result<Outcome, DomainError> {
        let request = FeedRequest::Profile {
            username: username.to_string(),
            viewer: actor.user_id(),
        };
        self.feed_page(&request, page).await
    }

    pub async fn follow_index(&self, actor: &Actor, page: Option<&str>) -> Result<Outcome, DomainError> {
        let viewer = match (authz::can_view_followed_feed(actor), actor.user_id()) {
            (Access::Granted, Some(viewer)) => viewer,
            _ => {
                return Ok(Outcome::redirect(paths::login(
                    &self.login_url,
                    &paths::follow_index(),
                )));
            }
        };

        self.feed_page(&FeedRequest::Followed { viewer }, page).await
    }

    pub async fn post_detail(&self, post_id: i64) -> Result<Outcome, DomainError> {
        let thread = self
            .store
            .read_post_thread(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", post_id))?;

        Ok(Outcome::render(
            templates::POST_DETAIL,
            json!({
                "post": thread.post,
                "comments": thread.comments,
                "form": BoundForm::unbound(CommentInput::default()),
            }),
        ))
    }

    async fn feed_page(&self, request: &FeedRequest, page: Option<&str>) -> Result<Outcome, DomainError> {
        let feed = self.feeds.compose(request).await?;
        Ok(Outcome::Render(feed_view(feed, page).view))
    }
}

/// A feed page's view and where that page sits in the feed.
struct FeedView {
    view: View,
    number: usize,
    num_pages: usize,
}

/// Paginate a feed and pick its template and context.
fn feed_view(feed: Feed, page: Option<&str>) -> FeedView {
    let (template, mut context, posts) = match feed {
        Feed::Global { posts } => (templates::INDEX, json!({}), posts),
        Feed::Group { group, posts } => (templates::GROUP_LIST, json!({ "group": group }), posts),
        Feed::Profile {
            author,
            is_followed_by_viewer,
            posts,
        } => (
            templates::PROFILE,
            json!({
                "author": author,
                "following": is_followed_by_viewer,
            }),
            posts,
        ),
        Feed::Followed { posts } => (templates::FOLLOW, json!({}), posts),
    };

    let page_obj = paginate(posts, POSTS_PER_PAGE, page);
    let (number, num_pages) = (page_obj.number, page_obj.num_pages);
    context["page_obj"] = json!(page_obj);

    FeedView {
        view: View::new(template, context),
        number,
        num_pages,
    }
}
