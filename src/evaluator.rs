//! Threshold evaluation for fetched posts.

use crate::core::Post;
use crate::store::NotifiedStore;

/// Filters `posts` down to the ones that should be announced for `channel`:
/// not yet recorded, a known view count, and views at or above `threshold`.
///
/// Already-recorded posts are skipped before their view count is looked at,
/// so a post stays skipped even when its views keep growing. Posts without
/// a view counter are never eligible; a missing count is not zero.
pub fn qualifying<'a>(
    store: &'a NotifiedStore,
    channel: &'a str,
    threshold: u64,
    posts: &'a [Post],
) -> impl Iterator<Item = &'a Post> + 'a {
    posts.iter().filter(move |post| {
        if store.has(channel, post.id) {
            return false;
        }
        post.views.map_or(false, |views| views >= threshold)
    })
}
