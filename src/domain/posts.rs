//! Post lifecycle rules.
//!
//! A post is a draft until its `published_at` timestamp is set. It counts as
//! published only once that timestamp is non-null and not in the future;
//! re-publishing is allowed and always overwrites the timestamp with "now".

use time::OffsetDateTime;

use crate::domain::entities::PostRecord;

impl PostRecord {
    /// Whether the post is visible in the public catalog at `now`.
    pub fn is_published(&self, now: OffsetDateTime) -> bool {
        matches!(self.published_at, Some(at) if at <= now)
    }

    /// Drafts carry no published timestamp at all.
    pub fn is_draft(&self) -> bool {
        self.published_at.is_none()
    }
}
