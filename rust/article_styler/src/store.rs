//! The persistence collaborator, as traits, plus an in-memory implementation.
//!
//! Real deployments keep articles and highlights in a database behind an HTTP
//! API. The traits capture the operations the reader relies on; `MemoryStore`
//! implements them for the command line tool and for tests.

use crate::error::StoreError;
use crate::highlight::HighlightId;
use crate::model::{
    Article, ArticleId, HighlightRecord, LastReadPosition, NewHighlight, SessionId,
};
use crate::options::StyleOptions;
use crate::styler::transform_with;
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

pub trait ArticleStore {
    /// Store `raw_html` under `slug`, styling it on the way in.
    fn create_article(&mut self, slug: &str, raw_html: &str) -> Result<Article, StoreError>;

    fn article(&self, id: ArticleId) -> Result<Article, StoreError>;

    fn article_by_slug(&self, slug: &str) -> Result<Article, StoreError>;

    /// Replace the raw markup; the styled markup and title are regenerated.
    fn update_article(&mut self, id: ArticleId, raw_html: &str) -> Result<Article, StoreError>;

    fn delete_article(&mut self, id: ArticleId) -> Result<(), StoreError>;
}

pub trait HighlightStore {
    /// A reader's highlights on one article, oldest first.
    fn highlights(
        &self,
        article_id: ArticleId,
        session: &SessionId,
    ) -> Result<Vec<HighlightRecord>, StoreError>;

    fn insert_highlight(&mut self, new: NewHighlight) -> Result<HighlightRecord, StoreError>;

    /// Delete a highlight owned by `session`.
    fn delete_highlight(
        &mut self,
        id: HighlightId,
        session: &SessionId,
    ) -> Result<HighlightRecord, StoreError>;
}

pub trait LastReadStore {
    fn last_read(&self, article_id: ArticleId, session: &SessionId) -> Option<LastReadPosition>;

    fn save_last_read(
        &mut self,
        article_id: ArticleId,
        session: &SessionId,
        scroll_position: f64,
    ) -> LastReadPosition;
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn not_found(what: &'static str, key: impl ToString) -> StoreError {
    StoreError::NotFound {
        what,
        key: key.to_string(),
    }
}

#[derive(Default)]
pub struct MemoryStore {
    options: StyleOptions,
    articles: BTreeMap<ArticleId, Article>,
    highlights: BTreeMap<HighlightId, HighlightRecord>,
    last_read: BTreeMap<(ArticleId, SessionId), LastReadPosition>,
    next_article: ArticleId,
    next_highlight: HighlightId,
}

impl MemoryStore {
    pub fn new(options: StyleOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }
}

impl ArticleStore for MemoryStore {
    fn create_article(&mut self, slug: &str, raw_html: &str) -> Result<Article, StoreError> {
        if slug.is_empty() {
            return Err(StoreError::Invalid {
                what: "article",
                reason: "slug is required".to_string(),
            });
        }
        if self.articles.values().any(|a| a.slug == slug) {
            return Err(StoreError::SlugTaken {
                slug: slug.to_string(),
            });
        }

        let styled = transform_with(raw_html, &self.options);
        self.next_article += 1;
        let ts = now();
        let article = Article {
            id: self.next_article,
            slug: slug.to_string(),
            title: styled.title,
            raw_html: raw_html.to_string(),
            styled_html: styled.styled_html,
            created_at: ts,
            updated_at: ts,
        };
        log::info!("stored article {} ({})", article.id, article.slug);
        self.articles.insert(article.id, article.clone());
        Ok(article)
    }

    fn article(&self, id: ArticleId) -> Result<Article, StoreError> {
        self.articles
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("article", id))
    }

    fn article_by_slug(&self, slug: &str) -> Result<Article, StoreError> {
        self.articles
            .values()
            .find(|a| a.slug == slug)
            .cloned()
            .ok_or_else(|| not_found("article", slug))
    }

    fn update_article(&mut self, id: ArticleId, raw_html: &str) -> Result<Article, StoreError> {
        let styled = transform_with(raw_html, &self.options);
        let article = self
            .articles
            .get_mut(&id)
            .ok_or_else(|| not_found("article", id))?;
        article.raw_html = raw_html.to_string();
        article.title = styled.title;
        article.styled_html = styled.styled_html;
        article.updated_at = now();
        Ok(article.clone())
    }

    fn delete_article(&mut self, id: ArticleId) -> Result<(), StoreError> {
        self.articles
            .remove(&id)
            .ok_or_else(|| not_found("article", id))?;
        self.highlights.retain(|_, h| h.article_id != id);
        self.last_read.retain(|(article_id, _), _| *article_id != id);
        Ok(())
    }
}

impl HighlightStore for MemoryStore {
    fn highlights(
        &self,
        article_id: ArticleId,
        session: &SessionId,
    ) -> Result<Vec<HighlightRecord>, StoreError> {
        Ok(self
            .highlights
            .values()
            .filter(|h| h.article_id == article_id && &h.session == session)
            .cloned()
            .collect())
    }

    fn insert_highlight(&mut self, new: NewHighlight) -> Result<HighlightRecord, StoreError> {
        new.validate()?;
        if !self.articles.contains_key(&new.article_id) {
            return Err(not_found("article", new.article_id));
        }
        let duplicate = self.highlights.values().any(|h| {
            h.article_id == new.article_id
                && h.session == new.session
                && h.start_offset == new.start_offset
                && h.end_offset == new.end_offset
        });
        if duplicate {
            return Err(StoreError::DuplicateHighlight {
                start_offset: new.start_offset,
                end_offset: new.end_offset,
            });
        }

        self.next_highlight += 1;
        let ts = now();
        let record = HighlightRecord {
            id: self.next_highlight,
            article_id: new.article_id,
            session: new.session,
            highlighted_text: new.highlighted_text,
            start_offset: new.start_offset,
            end_offset: new.end_offset,
            container_path: new.container_path,
            color: new.color,
            note: new.note,
            created_at: ts,
            updated_at: ts,
        };
        self.highlights.insert(record.id, record.clone());
        Ok(record)
    }

    fn delete_highlight(
        &mut self,
        id: HighlightId,
        session: &SessionId,
    ) -> Result<HighlightRecord, StoreError> {
        match self.highlights.get(&id) {
            Some(h) if &h.session == session => {}
            _ => return Err(not_found("highlight", id)),
        }
        self.highlights
            .remove(&id)
            .ok_or_else(|| not_found("highlight", id))
    }
}

impl LastReadStore for MemoryStore {
    fn last_read(&self, article_id: ArticleId, session: &SessionId) -> Option<LastReadPosition> {
        self.last_read.get(&(article_id, session.clone())).cloned()
    }

    fn save_last_read(
        &mut self,
        article_id: ArticleId,
        session: &SessionId,
        scroll_position: f64,
    ) -> LastReadPosition {
        let pos = LastReadPosition {
            article_id,
            session: session.clone(),
            scroll_position,
            updated_at: now(),
        };
        self.last_read.insert((article_id, session.clone()), pos.clone());
        pos
    }
}
