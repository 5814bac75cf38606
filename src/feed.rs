use tracing::debug;

use crate::api::ApiClient;
use crate::error::{Error, Result};
use crate::filter::{Filter, SearchPayload};
use crate::models::{FeedPage, Job};
use crate::pagination::Paginator;

/// What happened to a completed page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response matched the session's current identity and is now the
    /// displayed page.
    Applied,
    /// The filter or cursor changed while the request was in flight; the
    /// response was discarded.
    Superseded,
}

/// Ticket identifying one page request. A response is applied only while the
/// session identity it was issued under is still current, so a slow page-1
/// response can never overwrite a fast page-2 response.
#[derive(Debug)]
pub struct PageRequest {
    epoch: u64,
    payload: SearchPayload,
}

impl PageRequest {
    pub fn payload(&self) -> &SearchPayload {
        &self.payload
    }
}

/// One search session: the active filter, the cursor stack scoped to it, and
/// the page currently displayed. Responses are applied in completion order
/// with stale ones suppressed by epoch.
pub struct FeedSession {
    filter: Filter,
    paginator: Paginator,
    page: Option<FeedPage>,
    epoch: u64,
}

impl FeedSession {
    pub fn new() -> Self {
        Self {
            filter: Filter::default(),
            paginator: Paginator::new(),
            page: None,
            epoch: 0,
        }
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn page(&self) -> Option<&FeedPage> {
        self.page.as_ref()
    }

    pub fn jobs(&self) -> &[Job] {
        self.page.as_ref().map(|p| p.jobs.as_slice()).unwrap_or(&[])
    }

    pub fn total(&self) -> i64 {
        self.page.as_ref().map(|p| p.paging.total).unwrap_or(0)
    }

    #[allow(dead_code)]
    pub fn cursor(&self) -> Option<&str> {
        self.paginator.current()
    }

    pub fn can_retreat(&self) -> bool {
        self.paginator.can_retreat()
    }

    /// 1-based page position, derived from how deep the cursor stack is.
    pub fn page_number(&self) -> usize {
        self.paginator.depth() + 1
    }

    pub fn has_next(&self) -> bool {
        self.page
            .as_ref()
            .map(|p| p.paging.has_next_page && p.paging.next_cursor.is_some())
            .unwrap_or(false)
    }

    /// Replaces the filter wholesale. Resets pagination to the first page,
    /// drops the displayed page, and invalidates any in-flight request.
    pub fn apply_filter(&mut self, filter: Filter) {
        self.filter = filter;
        self.paginator.reset();
        self.invalidate_page();
    }

    /// `apply_filter` with every field at its default.
    #[allow(dead_code)]
    pub fn clear_filter(&mut self) {
        self.apply_filter(Filter::default());
    }

    /// Moves to the next page if the current response reported one. The
    /// cursor identity changes, so the stale page is dropped rather than
    /// shown against the wrong cursor.
    pub fn advance(&mut self) -> bool {
        let Some(page) = &self.page else { return false };
        let next = page.paging.next_cursor.clone();
        let has_next = page.paging.has_next_page;
        if self.paginator.advance(next, has_next) {
            self.invalidate_page();
            true
        } else {
            false
        }
    }

    pub fn retreat(&mut self) -> bool {
        if self.paginator.retreat() {
            self.invalidate_page();
            true
        } else {
            false
        }
    }

    fn invalidate_page(&mut self) {
        self.page = None;
        self.epoch += 1;
    }

    /// Starts a page request for the current (filter, cursor) identity.
    /// An empty filter is a user error, not a backend call.
    pub fn begin(&self) -> Result<PageRequest> {
        if self.filter.is_empty() {
            return Err(Error::EmptyFilter);
        }
        Ok(PageRequest {
            epoch: self.epoch,
            payload: self.filter.to_payload(self.paginator.current()),
        })
    }

    /// Applies a completed response, unless the session has moved on since
    /// the request was issued.
    pub fn apply(&mut self, request: &PageRequest, page: FeedPage) -> LoadOutcome {
        if request.epoch != self.epoch {
            debug!("discarding stale feed response");
            return LoadOutcome::Superseded;
        }
        self.page = Some(page);
        LoadOutcome::Applied
    }

    /// Records a failed page request. The error replaces the displayed list,
    /// but the cursor stack stays put so a retry resumes from the same page.
    /// A stale failure is suppressed like any other stale response.
    pub fn fail(&mut self, request: &PageRequest, error: Error) -> Error {
        if request.epoch == self.epoch {
            self.page = None;
        }
        error
    }

    /// Issues and applies one page request.
    pub async fn load(&mut self, api: &ApiClient) -> Result<LoadOutcome> {
        let request = self.begin()?;
        match api.fetch_jobs(request.payload()).await {
            Ok(page) => Ok(self.apply(&request, page)),
            Err(e) => Err(self.fail(&request, e)),
        }
    }
}
