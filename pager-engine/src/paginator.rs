use crate::emitter::PageEmitter;
use crate::error::PagerError;
use crate::page::{Cursor, Page};
use crate::request::{PaginationMode, RequestContext};
use crate::{CloudApi, PageQuery};

use futures::Stream;
use log::debug;

/// Outcome of a pagination run
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub mode: PaginationMode,
    /// Pages fetched successfully
    pub pages: usize,
    /// Items received across those pages
    pub items: usize,
    /// Cursor of the next unfetched page, if the server has more
    pub next_cursor: Option<Cursor>,
}

/// Lazily walks the pages of one describe/list request.
///
/// Pages are fetched one at a time, only when asked for. In automatic mode
/// the paginator follows continuation tokens until the server stops
/// returning one or the running item count reaches the request's cap. A cap
/// never truncates a page: the page that crosses it is returned whole. In
/// manual mode exactly one page is fetched and its token is left for the
/// caller.
///
/// A failed fetch ends the sequence. Pages already returned stay returned,
/// and [`Paginator::resume_cursor`] still points at the page that failed.
pub struct Paginator<'a> {
    api: &'a dyn CloudApi,
    request: &'a RequestContext,
    mode: PaginationMode,
    next: Option<Cursor>,
    pages: usize,
    items: usize,
    finished: bool,
}

impl<'a> Paginator<'a> {
    pub fn new(api: &'a dyn CloudApi, request: &'a RequestContext) -> Self {
        Self {
            api,
            request,
            mode: request.mode(),
            next: request.cursor().cloned(),
            pages: 0,
            items: 0,
            finished: false,
        }
    }

    /// Picks up a previous run at `cursor`, keeping the request's own mode.
    pub fn starting_at(api: &'a dyn CloudApi, request: &'a RequestContext, cursor: Cursor) -> Self {
        let mut paginator = Self::new(api, request);
        paginator.next = Some(cursor);
        paginator
    }

    pub fn mode(&self) -> PaginationMode {
        self.mode
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Cursor the next fetch would use; `None` once the last page was seen.
    pub fn resume_cursor(&self) -> Option<&Cursor> {
        self.next.as_ref()
    }

    pub fn summary(&self) -> Summary {
        Summary {
            mode: self.mode,
            pages: self.pages,
            items: self.items,
            next_cursor: self.next.clone(),
        }
    }

    /// Fetches the next page, or returns `None` once the sequence is over.
    pub async fn next_page(&mut self) -> Option<Result<Page, PagerError>> {
        if self.finished {
            return None;
        }

        debug!(
            "Fetching page {} of {} (cursor: {:?})",
            self.pages + 1,
            self.request.operation(),
            self.next.as_ref().map(Cursor::as_str)
        );
        let query = PageQuery {
            operation: self.request.operation(),
            fields: self.request.fields(),
            cursor: self.next.as_ref(),
            page_size: self.request.page_size(),
            items_key: self.request.items_key(),
        };
        let page = match self.api.invoke_page(query).await {
            Ok(page) => page,
            Err(e) => {
                debug!("Stopping {} after error: {}", self.request.operation(), e);
                self.finished = true;
                return Some(Err(e));
            }
        };

        self.pages += 1;
        self.items += page.len();
        self.next = page.next_cursor.clone();
        if let Some(reason) = self.stop_reason() {
            debug!(
                "Stopping {} after {} page(s), {} item(s): {}",
                self.request.operation(),
                self.pages,
                self.items,
                reason
            );
            self.finished = true;
        }
        Some(Ok(page))
    }

    fn stop_reason(&self) -> Option<&'static str> {
        if self.next.is_none() {
            Some("no continuation token")
        } else if self.mode == PaginationMode::Manual {
            Some("caller-controlled pagination")
        } else if self
            .request
            .max_items()
            .is_some_and(|cap| self.items >= cap)
        {
            Some("item cap reached")
        } else {
            None
        }
    }

    /// The remaining pages as a stream.
    pub fn into_stream(self) -> impl Stream<Item = Result<Page, PagerError>> + 'a {
        futures::stream::unfold(self, |mut paginator| async move {
            paginator
                .next_page()
                .await
                .map(|page| (page, paginator))
        })
    }

    /// Forwards every remaining page to `emitter` as soon as it arrives.
    ///
    /// Stops at the first fetch or emit error; whatever was emitted before it
    /// is left in place and [`Paginator::resume_cursor`] points at the first
    /// page that was not fully emitted.
    pub async fn drive<E: PageEmitter + ?Sized>(
        &mut self,
        emitter: &mut E,
    ) -> Result<Summary, PagerError> {
        loop {
            let fetched_with = self.next.clone();
            let Some(page) = self.next_page().await else {
                break;
            };
            let page = page?;
            if let Err(e) = emitter.emit_page(&page) {
                // The page was not written out; resume from the cursor that fetched it.
                debug!("Stopping {} after emit error: {}", self.request.operation(), e);
                self.next = fetched_with;
                self.finished = true;
                return Err(e);
            }
        }
        let summary = self.summary();
        emitter.finish(&summary)?;
        Ok(summary)
    }
}
