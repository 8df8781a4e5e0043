use std::sync::Arc;

use crate::{filters::SearchFilters, pagination::PageSize};

/// What the user asked for, independent of where they are in the results.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryIntent<F> {
    FetchAll,
    Search(F),
}

impl<F> QueryIntent<F> {
    pub fn is_search(&self) -> bool {
        matches!(self, Self::Search(_))
    }

    /// Verb used in user facing messages.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::FetchAll => "fetch",
            Self::Search(_) => "search",
        }
    }
}

impl<F: SearchFilters> QueryIntent<F> {
    /// A search whose filters constrain nothing is a fetch-all.
    pub fn search(filters: F) -> Self {
        if filters.is_unconstrained() {
            Self::FetchAll
        } else {
            Self::Search(filters)
        }
    }
}

/// The last executed query: intent plus page and size.
///
/// The intent is shared and only ever replaced as a whole; page and size are
/// updated in place by navigation.
#[derive(Debug, Clone)]
pub struct LastQuery<F> {
    pub intent: Arc<QueryIntent<F>>,
    pub page: u32,
    pub size: PageSize,
}

impl<F> LastQuery<F> {
    pub fn fetch_all(size: PageSize) -> Self {
        Self {
            intent: Arc::new(QueryIntent::FetchAll),
            page: 0,
            size,
        }
    }

    /// Stores a new intent; new queries always start from the first page.
    pub fn replace(&mut self, intent: QueryIntent<F>, size: PageSize) {
        self.intent = Arc::new(intent);
        self.page = 0;
        self.size = size;
    }

    pub fn set_position(&mut self, page: u32, size: PageSize) {
        self.page = page;
        self.size = size;
    }
}
