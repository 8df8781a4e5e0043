use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("page size {0} not allowed, expected one of 10, 25, 50, 100")]
pub struct InvalidPageSize(pub u32);

/// Number of records per page; only the sizes offered by the dashboard are
/// representable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PageSize(u32);

impl PageSize {
    pub const ALLOWED: [u32; 4] = [10, 25, 50, 100];

    pub const TEN: Self = Self(10);
    pub const TWENTY_FIVE: Self = Self(25);
    pub const FIFTY: Self = Self(50);
    pub const HUNDRED: Self = Self(100);

    pub fn new(size: u32) -> Result<Self, InvalidPageSize> {
        if Self::ALLOWED.contains(&size) {
            Ok(Self(size))
        } else {
            Err(InvalidPageSize(size))
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Next larger allowed size, wrapping to the smallest.
    pub fn next(self) -> Self {
        let idx = Self::ALLOWED.iter().position(|s| *s == self.0).unwrap_or(0);
        Self(Self::ALLOWED[(idx + 1) % Self::ALLOWED.len()])
    }

    /// Next smaller allowed size, wrapping to the largest.
    pub fn previous(self) -> Self {
        let len = Self::ALLOWED.len();
        let idx = Self::ALLOWED.iter().position(|s| *s == self.0).unwrap_or(0);
        Self(Self::ALLOWED[(idx + len - 1) % len])
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::TEN
    }
}

impl TryFrom<u32> for PageSize {
    type Error = InvalidPageSize;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PageSize> for u32 {
    fn from(value: PageSize) -> Self {
        value.0
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position inside a paginated result.
///
/// `current_page` is zero based and always lower than `total_pages`, which
/// is at least one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageWindow {
    pub current_page: u32,
    pub total_pages: u32,
    pub page_size: PageSize,
}

impl PageWindow {
    pub fn new(page_size: PageSize) -> Self {
        Self {
            current_page: 0,
            total_pages: 1,
            page_size,
        }
    }

    pub fn last_page(&self) -> u32 {
        self.total_pages.max(1) - 1
    }

    /// Clamps `target` into `[0, total_pages - 1]`.
    pub fn clamp_page(&self, target: i64) -> u32 {
        let clamped = target.clamp(0, i64::from(self.last_page()));
        u32::try_from(clamped).unwrap_or(0)
    }

    /// Page that holds the current first record once the size becomes `new_size`.
    pub fn page_for_size(&self, new_size: PageSize) -> u32 {
        let first = self.first_record_index();
        let page = first / u64::from(new_size.get());
        u32::try_from(page).unwrap_or(u32::MAX)
    }

    pub fn first_record_index(&self) -> u64 {
        u64::from(self.current_page) * u64::from(self.page_size.get())
    }

    /// Applies the page number and count reported by the server.
    pub fn apply(&mut self, number: u32, total_pages: u32, page_size: PageSize) {
        self.total_pages = total_pages.max(1);
        self.current_page = number.min(self.total_pages - 1);
        self.page_size = page_size;
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.last_page()
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 0
    }
}

impl Default for PageWindow {
    fn default() -> Self {
        Self::new(PageSize::default())
    }
}
