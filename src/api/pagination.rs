//! Pagination utilities for list endpoints.
//!
//! Two styles are served: page-number pagination with `next`/`previous`
//! links for the team listing, and `limit`/`offset` windows with a total
//! count for the content API.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Page-number pagination settings.
#[derive(Debug, Clone, Copy)]
pub struct PageNumberPagination {
    pub page_size: usize,
    pub max_page_size: usize,
}

impl PageNumberPagination {
    /// Page size requested by the client. Anything that is not a positive
    /// integer falls back to the default; larger values are clamped.
    pub fn page_size(&self, raw: Option<&str>) -> usize {
        match raw.and_then(|r| r.trim().parse::<i64>().ok()) {
            Some(n) if n > 0 => (n as usize).min(self.max_page_size),
            _ => self.page_size,
        }
    }

    /// Cut one page out of `items`. Page 1 always exists, even when empty.
    pub fn paginate<T>(
        &self,
        items: Vec<T>,
        page: Option<&str>,
        page_size: usize,
        links: &PageLinks,
    ) -> Result<Paginated<T>, AppError> {
        let count = items.len();
        let num_pages = count.div_ceil(page_size).max(1);

        let number = match page.map(str::trim) {
            None | Some("") => 1,
            Some("last") => num_pages,
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|n| *n >= 1 && *n <= num_pages)
                .ok_or_else(|| AppError::NotFound("Invalid page.".to_string()))?,
        };

        let start = (number - 1) * page_size;
        let results: Vec<T> = items.into_iter().skip(start).take(page_size).collect();

        Ok(Paginated {
            count,
            next: (number < num_pages).then(|| links.page(Some(number + 1))),
            previous: match number {
                1 => None,
                2 => Some(links.page(None)),
                n => Some(links.page(Some(n - 1))),
            },
            results,
        })
    }
}

/// Builds absolute links to other pages of the same request.
#[derive(Debug, Clone)]
pub struct PageLinks {
    url: String,
    params: Vec<(String, String)>,
}

impl PageLinks {
    /// `params` are the request's query parameters; any `page` among them is
    /// replaced in generated links.
    pub fn new(url: String, params: &[(String, String)]) -> Self {
        Self {
            url,
            params: params.iter().filter(|(k, _)| k != "page").cloned().collect(),
        }
    }

    /// Link to `page`, or to the first page without a `page` parameter.
    pub fn page(&self, page: Option<usize>) -> String {
        let mut pairs: Vec<String> = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect();
        if let Some(n) = page {
            pairs.push(format!("page={}", n));
        }

        if pairs.is_empty() {
            self.url.clone()
        } else {
            format!("{}?{}", self.url, pairs.join("&"))
        }
    }
}

/// Page-number response body.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    /// Same page with its results replaced, e.g. by their projections.
    pub fn with_results<U>(self, results: Vec<U>) -> Paginated<U> {
        Paginated {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results,
        }
    }
}

/// `limit`/`offset` parameters of the content API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl ListingParams {
    /// Default and maximum `limit`.
    pub const LIMIT_MAX: usize = 20;

    pub fn limit(&self) -> Result<usize, AppError> {
        let limit = match self.limit.as_deref() {
            None => Self::LIMIT_MAX,
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| AppError::BadRequest("limit must be a positive integer".to_string()))?,
        };
        if limit > Self::LIMIT_MAX {
            return Err(AppError::BadRequest(format!(
                "limit cannot be higher than {}",
                Self::LIMIT_MAX
            )));
        }
        Ok(limit)
    }

    pub fn offset(&self) -> Result<usize, AppError> {
        match self.offset.as_deref() {
            None => Ok(0),
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| AppError::BadRequest("offset must be a positive integer".to_string())),
        }
    }

    /// Apply the window to `items`, returning it with the total count.
    pub fn window<T>(&self, items: Vec<T>) -> Result<Listing<T>, AppError> {
        let limit = self.limit()?;
        let offset = self.offset()?;
        let total_count = items.len();
        Ok(Listing {
            meta: ListingMeta { total_count },
            items: items.into_iter().skip(offset).take(limit).collect(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ListingMeta {
    pub total_count: usize,
}

/// Content API listing body.
#[derive(Debug, Serialize)]
pub struct Listing<T> {
    pub meta: ListingMeta,
    pub items: Vec<T>,
}

impl<T> Listing<T> {
    pub fn with_items<U>(self, items: Vec<U>) -> Listing<U> {
        Listing {
            meta: self.meta,
            items,
        }
    }
}
