//! Response envelopes: `{"data": ...}` for one record, `{"data", "links", "meta"}` for a page.

use crate::error::AppError;
use crate::service::PAGE_PARAM;
use axum::{http::StatusCode, Json};
use serde::Serialize;
use url::Url;

#[derive(Debug, Serialize)]
pub struct SuccessOne<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub links: PageLinks,
    pub meta: PageMeta,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct PageLinks {
    pub first: String,
    pub last: String,
    pub prev: Option<String>,
    pub next: Option<String>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct PageMeta {
    pub current_page: u32,
    pub from: Option<u64>,
    pub to: Option<u64>,
    pub last_page: u32,
    pub path: String,
    pub per_page: u32,
    pub total: u64,
}

pub fn success_created<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (StatusCode::CREATED, Json(SuccessOne { data }))
}

pub fn success_ok<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (StatusCode::OK, Json(SuccessOne { data }))
}

/// Where a page lives: absolute path URL plus the request's query pairs (kept across links).
#[derive(Clone, Debug)]
pub struct PageLocation {
    pub path: Url,
    pub query: Vec<(String, String)>,
}

impl PageLocation {
    pub fn new(app_url: &Url, path: &str, query: Vec<(String, String)>) -> Result<Self, AppError> {
        let path = app_url
            .join(path)
            .map_err(|e| AppError::Internal(format!("cannot build page url: {}", e)))?;
        Ok(PageLocation { path, query })
    }

    /// URL for `page`, preserving every other query parameter.
    pub fn page_url(&self, page: u32) -> String {
        let mut url = self.path.clone();
        url.set_query(None);
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in self.query.iter().filter(|(k, _)| k != PAGE_PARAM) {
                pairs.append_pair(k, v);
            }
            pairs.append_pair(PAGE_PARAM, &page.to_string());
        }
        url.to_string()
    }

    fn path_string(&self) -> String {
        let mut url = self.path.clone();
        url.set_query(None);
        url.to_string()
    }
}

pub fn paginated<T>(data: Vec<T>, total: u64, page: u32, per_page: u32, location: &PageLocation) -> Paginated<T> {
    let last_page = u32::try_from(total.div_ceil(u64::from(per_page.max(1))))
        .unwrap_or(u32::MAX)
        .max(1);
    let (from, to) = if data.is_empty() {
        (None, None)
    } else {
        let from = u64::from(page.saturating_sub(1)) * u64::from(per_page) + 1;
        (Some(from), Some(from + data.len() as u64 - 1))
    };
    Paginated {
        links: PageLinks {
            first: location.page_url(1),
            last: location.page_url(last_page),
            prev: (page > 1).then(|| location.page_url(page - 1)),
            next: (page < last_page).then(|| location.page_url(page + 1)),
        },
        meta: PageMeta {
            current_page: page,
            from,
            to,
            last_page,
            path: location.path_string(),
            per_page,
            total,
        },
        data,
    }
}
