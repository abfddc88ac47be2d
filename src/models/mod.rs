//! Response envelope and query parameter models for the loanbook API

use serde::{Deserialize, Serialize};
use validator::Validate;

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Reference date and threshold shared by every classified view.
///
/// Dates stay raw strings here so a malformed value is reported through the
/// loan core's own invalid-argument error instead of an extractor rejection.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ClassificationParams {
    pub as_of: Option<String>,
    #[validate(range(min = 1, max = 365))]
    pub threshold: Option<u32>,
}

/// `limit`/`offset` plus classification parameters
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub as_of: Option<String>,
    #[validate(range(min = 1, max = 365))]
    pub threshold: Option<u32>,
}

impl ListParams {
    pub fn classification(&self) -> ClassificationParams {
        ClassificationParams {
            as_of: self.as_of.clone(),
            threshold: self.threshold,
        }
    }
}

/// Application date window plus classification parameters
#[derive(Debug, Default, Deserialize, Validate)]
pub struct WindowParams {
    pub from: Option<String>,
    pub to: Option<String>,
    pub as_of: Option<String>,
    #[validate(range(min = 1, max = 365))]
    pub threshold: Option<u32>,
}

impl WindowParams {
    pub fn classification(&self) -> ClassificationParams {
        ClassificationParams {
            as_of: self.as_of.clone(),
            threshold: self.threshold,
        }
    }
}

/// Status view query: optional officer narrowing plus paging
#[derive(Debug, Default, Deserialize, Validate)]
pub struct StatusListParams {
    pub officer_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub as_of: Option<String>,
    #[validate(range(min = 1, max = 365))]
    pub threshold: Option<u32>,
}

impl StatusListParams {
    pub fn classification(&self) -> ClassificationParams {
        ClassificationParams {
            as_of: self.as_of.clone(),
            threshold: self.threshold,
        }
    }
}
