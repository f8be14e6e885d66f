pub mod admin;
pub mod auth;
pub mod branches;
pub mod org;
pub mod posts;
pub mod users;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Invalid phone number or password")]
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Logged out")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Pagination envelope for list endpoints.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[aliases(
    PaginatedPosts = Paginated<posts::PostResponse>,
    PaginatedUsers = Paginated<users::UserResponse>,
    PaginatedPersons = Paginated<org::PersonResponse>,
    PaginatedDepartments = Paginated<org::DepartmentResponse>
)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, page: i64, page_size: i64, total: i64) -> Self {
        let total_pages = if page_size > 0 {
            (total + page_size - 1) / page_size
        } else {
            0
        };
        Self {
            data,
            page,
            page_size,
            total,
            total_pages,
        }
    }
}

/// Common pagination query parameters.
#[derive(Debug, Deserialize, IntoParams)]
pub struct PageParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PageParams {
    /// Clamp to sane bounds: page >= 1, 1 <= page_size <= 100.
    pub fn normalized(&self) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self.page_size.unwrap_or(10).clamp(1, 100);
        (page, page_size)
    }

    pub fn offset(&self) -> i64 {
        let (page, page_size) = self.normalized();
        (page - 1) * page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginated_total_pages() {
        let p = Paginated::new(vec![1, 2, 3], 1, 10, 23);
        assert_eq!(p.total_pages, 3);
        let empty: Paginated<i32> = Paginated::new(vec![], 1, 10, 0);
        assert_eq!(empty.total_pages, 0);
    }
}
