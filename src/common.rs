use serde::{Deserialize, Serialize};

/// Envelope for every JSON API response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// 0 on success.
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resp_data: Option<T>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

const DEFAULT_PER_PAGE: u32 = 20;
const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PageQuery {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(self.per_page())
    }

    pub fn paginate<T>(&self, items: Vec<T>, total: i64) -> PaginatedResponse<T> {
        PaginatedResponse {
            items,
            pagination: Pagination {
                page: self.page(),
                per_page: self.per_page(),
                total,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_bounds() {
        let query = PageQuery::default();
        assert_eq!((query.page(), query.per_page(), query.offset()), (1, 20, 0));

        let query = PageQuery {
            page: Some(0),
            per_page: Some(1000),
        };
        assert_eq!((query.page(), query.per_page()), (1, 100));

        let query = PageQuery {
            page: Some(3),
            per_page: Some(10),
        };
        assert_eq!(query.offset(), 20);
    }
}
