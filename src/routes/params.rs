use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    /// Page number, default 1
    pub page: Option<i64>,
    /// Items per page, default 20, max 100
    pub per_page: Option<i64>,
}

/// Deepest page a listing will serve; larger requests are clamped to it.
pub const MAX_PAGE: i64 = 1_000_000;

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).clamp(1, MAX_PAGE);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;
        (page, per_page, offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[serde(alias = "ASC")]
    Asc,
    #[serde(alias = "DESC")]
    Desc,
}

/// Columns a product listing may be ordered by. Anything else fails deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortBy {
    CreatedAt,
    Name,
    Price,
    Quantity,
}

// Flattening a Pagination here would break numeric parsing under serde_urlencoded.
#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Exact category match
    pub category: Option<String>,
    /// Case-insensitive substring over name and description
    pub search: Option<String>,
    #[param(value_type = Option<String>)]
    #[schema(value_type = Option<String>)]
    pub min_price: Option<Decimal>,
    #[param(value_type = Option<String>)]
    #[schema(value_type = Option<String>)]
    pub max_price: Option<Decimal>,
    #[param(inline)]
    pub sort_by: Option<ProductSortBy>,
    #[param(inline)]
    pub order: Option<SortOrder>,
}

impl ProductQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Filter by status
    pub status: Option<String>,
    #[param(inline)]
    pub order: Option<SortOrder>,
}

impl OrderListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::Uri};

    fn parse(uri: &str) -> Result<ProductQuery, String> {
        let uri: Uri = uri.parse().unwrap();
        Query::<ProductQuery>::try_from_uri(&uri)
            .map(|Query(q)| q)
            .map_err(|e| e.body_text())
    }

    #[test]
    fn pagination_is_clamped() {
        let p = Pagination {
            page: Some(0),
            per_page: Some(1000),
        };
        assert_eq!(p.normalize(), (1, 100, 0));

        let p = Pagination {
            page: Some(3),
            per_page: None,
        };
        assert_eq!(p.normalize(), (3, 20, 40));
    }

    #[test]
    fn huge_page_is_clamped_without_overflow() {
        let p = Pagination {
            page: Some(i64::MAX),
            per_page: Some(100),
        };
        assert_eq!(p.normalize(), (MAX_PAGE, 100, (MAX_PAGE - 1) * 100));

        let p = Pagination {
            page: Some(i64::MIN),
            per_page: Some(i64::MIN),
        };
        assert_eq!(p.normalize(), (1, 1, 0));
    }

    #[test]
    fn product_query_parses_filters_and_sort() {
        let q = parse("/products?category=Electronics&search=phone&sort_by=price&order=desc&page=2")
            .unwrap();
        assert_eq!(q.category.as_deref(), Some("Electronics"));
        assert_eq!(q.search.as_deref(), Some("phone"));
        assert_eq!(q.sort_by, Some(ProductSortBy::Price));
        assert_eq!(q.order, Some(SortOrder::Desc));
        assert_eq!(q.pagination().normalize(), (2, 20, 20));
    }

    #[test]
    fn uppercase_order_is_accepted() {
        let q = parse("/products?sort_by=name&order=ASC").unwrap();
        assert_eq!(q.order, Some(SortOrder::Asc));
    }

    #[test]
    fn unknown_sort_column_is_rejected() {
        assert!(parse("/products?sort_by=price%3BDROP%20TABLE%20users").is_err());
        assert!(parse("/products?sort_by=password_hash").is_err());
    }

    #[test]
    fn price_bounds_parse_as_decimals() {
        let q = parse("/products?min_price=10.50&max_price=99").unwrap();
        assert_eq!(q.min_price, Some(Decimal::new(1050, 2)));
        assert_eq!(q.max_price, Some(Decimal::from(99)));
    }
}
