use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use sqlx::{Postgres, QueryBuilder};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use super::dto::{CatalogQuery, ProductFilter};
use super::repo::PRODUCT_COLUMNS;
use super::repo_types::ProductInput;
use crate::error::{AppError, AppResult, FieldErrors};
use crate::images::services::MultipartForm;

pub const MAX_NAME_LEN: usize = 200;
pub const MAX_TITLE_LEN: usize = 100;
/// Largest price `products.price NUMERIC(12, 2)` can hold.
// 9_999_999_999.99 (mantissa 999_999_999_999 = 0xE8_D4A5_0FFF, scale 2); `Decimal::new` is not const.
pub const MAX_PRICE: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

/// Price ordering of the catalog index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    Cheap,
    Expensive,
    #[default]
    Default,
}

impl SortMode {
    /// Unknown or empty values keep insertion order.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("cheap") => SortMode::Cheap,
            Some("expensive") => SortMode::Expensive,
            _ => SortMode::Default,
        }
    }

    fn order_by(self) -> &'static str {
        match self {
            SortMode::Cheap => " ORDER BY price ASC, id ASC",
            SortMode::Expensive => " ORDER BY price DESC, id ASC",
            SortMode::Default => " ORDER BY id ASC",
        }
    }
}

impl CatalogQuery {
    pub fn into_filter(self) -> AppResult<ProductFilter> {
        let category_id = match self.category.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<i64>().map_err(|_| {
                AppError::Validation(FieldErrors::single("category", "Select a valid category."))
            })?),
        };
        Ok(ProductFilter {
            search: self
                .q
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty()),
            category_id,
            sort: SortMode::parse(self.filter_type.as_deref()),
        })
    }
}

/// Case-insensitive substring pattern with LIKE wildcards escaped.
pub fn like_pattern(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('%');
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

/// Category restriction AND text search, then sort.
pub fn product_query(filter: &ProductFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE TRUE"));
    if let Some(category_id) = filter.category_id {
        qb.push(" AND category_id = ").push_bind(category_id);
    }
    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    qb.push(filter.sort.order_by());
    qb
}

/// Price of one unit after the percentage discount, rounded to cents.
pub fn discounted_unit_price(price: Decimal, discount_percent: Decimal) -> Decimal {
    let factor = (Decimal::ONE_HUNDRED - discount_percent) / Decimal::ONE_HUNDRED;
    (price * factor).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn validate_title(raw: &str) -> AppResult<String> {
    let title = raw.trim();
    let mut errors = FieldErrors::new();
    if title.is_empty() {
        errors.add("title", "This field is required.");
    } else if title.chars().count() > MAX_TITLE_LEN {
        errors.add("title", format!("Ensure this value has at most {MAX_TITLE_LEN} characters."));
    }
    errors.into_result()?;
    Ok(title.to_string())
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw.trim()).ok()
}

/// Validates the product form fields; category existence is checked by the caller.
pub fn validate_product(form: &MultipartForm) -> AppResult<ProductInput> {
    let mut errors = FieldErrors::new();

    let name = form.text("name").trim().to_string();
    if name.is_empty() {
        errors.add("name", "This field is required.");
    } else if name.chars().count() > MAX_NAME_LEN {
        errors.add("name", format!("Ensure this value has at most {MAX_NAME_LEN} characters."));
    }

    let price = match parse_decimal(form.text("price")) {
        Some(p) if p < Decimal::ZERO => {
            errors.add("price", "Price cannot be negative.");
            Decimal::ZERO
        }
        Some(p) if p.round_dp(2) > MAX_PRICE => {
            errors.add("price", format!("Ensure this value is at most {MAX_PRICE}."));
            Decimal::ZERO
        }
        Some(p) => p.round_dp(2),
        None => {
            errors.add("price", "Enter a number.");
            Decimal::ZERO
        }
    };

    let stock = match form.text("stock").trim().parse::<i32>() {
        Ok(s) if s >= 0 => s,
        Ok(_) => {
            errors.add("stock", "Stock cannot be negative.");
            0
        }
        Err(_) => {
            errors.add("stock", "Enter a whole number.");
            0
        }
    };

    let discount = match form.text("discount").trim() {
        "" => Decimal::ZERO,
        raw => match parse_decimal(raw) {
            Some(d) if d >= Decimal::ZERO && d <= Decimal::ONE_HUNDRED => d.round_dp(2),
            _ => {
                errors.add("discount", "Discount must be a percentage between 0 and 100.");
                Decimal::ZERO
            }
        },
    };

    let category_id = match form.text("category").trim().parse::<i64>() {
        Ok(id) => id,
        Err(_) => {
            errors.add("category", "Select a valid category.");
            0
        }
    };

    errors.into_result()?;
    Ok(ProductInput {
        name,
        price,
        description: form.text("description").trim().to_string(),
        stock,
        discount,
        category_id,
    })
}

/// `updated_at` of the product as the edit form showed it; saving is refused if it moved on.
pub fn parse_version(form: &MultipartForm) -> AppResult<OffsetDateTime> {
    OffsetDateTime::parse(form.text("updated_at").trim(), &Rfc3339).map_err(|_| {
        AppError::Validation(FieldErrors::single(
            "updated_at",
            "Missing or invalid form version; reload the form and try again.",
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> MultipartForm {
        MultipartForm {
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            file: None,
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn sort_mode_parsing() {
        assert_eq!(SortMode::parse(Some("cheap")), SortMode::Cheap);
        assert_eq!(SortMode::parse(Some("expensive")), SortMode::Expensive);
        assert_eq!(SortMode::parse(Some("newest")), SortMode::Default);
        assert_eq!(SortMode::parse(None), SortMode::Default);
    }

    #[test]
    fn query_composes_category_and_search_then_sorts() {
        let filter = ProductFilter {
            search: Some("phone".into()),
            category_id: Some(3),
            sort: SortMode::Cheap,
        };
        let qb = product_query(&filter);
        let sql = qb.sql();
        assert!(sql.contains("category_id = $1"));
        assert!(sql.contains("(name ILIKE $2 OR description ILIKE $3)"));
        assert!(sql.ends_with("ORDER BY price ASC, id ASC"));
    }

    #[test]
    fn query_without_filters_keeps_insertion_order() {
        let qb = product_query(&ProductFilter::default());
        assert!(!qb.sql().contains("ILIKE"));
        assert!(!qb.sql().contains("category_id ="));
        assert!(qb.sql().ends_with("ORDER BY id ASC"));

        let expensive = product_query(&ProductFilter {
            sort: SortMode::Expensive,
            ..Default::default()
        });
        assert!(expensive.sql().ends_with("ORDER BY price DESC, id ASC"));
    }

    #[test]
    fn catalog_query_parsing() {
        let filter = CatalogQuery {
            q: Some("  Phone ".into()),
            filter_type: Some("expensive".into()),
            category: Some("7".into()),
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter.search.as_deref(), Some("Phone"));
        assert_eq!(filter.category_id, Some(7));
        assert_eq!(filter.sort, SortMode::Expensive);

        let empty = CatalogQuery {
            q: Some("   ".into()),
            filter_type: None,
            category: Some(String::new()),
        }
        .into_filter()
        .unwrap();
        assert_eq!(empty, ProductFilter::default());

        let bad = CatalogQuery {
            category: Some("shoes".into()),
            ..Default::default()
        };
        assert!(matches!(bad.into_filter(), Err(AppError::Validation(_))));
    }

    #[test]
    fn filter_alias_is_accepted() {
        let q: CatalogQuery = serde_json::from_str(r#"{"filter":"cheap"}"#).unwrap();
        assert_eq!(q.into_filter().unwrap().sort, SortMode::Cheap);
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("phone"), "%phone%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn discount_is_a_percentage() {
        assert_eq!(discounted_unit_price(dec("100.00"), dec("0")), dec("100.00"));
        assert_eq!(discounted_unit_price(dec("100.00"), dec("15")), dec("85.00"));
        assert_eq!(discounted_unit_price(dec("19.99"), dec("10")), dec("17.99"));
        assert_eq!(discounted_unit_price(dec("0.05"), dec("50")), dec("0.03"));
        assert_eq!(discounted_unit_price(dec("42"), dec("100")), dec("0.00"));
    }

    #[test]
    fn product_form_validation() {
        let ok = validate_product(&form(&[
            ("name", " Phone X "),
            ("price", "199.90"),
            ("description", "A phone"),
            ("stock", "4"),
            ("discount", ""),
            ("category", "2"),
        ]))
        .unwrap();
        assert_eq!(ok.name, "Phone X");
        assert_eq!(ok.price, dec("199.90"));
        assert_eq!(ok.stock, 4);
        assert_eq!(ok.discount, Decimal::ZERO);
        assert_eq!(ok.category_id, 2);

        let err = validate_product(&form(&[
            ("name", ""),
            ("price", "-1"),
            ("stock", "1.5"),
            ("discount", "120"),
            ("category", ""),
        ]))
        .unwrap_err();
        match err {
            AppError::Validation(fields) => {
                for f in ["name", "price", "stock", "discount", "category"] {
                    assert!(fields.get(f).is_some(), "missing error for {f}");
                }
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn price_is_capped_at_column_size() {
        assert_eq!(MAX_PRICE, dec("9999999999.99"));
        let fields = |price: &str| {
            form(&[
                ("name", "Phone X"),
                ("price", price),
                ("stock", "1"),
                ("category", "2"),
            ])
        };

        assert_eq!(validate_product(&fields("9999999999.99")).unwrap().price, MAX_PRICE);
        for too_big in ["100000000000", "10000000000", "9999999999.995"] {
            match validate_product(&fields(too_big)) {
                Err(AppError::Validation(errors)) => assert!(errors.get("price").is_some()),
                other => panic!("{too_big} gave {other:?}"),
            }
        }
    }

    #[test]
    fn edit_version_is_required() {
        let stamp = "2026-03-01T10:15:30.123456Z";
        let version = parse_version(&form(&[("updated_at", stamp)])).unwrap();
        assert_eq!(version.format(&Rfc3339).unwrap(), stamp);

        for bad in [&[][..], &[("updated_at", "yesterday")][..]] {
            match parse_version(&form(bad)) {
                Err(AppError::Validation(errors)) => assert!(errors.get("updated_at").is_some()),
                other => panic!("unexpected: {other:?}"),
            }
        }
    }

    #[test]
    fn title_validation() {
        assert_eq!(validate_title("  Phones ").unwrap(), "Phones");
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"x".repeat(MAX_TITLE_LEN + 1)).is_err());
    }
}
