//! In-memory product catalog.
//!
//! The catalog is a JSON array of [`Product`] documents loaded once at
//! startup. Reads hand out clones so no lock guard ever crosses an `.await`.
//! The only write is appending a review.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use masala_core::{Category, Product, ProductError, ProductId, Review, UserId};
use thiserror::Error;

/// Errors from loading or updating the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog file could not be read.
    #[error("failed to read catalog {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Catalog file is not a valid product array.
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// A product failed validation.
    #[error("invalid product {id}: {source}")]
    InvalidProduct { id: ProductId, source: ProductError },

    /// Two products share an ID.
    #[error("duplicate product id {0}")]
    DuplicateId(ProductId),

    /// Unknown product.
    #[error("product {0} not found")]
    NotFound(ProductId),

    /// Review rejected.
    #[error(transparent)]
    Review(#[from] ProductError),
}

/// Listing filters.
#[derive(Debug, Clone, Default)]
pub struct CatalogQuery {
    /// Free-text terms, all of which must match.
    pub text: Option<String>,
    pub category: Option<Category>,
    /// Only featured products when `Some(true)`.
    pub featured: Option<bool>,
}

impl CatalogQuery {
    fn matches(&self, product: &Product) -> bool {
        if self.category.is_some_and(|c| c != product.category) {
            return false;
        }
        if self.featured.is_some_and(|f| f != product.featured) {
            return false;
        }
        self.text
            .as_deref()
            .is_none_or(|text| product.matches_query(text))
    }
}

/// The shop's products.
#[derive(Debug, Default)]
pub struct Catalog {
    products: RwLock<Vec<Product>>,
}

impl Catalog {
    /// Build a catalog, normalizing and validating every product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` on the first invalid product or duplicate ID.
    pub fn from_products(mut products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut seen = std::collections::HashSet::new();
        for product in &mut products {
            product.normalize();
            product
                .validate()
                .map_err(|source| CatalogError::InvalidProduct {
                    id: product.id,
                    source,
                })?;
            if !seen.insert(product.id) {
                return Err(CatalogError::DuplicateId(product.id));
            }
        }

        Ok(Self {
            products: RwLock::new(products),
        })
    }

    /// Parse a catalog from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the JSON is malformed or a product is invalid.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let products: Vec<Product> = serde_json::from_str(json)?;
        Self::from_products(products)
    }

    /// Load a catalog file.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json(&json)?;
        tracing::info!(path = %path.display(), products = catalog.len(), "Catalog loaded");
        Ok(catalog)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read(Vec::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All products in catalog order.
    #[must_use]
    pub fn all(&self) -> Vec<Product> {
        self.read(Clone::clone)
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<Product> {
        self.read(|products| products.iter().find(|p| p.id == id).cloned())
    }

    /// Featured products, for the home page.
    #[must_use]
    pub fn featured(&self) -> Vec<Product> {
        self.search(&CatalogQuery {
            featured: Some(true),
            ..CatalogQuery::default()
        })
    }

    /// Products in one category.
    #[must_use]
    pub fn by_category(&self, category: Category) -> Vec<Product> {
        self.search(&CatalogQuery {
            category: Some(category),
            ..CatalogQuery::default()
        })
    }

    /// Products matching every filter in `query`.
    #[must_use]
    pub fn search(&self, query: &CatalogQuery) -> Vec<Product> {
        self.read(|products| {
            products
                .iter()
                .filter(|p| query.matches(p))
                .cloned()
                .collect()
        })
    }

    /// Append a review to a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown product and
    /// `CatalogError::Review` if the review is rejected.
    pub fn add_review(
        &self,
        id: ProductId,
        user: UserId,
        name: &str,
        rating: u8,
        comment: &str,
    ) -> Result<(Product, Review), CatalogError> {
        let mut products = self.products.write().unwrap_or_else(PoisonError::into_inner);
        let product = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(CatalogError::NotFound(id))?;
        let review = product.add_review(user, name, rating, comment)?;
        tracing::info!(product_id = %id, rating, new_rating = product.rating, "Review added");
        Ok((product.clone(), review))
    }

    fn read<T>(&self, f: impl FnOnce(&Vec<Product>) -> T) -> T {
        let products = self.products.read().unwrap_or_else(PoisonError::into_inner);
        f(&products)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"[
        {"id": 1, "name": " Turmeric ", "description": "Lakadong turmeric, high curcumin",
         "price": 180, "category": "spices", "image_url": "/static/img/turmeric.jpg",
         "featured": true, "weights": ["100g", "250g"]},
        {"id": 2, "name": "Dried Mint", "description": "Sun-dried pudina leaves",
         "price": 90, "category": "herbs", "image_url": "/static/img/mint.jpg"},
        {"id": 3, "name": "Chaat Masala", "description": "Tangy blend with amchur",
         "price": 120, "category": "blends", "image_url": "/static/img/chaat.jpg",
         "discount": 10, "featured": true, "in_stock": false}
    ]"#;

    #[test]
    fn test_from_json_normalizes_names() {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get(ProductId::new(1)).unwrap().name, "Turmeric");
        assert!(catalog.get(ProductId::new(99)).is_none());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = r#"[
            {"id": 1, "name": "A", "description": "", "price": 1, "category": "herbs", "image_url": ""},
            {"id": 1, "name": "B", "description": "", "price": 1, "category": "herbs", "image_url": ""}
        ]"#;
        assert!(matches!(
            Catalog::from_json(json),
            Err(CatalogError::DuplicateId(_))
        ));
    }

    #[test]
    fn test_invalid_product_rejected() {
        let json = r#"[
            {"id": 4, "name": "A", "description": "", "price": 1, "category": "herbs",
             "image_url": "", "discount": 120}
        ]"#;
        assert!(matches!(
            Catalog::from_json(json),
            Err(CatalogError::InvalidProduct { .. })
        ));
    }

    #[test]
    fn test_unknown_category_is_a_parse_error() {
        let json = r#"[
            {"id": 4, "name": "A", "description": "", "price": 1, "category": "pickles", "image_url": ""}
        ]"#;
        assert!(matches!(Catalog::from_json(json), Err(CatalogError::Parse(_))));
    }

    #[test]
    fn test_featured() {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        let ids: Vec<_> = catalog.featured().iter().map(|p| p.id.as_i32()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_search_text_and_category() {
        let catalog = Catalog::from_json(CATALOG).unwrap();

        let by_text = catalog.search(&CatalogQuery {
            text: Some("MINT".to_string()),
            ..CatalogQuery::default()
        });
        assert_eq!(by_text.len(), 1);

        let by_category = catalog.by_category(Category::Blends);
        assert_eq!(by_category.len(), 1);
        assert_eq!(by_category[0].id, ProductId::new(3));

        let none = catalog.search(&CatalogQuery {
            text: Some("turmeric".to_string()),
            category: Some(Category::Herbs),
            featured: None,
        });
        assert!(none.is_empty());
    }

    #[test]
    fn test_add_review_updates_rating() {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        catalog
            .add_review(ProductId::new(2), UserId::new(1), "Asha", 4, "Fresh")
            .unwrap();
        let (product, review) = catalog
            .add_review(ProductId::new(2), UserId::new(2), "Ravi", 5, "Great")
            .unwrap();

        assert_eq!(review.rating, 5);
        assert!((product.rating - 4.5).abs() < f64::EPSILON);
        assert_eq!(catalog.get(ProductId::new(2)).unwrap().reviews.len(), 2);
    }

    #[test]
    fn test_add_review_errors() {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        assert!(matches!(
            catalog.add_review(ProductId::new(42), UserId::new(1), "Asha", 4, "?"),
            Err(CatalogError::NotFound(_))
        ));
        assert!(matches!(
            catalog.add_review(ProductId::new(1), UserId::new(1), "Asha", 9, "!"),
            Err(CatalogError::Review(ProductError::ReviewRatingOutOfRange(9)))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Catalog::load(&dir.path().join("missing.json")),
            Err(CatalogError::Io { .. })
        ));
    }
}
