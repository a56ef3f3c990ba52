//! Catalog commands.
//!
//! Catalogs are authored in YAML and served as JSON. `import` converts and
//! validates in one step so the storefront never starts on a bad file.
//!
//! # Usage
//!
//! ```bash
//! masala-cli catalog import catalog.yaml -o crates/storefront/content/products.json
//! masala-cli catalog validate crates/storefront/content/products.json
//! ```

use std::io::{self, Write};
use std::path::Path;

use masala_core::Product;
use masala_storefront::catalog::Catalog;
use tracing::info;

use super::CliError;

/// Convert a YAML catalog to JSON.
///
/// Products are normalized and validated before anything is written.
///
/// # Errors
///
/// Returns an error if the input cannot be read or parsed, a product is
/// invalid, or the output cannot be written.
pub fn import(input: &Path, output: &Path) -> Result<usize, CliError> {
    let yaml = std::fs::read_to_string(input).map_err(|source| CliError::Io {
        path: input.to_path_buf(),
        source,
    })?;
    let products: Vec<Product> = serde_yaml::from_str(&yaml)?;
    info!(path = %input.display(), products = products.len(), "Parsed catalog");

    let catalog = Catalog::from_products(products)?;
    let json = serde_json::to_string_pretty(&catalog.all())?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| CliError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(output, json + "\n").map_err(|source| CliError::Io {
        path: output.to_path_buf(),
        source,
    })?;

    info!(path = %output.display(), products = catalog.len(), "Catalog written");
    Ok(catalog.len())
}

/// Check that a JSON catalog loads.
///
/// # Errors
///
/// Returns the first load or validation error.
pub fn validate(path: &Path) -> Result<(), CliError> {
    let catalog = Catalog::load(path)?;
    writeln!(
        io::stdout().lock(),
        "{}: {} products, {} featured",
        path.display(),
        catalog.len(),
        catalog.featured().len()
    )?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use masala_storefront::catalog::CatalogError;

    use super::*;

    const YAML: &str = r"
- id: 1
  name: '  Lakadong Turmeric '
  description: High-curcumin turmeric
  price: 180
  category: spices
  image_url: /static/img/turmeric.jpg
  featured: true
  weights: [100g, 250g]
- id: 2
  name: Kasuri Methi
  description: Dried fenugreek leaves
  price: 95
  category: herbs
  image_url: /static/img/kasuri-methi.jpg
";

    #[test]
    fn test_import_writes_validated_json() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("catalog.yaml");
        let output = dir.path().join("out").join("products.json");
        std::fs::write(&input, YAML).unwrap();

        assert_eq!(import(&input, &output).unwrap(), 2);

        let catalog = Catalog::load(&output).unwrap();
        assert_eq!(catalog.len(), 2);
        let turmeric = catalog.all().into_iter().next().unwrap();
        assert_eq!(turmeric.name, "Lakadong Turmeric");
        assert!(turmeric.in_stock);
        validate(&output).unwrap();
    }

    #[test]
    fn test_import_rejects_invalid_product() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("catalog.yaml");
        let output = dir.path().join("products.json");
        std::fs::write(&input, YAML.replace("price: 95", "price: -95")).unwrap();

        assert!(matches!(
            import(&input, &output),
            Err(CliError::Catalog(CatalogError::InvalidProduct { .. }))
        ));
        assert!(!output.exists());
    }

    #[test]
    fn test_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            import(&dir.path().join("nope.yaml"), &dir.path().join("out.json")),
            Err(CliError::Io { .. })
        ));
        assert!(matches!(
            validate(&dir.path().join("nope.json")),
            Err(CliError::Catalog(CatalogError::Io { .. }))
        ));
    }
}
