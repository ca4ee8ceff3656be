//! Persisted cart storage.
//!
//! The cart is client-local; there is no server record of it until order
//! creation. [`CartStore`] is the seam the orchestrator is injected with:
//! production code uses [`JsonCartStore`] (one JSON file, the serialized
//! form of [`Cart`]), tests use [`MemoryCartStore`].

use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use lapacho_core::Cart;

/// Errors reading or writing the persisted cart.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("cart file is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Storage for the client-local cart.
pub trait CartStore {
    /// Read the persisted cart. Absence is an empty cart, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the store exists but cannot be read or parsed.
    fn get(&self) -> Result<Cart, StoreError>;

    /// Replace the persisted cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be written.
    fn set(&self, cart: &Cart) -> Result<(), StoreError>;

    /// Remove the persisted cart entirely.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be cleared.
    fn clear(&self) -> Result<(), StoreError>;
}

impl<T: CartStore> CartStore for std::sync::Arc<T> {
    fn get(&self) -> Result<Cart, StoreError> {
        (**self).get()
    }

    fn set(&self, cart: &Cart) -> Result<(), StoreError> {
        (**self).set(cart)
    }

    fn clear(&self) -> Result<(), StoreError> {
        (**self).clear()
    }
}

/// File-backed cart store: one JSON document, the serialized [`Cart`].
#[derive(Debug, Clone)]
pub struct JsonCartStore {
    path: PathBuf,
}

impl JsonCartStore {
    /// Create a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CartStore for JsonCartStore {
    fn get(&self) -> Result<Cart, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Cart::default()),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, cart: &Cart) -> Result<(), StoreError> {
        let raw = serde_json::to_string(cart)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-memory cart store for tests.
#[derive(Debug, Default)]
pub struct MemoryCartStore {
    cart: Mutex<Option<Cart>>,
}

impl MemoryCartStore {
    /// Create a store pre-populated with a cart.
    #[must_use]
    pub fn with_cart(cart: Cart) -> Self {
        Self {
            cart: Mutex::new(Some(cart)),
        }
    }

    /// Whether the store currently holds a cart.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn is_cleared(&self) -> bool {
        self.cart.lock().expect("cart mutex poisoned").is_none()
    }
}

impl CartStore for MemoryCartStore {
    fn get(&self) -> Result<Cart, StoreError> {
        Ok(self
            .cart
            .lock()
            .expect("cart mutex poisoned")
            .clone()
            .unwrap_or_default())
    }

    fn set(&self, cart: &Cart) -> Result<(), StoreError> {
        *self.cart.lock().expect("cart mutex poisoned") = Some(cart.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.cart.lock().expect("cart mutex poisoned") = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lapacho_core::{CartItem, ProductId};
    use rust_decimal::Decimal;

    fn sample_cart() -> Cart {
        Cart::new(vec![CartItem {
            product_id: ProductId::new(1),
            variant_id: None,
            name: "Ambo clásico".to_owned(),
            unit_price: Decimal::from(2500),
            quantity: 2,
            size: Some("M".to_owned()),
            color: None,
            stock: None,
        }])
    }

    #[test]
    fn missing_file_reads_as_empty_cart() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonCartStore::new(dir.path().join("cart.json"));
        assert!(store.get().unwrap().is_empty());
    }

    #[test]
    fn json_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonCartStore::new(dir.path().join("cart.json"));

        store.set(&sample_cart()).unwrap();
        assert_eq!(store.get().unwrap(), sample_cart());

        store.clear().unwrap();
        assert!(store.get().unwrap().is_empty());
    }

    #[test]
    fn clearing_a_missing_file_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonCartStore::new(dir.path().join("cart.json"));
        store.clear().unwrap();
    }

    #[test]
    fn corrupt_file_is_an_error_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = JsonCartStore::new(path);
        assert!(matches!(store.get(), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn memory_store_reports_cleared() {
        let store = MemoryCartStore::with_cart(sample_cart());
        assert!(!store.is_cleared());
        store.clear().unwrap();
        assert!(store.is_cleared());
    }
}
