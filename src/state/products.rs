//! Product selection slice.
//!
//! Product data itself lives in the query cache; this slice carries only
//! the last viewed product and the action that clears it. Kept around for
//! flows that pin a selection while navigating.

use crate::fakestore::Product;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductsState {
  #[allow(dead_code)]
  pub selected_product: Option<Product>,
}

#[derive(Debug, Clone)]
pub enum ProductsAction {
  #[allow(dead_code)]
  ClearSelectedProduct,
}

impl ProductsState {
  pub fn reduce(&mut self, action: ProductsAction) {
    match action {
      ProductsAction::ClearSelectedProduct => {
        self.selected_product = None;
      }
    }
  }
}
