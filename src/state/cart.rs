//! Shopping cart slice: line items plus incrementally maintained totals.

use crate::fakestore::Product;

/// One cart line: the product as fetched, plus how many units of it are
/// in the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
  pub product: Product,
  pub quantity: u32,
}

impl CartItem {
  pub fn line_total(&self) -> f64 {
    self.product.price * f64::from(self.quantity)
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartState {
  pub items: Vec<CartItem>,
  pub total_quantity: u32,
  pub total_price: f64,
}

#[derive(Debug, Clone)]
pub enum CartAction {
  /// Add one unit: bump an existing line or start a new one at 1.
  AddToCart(Product),
  /// Drop the whole line, not one unit.
  RemoveFromCart(u64),
  /// Set a line's quantity. Values below 1 are floored to 1.
  UpdateQuantity { id: u64, quantity: u32 },
  ClearCart,
}

impl CartState {
  /// Totals are adjusted alongside every change instead of being
  /// recomputed from the lines.
  pub fn reduce(&mut self, action: CartAction) {
    match action {
      CartAction::AddToCart(product) => {
        // One unit either way, so the totals move the same in both
        // branches.
        self.total_quantity += 1;
        self.total_price += product.price;
        match self.items.iter_mut().find(|item| item.product.id == product.id) {
          Some(item) => item.quantity += 1,
          None => self.items.push(CartItem { product, quantity: 1 }),
        }
      }
      CartAction::RemoveFromCart(id) => {
        if let Some(index) = self.items.iter().position(|item| item.product.id == id) {
          let item = self.items.remove(index);
          self.total_quantity -= item.quantity;
          self.total_price -= item.line_total();
        }
      }
      CartAction::UpdateQuantity { id, quantity } => {
        let quantity = quantity.max(1);
        if let Some(item) = self.items.iter_mut().find(|item| item.product.id == id) {
          let diff = i64::from(quantity) - i64::from(item.quantity);
          let total = i64::from(self.total_quantity) + diff;
          // Saturate at the u32 bounds rather than wrap.
          self.total_quantity = total.clamp(0, i64::from(u32::MAX)) as u32;
          self.total_price += diff as f64 * item.product.price;
          item.quantity = quantity;
        }
      }
      CartAction::ClearCart => {
        self.items.clear();
        self.total_quantity = 0;
        self.total_price = 0.0;
      }
    }
  }
}
