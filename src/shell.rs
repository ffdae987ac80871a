//! Interactive shell: browse the catalog and fill a local cart without
//! re-running the binary. One process means one live query cache, so
//! repeat lookups inside a session stay off the network.

use std::io::Write;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands;
use crate::fakestore::{ApiError, CachedStoreClient};
use crate::session::SessionStore;
use crate::state::{Action, CartAction, Store};

#[derive(Debug, Clone)]
pub struct ShellCommand {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub usage: &'static str,
  pub description: &'static str,
}

/// All shell commands
pub const COMMANDS: &[ShellCommand] = &[
  ShellCommand {
    name: "products",
    aliases: &["p"],
    usage: "products [CATEGORY]",
    description: "List products, optionally by category",
  },
  ShellCommand {
    name: "product",
    aliases: &[],
    usage: "product ID",
    description: "Show one product",
  },
  ShellCommand {
    name: "categories",
    aliases: &["cats"],
    usage: "categories",
    description: "List product categories",
  },
  ShellCommand {
    name: "add",
    aliases: &["a"],
    usage: "add ID",
    description: "Add one unit of a product to the cart",
  },
  ShellCommand {
    name: "remove",
    aliases: &["rm"],
    usage: "remove ID",
    description: "Remove a line from the cart",
  },
  ShellCommand {
    name: "quantity",
    aliases: &["qty"],
    usage: "quantity ID COUNT",
    description: "Set a cart line's quantity",
  },
  ShellCommand {
    name: "cart",
    aliases: &["c"],
    usage: "cart",
    description: "Show the cart",
  },
  ShellCommand {
    name: "clear",
    aliases: &[],
    usage: "clear",
    description: "Empty the cart",
  },
  ShellCommand {
    name: "login",
    aliases: &[],
    usage: "login USERNAME PASSWORD",
    description: "Log in and persist the session",
  },
  ShellCommand {
    name: "logout",
    aliases: &[],
    usage: "logout",
    description: "Log out and clear the session",
  },
  ShellCommand {
    name: "status",
    aliases: &[],
    usage: "status",
    description: "Show the current session",
  },
  ShellCommand {
    name: "help",
    aliases: &["?"],
    usage: "help",
    description: "List commands",
  },
  ShellCommand {
    name: "quit",
    aliases: &["q", "exit"],
    usage: "quit",
    description: "Leave the shell",
  },
];

/// Resolve input to a command: exact name, then exact alias, then a
/// prefix if it names exactly one command.
pub fn find_command(input: &str) -> Option<&'static ShellCommand> {
  let input = input.to_lowercase();

  for command in COMMANDS {
    if command.name == input {
      return Some(command);
    }
  }

  for command in COMMANDS {
    if command.aliases.contains(&input.as_str()) {
      return Some(command);
    }
  }

  let mut matches = COMMANDS.iter().filter(|c| c.name.starts_with(&input));
  match (matches.next(), matches.next()) {
    (Some(command), None) => Some(command),
    _ => None,
  }
}

/// Read-eval loop over stdin. Command failures are printed and the
/// session keeps going; only EOF or `quit` ends it.
pub async fn run<S: SessionStore>(
  store: &mut Store<S>,
  client: &CachedStoreClient,
) -> Result<()> {
  println!("Type `help` for commands, `quit` to leave.");

  let mut lines = BufReader::new(tokio::io::stdin()).lines();

  loop {
    print!("shopfront> ");
    std::io::stdout().flush()?;

    let line = match lines.next_line().await? {
      Some(line) => line,
      None => break,
    };

    let parts: Vec<&str> = line.split_whitespace().collect();
    let first = match parts.first() {
      Some(first) => *first,
      None => continue,
    };

    let command = match find_command(first) {
      Some(command) => command,
      None => {
        println!("unknown command: {} (type `help` for the list)", first);
        continue;
      }
    };

    if command.name == "quit" {
      break;
    }

    if let Err(error) = execute(command.name, &parts[1..], store, client).await {
      println!("error: {:#}", error);
    }
  }

  Ok(())
}

async fn execute<S: SessionStore>(
  name: &str,
  args: &[&str],
  store: &mut Store<S>,
  client: &CachedStoreClient,
) -> Result<()> {
  match name {
    "products" => {
      let products = match args.first() {
        Some(category) => client.products_by_category(category).await,
        None => client.products().await,
      }
      .map_err(|e| eyre!("Failed to load products: {}", e))?;
      commands::print_products(&products);
    }
    "product" => {
      let id = parse_id(args, "product ID")?;
      let product = client
        .product(id)
        .await
        .map_err(|e| eyre!("Failed to load product {}: {}", id, e))?;
      commands::print_product(&product);
    }
    "categories" => {
      let categories = client
        .categories()
        .await
        .map_err(|e| eyre!("Failed to load categories: {}", e))?;
      for category in &categories {
        println!("{}", category);
      }
    }
    "add" => {
      let id = parse_id(args, "add ID")?;
      let product = client
        .product(id)
        .await
        .map_err(|e| eyre!("Failed to load product {}: {}", id, e))?;
      let title = product.title.clone();
      store.dispatch(Action::Cart(CartAction::AddToCart(product)))?;
      let cart = store.cart();
      println!(
        "Added {} ({} items, {})",
        title,
        cart.total_quantity,
        commands::format_price(cart.total_price)
      );
    }
    "remove" => {
      let id = parse_id(args, "remove ID")?;
      store.dispatch(Action::Cart(CartAction::RemoveFromCart(id)))?;
      let cart = store.cart();
      println!(
        "Cart now {} items, {}",
        cart.total_quantity,
        commands::format_price(cart.total_price)
      );
    }
    "quantity" => {
      let id = parse_id(args, "quantity ID COUNT")?;
      let quantity = args
        .get(1)
        .and_then(|raw| raw.parse::<u32>().ok())
        .ok_or_else(|| eyre!("usage: quantity ID COUNT"))?;
      store.dispatch(Action::Cart(CartAction::UpdateQuantity { id, quantity }))?;
      let cart = store.cart();
      println!(
        "Cart now {} items, {}",
        cart.total_quantity,
        commands::format_price(cart.total_price)
      );
    }
    "cart" => print_cart(store),
    "clear" => {
      store.dispatch(Action::Cart(CartAction::ClearCart))?;
      println!("Cart cleared");
    }
    "login" => {
      let username = args
        .first()
        .ok_or_else(|| eyre!("usage: login USERNAME PASSWORD"))?;
      let password = args
        .get(1)
        .ok_or_else(|| eyre!("usage: login USERNAME PASSWORD"))?;
      if let Err(report) = commands::login(store, client, username, password).await {
        let unauthorized = report
          .downcast_ref::<ApiError>()
          .and_then(|error| error.status())
          == Some(401);
        if unauthorized {
          println!("The public API only accepts its demo users, e.g. mor_2314 / 83r5^_");
        }
        return Err(report);
      }
    }
    "logout" => commands::logout(store)?,
    "status" => commands::status(store),
    "help" => {
      for command in COMMANDS {
        let aliases = if command.aliases.is_empty() {
          String::new()
        } else {
          format!("  (alias: {})", command.aliases.join(", "))
        };
        println!("  {:<22} {}{}", command.usage, command.description, aliases);
      }
    }
    _ => {}
  }

  Ok(())
}

fn parse_id(args: &[&str], usage: &str) -> Result<u64> {
  args
    .first()
    .ok_or_else(|| eyre!("usage: {}", usage))?
    .parse::<u64>()
    .map_err(|_| eyre!("usage: {}", usage))
}

fn print_cart<S: SessionStore>(store: &Store<S>) {
  let cart = store.cart();
  if cart.items.is_empty() {
    println!("Cart is empty");
    return;
  }
  for item in &cart.items {
    println!(
      "{:>3} x {:<40.40} @ {:>9} = {:>9}",
      item.quantity,
      item.product.title,
      commands::format_price(item.product.price),
      commands::format_price(item.line_total())
    );
  }
  println!(
    "Total: {} items, {}",
    cart.total_quantity,
    commands::format_price(cart.total_price)
  );
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fakestore::StoreClient;
  use crate::session::MemorySessionStore;
  use serde_json::json;
  use wiremock::matchers::{method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  #[test]
  fn test_exact_name_wins() {
    assert_eq!(find_command("cart").unwrap().name, "cart");
    assert_eq!(find_command("quit").unwrap().name, "quit");
  }

  #[test]
  fn test_aliases_resolve() {
    assert_eq!(find_command("p").unwrap().name, "products");
    assert_eq!(find_command("qty").unwrap().name, "quantity");
    assert_eq!(find_command("?").unwrap().name, "help");
    assert_eq!(find_command("exit").unwrap().name, "quit");
  }

  #[test]
  fn test_unique_prefix_resolves() {
    assert_eq!(find_command("stat").unwrap().name, "status");
    assert_eq!(find_command("quant").unwrap().name, "quantity");
    assert_eq!(find_command("CLEAR").unwrap().name, "clear");
  }

  #[test]
  fn test_ambiguous_prefix_is_rejected() {
    // "log" could be login or logout, "pr" products or product.
    assert!(find_command("log").is_none());
    assert!(find_command("pr").is_none());
    assert!(find_command("qu").is_none());
  }

  #[test]
  fn test_unknown_input_is_rejected() {
    assert!(find_command("frobnicate").is_none());
    assert!(find_command("").is_none());
  }

  #[tokio::test]
  async fn test_add_fetches_the_product_and_grows_the_cart() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/products/1"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "id": 1, "title": "Backpack", "price": 109.95
      })))
      .expect(1)
      .mount(&server)
      .await;

    let client = CachedStoreClient::new(StoreClient::new(&server.uri()).unwrap());
    let mut store = Store::new(MemorySessionStore::new()).unwrap();

    // Second add hits the cache, not the server.
    execute("add", &["1"], &mut store, &client).await.unwrap();
    execute("add", &["1"], &mut store, &client).await.unwrap();

    assert_eq!(store.cart().total_quantity, 2);
    assert!((store.cart().total_price - 219.90).abs() < 1e-9);
  }

  #[tokio::test]
  async fn test_quantity_and_remove_update_totals() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/products/2"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "id": 2, "title": "T-Shirt", "price": 10.0
      })))
      .mount(&server)
      .await;

    let client = CachedStoreClient::new(StoreClient::new(&server.uri()).unwrap());
    let mut store = Store::new(MemorySessionStore::new()).unwrap();

    execute("add", &["2"], &mut store, &client).await.unwrap();
    execute("quantity", &["2", "4"], &mut store, &client).await.unwrap();
    assert_eq!(store.cart().total_quantity, 4);
    assert!((store.cart().total_price - 40.0).abs() < 1e-9);

    execute("remove", &["2"], &mut store, &client).await.unwrap();
    assert_eq!(store.cart().total_quantity, 0);
    assert!(store.cart().items.is_empty());
  }

  #[tokio::test]
  async fn test_bad_arguments_report_usage() {
    let server = MockServer::start().await;
    let client = CachedStoreClient::new(StoreClient::new(&server.uri()).unwrap());
    let mut store = Store::new(MemorySessionStore::new()).unwrap();

    let error = execute("add", &[], &mut store, &client).await.unwrap_err();
    assert!(error.to_string().contains("usage: add ID"));

    let error = execute("quantity", &["2"], &mut store, &client)
      .await
      .unwrap_err();
    assert!(error.to_string().contains("usage: quantity ID COUNT"));
  }
}
