//! Fixtures shared by unit tests.

use crate::auth::extractors::CommonRequest;
use crate::auth::repo_types::{NewUser, Role};
use crate::restaurants::repo_types::{MenuItem, NewMenuItem, Restaurant};
use crate::store::{memory::MemoryStore, Store};

/// Inserts a user directly (no hashing) and wraps it as a resolved request.
pub async fn requester(store: &MemoryStore, username: &str, role: Role) -> CommonRequest {
    let identity = store
        .insert_user(NewUser {
            username: username.into(),
            email: format!("{username}@x.com"),
            password_hash: "unused".into(),
            role,
        })
        .await
        .expect("seed user");
    CommonRequest {
        is_admin: identity.is_admin(),
        identity,
    }
}

/// A restaurant owned by `owner` with the given `(name, price)` menu.
pub async fn restaurant_with_menu(
    store: &MemoryStore,
    owner: &CommonRequest,
    name: &str,
    menu: &[(&str, i64)],
) -> (Restaurant, Vec<MenuItem>) {
    let restaurant = store
        .insert_restaurant(name, "Austin", owner.identity.id)
        .await
        .expect("seed restaurant");
    let batch: Vec<NewMenuItem> = menu
        .iter()
        .map(|(n, p)| NewMenuItem {
            name: (*n).into(),
            description: String::new(),
            price: *p,
        })
        .collect();
    store
        .insert_menu_items(restaurant.id, &batch)
        .await
        .expect("seed menu");
    let items = store.menu_items_of(restaurant.id);
    (restaurant, items)
}
