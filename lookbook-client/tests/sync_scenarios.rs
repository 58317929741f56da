// lookbook-client/tests/sync_scenarios.rs
// 端到端场景: live view + commands over the in-memory store

use lookbook_client::{
    CatalogCommands, ClientConfig, ClientError, DeleteRequest, LiveView, MemoryStore,
    OutfitDraft, OutfitInput, Product, ProductInput, SyncError, ViewModel,
};
use serde_json::json;
use shared::catalog::CollectionStatus;
use std::sync::Arc;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(2);

async fn catalog_view(store: &MemoryStore) -> LiveView {
    LiveView::builder(store)
        .name("test")
        .from_config(&ClientConfig::default())
        .spawn()
        .await
        .unwrap()
}

async fn wait_for(view: &mut LiveView, predicate: impl FnMut(&ViewModel) -> bool) -> Arc<ViewModel> {
    tokio::time::timeout(WAIT, view.wait_for(predicate))
        .await
        .expect("timed out waiting for view")
        .expect("view stopped")
}

fn product(name: &str, price: f64, category: &str) -> ProductInput {
    ProductInput {
        name: name.to_string(),
        price,
        category: category.to_string(),
        image: format!("https://img.example/{}.jpg", name.to_lowercase()),
        affiliate_link: format!("https://shop.example/{}", name.to_lowercase()),
        ..Default::default()
    }
}

#[tokio::test]
async fn scenario_a_snapshot_normalizes_to_product() {
    let store = MemoryStore::with_data(json!({
        "products": {"k1": {"name": "Tee", "price": 10, "category": "Tops"}}
    }));
    let mut view = catalog_view(&store).await;

    let model = wait_for(&mut view, |m| m.products.is_ready()).await;
    assert_eq!(model.products.entities.len(), 1);
    let tee = &model.products.entities[0];
    assert_eq!(tee.id, "k1");
    assert_eq!(tee.price, 10.0);
    assert_eq!(tee.category, "Tops");
    assert!(tee.sizes.is_empty());

    view.close().await;
}

#[tokio::test]
async fn scenario_b_outfit_total_is_persisted() {
    let store = MemoryStore::new();
    let commands = CatalogCommands::new(store.clone(), &ClientConfig::default());
    let mut view = catalog_view(&store).await;

    let jeans = commands.create_product(&product("Jeans", 20.0, "Bottoms")).await.unwrap();
    let jacket = commands.create_product(&product("Jacket", 30.0, "Outerwear")).await.unwrap();
    let model = wait_for(&mut view, |m| m.counts.products == 2).await;

    let mut draft = OutfitDraft::new("Weekend", "https://img.example/weekend.jpg");
    draft.add_product(&jeans, &model.products.entities);
    draft.add_product(&jacket, &model.products.entities);
    let id = commands.create_outfit(&draft.into_input()).await.unwrap();

    assert_eq!(store.get(&format!("outfits/{id}"))["totalPrice"], json!(50.0));

    let model = wait_for(&mut view, |m| m.counts.outfits == 1).await;
    let outfit = model.outfit(&id).unwrap();
    assert_eq!(outfit.total_price, Some(50.0));
    assert_eq!(outfit.items.len(), 2);
    assert_eq!(outfit.items[0].name, "Jeans");
}

#[tokio::test]
async fn empty_outfit_total_is_zero() {
    let store = MemoryStore::new();
    let commands = CatalogCommands::new(store.clone(), &ClientConfig::default());

    let input = OutfitInput {
        name: "Capsule".to_string(),
        image: "https://img.example/capsule.jpg".to_string(),
        ..Default::default()
    };
    let id = commands.create_outfit(&input).await.unwrap();
    assert_eq!(store.get(&format!("outfits/{id}"))["totalPrice"], json!(0.0));
}

#[tokio::test]
async fn scenario_c_delete_removes_from_view() {
    let store = MemoryStore::new();
    let commands = CatalogCommands::new(store.clone(), &ClientConfig::default());
    let mut view = catalog_view(&store).await;

    let keep = commands.create_product(&product("Tee", 10.0, "Tops")).await.unwrap();
    let gone = commands.create_product(&product("Cap", 5.0, "Accessories")).await.unwrap();
    let model = wait_for(&mut view, |m| m.counts.products == 2).await;

    let target: &Product = model.product(&gone).unwrap();
    commands.delete_product(DeleteRequest::of(target).confirm()).await.unwrap();

    let model = wait_for(&mut view, |m| m.counts.products == 1).await;
    assert!(model.product(&gone).is_none());
    assert!(model.product(&keep).is_some());
    assert_eq!(model.categories, vec!["Tops"]);
    assert!(store.get(&format!("products/{gone}")).is_null());
}

#[tokio::test]
async fn scenario_d_keyed_items_flatten_in_order() {
    let store = MemoryStore::with_data(json!({
        "outfits": {
            "o1": {
                "name": "Layered",
                "image": "https://img.example/layered.jpg",
                "items": {
                    "a": {"name": "Shirt", "price": 25, "image": "s"},
                    "b": {"name": "Coat", "price": 80, "image": "c"}
                }
            }
        }
    }));
    let mut view = catalog_view(&store).await;

    let model = wait_for(&mut view, |m| m.outfits.is_ready()).await;
    let outfit = model.outfit("o1").unwrap();
    let names: Vec<_> = outfit.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Shirt", "Coat"]);
    // No stored total: the display total is summed at read time
    assert_eq!(shared::catalog::outfit_display_total(outfit), 105.0);
}

#[tokio::test]
async fn outfit_error_keeps_products() {
    let store = MemoryStore::new();
    let commands = CatalogCommands::new(store.clone(), &ClientConfig::default());
    let mut view = catalog_view(&store).await;

    commands.create_product(&product("Tee", 10.0, "Tops")).await.unwrap();
    wait_for(&mut view, |m| m.counts.products == 1 && m.outfits.is_ready()).await;

    store.deny("outfits");
    let model = wait_for(&mut view, |m| m.outfits.error().is_some()).await;
    assert_eq!(
        model.outfits.status,
        CollectionStatus::Failed(SyncError::PermissionDenied("outfits".to_string()))
    );
    assert!(model.products.is_ready());
    assert_eq!(model.counts.products, 1);

    // Products keep flowing after the outfit subscription died
    commands.create_product(&product("Cap", 5.0, "Accessories")).await.unwrap();
    let model = wait_for(&mut view, |m| m.counts.products == 2).await;
    assert!(model.outfits.error().is_some());
}

#[tokio::test]
async fn views_are_independent() {
    let store = MemoryStore::new();
    let commands = CatalogCommands::new(store.clone(), &ClientConfig::default());
    let mut storefront = catalog_view(&store).await;
    let dashboard = catalog_view(&store).await;

    dashboard.close().await;
    commands.create_product(&product("Tee", 10.0, "Tops")).await.unwrap();

    let model = wait_for(&mut storefront, |m| m.counts.products == 1).await;
    assert!(model.products.is_ready());

    // Only the storefront's two listeners remain
    tokio::time::timeout(WAIT, async {
        while store.active_subscriptions() != 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("closed view still attached");
}

#[tokio::test]
async fn close_stops_all_listeners() {
    let store = MemoryStore::new();
    let mut view = catalog_view(&store).await;
    wait_for(&mut view, |m| m.is_settled()).await;
    assert_eq!(store.active_subscriptions(), 2);

    view.close().await;

    tokio::time::timeout(WAIT, async {
        while store.active_subscriptions() > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("listeners still attached after close");
}

#[tokio::test]
async fn dropping_view_stops_listeners() {
    let store = MemoryStore::new();
    {
        let mut view = catalog_view(&store).await;
        wait_for(&mut view, |m| m.is_settled()).await;
    }

    tokio::time::timeout(WAIT, async {
        while store.active_subscriptions() > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("listeners still attached after drop");
}

#[tokio::test]
async fn invalid_payload_never_reaches_store() {
    let store = MemoryStore::new();
    let commands = CatalogCommands::new(store.clone(), &ClientConfig::default());
    let mut view = catalog_view(&store).await;
    wait_for(&mut view, |m| m.is_settled()).await;

    let err = commands
        .create_product(&ProductInput {
            image: String::new(),
            ..product("Tee", 10.0, "Tops")
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Validation(ref e) if e.field == "image"));

    let err = commands
        .create_product(&product("Tee", -1.0, "Tops"))
        .await
        .unwrap_err();
    assert!(err.is_validation());

    assert!(store.get("products").is_null());
    assert_eq!(view.model().counts.products, 0);
}

#[tokio::test]
async fn failed_write_leaves_view_unchanged() {
    let store = MemoryStore::new();
    let commands = CatalogCommands::new(store.clone(), &ClientConfig::default());
    let mut view = LiveView::builder(&store).products("products").spawn().await.unwrap();

    let id = commands.create_product(&product("Tee", 10.0, "Tops")).await.unwrap();
    let before = wait_for(&mut view, |m| m.counts.products == 1).await;

    store.deny("products/other");
    let err = commands
        .update_product("other", &product("Cap", 5.0, "Accessories"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::PermissionDenied(_)));

    assert_eq!(view.model().products, before.products);
    assert!(view.model().product(&id).is_some());
}
