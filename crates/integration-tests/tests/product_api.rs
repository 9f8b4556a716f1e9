//! Product CRUD through the typed client.

#![allow(clippy::unwrap_used)]

use std::path::PathBuf;

use inventory_client::{
    ApiClient, ClientError, ImageUpload, ProductQuery, Session, SessionStore, session,
};
use inventory_core::form::{DeleteRequest, LoginForm, ProductForm, ProductPatchForm};
use inventory_core::{Category, Price, UserId};
use inventory_integration_tests::FakeBackend;

struct Harness {
    backend: FakeBackend,
    api: ApiClient,
    alice: UserId,
    session: Session,
    _dir: tempfile::TempDir,
}

async fn harness() -> Harness {
    let backend = FakeBackend::start().await.unwrap();
    let alice = backend
        .add_user("alice", "alice@example.com", "correct-horse")
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = backend.config(dir.path().join("session.json")).unwrap();
    let api = ApiClient::new(&config).unwrap();
    let store = SessionStore::new(config.session_file.clone());
    let credentials = LoginForm {
        username: "alice".to_owned(),
        password: "correct-horse".to_owned(),
    }
    .validate()
    .unwrap();
    let session = session::login(&api, &store, &credentials).await.unwrap();

    Harness {
        backend,
        api,
        alice,
        session,
        _dir: dir,
    }
}

fn lamp_form() -> ProductForm {
    ProductForm {
        name: "Desk Lamp".to_owned(),
        description: "Warm white, dimmable".to_owned(),
        category: "home".to_owned(),
        price: "24.50".to_owned(),
        quantity: "4".to_owned(),
        image: None,
    }
}

#[tokio::test]
async fn test_create_with_image_and_fetch() {
    let h = harness().await;
    let dir = tempfile::tempdir().unwrap();
    let path: PathBuf = dir.path().join("lamp.png");
    std::fs::write(&path, b"\x89PNG fake image").unwrap();

    let product = ProductForm {
        image: Some(path.clone()),
        ..lamp_form()
    }
    .validate()
    .unwrap();
    let image = ImageUpload::from_path(&path).await.unwrap();

    let created = h
        .api
        .create_product(&h.session, &product, Some(image))
        .await
        .unwrap();
    assert_eq!(created.name, "Desk Lamp");
    assert_eq!(created.category, Category::Home);
    assert_eq!(created.price.to_wire(), "24.50");
    assert_eq!(created.image.as_deref(), Some("/media/product/lamp.png"));
    assert_eq!(created.created_by, Some(h.alice));

    let fetched = h.api.get_product(&h.session, created.id).await.unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_duplicate_name_is_a_field_error() {
    let h = harness().await;
    let product = lamp_form().validate().unwrap();
    h.api
        .create_product(&h.session, &product, None)
        .await
        .unwrap();

    let err = h
        .api
        .create_product(&h.session, &product, None)
        .await
        .unwrap_err();
    let errors = err.field_errors().unwrap();
    assert!(errors.contains("name"), "{errors}");
}

#[tokio::test]
async fn test_list_is_newest_first_and_mine_is_filtered() {
    let h = harness().await;
    let bob = h.backend.add_user("bob", "bob@example.com", "pw").await;
    h.backend
        .seed_product(bob, "Old Chair", Category::Home, Price::parse("40").unwrap(), 2)
        .await;
    let mine = h
        .api
        .create_product(&h.session, &lamp_form().validate().unwrap(), None)
        .await
        .unwrap();

    let all = h.api.list_products(&h.session).await.unwrap();
    let names: Vec<_> = all.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Desk Lamp", "Old Chair"]);

    let own = h.api.my_products(&h.session).await.unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own.first().unwrap().id, mine.id);
}

#[tokio::test]
async fn test_server_filters_and_orders_list() {
    let h = harness().await;
    let bob = h.backend.add_user("bob", "bob@example.com", "pw").await;
    for (name, category, price, quantity) in [
        ("Rust Book", Category::Books, "39.95", 10),
        ("Garden Hose", Category::Home, "15", 3),
        ("Kite", Category::Sports, "12", 0),
    ] {
        h.backend
            .seed_product(bob, name, category, Price::parse(price).unwrap(), quantity)
            .await;
    }
    let lamp = h
        .api
        .create_product(&h.session, &lamp_form().validate().unwrap(), None)
        .await
        .unwrap();
    let retire = ProductPatchForm {
        is_active: Some(false),
        ..ProductPatchForm::default()
    }
    .validate()
    .unwrap();
    h.api
        .patch_product(&h.session, lamp.id, &retire)
        .await
        .unwrap();

    let names = |query: ProductQuery| {
        let api = h.api.clone();
        let session = h.session.clone();
        async move {
            api.query_products(&session, &query)
                .await
                .unwrap()
                .into_iter()
                .map(|p| p.name)
                .collect::<Vec<_>>()
        }
    };

    let home = ProductQuery {
        category: Some(Category::Home),
        ..ProductQuery::default()
    };
    assert_eq!(names(home.clone()).await, ["Desk Lamp", "Garden Hose"]);
    assert_eq!(
        names(ProductQuery {
            is_active: Some(true),
            ..home
        })
        .await,
        ["Garden Hose"]
    );
    assert_eq!(
        names(ProductQuery {
            is_active: Some(false),
            ..ProductQuery::default()
        })
        .await,
        ["Desk Lamp"]
    );

    // Search covers name and description, not category.
    assert_eq!(
        names(ProductQuery {
            search: Some("DIMMABLE".to_owned()),
            ..ProductQuery::default()
        })
        .await,
        ["Desk Lamp"]
    );
    assert!(
        names(ProductQuery {
            search: Some("sports".to_owned()),
            ..ProductQuery::default()
        })
        .await
        .is_empty()
    );

    assert_eq!(
        names(ProductQuery {
            ordering: Some("-price".parse().unwrap()),
            ..ProductQuery::default()
        })
        .await,
        ["Rust Book", "Desk Lamp", "Garden Hose", "Kite"]
    );
    assert_eq!(
        names(ProductQuery {
            ordering: Some("name".parse().unwrap()),
            ..ProductQuery::default()
        })
        .await,
        ["Desk Lamp", "Garden Hose", "Kite", "Rust Book"]
    );
    assert_eq!(
        names(ProductQuery {
            ordering: Some("quantity".parse().unwrap()),
            ..ProductQuery::default()
        })
        .await,
        ["Kite", "Garden Hose", "Desk Lamp", "Rust Book"]
    );
}

#[tokio::test]
async fn test_put_replaces_fields_and_keeps_image() {
    let h = harness().await;
    let created = h
        .api
        .create_product(
            &h.session,
            &lamp_form().validate().unwrap(),
            Some(ImageUpload::from_bytes("lamp.jpg", "image/jpeg", vec![1, 2, 3])),
        )
        .await
        .unwrap();

    let mut form = ProductForm::from_product(&created);
    form.quantity = "0".to_owned();
    form.description = "Sold out".to_owned();
    let updated = h
        .api
        .update_product(&h.session, created.id, &form.validate().unwrap(), None)
        .await
        .unwrap();

    assert_eq!(updated.quantity, 0);
    assert!(!updated.is_in_stock());
    assert_eq!(updated.description, "Sold out");
    assert_eq!(updated.image.as_deref(), Some("/media/product/lamp.jpg"));
    assert!(updated.updated_at.is_some());
}

#[tokio::test]
async fn test_patch_changes_only_given_fields() {
    let h = harness().await;
    let created = h
        .api
        .create_product(&h.session, &lamp_form().validate().unwrap(), None)
        .await
        .unwrap();

    let changes = ProductPatchForm {
        price: Some("19.99".to_owned()),
        is_active: Some(false),
        ..ProductPatchForm::default()
    }
    .validate()
    .unwrap();
    let patched = h
        .api
        .patch_product(&h.session, created.id, &changes)
        .await
        .unwrap();

    assert_eq!(patched.price.to_wire(), "19.99");
    assert_eq!(patched.status_label(), "Inactive");
    assert_eq!(patched.name, created.name);
    assert_eq!(patched.quantity, created.quantity);
}

#[tokio::test]
async fn test_cannot_modify_someone_elses_product() {
    let h = harness().await;
    let bob = h.backend.add_user("bob", "bob@example.com", "pw").await;
    let chair = h
        .backend
        .seed_product(bob, "Old Chair", Category::Home, Price::parse("40").unwrap(), 2)
        .await;

    let changes = ProductPatchForm {
        quantity: Some("9".to_owned()),
        ..ProductPatchForm::default()
    }
    .validate()
    .unwrap();
    let err = h
        .api
        .patch_product(&h.session, chair.id, &changes)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Forbidden(_)), "{err:?}");

    let err = h
        .api
        .delete_product(&h.session, DeleteRequest::new(chair.id).confirm_unprompted())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Forbidden(_)), "{err:?}");
    assert_eq!(h.backend.products().await.len(), 1);
}

#[tokio::test]
async fn test_confirmed_delete_removes_product() {
    let h = harness().await;
    let created = h
        .api
        .create_product(&h.session, &lamp_form().validate().unwrap(), None)
        .await
        .unwrap();

    assert!(DeleteRequest::new(created.id).confirm("n").is_err());
    assert_eq!(h.backend.products().await.len(), 1);

    let confirmed = DeleteRequest::new(created.id).confirm("Yes").unwrap();
    h.api.delete_product(&h.session, confirmed).await.unwrap();

    let err = h.api.get_product(&h.session, created.id).await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)), "{err:?}");
}

#[tokio::test]
async fn test_requests_without_valid_token_are_unauthorized() {
    let h = harness().await;
    h.backend.expire_access_tokens().await;

    let err = h.api.list_products(&h.session).await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized(_)), "{err:?}");
    assert_eq!(err.kind(), inventory_client::ErrorKind::Transport);
}
