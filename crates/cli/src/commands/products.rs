//! Product commands: list, show, add, update, edit, delete.

use std::path::PathBuf;

use inventory_client::{ImageUpload, ProductOrder, ProductQuery};
use inventory_core::form::{DeleteRequest, ProductForm, ProductPatchForm};
use inventory_core::{Category, Product, ProductId, ProductStore, filter_products};

use super::{App, prompt};
use crate::render;

/// Fields shared by `add` and `update`.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ProductArgs {
    /// Product name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Product description
    #[arg(short, long)]
    pub description: Option<String>,

    /// Category (`other`, `books`, `sports`, `clothing`, `home`, `electronics`)
    #[arg(short, long)]
    pub category: Option<String>,

    /// Unit price, e.g. 19.99
    #[arg(short, long)]
    pub price: Option<String>,

    /// Units in stock
    #[arg(short, long)]
    pub quantity: Option<String>,

    /// Image file (.jpg, .jpeg, .png, .img)
    #[arg(short, long)]
    pub image: Option<PathBuf>,
}

impl ProductArgs {
    /// Overlay the given flags on `form`.
    fn apply_to(self, form: &mut ProductForm) {
        let overlay = |slot: &mut String, value: Option<String>| {
            if let Some(value) = value {
                *slot = value;
            }
        };
        overlay(&mut form.name, self.name);
        overlay(&mut form.description, self.description);
        overlay(&mut form.category, self.category);
        overlay(&mut form.price, self.price);
        overlay(&mut form.quantity, self.quantity);
        if self.image.is_some() {
            form.image = self.image;
        }
    }
}

/// Flags for a partial update.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct PatchArgs {
    #[arg(short, long)]
    pub name: Option<String>,

    #[arg(short, long)]
    pub description: Option<String>,

    /// Category (`other`, `books`, `sports`, `clothing`, `home`, `electronics`)
    #[arg(short, long)]
    pub category: Option<String>,

    #[arg(short, long)]
    pub price: Option<String>,

    #[arg(short, long)]
    pub quantity: Option<String>,

    /// Mark the product active or inactive
    #[arg(long)]
    pub active: Option<bool>,
}

impl From<PatchArgs> for ProductPatchForm {
    fn from(args: PatchArgs) -> Self {
        Self {
            name: args.name,
            description: args.description,
            category: args.category,
            price: args.price,
            quantity: args.quantity,
            is_active: args.active,
        }
    }
}

/// Flags for `products list`.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ListArgs {
    /// Only products you created
    #[arg(long)]
    pub mine: bool,

    /// Case-insensitive match on name, description or category
    #[arg(short, long)]
    pub search: Option<String>,

    /// Only this category (`other`, `books`, `sports`, `clothing`, `home`, `electronics`)
    #[arg(short, long)]
    pub category: Option<Category>,

    /// Only active (`true`) or inactive (`false`) products
    #[arg(long)]
    pub active: Option<bool>,

    /// Server ordering: `name`, `price`, `quantity` or `created_at`, prefix `-` for descending
    #[arg(short, long, conflicts_with = "mine", allow_hyphen_values = true)]
    pub ordering: Option<ProductOrder>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl ListArgs {
    /// Filters the server applies. Search stays local so it also matches
    /// the category label.
    fn server_query(&self) -> ProductQuery {
        ProductQuery {
            category: self.category,
            is_active: self.active,
            search: None,
            ordering: self.ordering,
        }
    }

    /// The caller's own list is not filtered by the server.
    fn keeps(&self, product: &Product) -> bool {
        self.category.is_none_or(|c| product.category == c)
            && self.active.is_none_or(|a| product.is_active == a)
    }
}

/// List products, optionally only the caller's and optionally filtered.
///
/// # Errors
///
/// Returns error if not logged in or the request fails.
pub async fn list(app: &App, args: ListArgs) -> Result<(), Box<dyn std::error::Error>> {
    let session = app.require_session().await?;
    let products = if args.mine {
        let mut own = app.api.my_products(&session).await?;
        own.retain(|p| args.keeps(p));
        own
    } else {
        app.api.query_products(&session, &args.server_query()).await?
    };

    let store = ProductStore::from_snapshot(products);
    let visible: Vec<_> = filter_products(&store, args.search.as_deref().unwrap_or_default())
        .into_iter()
        .cloned()
        .collect();
    tracing::debug!(total = store.len(), shown = visible.len(), "Listed products");

    if args.json {
        render::emit(&serde_json::to_string_pretty(&visible)?);
    } else if visible.is_empty() {
        render::emit(if store.is_empty() {
            "No products yet. Add your first product to get started!"
        } else {
            "No products match. Try adjusting your search terms."
        });
    } else {
        render::emit(&render::product_table(&visible));
    }
    Ok(())
}

/// Show one product.
///
/// # Errors
///
/// Returns error if not logged in or the product does not exist.
pub async fn show(app: &App, id: ProductId, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let session = app.require_session().await?;
    let product = app.api.get_product(&session, id).await?;
    if json {
        render::emit(&serde_json::to_string_pretty(&product)?);
    } else {
        render::emit(&render::product_detail(&product));
    }
    Ok(())
}

/// Create a product. Missing required fields are prompted for.
///
/// # Errors
///
/// Returns error on invalid input or when the server rejects the product.
pub async fn add(app: &App, args: ProductArgs) -> Result<(), Box<dyn std::error::Error>> {
    let session = app.require_session().await?;

    let mut form = ProductForm {
        category: "other".to_owned(),
        ..ProductForm::default()
    };
    args.apply_to(&mut form);
    for (slot, question) in [
        (&mut form.name, "Name: "),
        (&mut form.description, "Description: "),
        (&mut form.price, "Price: "),
        (&mut form.quantity, "Quantity: "),
    ] {
        if slot.is_empty() {
            *slot = prompt(question)?;
        }
    }

    let product = form.validate()?;
    let image = match &product.image {
        Some(path) => Some(ImageUpload::from_path(path).await?),
        None => None,
    };

    let created = app.api.create_product(&session, &product, image).await?;
    tracing::info!(product_id = %created.id, "Product created");
    render::emit(&render::product_detail(&created));
    Ok(())
}

/// Replace a product, starting from its current values.
///
/// # Errors
///
/// Returns error on invalid input, when the product belongs to someone
/// else or when the server rejects a field.
pub async fn update(
    app: &App,
    id: ProductId,
    args: ProductArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = app.require_session().await?;
    let current = app.api.get_product(&session, id).await?;

    let mut form = ProductForm::from_product(&current);
    args.apply_to(&mut form);
    let product = form.validate()?;
    let image = match &product.image {
        Some(path) => Some(ImageUpload::from_path(path).await?),
        None => None,
    };

    let updated = app.api.update_product(&session, id, &product, image).await?;
    tracing::info!(product_id = %updated.id, "Product updated");
    render::emit(&render::product_detail(&updated));
    Ok(())
}

/// Change only the given fields.
///
/// # Errors
///
/// Returns error if no field was given, a field is invalid or the server
/// refuses the change.
pub async fn edit(app: &App, id: ProductId, args: PatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let changes = ProductPatchForm::from(args).validate()?;
    let session = app.require_session().await?;

    let updated = app.api.patch_product(&session, id, &changes).await?;
    tracing::info!(product_id = %updated.id, "Product patched");
    render::emit(&render::product_detail(&updated));
    Ok(())
}

/// Delete a product after confirmation.
///
/// # Errors
///
/// Returns error if the deletion is not confirmed or the server refuses it.
pub async fn delete(app: &App, id: ProductId, yes: bool) -> Result<(), Box<dyn std::error::Error>> {
    let session = app.require_session().await?;
    let request = DeleteRequest::new(id);

    let confirmed = if yes {
        request.confirm_unprompted()
    } else {
        let name = app
            .api
            .get_product(&session, id)
            .await
            .map_or_else(|_| format!("#{id}"), |p| format!("\"{}\"", p.name));
        let answer = prompt(&format!(
            "Are you sure you want to delete {name}? This action cannot be undone. [y/N] "
        ))?;
        request.confirm(&answer)?
    };

    app.api.delete_product(&session, confirmed).await?;
    tracing::info!(product_id = %id, "Product deleted");
    render::emit(&format!("Deleted product #{id}."));
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_overlay_prefilled_form() {
        let mut form = ProductForm {
            name: "Mug".to_owned(),
            description: "Blue".to_owned(),
            category: "home".to_owned(),
            price: "2.50".to_owned(),
            quantity: "4".to_owned(),
            image: None,
        };
        ProductArgs {
            price: Some("3.00".to_owned()),
            ..ProductArgs::default()
        }
        .apply_to(&mut form);

        assert_eq!(form.name, "Mug");
        assert_eq!(form.price, "3.00");
        assert_eq!(form.category, "home");
    }

    #[test]
    fn test_patch_args_without_fields_is_rejected() {
        let result = ProductPatchForm::from(PatchArgs::default()).validate();
        assert!(matches!(
            result,
            Err(inventory_core::FormError::NothingToUpdate)
        ));
    }

    #[test]
    fn test_patch_args_carry_active_flag() {
        let changes = ProductPatchForm::from(PatchArgs {
            active: Some(false),
            ..PatchArgs::default()
        })
        .validate()
        .unwrap();
        assert_eq!(changes.is_active, Some(false));
        assert!(changes.name.is_none());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod cli_tests {
    use clap::{CommandFactory, Parser};

    use super::*;

    #[derive(Parser)]
    struct ListCli {
        #[command(flatten)]
        args: ListArgs,
    }

    #[derive(Parser)]
    struct AddCli {
        #[command(flatten)]
        fields: ProductArgs,
    }

    #[derive(Parser)]
    struct EditCli {
        #[command(flatten)]
        fields: PatchArgs,
    }

    #[test]
    fn test_category_help_names_every_category() {
        for help in [
            AddCli::command().render_long_help().to_string(),
            EditCli::command().render_long_help().to_string(),
            ListCli::command().render_long_help().to_string(),
        ] {
            for category in Category::ALL {
                assert!(help.contains(category.as_str()), "{help}");
            }
            assert!(!help.contains("toys"), "{help}");
        }
    }

    #[test]
    fn test_list_flags_become_server_query() {
        let cli = ListCli::try_parse_from([
            "list",
            "--category",
            "Books",
            "--active",
            "false",
            "--ordering",
            "-price",
        ])
        .unwrap();
        let query = cli.args.server_query();
        assert_eq!(query.category, Some(Category::Books));
        assert_eq!(query.is_active, Some(false));
        assert_eq!(query.ordering.unwrap().to_string(), "-price");
        assert_eq!(query.search, None);
    }

    #[test]
    fn test_list_rejects_unknown_values() {
        assert!(ListCli::try_parse_from(["list", "--category", "toys"]).is_err());
        assert!(ListCli::try_parse_from(["list", "--ordering", "stock"]).is_err());
        assert!(ListCli::try_parse_from(["list", "--mine", "--ordering", "name"]).is_err());
    }

    #[test]
    fn test_mine_filters_locally() {
        let args = ListCli::try_parse_from(["list", "--mine", "-c", "home", "--active", "true"])
            .unwrap()
            .args;
        let product = |category, is_active| {
            let mut p: Product =
                serde_json::from_str(r#"{"id":1,"name":"Lamp","price":"1.00"}"#).unwrap();
            p.category = category;
            p.is_active = is_active;
            p
        };
        assert!(args.keeps(&product(Category::Home, true)));
        assert!(!args.keeps(&product(Category::Home, false)));
        assert!(!args.keeps(&product(Category::Books, true)));
        assert!(args.server_query().ordering.is_none());
    }
}
