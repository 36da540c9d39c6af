//! Product CRUD, search and attachment bookkeeping.
//!
//! Attachments and rows live in separate stores with no shared transaction,
//! so every mutation follows a fixed order: a new file is written before the
//! row that references it is committed, and a replaced or orphaned file is
//! only removed once the row no longer needs it. A failure in between may
//! leave a stray file behind but never a row pointing at a missing one.

use serde::Deserialize;

use crate::domain::product::{NewProduct, Product, ProductListQuery, UpdateProduct};
use crate::forms::products::{ProductForm, ProductPayload};
use crate::repository::{ProductReader, ProductWriter};
use crate::services::{ServiceError, ServiceResult};
use crate::storage::AttachmentStore;

/// Query parameters accepted by the search endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    /// Case-insensitive substring matched against product names.
    pub keyword: Option<String>,
}

/// Returns every product in store order.
pub fn list_products<R>(repo: &R) -> ServiceResult<Vec<Product>>
where
    R: ProductReader + ?Sized,
{
    repo.list_products(ProductListQuery::new())
        .map_err(ServiceError::from)
}

/// Returns a single product.
pub fn get_product<R>(repo: &R, product_id: i32) -> ServiceResult<Product>
where
    R: ProductReader + ?Sized,
{
    repo.get_product_by_id(product_id)
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)
}

/// Returns products whose name contains `keyword`. A missing or blank keyword
/// behaves like [`list_products`].
pub fn search_products<R>(repo: &R, keyword: Option<&str>) -> ServiceResult<Vec<Product>>
where
    R: ProductReader + ?Sized,
{
    let mut query = ProductListQuery::new();
    if let Some(keyword) = keyword {
        query = query.search(keyword);
    }

    repo.list_products(query).map_err(ServiceError::from)
}

/// Creates a product, storing its image first when one was uploaded.
pub fn create_product<R, S>(repo: &R, storage: &S, form: ProductForm) -> ServiceResult<Product>
where
    R: ProductWriter + ?Sized,
    S: AttachmentStore + ?Sized,
{
    let ProductPayload {
        name,
        tags,
        attachment,
    } = into_payload(form)?;

    let image_url = match attachment {
        Some(upload) => Some(storage.store(&upload.bytes, &upload.file_name)?),
        None => None,
    };

    let mut new_product = NewProduct::new(name, tags);
    if let Some(reference) = image_url.as_deref() {
        new_product = new_product.with_image_url(reference);
    }

    match repo.create_product(&new_product) {
        Ok(created) => Ok(created),
        Err(err) => {
            if let Some(reference) = image_url.as_deref() {
                discard_attachment(storage, reference);
            }
            Err(ServiceError::from(err))
        }
    }
}

/// Replaces name and tags of a product and, when a new image was uploaded,
/// swaps its attachment.
pub fn update_product<R, S>(
    repo: &R,
    storage: &S,
    product_id: i32,
    form: ProductForm,
) -> ServiceResult<Product>
where
    R: ProductReader + ProductWriter + ?Sized,
    S: AttachmentStore + ?Sized,
{
    let ProductPayload {
        name,
        tags,
        attachment,
    } = into_payload(form)?;

    let current = get_product(repo, product_id)?;

    let new_image = match attachment {
        Some(upload) => Some(storage.store(&upload.bytes, &upload.file_name)?),
        None => None,
    };

    let mut updates = UpdateProduct::new(name, tags, current.version);
    if let Some(reference) = new_image.as_deref() {
        updates = updates.image_url(reference);
    }

    match repo.update_product(product_id, &updates) {
        Ok(updated) => {
            if new_image.is_some() && current.has_image() {
                discard_attachment(storage, &current.image_url);
            }
            Ok(updated)
        }
        Err(err) => {
            if let Some(reference) = new_image.as_deref() {
                discard_attachment(storage, reference);
            }
            Err(ServiceError::from(err))
        }
    }
}

/// Deletes a product and then its attachment.
pub fn delete_product<R, S>(repo: &R, storage: &S, product_id: i32) -> ServiceResult<()>
where
    R: ProductWriter + ?Sized,
    S: AttachmentStore + ?Sized,
{
    let removed = repo
        .delete_product(product_id)
        .map_err(ServiceError::from)?;

    if removed.has_image() {
        discard_attachment(storage, &removed.image_url);
    }

    Ok(())
}

fn into_payload(form: ProductForm) -> ServiceResult<ProductPayload> {
    form.into_payload()
        .map_err(|err| ServiceError::Form(err.to_string()))
}

/// Best-effort removal; failures are only logged.
fn discard_attachment<S>(storage: &S, reference: &str)
where
    S: AttachmentStore + ?Sized,
{
    if let Err(err) = storage.remove(reference) {
        log::warn!("Failed to remove attachment {reference}: {err}");
    }
}
