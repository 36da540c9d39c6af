use actix_multipart::form::MultipartForm;
use actix_web::http::header;
use actix_web::{HttpResponse, Responder, delete, get, post, put, web};
use serde_json::json;

use crate::API_PREFIX;
use crate::domain::auth::AuthenticatedUser;
use crate::forms::products::ProductMultipartForm;
use crate::repository::DieselRepository;
use crate::services::{ServiceError, products};
use crate::storage::FileSystemStorage;

#[get("/products")]
pub async fn show_products(
    _user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match products::list_products(repo.get_ref()) {
        Ok(items) => HttpResponse::Ok().json(items),
        Err(err) => error_response(err, "list products"),
    }
}

#[get("/products/search")]
pub async fn search_products(
    params: web::Query<products::SearchQuery>,
    _user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match products::search_products(repo.get_ref(), params.keyword.as_deref()) {
        Ok(items) => HttpResponse::Ok().json(items),
        Err(err) => error_response(err, "search products"),
    }
}

#[get("/products/{product_id}")]
pub async fn show_product(
    path: web::Path<i32>,
    _user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let product_id = path.into_inner();

    match products::get_product(repo.get_ref(), product_id) {
        Ok(product) => HttpResponse::Ok().json(product),
        Err(err) => error_response(err, &format!("load product {product_id}")),
    }
}

#[post("/products")]
pub async fn add_product(
    _user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    storage: web::Data<FileSystemStorage>,
    MultipartForm(form): MultipartForm<ProductMultipartForm>,
) -> impl Responder {
    let form = match form.into_form() {
        Ok(form) => form,
        Err(err) => {
            log::error!("Failed to read product upload: {err}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    match products::create_product(repo.get_ref(), storage.get_ref(), form) {
        Ok(product) => HttpResponse::Created()
            .insert_header((
                header::LOCATION,
                format!("{API_PREFIX}/products/{}", product.id),
            ))
            .json(product),
        Err(err) => error_response(err, "create product"),
    }
}

#[put("/products/{product_id}")]
pub async fn edit_product(
    path: web::Path<i32>,
    _user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    storage: web::Data<FileSystemStorage>,
    MultipartForm(form): MultipartForm<ProductMultipartForm>,
) -> impl Responder {
    let product_id = path.into_inner();

    let form = match form.into_form() {
        Ok(form) => form,
        Err(err) => {
            log::error!("Failed to read upload for product {product_id}: {err}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    match products::update_product(repo.get_ref(), storage.get_ref(), product_id, form) {
        Ok(_) => HttpResponse::NoContent().finish(),
        Err(err) => error_response(err, &format!("update product {product_id}")),
    }
}

#[delete("/products/{product_id}")]
pub async fn delete_product(
    path: web::Path<i32>,
    _user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    storage: web::Data<FileSystemStorage>,
) -> impl Responder {
    let product_id = path.into_inner();

    match products::delete_product(repo.get_ref(), storage.get_ref(), product_id) {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => error_response(err, &format!("delete product {product_id}")),
    }
}

fn error_response(err: ServiceError, action: &str) -> HttpResponse {
    match err {
        ServiceError::NotFound => HttpResponse::NotFound().finish(),
        ServiceError::Form(message) => HttpResponse::BadRequest().json(json!({ "error": message })),
        err => {
            log::error!("Failed to {action}: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    use crate::repository::RepositoryError;
    use crate::storage::StorageError;

    #[test]
    fn service_errors_map_to_status_codes() {
        let cases = [
            (ServiceError::NotFound, StatusCode::NOT_FOUND),
            (
                ServiceError::Form("product name cannot be empty".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::from(RepositoryError::ConcurrencyConflict),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ServiceError::Storage(StorageError::InvalidReference("x".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ServiceError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let label = err.to_string();
            assert_eq!(error_response(err, "test").status(), expected, "{label}");
        }
    }
}
