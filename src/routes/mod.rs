use std::path::{Path, PathBuf};

use actix_files::{Files, NamedFile};
use actix_web::dev::{ServiceRequest, ServiceResponse, fn_service};
use actix_web::web;

use crate::API_PREFIX;
use crate::storage::UPLOADS_PREFIX;

pub mod products;

/// Register the JSON API under [`API_PREFIX`].
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    // `search` must be registered before `{product_id}`.
    cfg.service(
        web::scope(API_PREFIX)
            .service(products::search_products)
            .service(products::show_products)
            .service(products::show_product)
            .service(products::add_product)
            .service(products::edit_product)
            .service(products::delete_product),
    );
}

/// Serve stored attachments under the same prefix their references use.
pub fn uploads(uploads_dir: &Path) -> Files {
    Files::new(&format!("/{UPLOADS_PREFIX}"), uploads_dir)
}

/// Serve the single-page front-end, answering unknown paths with
/// `index.html` so client-side routes survive a reload.
pub fn front_end(static_dir: &Path) -> Files {
    let index: PathBuf = static_dir.join("index.html");

    Files::new("/", static_dir)
        .index_file("index.html")
        .default_handler(fn_service(move |req: ServiceRequest| {
            let index = index.clone();
            async move {
                let (req, _) = req.into_parts();
                let file = NamedFile::open_async(index).await?;
                let res = file.into_response(&req);
                Ok(ServiceResponse::new(req, res))
            }
        }))
}
