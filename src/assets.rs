use actix_web::{HttpResponse, Responder, Scope, web};
use mime_guess::from_path;
use rust_embed::RustEmbed;

/// The presentation shell: a static page that renders the canonical
/// datasets through the JSON API and the update stream.
#[derive(RustEmbed)]
#[folder = "./static/"]
struct ShellAssets;

async fn shell_handler(
    path: web::Path<String>,
    index_file_name_data: web::Data<String>,
) -> impl Responder {
    let file_path = if path.is_empty() {
        index_file_name_data.as_str()
    } else {
        path.as_str()
    };

    match ShellAssets::get(file_path) {
        Some(embedded_file) => {
            // Fallback to application/octet-stream
            let mime_type = from_path(file_path).first_or_octet_stream();
            HttpResponse::Ok()
                .content_type(mime_type.to_string())
                .body(embedded_file.data)
        }
        None => HttpResponse::NotFound().body("File not found"),
    }
}

pub fn assets(path_prefix: &str, index_file_name: &str) -> Scope {
    web::scope(path_prefix)
        .app_data(web::Data::new(index_file_name.to_string()))
        .route("/{path:.*}", web::get().to(shell_handler))
}
