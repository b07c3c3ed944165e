use crate::api;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::auth::login,
        api::auth::register,
        api::auth::forgot_password,
        api::auth::me,
        api::dashboard::dashboard,
        api::dashboard::stats,
        api::supplier::list_suppliers,
        api::supplier::get_supplier,
        api::supplier::create_supplier,
        api::supplier::update_supplier,
        api::supplier::delete_supplier,
        api::supplier::list_supplier_products,
        api::product::list_products,
        api::product::stock_alerts,
        api::product::list_categories,
        api::product::get_product,
        api::product::create_product,
        api::product::update_product,
        api::product::delete_product,
        api::product::upload_image,
        api::product::get_image,
        api::stock::list_entries,
        api::stock::create_entry,
        api::stock::reconciliation,
        api::document::list_documents,
        api::document::upload_document,
        api::document::get_document,
        api::document::download_document,
        api::document::delete_document,
        api::user::list_users,
        api::user::create_user,
        api::user::change_role,
        api::user::set_status,
        api::user::reset_password,
        api::user::delete_user,
        api::audit::list_audit,
        api::audit::export_audit,
    ),
    tags(
        (name = "ledblast", description = "LED BLAST inventory panel API")
    )
)]
pub struct ApiDoc;
