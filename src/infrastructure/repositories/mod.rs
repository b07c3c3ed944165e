//! Repository implementations using SeaORM

pub mod audit_repository;
pub mod document_repository;
pub mod product_repository;
pub mod stock_repository;
pub mod supplier_repository;
pub mod user_repository;

pub use audit_repository::SeaOrmAuditRepository;
pub use document_repository::SeaOrmDocumentRepository;
pub use product_repository::SeaOrmProductRepository;
pub use stock_repository::SeaOrmStockRepository;
pub use supplier_repository::SeaOrmSupplierRepository;
pub use user_repository::SeaOrmUserRepository;

use sea_orm::sea_query::{Expr, LikeExpr, SimpleExpr};
use sea_orm::ColumnTrait;

const LIKE_ESCAPE: char = '\\';

/// Escape `%`, `_` and the escape character itself so user input matches literally
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_') || c == LIKE_ESCAPE {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// Substring match on `column`; case-insensitive for ASCII under SQLite's LIKE
pub(crate) fn contains_text<C: ColumnTrait>(column: C, needle: &str) -> SimpleExpr {
    Expr::col((column.entity_name(), column)).like(LikeExpr::new(format!("%{}%", escape_like(needle))).escape(LIKE_ESCAPE))
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn wildcards_are_escaped() {
        assert_eq!(escape_like("P10_"), "P10\\_");
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        assert_eq!(escape_like("plain"), "plain");
    }
}
