use actix_web::{web, HttpResponse};

use super::stock::stock_or_not_found;
use crate::error::ApiError;
use crate::models::{ApiResponse, InsiderTradeView, TradeView};
use crate::services::store::Store;

/// 某只股票的全部内部人交易
pub async fn get_stock_insider_trades(
    store: web::Data<Store>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let stock = stock_or_not_found(&store, &path.into_inner()).await?;

    let rows = store.trades_for_stock(stock.id).await?;
    let views: Vec<TradeView> = rows.iter().map(TradeView::from).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::success(views)))
}

/// 某个内部人在所有股票上的交易，路径中的股票代码不参与过滤
pub async fn get_insider_trades(
    store: web::Data<Store>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (_, slug) = path.into_inner();
    let insider = store
        .find_insider(&slug)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("内部人 {} 不存在", slug)))?;

    let rows = store.trades_for_insider(insider.id).await?;
    let views: Vec<InsiderTradeView> = rows.iter().map(InsiderTradeView::from).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::success(views)))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/stocks/{name}/insider", web::get().to(get_stock_insider_trades))
        .route("/stocks/{name}/insider/{slug}", web::get().to(get_insider_trades));
}
