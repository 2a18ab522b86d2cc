use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

use crate::error::ApiError;
use crate::models::{AnalyticsView, ApiResponse, PriceField, PriceView, Stock, StockView};
use crate::services::analytics::{run_analytics, AnalyticsMode};
use crate::services::store::Store;

/// 分析接口查询参数
///
/// `date_from`/`date_to` 与 `value`/`type` 都必须成对出现
#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub value: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

fn parse_date(name: &str, raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("{} 必须是 YYYY-MM-DD 格式: {:?}", name, raw)))
}

impl AnalyticsQuery {
    /// 解析为分析模式，两组参数都给出时以阈值模式为准
    pub fn into_mode(self) -> Result<AnalyticsMode, ApiError> {
        let dates = match (self.date_from.as_deref(), self.date_to.as_deref()) {
            (Some(from), Some(to)) => Some((
                parse_date("date_from", from)?,
                parse_date("date_to", to)?,
            )),
            (None, None) => None,
            _ => {
                return Err(ApiError::BadRequest(
                    "date_from 和 date_to 必须同时提供".to_string(),
                ))
            }
        };

        match (self.value.as_deref(), self.kind.as_deref()) {
            (Some(value), Some(kind)) => {
                let threshold = Decimal::from_str(value.trim()).map_err(|_| {
                    ApiError::BadRequest(format!("value 不是合法数值: {:?}", value))
                })?;
                let field = PriceField::from_str(kind).map_err(ApiError::BadRequest)?;
                Ok(AnalyticsMode::Threshold {
                    field,
                    threshold,
                    window: dates,
                })
            }
            (None, None) => match dates {
                Some((date_from, date_to)) => {
                    Ok(AnalyticsMode::BetweenDates { date_from, date_to })
                }
                None => Err(ApiError::BadRequest(
                    "需要提供 date_from 和 date_to，或 value 和 type".to_string(),
                )),
            },
            _ => Err(ApiError::BadRequest("value 和 type 必须同时提供".to_string())),
        }
    }
}

/// 按代码查找股票，不存在时返回 404
pub(crate) async fn stock_or_not_found(store: &Store, name: &str) -> Result<Stock, ApiError> {
    store
        .find_stock(name)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("股票 {} 不存在", name)))
}

pub async fn list_stocks(store: web::Data<Store>) -> Result<HttpResponse, ApiError> {
    let stocks = store.list_stocks().await?;
    let views: Vec<StockView> = stocks.iter().map(StockView::from).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::success(views)))
}

pub async fn get_stock_prices(
    store: web::Data<Store>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let stock = stock_or_not_found(&store, &path.into_inner()).await?;

    let prices = store.all_prices(stock.id).await?;
    let views: Vec<PriceView> = prices.iter().map(|p| PriceView::new(&stock, p)).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::success(views)))
}

pub async fn get_stock_analytics(
    store: web::Data<Store>,
    path: web::Path<String>,
    query: web::Query<AnalyticsQuery>,
) -> Result<HttpResponse, ApiError> {
    let stock = stock_or_not_found(&store, &path.into_inner()).await?;
    let mode = query.into_inner().into_mode()?;

    let outcome = run_analytics(&store, &stock, &mode).await?;
    let views: Vec<AnalyticsView> = outcome
        .records
        .iter()
        .map(|record| AnalyticsView::new(&stock, record, outcome.absolute_delta))
        .collect();
    Ok(HttpResponse::Ok().json(ApiResponse::success(views)))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/stocks", web::get().to(list_stocks))
        .route("/stocks/{name}", web::get().to(get_stock_prices))
        .route("/stocks/{name}/analytics", web::get().to(get_stock_analytics));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewPrice;
    use actix_web::test as actix_test;
    use actix_web::{http::StatusCode, App};
    use rust_decimal_macros::dec;
    use serde_json::Value;

    fn query(
        date_from: Option<&str>,
        date_to: Option<&str>,
        value: Option<&str>,
        kind: Option<&str>,
    ) -> AnalyticsQuery {
        AnalyticsQuery {
            date_from: date_from.map(str::to_string),
            date_to: date_to.map(str::to_string),
            value: value.map(str::to_string),
            kind: kind.map(str::to_string),
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_query_between_dates() {
        let mode = query(Some("2024-01-01"), Some("2024-01-05"), None, None)
            .into_mode()
            .unwrap();
        assert_eq!(
            mode,
            AnalyticsMode::BetweenDates {
                date_from: day(1),
                date_to: day(5)
            }
        );
    }

    /// 两组参数同时出现时以阈值模式为准，日期作为窗口
    #[test]
    fn test_query_threshold_takes_precedence() {
        let mode = query(Some("2024-01-01"), Some("2024-01-05"), Some("4"), Some("Close"))
            .into_mode()
            .unwrap();
        assert_eq!(
            mode,
            AnalyticsMode::Threshold {
                field: PriceField::Close,
                threshold: dec!(4),
                window: Some((day(1), day(5))),
            }
        );
    }

    #[test]
    fn test_query_rejects_incomplete_or_bad_params() {
        let cases = [
            query(None, None, None, None),
            query(Some("2024-01-01"), None, None, None),
            query(None, None, Some("4"), None),
            query(None, None, Some("four"), Some("close")),
            query(None, None, Some("4"), Some("price")),
            query(Some("01/01/2024"), Some("2024-01-05"), None, None),
        ];
        for case in cases {
            assert!(matches!(case.into_mode(), Err(ApiError::BadRequest(_))));
        }
    }

    async fn seeded_store() -> Store {
        let store = Store::in_memory().await;
        let stock = store.get_or_create_stock("AAPL", "Apple Inc.").await.unwrap();
        store.get_or_create_stock("MSFT", "Microsoft Corporation").await.unwrap();

        let closes = [dec!(10), dec!(10), dec!(15), dec!(10), dec!(10)];
        for (i, close) in closes.iter().enumerate() {
            let price = NewPrice {
                date: day(i as u32 + 1).and_hms_opt(0, 0, 0).unwrap(),
                open: *close,
                high: *close,
                low: *close,
                close: *close,
                volume: 100 * (i as i64 + 1),
            };
            store.get_or_create_price(stock.id, &price).await.unwrap();
        }
        store
    }

    async fn get_json(store: Store, uri: &str) -> (StatusCode, Value) {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(store))
                .configure(crate::handlers::config),
        )
        .await;
        let req = actix_test::TestRequest::get().uri(uri).to_request();
        let resp = actix_test::call_service(&app, req).await;
        let status = resp.status();
        let body: Value = actix_test::read_body_json(resp).await;
        (status, body)
    }

    fn decimal(value: &Value) -> Decimal {
        Decimal::from_str(value.as_str().unwrap()).unwrap()
    }

    #[actix_web::test]
    async fn test_list_stocks() {
        let (status, body) = get_json(seeded_store().await, "/api/v1/stocks").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["name"], "AAPL");
        assert_eq!(data[1]["company_name"], "Microsoft Corporation");
    }

    #[actix_web::test]
    async fn test_stock_prices() {
        let (status, body) = get_json(seeded_store().await, "/api/v1/stocks/AAPL").await;

        assert_eq!(status, StatusCode::OK);
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 5);
        assert_eq!(data[0]["stock"], "AAPL");
        assert_eq!(data[0]["date"], "2024-01-01T00:00:00");
        assert_eq!(decimal(&data[2]["close"]), dec!(15));
        assert_eq!(data[4]["volume"], 500);
    }

    #[actix_web::test]
    async fn test_unknown_stock_is_404() {
        let (status, body) = get_json(seeded_store().await, "/api/v1/stocks/XYZ").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);

        let (status, _) =
            get_json(seeded_store().await, "/api/v1/stocks/XYZ/analytics?value=1&type=close").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_analytics_between_dates() {
        let (status, body) = get_json(
            seeded_store().await,
            "/api/v1/stocks/AAPL/analytics?date_from=2024-01-02&date_to=2024-01-03",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(decimal(&data[0]["delta_close"]), dec!(0));
        assert_eq!(decimal(&data[1]["delta_close"]), dec!(5));
        assert_eq!(data[1]["delta_volume"], 100);
        assert!(data[0].get("absolute_delta").is_none());
    }

    #[actix_web::test]
    async fn test_analytics_threshold() {
        let (status, body) = get_json(
            seeded_store().await,
            "/api/v1/stocks/AAPL/analytics?value=4&type=close",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["date"], "2024-01-02T00:00:00");
        assert_eq!(data[1]["date"], "2024-01-03T00:00:00");
        for record in data {
            assert_eq!(decimal(&record["absolute_delta"]), dec!(5));
        }
    }

    #[actix_web::test]
    async fn test_analytics_threshold_not_reached() {
        let (status, body) = get_json(
            seeded_store().await,
            "/api/v1/stocks/AAPL/analytics?value=100&type=close",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 0);
    }

    #[actix_web::test]
    async fn test_analytics_bad_request() {
        let (status, body) = get_json(
            seeded_store().await,
            "/api/v1/stocks/AAPL/analytics?value=4",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, _) = get_json(
            seeded_store().await,
            "/api/v1/stocks/AAPL/analytics?value=4&type=price",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
