use lotusx_futures::core::errors::codes;
use lotusx_futures::core::kernel::{
    FixedClock, HmacSigner, ReqwestRest, RestClient, RestClientBuilder, RestClientConfig,
};
use lotusx_futures::core::types::Endpoints;
use lotusx_futures::exchanges::binance_futures::types::OrderSide;
use lotusx_futures::{
    CoinMargined, ExchangeConfig, ExchangeError, FuturesAccess, ServerMessage, UsdMargined,
};
use reqwest::Method;
use rust_decimal::Decimal;
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test_api_key";
const SECRET_KEY: &str = "test_secret_key";
const TIMESTAMP: u64 = 1_499_827_319_559;

fn signed_rest(base_url: &str) -> ReqwestRest {
    RestClientBuilder::new(RestClientConfig::new(
        base_url.to_string(),
        "binance_usdm".to_string(),
    ))
    .with_signer(Arc::new(HmacSigner::new(
        API_KEY.to_string(),
        SECRET_KEY.to_string(),
    )))
    .with_clock(Arc::new(FixedClock(TIMESTAMP)))
    .build()
    .unwrap()
}

fn usd_access(server: &MockServer) -> FuturesAccess<UsdMargined> {
    let config = ExchangeConfig::new(API_KEY.to_string(), SECRET_KEY.to_string());
    let endpoints = Endpoints::new(server.uri(), "ws://127.0.0.1:1/ws");
    FuturesAccess::from_parts(config, endpoints, signed_rest(&server.uri()))
}

fn assert_api_error(err: ExchangeError, status: u16, code: i64) {
    match err {
        ExchangeError::Api(request_error) => {
            assert_eq!(request_error.status_code, status);
            assert_eq!(request_error.message.code(), Some(code));
            assert!(request_error.url.contains("/fapi/"));
        }
        other => panic!("expected api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_public_ticker_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/ticker/24hr"))
        .and(query_param("symbol", "BTCUSDT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "symbol": "BTCUSDT",
            "weightedAvgPrice": "26950.50",
            "lastPrice": "27010.10",
            "priceChangePercent": "0.512"
        })))
        .mount(&server)
        .await;

    let access = usd_access(&server);
    let tickers = access.api().get_24hr_ticker("BTCUSDT").await.unwrap();

    assert_eq!(tickers.len(), 1);
    assert_eq!(tickers[0].symbol, "BTCUSDT");
    assert_eq!(tickers[0].last_price, Decimal::from_str("27010.10").unwrap());
}

#[tokio::test]
async fn test_coin_margined_paths() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dapi/v1/ticker/24hr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "symbol": "BTCUSD_PERP",
            "weightedAvgPrice": "26950.50",
            "lastPrice": "27010.10"
        }])))
        .mount(&server)
        .await;

    let config = ExchangeConfig::read_only().base_url(server.uri());
    let access = FuturesAccess::<CoinMargined>::new(config).unwrap();
    let tickers = access.api().get_24hr_ticker("BTCUSD_PERP").await.unwrap();

    assert_eq!(tickers[0].symbol, "BTCUSD_PERP");
}

#[tokio::test]
async fn test_error_status_with_structured_body() {
    for status in [400_u16, 401] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fapi/v2/balance"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "code": -2014,
                "msg": "API-key format invalid."
            })))
            .mount(&server)
            .await;

        let access = usd_access(&server);
        let err = access.api().get_account_balance().await.unwrap_err();

        assert_eq!(err.api_code(), Some(codes::API_KEY_WRONG));
        assert_api_error(err, status, -2014);
    }
}

#[tokio::test]
async fn test_error_status_with_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/exchangeInfo"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let access = usd_access(&server);
    let err = access.api().get_exchange_info().await.unwrap_err();

    match err {
        ExchangeError::Api(request_error) => {
            assert_eq!(request_error.status_code, 503);
            assert_eq!(request_error.message, ServerMessage::Raw(String::new()));
            assert!(request_error.to_string().starts_with("Status Code: 503"));
        }
        other => panic!("expected api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_non_200_success_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/exchangeInfo"))
        .respond_with(ResponseTemplate::new(202).set_body_string("accepted"))
        .mount(&server)
        .await;

    let access = usd_access(&server);
    let err = access.api().get_exchange_info().await.unwrap_err();

    match err {
        ExchangeError::Api(request_error) => {
            assert_eq!(request_error.status_code, 202);
            assert_eq!(request_error.message, ServerMessage::Raw("accepted".into()));
        }
        other => panic!("expected api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_signed_request_carries_key_and_signature() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fapi/v1/order"))
        .and(header("X-MBX-APIKEY", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "orderId": 42,
            "symbol": "BTCUSDT",
            "side": "BUY",
            "status": "NEW",
            "clientOrderId": "abc",
            "price": "27000",
            "origQty": "0.01",
            "reduceOnly": false
        })))
        .mount(&server)
        .await;

    let access = usd_access(&server);
    let order = access
        .api()
        .place_post_only_limit_order(
            "BTCUSDT",
            OrderSide::Buy,
            Decimal::from_str("27000.00").unwrap(),
            Decimal::from_str("0.0100").unwrap(),
            false,
        )
        .await
        .unwrap();
    assert_eq!(order.order_id, 42);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let query = requests[0].url.query().unwrap().to_string();

    let payload = format!(
        "symbol=BTCUSDT&side=BUY&type=LIMIT&timeInForce=GTX&reduceOnly=false&quantity=0.01&price=27000&timestamp={}",
        TIMESTAMP
    );
    let expected_signature = HmacSigner::new(API_KEY.to_string(), SECRET_KEY.to_string())
        .signature(&payload)
        .unwrap();

    assert_eq!(query, format!("{}&signature={}", payload, expected_signature));
}

#[tokio::test]
async fn test_cancel_requires_an_identifier() {
    let server = MockServer::start().await;
    let access = usd_access(&server);

    let err = access
        .api()
        .cancel_order("BTCUSDT", None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, ExchangeError::InvalidParameters(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_signed_call_without_credentials() {
    let server = MockServer::start().await;
    let config = ExchangeConfig::read_only().base_url(server.uri());
    let access = FuturesAccess::<UsdMargined>::new(config).unwrap();

    let err = access.user_stream().obtain().await.unwrap_err();

    assert!(matches!(err, ExchangeError::AuthenticationRequired));
}

#[tokio::test]
async fn test_used_weight_header_recorded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/depth"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-mbx-used-weight-1m", "17")
                .set_body_json(json!({
                    "lastUpdateId": 1027024,
                    "bids": [["4.00000000", "431.00000000"]],
                    "asks": [["4.00000200", "12.00000000"]]
                })),
        )
        .mount(&server)
        .await;

    let rest = signed_rest(&server.uri());
    assert_eq!(rest.last_used_weight(), None);

    let body = rest
        .public_request(Method::GET, "/fapi/v1/depth", &[("symbol", "BTCUSDT")])
        .await
        .unwrap();

    assert!(body.contains("lastUpdateId"));
    assert_eq!(rest.last_used_weight(), Some(17));
}

#[tokio::test]
async fn test_connectivity_error() {
    // Bind then drop to get a port nothing listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let rest = signed_rest(&format!("http://{}", addr));
    let err = rest
        .public_request(Method::GET, "/fapi/v1/ping", &[])
        .await
        .unwrap_err();

    assert!(err.is_connectivity());
}

#[tokio::test]
async fn test_listen_key_lifecycle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fapi/v1/listenKey"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "listenKey": "pqia91ma19a5s61cv6a81va65sdf19v8a65a1a5s61cv6a81va65sdf19v8a65a1"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/fapi/v1/listenKey"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/fapi/v1/listenKey"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let access = usd_access(&server);
    let key = access.user_stream().obtain().await.unwrap();
    assert!(key.listen_key.starts_with("pqia91"));

    access.user_stream().keep_alive().await.unwrap();
    access.user_stream().revoke().await.unwrap();
}

#[tokio::test]
async fn test_keep_alive_task_extends_key() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/fapi/v1/listenKey"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let access = usd_access(&server);
    let handle = access
        .user_stream()
        .spawn_keep_alive(std::time::Duration::from_millis(50));

    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    handle.abort();

    let requests = server.received_requests().await.unwrap();
    assert!(!requests.is_empty());
    assert!(requests.iter().all(|r| r.method.as_str() == "PUT"));
}
