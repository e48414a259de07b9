pub mod binance_futures;
