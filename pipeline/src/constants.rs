//! Bit-exact constants dictated by the upstream marketplace API.

pub const BASE_URL: &str = "https://catalog.wb.ru/catalog/";
pub const CARD_URL_BASE: &str = "https://card.wb.ru/cards/detail?spp=30";
pub const QUERY_PARAMS: &str = "&appType=1&dest=-1029256,-102269,-1304596,-1281263";
pub const CATEGORY_TREE_URL: &str = "https://static-basket-01.wb.ru/vol0/data/main-menu-ru-ru-v2.json";

pub const MAX_PAGE: u32 = 100;
pub const LAST_PAGE_TRESHOLD: usize = 95;
pub const MAX_ITEMS_IN_REQUEST: usize = 750;
pub const MAX_ITEMS_IN_BRANDS_FILTER: u64 = 500;
pub const MAX_BRANDS_IN_REQUEST: usize = 20;
pub const MIN_PRICE_RANGE: u64 = 20_000;
pub const WORKER_COUNT: usize = 100;

pub fn card_url(ids: &str) -> String {
    format!("{CARD_URL_BASE}{QUERY_PARAMS}&nm={ids}")
}
