// Diesel table definitions for the krxusd relational schema. Mirrors
// the migrations under `migrations/`; kept hand-written (rather than
// `diesel print-schema`-generated) because this workspace has no
// database available to run the CLI against at authoring time.

diesel::table! {
  stocks (symbol) {
    #[max_length = 20]
    symbol -> Varchar,
    name -> Text,
    name_en -> Nullable<Text>,
    #[max_length = 10]
    market -> Varchar,
    sector -> Nullable<Text>,
    industry -> Nullable<Text>,
    listed_shares -> Nullable<Int8>,
    listing_date -> Nullable<Date>,
    is_active -> Bool,
    created_at -> Timestamptz,
    updated_at -> Timestamptz,
  }
}

diesel::table! {
  stock_prices (symbol, price_date) {
    #[max_length = 20]
    symbol -> Varchar,
    price_date -> Date,
    open -> Numeric,
    high -> Numeric,
    low -> Numeric,
    close -> Numeric,
    volume -> Int8,
    trading_value -> Nullable<Numeric>,
    market_cap -> Nullable<Numeric>,
    exchange_rate -> Nullable<Numeric>,
    close_price_usd -> Nullable<Numeric>,
    created_at -> Timestamptz,
    updated_at -> Timestamptz,
  }
}

diesel::table! {
  exchange_rates (pair, rate_date) {
    #[max_length = 10]
    pair -> Varchar,
    rate_date -> Date,
    rate -> Numeric,
    #[max_length = 32]
    source -> Varchar,
    created_at -> Timestamptz,
  }
}

diesel::table! {
  sync_status (symbol, data_type) {
    #[max_length = 20]
    symbol -> Varchar,
    #[max_length = 20]
    data_type -> Varchar,
    #[max_length = 20]
    status -> Varchar,
    last_sync_date -> Nullable<Date>,
    last_sync_at -> Nullable<Timestamptz>,
    error_message -> Nullable<Text>,
    updated_at -> Timestamptz,
  }
}

diesel::table! {
  popular_stocks (ranking_type, rank, computed_date) {
    #[max_length = 20]
    ranking_type -> Varchar,
    rank -> Int4,
    #[max_length = 20]
    symbol -> Varchar,
    value -> Numeric,
    computed_at -> Timestamptz,
    computed_date -> Date,
  }
}
